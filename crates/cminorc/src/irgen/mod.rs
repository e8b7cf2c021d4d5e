//! Lowers an analyzed [`Program`] to an LLVM [`Module`] via `inkwell`.
//!
//! `Codegen` holds nothing a single pass couldn't: the `inkwell` context
//! borrow plus a handful of interior-mutable side tables keyed by the
//! things the AST already carries stable identity for — a `Symbol`'s
//! [`SymbolId`] for lowered allocas/globals/functions, a string literal's
//! raw source text for interned globals, a compound type's tag name for
//! its LLVM struct type. Every method therefore takes `&self`; nothing
//! about lowering needs `&mut`, the same shape the semantic analyzer's
//! expression-checking half uses for its own read-only traversal.
//!
//! The four submodules split by concern: `types` (the `Type` → LLVM type
//! mapping and struct/union layout), `expr` (expression/address/cast
//! lowering), `stmt` (statements and control flow), and this module
//! (module setup, declarations, and the public entry points).

mod expr;
mod stmt;
mod types;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use inkwell::basic_block::BasicBlock;
use inkwell::context::Context;
use inkwell::module::Module;
use inkwell::values::{FunctionValue, GlobalValue, PointerValue};
use inkwell::AddressSpace;

use cminor_ast::ast::*;
use cminor_ast::span::Node;
use cminor_ast::symbol::SymbolId;
use cminor_ast::types::{self, Type};

/// What a declaration's symbol lowers to: a callable function, or the
/// address of a stack slot / global it can be loaded from and stored to.
#[derive(Debug, Clone, Copy)]
enum LoweredValue<'ctx> {
    Function(FunctionValue<'ctx>),
    Address(PointerValue<'ctx>),
}

/// `break`/`continue` targets for the loop currently being lowered. A
/// `while` pushes `(end, cond)` since `continue` re-checks the condition;
/// a `for` pushes `(end, post)` since `continue` must still run the loop's
/// post-expression before re-checking the condition.
type LoopTargets<'ctx> = (BasicBlock<'ctx>, BasicBlock<'ctx>);

pub struct Codegen<'ctx> {
    context: &'ctx Context,
    module: Module<'ctx>,
    builder: inkwell::builder::Builder<'ctx>,
    current_function: Cell<Option<FunctionValue<'ctx>>>,
    current_return_type: RefCell<Option<Type>>,
    loop_stack: RefCell<Vec<LoopTargets<'ctx>>>,
    strings: RefCell<HashMap<String, GlobalValue<'ctx>>>,
    structs: RefCell<HashMap<String, inkwell::types::StructType<'ctx>>>,
    values: RefCell<HashMap<SymbolId, LoweredValue<'ctx>>>,
}

impl<'ctx> Codegen<'ctx> {
    /// `predeclare_io` controls whether `printf`/`scanf` get their
    /// variadic `i32(ptr, ...)` declarations up front; a program that
    /// never calls either still compiles without them.
    pub fn new(context: &'ctx Context, module_name: &str, predeclare_io: bool) -> Self {
        let module = context.create_module(module_name);
        module.set_triple(&inkwell::targets::TargetMachine::get_default_triple());
        let builder = context.create_builder();

        let codegen = Codegen {
            context,
            module,
            builder,
            current_function: Cell::new(None),
            current_return_type: RefCell::new(None),
            loop_stack: RefCell::new(Vec::new()),
            strings: RefCell::new(HashMap::new()),
            structs: RefCell::new(HashMap::new()),
            values: RefCell::new(HashMap::new()),
        };
        if predeclare_io {
            codegen.declare_io_builtins();
        }
        codegen
    }

    fn declare_io_builtins(&self) {
        let ptr_ty = self.context.ptr_type(AddressSpace::default());
        let fn_ty = self.context.i32_type().fn_type(&[ptr_ty.into()], true);
        self.module.add_function("printf", fn_ty, None);
        self.module.add_function("scanf", fn_ty, None);
    }

    pub fn generate_program(&self, program: &Program) {
        log::debug!("lowering program with {} external declaration(s)", program.decls.len());
        for decl in &program.decls {
            self.external_decl(decl);
        }
    }

    /// Verifies the module and hands it back to the caller. Verification
    /// failure means this pass emitted invalid IR — a defect in this
    /// crate, not in the source program, so it panics rather than
    /// returning a `CompileError`.
    pub fn finish(self) -> Module<'ctx> {
        if let Err(message) = self.module.verify() {
            unreachable!("generated IR failed verification: {}", message.to_string());
        }
        self.module
    }

    fn external_decl(&self, decl: &Node<ExternalDecl>) {
        match &decl.node {
            ExternalDecl::Function(f) => self.function_definition(f),
            ExternalDecl::Compound(_) | ExternalDecl::Enum(_) => {
                // Struct/union layouts and enum values are materialized
                // lazily the first time `lower_type`/an enum-constant
                // identifier needs them; there is nothing to emit here.
            }
            ExternalDecl::FuncDecl(d) => self.function_declaration(d),
            ExternalDecl::VarDecl(d) => self.variable_declaration(d),
            ExternalDecl::ArrDecl(d) => self.array_declaration(d),
        }
    }

    fn function_declaration(&self, d: &FunctionDeclaration) {
        for decl in &d.decls {
            self.ensure_function(decl);
        }
    }

    /// Creates (if missing) the `FunctionValue` for a function-shaped
    /// declarator and binds its symbol, without opening a body. Shared by
    /// a bare prototype declaration and a function definition's own decl.
    fn ensure_function(&self, decl: &Node<Declarator>) -> FunctionValue<'ctx> {
        let sym = decl.node.symbol.borrow().clone().expect("function declarator missing resolved symbol at lowering");
        if let Some(LoweredValue::Function(existing)) = self.values.borrow().get(&sym.id) {
            return *existing;
        }
        let (ret_ty, param_types) = match &sym.ty {
            Type::Function(r, p) => ((**r).clone(), p.clone()),
            other => unreachable!("function declarator resolved to non-function type {other}"),
        };
        let function = match self.module.get_function(&sym.name) {
            Some(existing) => existing,
            None => {
                let fn_ty = self.lower_fn_type(&ret_ty, &param_types, false);
                self.module.add_function(&sym.name, fn_ty, None)
            }
        };
        self.values.borrow_mut().insert(sym.id, LoweredValue::Function(function));
        function
    }

    fn function_definition(&self, f: &FunctionDefinition) {
        let function = self.ensure_function(&f.decl);
        let sym = f.decl.node.symbol.borrow().clone().expect("function definition missing resolved symbol at lowering");
        let ret_ty = match &sym.ty {
            Type::Function(r, _) => (**r).clone(),
            other => unreachable!("function definition resolved to non-function type {other}"),
        };

        self.current_function.set(Some(function));
        *self.current_return_type.borrow_mut() = Some(ret_ty.clone());

        let entry = self.context.append_basic_block(function, "entry");
        self.builder.position_at_end(entry);

        let params = crate::semantic::function_params(&f.decl.node)
            .expect("function definition missing parameter list at lowering");
        log::debug!("lowering function '{}'", sym.name);
        for (i, param) in params.iter().enumerate() {
            let arg = function
                .get_nth_param(i as u32)
                .expect("function argument count does not match its lowered type");
            let psym = param.node.decl.node.symbol.borrow().clone().expect("parameter missing resolved symbol at lowering");
            let llvm_ty = self.lower_type(&psym.ty);
            let addr = self.build_entry_alloca(llvm_ty, &format!("{}.addr", psym.name));
            self.builder.build_store(addr, arg).unwrap();
            self.values.borrow_mut().insert(psym.id, LoweredValue::Address(addr));
        }

        self.gen_block(&f.body.node);

        let current = self.builder.get_insert_block().expect("builder has no insertion point");
        if current.get_terminator().is_none() {
            if ret_ty == types::VOID {
                self.builder.build_return(None).unwrap();
            } else {
                self.builder.build_unreachable().unwrap();
            }
        }

        self.current_function.set(None);
        *self.current_return_type.borrow_mut() = None;
    }

    fn variable_declaration(&self, d: &VariableDeclaration) {
        for decl in &d.decls {
            self.decl_one(decl);
        }
    }

    fn array_declaration(&self, d: &ArrayDeclaration) {
        for decl in &d.decls {
            self.decl_one(decl);
        }
    }

    fn decl_one(&self, decl: &Node<Declarator>) {
        if self.current_function.get().is_some() {
            self.local_decl_one(decl);
        } else {
            self.global_decl_one(decl);
        }
    }

    fn local_decl_one(&self, decl: &Node<Declarator>) {
        let sym = decl.node.symbol.borrow().clone().expect("local declarator missing resolved symbol at lowering");
        let ty = decl.node.ctype.borrow().clone().expect("local declarator missing resolved type at lowering");
        let llvm_ty = self.lower_type(&ty);
        let addr = self.build_entry_alloca(llvm_ty, &sym.name);
        self.values.borrow_mut().insert(sym.id, LoweredValue::Address(addr));
        if let Some(init) = &decl.node.init {
            self.gen_init(init, addr, &ty);
        }
    }

    fn global_decl_one(&self, decl: &Node<Declarator>) {
        let sym = decl.node.symbol.borrow().clone().expect("global declarator missing resolved symbol at lowering");
        let ty = decl.node.ctype.borrow().clone().expect("global declarator missing resolved type at lowering");
        let llvm_ty = self.lower_type(&ty);
        let global = self.module.add_global(llvm_ty, None, &sym.name);
        match &decl.node.init {
            Some(init) => global.set_initializer(&self.const_init(init, &ty)),
            None => global.set_initializer(&self.zero_value(llvm_ty)),
        }
        self.values.borrow_mut().insert(sym.id, LoweredValue::Address(global.as_pointer_value()));
    }

    /// Moves the builder to the function's entry block to emit an
    /// `alloca`, then restores the caller's insertion point. Every local
    /// (parameter or declared variable) is allocated this way so that a
    /// function's stack frame is laid out entirely in its entry block,
    /// regardless of how deeply nested the declaring statement is.
    fn build_entry_alloca(&self, ty: inkwell::types::BasicTypeEnum<'ctx>, name: &str) -> PointerValue<'ctx> {
        let current_block = self.builder.get_insert_block().expect("builder has no insertion point");
        let function = self.current_function.get().expect("alloca requested outside a function body");
        let entry = function.get_first_basic_block().expect("function has no entry block yet");
        match entry.get_first_instruction() {
            Some(first) => self.builder.position_before(&first),
            None => self.builder.position_at_end(entry),
        }
        let addr = self.builder.build_alloca(ty, name).unwrap();
        self.builder.position_at_end(current_block);
        addr
    }
}

/// A compile-time convenience used by the library's `compile` entry point
/// and by tests: lowers an already-analyzed program into a fresh module
/// owned by `context`.
pub fn codegen_to_module<'ctx>(context: &'ctx Context, module_name: &str, program: &Program) -> Module<'ctx> {
    let codegen = Codegen::new(context, module_name, true);
    codegen.generate_program(program);
    codegen.finish()
}
