//! The semantic analyzer: a single recursive traversal of the AST that
//! resolves names against a scoped symbol table, builds every
//! declarator's effective [`Type`], folds constant expressions, and
//! annotates every expression node's `ctype` (and `Identifier`'s
//! `symbol`, and `MemberAccess`'s `index`) slot in place.
//!
//! Expression/type-checking methods take `&self`: they only ever *read*
//! the symbol table and write into the AST's own interior-mutable slots.
//! Declaration/statement methods take `&mut self` because they push and
//! pop scopes and install new symbols.

mod constexpr;
mod typerules;

use std::cell::RefCell;
use std::rc::Rc;

use cminor_ast::ast::*;
use cminor_ast::span::{Node, Span};
use cminor_ast::symbol::{Symbol, SymbolKind};
use cminor_ast::types::{self, BasicKind, CompoundType, EnumType, Members, Type};

use crate::error::CompileError;
use crate::symtab::SymbolTable;

pub use typerules::{assignable, binary_op_type, compound_assign_op, is_lvalue, unary_op_type};

/// Runs the analyzer over a complete parsed program. On success every
/// expression node reachable from `program` carries a resolved `ctype`
/// and the program is ready for lowering.
pub fn analyze(program: &Program) -> Result<(), CompileError> {
    let mut analyzer = Analyzer::new();
    for decl in &program.decls {
        log::trace!("analyzing external declaration at {}", decl.span);
        analyzer.external_decl(decl)?;
        debug_assert_eq!(analyzer.symtab.depth(), 1, "external declaration leaked a scope");
    }
    Ok(())
}

struct Analyzer {
    symtab: SymbolTable,
    loop_depth: u32,
    current_return_type: Option<Type>,
}

/// The declarator suffix holding a function's parameter list, if `decl`
/// is function-shaped (its last suffix is a `Suffix::Param`). Also used
/// by the lowering pass to line parameter declarators up with a
/// function's LLVM argument list.
pub(crate) fn function_params(decl: &Declarator) -> Option<&Vec<Node<Parameter>>> {
    decl.suffix.iter().rev().find_map(|s| match s {
        Suffix::Param(p) => Some(&p.params),
        _ => None,
    })
}

impl Analyzer {
    fn new() -> Self {
        let mut symtab = SymbolTable::new();
        for name in ["void", "int", "float", "char", "bool"] {
            let ty = match name {
                "void" => types::VOID,
                "int" => types::INT,
                "float" => types::FLOAT,
                "char" => types::CHAR,
                "bool" => types::BOOL,
                _ => unreachable!(),
            };
            symtab.define(Rc::new(Symbol::new(ty, name, SymbolKind::Type, Span::none())));
        }
        // printf/scanf are declared implicitly so calls to them resolve
        // without a user-written prototype; the IR generator emits their
        // actual (variadic) declarations at module init.
        let char_ptr = Type::pointer_to(types::CHAR);
        symtab.define(Rc::new(Symbol::prototype(
            Type::Function(Box::new(types::INT), vec![char_ptr.clone()]),
            "printf",
            SymbolKind::Func,
            Span::none(),
        )));
        symtab.define(Rc::new(Symbol::prototype(
            Type::Function(Box::new(types::INT), vec![char_ptr]),
            "scanf",
            SymbolKind::Func,
            Span::none(),
        )));
        Analyzer { symtab, loop_depth: 0, current_return_type: None }
    }

    // --- Top level -------------------------------------------------------

    fn external_decl(&mut self, decl: &Node<ExternalDecl>) -> Result<(), CompileError> {
        match &decl.node {
            ExternalDecl::Function(f) => self.function_definition(f, decl.span),
            ExternalDecl::Compound(c) => self.compound_definition(c, decl.span),
            ExternalDecl::Enum(e) => self.enum_definition(e, decl.span),
            ExternalDecl::FuncDecl(d) => self.function_declaration(d),
            ExternalDecl::VarDecl(d) => self.variable_declaration(d, true),
            ExternalDecl::ArrDecl(d) => self.array_declaration(d, true),
        }
    }

    fn base_type(&self, spec: &Node<Specifier>) -> Result<Type, CompileError> {
        match &spec.node {
            Specifier::Void => Ok(types::VOID),
            Specifier::Int => Ok(types::INT),
            Specifier::Float => Ok(types::FLOAT),
            Specifier::Char => Ok(types::CHAR),
            Specifier::Bool => Ok(types::BOOL),
            Specifier::Struct(tag) => self.lookup_tag("struct", tag),
            Specifier::Union(tag) => self.lookup_tag("union", tag),
            Specifier::Enum(tag) => self.lookup_tag("enum", tag),
        }
    }

    fn lookup_tag(&self, kind: &str, tag: &Node<Identifier>) -> Result<Type, CompileError> {
        self.symtab
            .lookup(&tag.node.name)
            .map(|sym| sym.ty.clone())
            .ok_or_else(|| CompileError::semantic(format!("undeclared {kind} '{}'", tag.node.name), tag.span))
    }

    /// Builds a declarator's effective type: the specifier's base type,
    /// pointer-wrapped once if the declarator is a pointer, then wrapped
    /// in `Array`/`Function` by reading `suffix` right-to-left (so
    /// `int *p[4]` ends up "array-of-4 pointer-to-int").
    fn declarator_type(&self, base: Type, decl: &Declarator) -> Result<Type, CompileError> {
        let mut ty = base;
        if decl.pointer {
            ty = Type::pointer_to(ty);
        }
        for suffix in decl.suffix.iter().rev() {
            ty = match suffix {
                Suffix::Array(arr) => Type::array_of(ty, self.resolve_array_size(arr)?),
                Suffix::Param(p) => {
                    let mut params = Vec::with_capacity(p.params.len());
                    for param in &p.params {
                        let base = self.base_type(&param.node.spec)?;
                        params.push(self.declarator_type(base, &param.node.decl.node)?);
                    }
                    Type::Function(Box::new(ty), params)
                }
            };
        }
        Ok(ty)
    }

    fn resolve_array_size(&self, arr: &ArraySuffix) -> Result<Option<u32>, CompileError> {
        let Some(size_expr) = &arr.size else { return Ok(None) };
        let ety = self.expr(size_expr)?;
        if !matches!(ety, Type::Basic(BasicKind::Int)) {
            return Err(CompileError::semantic("array size must be int-typed", size_expr.span));
        }
        match constexpr::fold(size_expr)? {
            Some(v) if v > 0 => Ok(Some(v as u32)),
            Some(_) => Err(CompileError::semantic("array size must be a positive constant", size_expr.span)),
            None => Err(CompileError::semantic("array size must be a constant expression", size_expr.span)),
        }
    }

    // --- Declarations ------------------------------------------------------

    fn compound_definition(&mut self, c: &CompoundDefinition, _span: Span) -> Result<(), CompileError> {
        let compound = Rc::new(CompoundType {
            name: c.name.node.name.clone(),
            is_union: c.is_union,
            members: RefCell::new(None),
        });
        let ty = Type::Compound(compound.clone());
        let sym = Rc::new(Symbol::new(ty, c.name.node.name.clone(), SymbolKind::Type, c.name.span));
        if !self.symtab.define(sym) {
            return Err(CompileError::semantic(
                format!("redefinition of '{}'", c.name.node.name),
                c.name.span,
            ));
        }

        let mut members: Members = Members::new();
        for member in &c.members {
            let base = self.base_type(&member.node.spec)?;
            for decl in &member.node.decls {
                if decl.node.init.is_some() {
                    return Err(CompileError::semantic("struct/union members cannot have initializers", decl.span));
                }
                let mty = self.declarator_type(base.clone(), &decl.node)?;
                if mty == types::VOID {
                    return Err(CompileError::semantic("member cannot have void type", decl.span));
                }
                let mname = decl.node.name.node.name.clone();
                if members.contains_key(&mname) {
                    return Err(CompileError::semantic(format!("duplicate member '{mname}'"), decl.span));
                }
                *decl.node.ctype.borrow_mut() = Some(mty.clone());
                members.insert(mname, mty);
            }
        }
        *compound.members.borrow_mut() = Some(members);
        Ok(())
    }

    fn enum_definition(&mut self, e: &EnumDefinition, _span: Span) -> Result<(), CompileError> {
        let mut values: indexmap::IndexMap<String, i32> = indexmap::IndexMap::new();
        let mut counter: i32 = 0;
        for enumerator in &e.enumerators {
            if let Some(expr) = &enumerator.node.value {
                let ety = self.expr(expr)?;
                if !matches!(ety, Type::Basic(BasicKind::Int)) {
                    return Err(CompileError::semantic("enumerator value must be int-typed", expr.span));
                }
                match constexpr::fold(expr)? {
                    Some(v) => counter = v,
                    None => return Err(CompileError::semantic("enumerator value must be a constant expression", expr.span)),
                }
            }
            let name = enumerator.node.name.node.name.clone();
            if values.contains_key(&name) {
                return Err(CompileError::semantic(format!("duplicate enumerator '{name}'"), enumerator.node.name.span));
            }
            values.insert(name, counter);
            counter += 1;
        }
        let enum_ty = Rc::new(EnumType { name: e.name.node.name.clone(), enumerators: values });

        let tag_sym = Rc::new(Symbol::new(Type::Enum(enum_ty.clone()), e.name.node.name.clone(), SymbolKind::Type, e.name.span));
        if !self.symtab.define(tag_sym) {
            return Err(CompileError::semantic(format!("redefinition of '{}'", e.name.node.name), e.name.span));
        }
        for enumerator in &e.enumerators {
            let name = enumerator.node.name.node.name.clone();
            let csym = Rc::new(Symbol::new(Type::Enum(enum_ty.clone()), name.clone(), SymbolKind::Const, enumerator.node.name.span));
            if !self.symtab.define(csym) {
                return Err(CompileError::semantic(format!("redefinition of '{name}'"), enumerator.node.name.span));
            }
        }
        Ok(())
    }

    fn function_declaration(&mut self, d: &FunctionDeclaration) -> Result<(), CompileError> {
        let base = self.base_type(&d.spec)?;
        for decl in &d.decls {
            let ty = self.declarator_type(base.clone(), &decl.node)?;
            *decl.node.ctype.borrow_mut() = Some(ty.clone());
            let name = decl.node.name.node.name.clone();
            let sym = match self.symtab.lookup_innermost(&name) {
                Some(existing) if existing.kind == SymbolKind::Func => {
                    if existing.ty != ty {
                        return Err(CompileError::semantic(format!("conflicting declaration of '{name}'"), decl.span));
                    }
                    existing
                }
                Some(_) => return Err(CompileError::semantic(format!("redefinition of '{name}' as a different kind of symbol"), decl.span)),
                None => {
                    let sym = Rc::new(Symbol::prototype(ty, name, SymbolKind::Func, decl.span));
                    self.symtab.define(sym.clone());
                    sym
                }
            };
            *decl.node.symbol.borrow_mut() = Some(sym);
        }
        Ok(())
    }

    fn variable_declaration(&mut self, d: &VariableDeclaration, is_global: bool) -> Result<(), CompileError> {
        let base = self.base_type(&d.spec)?;
        for decl in &d.decls {
            let ty = self.declarator_type(base.clone(), &decl.node)?;
            if ty == types::VOID {
                return Err(CompileError::semantic("variable cannot have void type", decl.span));
            }
            if let Some(init) = &decl.node.init {
                self.check_initializer(init, &ty)?;
                if is_global && !self.is_constant_initializer(init) {
                    return Err(CompileError::semantic("global initializer must be a constant expression", init.span));
                }
            }
            *decl.node.ctype.borrow_mut() = Some(ty.clone());
            self.define_var(decl, ty)?;
        }
        Ok(())
    }

    fn array_declaration(&mut self, d: &ArrayDeclaration, is_global: bool) -> Result<(), CompileError> {
        let base = self.base_type(&d.spec)?;
        for decl in &d.decls {
            let mut ty = self.declarator_type(base.clone(), &decl.node)?;
            let (elem, size) = match &ty {
                Type::Array(elem, size) => ((**elem).clone(), *size),
                other => unreachable!("array declaration produced non-array type {other}"),
            };
            if elem == types::VOID {
                return Err(CompileError::semantic("array element cannot have void type", decl.span));
            }
            if size.is_none() {
                let inferred = match &decl.node.init {
                    Some(init) => self.infer_array_size(init)?,
                    None => {
                        return Err(CompileError::semantic(
                            "array declared without a size must have an initializer",
                            decl.span,
                        ))
                    }
                };
                ty = Type::array_of(elem, Some(inferred));
            }
            if let Some(init) = &decl.node.init {
                self.check_initializer(init, &ty)?;
                if is_global && !self.is_constant_initializer(init) {
                    return Err(CompileError::semantic("global initializer must be a constant expression", init.span));
                }
            }
            *decl.node.ctype.borrow_mut() = Some(ty.clone());
            self.define_var(decl, ty)?;
        }
        Ok(())
    }

    fn define_var(&mut self, decl: &Node<Declarator>, ty: Type) -> Result<(), CompileError> {
        let name = decl.node.name.node.name.clone();
        let sym = Rc::new(Symbol::new(ty, name.clone(), SymbolKind::Var, decl.span));
        if !self.symtab.define(sym.clone()) {
            return Err(CompileError::semantic(format!("redefinition of '{name}'"), decl.span));
        }
        *decl.node.symbol.borrow_mut() = Some(sym);
        Ok(())
    }

    fn infer_array_size(&self, init: &Node<Initializer>) -> Result<u32, CompileError> {
        match &init.node {
            Initializer::List(items) => Ok(items.len() as u32),
            Initializer::Expr(_) => Err(CompileError::semantic(
                "array size can only be inferred from a brace-enclosed initializer",
                init.span,
            )),
        }
    }

    fn check_initializer(&self, init: &Node<Initializer>, target: &Type) -> Result<(), CompileError> {
        match &init.node {
            Initializer::Expr(e) => {
                let ety = self.expr(e)?;
                if !assignable(target, &ety) {
                    return Err(CompileError::semantic(
                        format!("cannot initialize '{target}' from '{ety}'"),
                        e.span,
                    ));
                }
                Ok(())
            }
            Initializer::List(items) => match target {
                Type::Array(elem, size) => {
                    if let Some(n) = size {
                        if items.len() as u32 > *n {
                            return Err(CompileError::semantic("too many initializers for array", init.span));
                        }
                    }
                    for item in items {
                        self.check_initializer(item, elem)?;
                    }
                    Ok(())
                }
                Type::Compound(c) => {
                    let members = c.members.borrow();
                    let members = members.as_ref().expect("compound members resolved before initializer checking");
                    if items.len() > members.len() {
                        return Err(CompileError::semantic("too many initializers for struct/union", init.span));
                    }
                    for (item, (_, mty)) in items.iter().zip(members.iter()) {
                        self.check_initializer(item, mty)?;
                    }
                    Ok(())
                }
                _ => Err(CompileError::semantic("scalar cannot be initialized with a brace-enclosed list", init.span)),
            },
        }
    }

    fn is_constant_initializer(&self, init: &Node<Initializer>) -> bool {
        match &init.node {
            Initializer::Expr(e) => constexpr::is_constant_expr(e),
            Initializer::List(items) => items.iter().all(|i| self.is_constant_initializer(i)),
        }
    }

    fn declaration(&mut self, decl: &Declaration, span: Span) -> Result<(), CompileError> {
        match decl {
            Declaration::Func(d) => self.function_declaration(d),
            Declaration::Var(d) => self.variable_declaration(d, false),
            Declaration::Arr(d) => self.array_declaration(d, false),
            Declaration::Compound(c) => self.compound_definition(c, span),
            Declaration::Enum(e) => self.enum_definition(e, span),
        }
    }

    // --- Functions -----------------------------------------------------------

    fn function_definition(&mut self, f: &FunctionDefinition, span: Span) -> Result<(), CompileError> {
        let ret = self.base_type(&f.spec)?;
        let ty = self.declarator_type(ret, &f.decl.node)?;
        let (ret_ty, param_types) = match &ty {
            Type::Function(r, p) => ((**r).clone(), p.clone()),
            _ => return Err(CompileError::semantic("function definition requires a parameter-list declarator", f.decl.span)),
        };
        let name = f.decl.node.name.node.name.clone();
        log::debug!("analyzing function '{name}'");
        let sym = match self.symtab.lookup_innermost(&name) {
            Some(existing) if existing.kind == SymbolKind::Func => {
                if existing.ty != ty {
                    return Err(CompileError::semantic(format!("definition of '{name}' does not match its prototype"), f.decl.span));
                }
                if existing.defined.get() {
                    return Err(CompileError::semantic(format!("redefinition of function '{name}'"), f.decl.span));
                }
                existing.defined.set(true);
                existing
            }
            Some(_) => return Err(CompileError::semantic(format!("redefinition of '{name}' as a different kind of symbol"), f.decl.span)),
            None => {
                let sym = Rc::new(Symbol::new(ty.clone(), name, SymbolKind::Func, f.decl.span));
                self.symtab.define(sym.clone());
                sym
            }
        };
        *f.decl.node.symbol.borrow_mut() = Some(sym);
        *f.decl.node.ctype.borrow_mut() = Some(ty.clone());
        *f.ctype.borrow_mut() = Some(ty);

        let params = function_params(&f.decl.node)
            .ok_or_else(|| CompileError::semantic("missing parameter list", f.decl.span))?;

        self.symtab.enter_scope();
        let prev_return = self.current_return_type.replace(ret_ty);
        let prev_loop_depth = std::mem::replace(&mut self.loop_depth, 0);
        let result = self.function_body(params, &param_types, &f.body.node);
        self.symtab.leave_scope();
        self.loop_depth = prev_loop_depth;
        self.current_return_type = prev_return;
        result.map_err(|e| {
            log::trace!("function body at {span} failed analysis");
            e
        })
    }

    fn function_body(&mut self, params: &[Node<Parameter>], param_types: &[Type], body: &Block) -> Result<(), CompileError> {
        for (param, pty) in params.iter().zip(param_types.iter()) {
            let pname = param.node.decl.node.name.node.name.clone();
            *param.node.decl.node.ctype.borrow_mut() = Some(pty.clone());
            let sym = Rc::new(Symbol::new(pty.clone(), pname.clone(), SymbolKind::Var, param.node.decl.span));
            if !self.symtab.define(sym.clone()) {
                return Err(CompileError::semantic(format!("duplicate parameter name '{pname}'"), param.node.decl.span));
            }
            *param.node.decl.node.symbol.borrow_mut() = Some(sym);
        }
        self.block_items(&body.items)
    }

    // --- Statements ----------------------------------------------------------

    fn block_items(&mut self, items: &[Node<BlockItem>]) -> Result<(), CompileError> {
        for item in items {
            self.block_item(item)?;
        }
        Ok(())
    }

    fn scoped_block(&mut self, b: &Block) -> Result<(), CompileError> {
        self.symtab.enter_scope();
        let result = self.block_items(&b.items);
        self.symtab.leave_scope();
        result
    }

    fn block_item(&mut self, item: &Node<BlockItem>) -> Result<(), CompileError> {
        match &item.node {
            BlockItem::Decl(d) => self.declaration(d, item.span),
            BlockItem::Stmt(s) => self.stmt(s, item.span),
        }
    }

    fn stmt(&mut self, s: &Stmt, span: Span) -> Result<(), CompileError> {
        match s {
            Stmt::Block(b) => self.scoped_block(b),
            Stmt::If(i) => {
                self.expr_list(&i.cond)?;
                self.stmt(&i.then.node, i.then.span)?;
                if let Some(e) = &i.or_else {
                    self.stmt(&e.node, e.span)?;
                }
                Ok(())
            }
            Stmt::While(w) => {
                self.expr_list(&w.cond)?;
                self.loop_depth += 1;
                let result = self.stmt(&w.body.node, w.body.span);
                self.loop_depth -= 1;
                result
            }
            Stmt::For(f) => self.for_stmt(f),
            Stmt::Return(r) => self.return_stmt(r, span),
            Stmt::Break => {
                if self.loop_depth == 0 {
                    return Err(CompileError::semantic("'break' outside a loop", span));
                }
                Ok(())
            }
            Stmt::Continue => {
                if self.loop_depth == 0 {
                    return Err(CompileError::semantic("'continue' outside a loop", span));
                }
                Ok(())
            }
            Stmt::Empty => Ok(()),
            Stmt::Expr(e) => self.expr_list(&e.expr).map(|_| ()),
        }
    }

    fn for_stmt(&mut self, f: &ForStmt) -> Result<(), CompileError> {
        self.symtab.enter_scope();
        let result = (|| -> Result<(), CompileError> {
            if let Some(init) = &f.init {
                match &init.node {
                    ForInit::Decl(d) => self.declaration(d, init.span)?,
                    ForInit::Expr(e) => {
                        self.expr_list_bare(e)?;
                    }
                }
            }
            if let Some(cond) = &f.cond {
                self.expr_list(cond)?;
            }
            if let Some(post) = &f.post {
                self.expr_list(post)?;
            }
            self.loop_depth += 1;
            let r = self.stmt(&f.body.node, f.body.span);
            self.loop_depth -= 1;
            r
        })();
        self.symtab.leave_scope();
        result
    }

    fn return_stmt(&mut self, r: &ReturnStmt, span: Span) -> Result<(), CompileError> {
        let ret_ty = self.current_return_type.clone().expect("return statement outside a function body");
        match (&r.expr, &ret_ty) {
            (None, Type::Basic(BasicKind::Void)) => Ok(()),
            (None, _) => Err(CompileError::semantic("missing return value in a non-void function", span)),
            (Some(_), Type::Basic(BasicKind::Void)) => Err(CompileError::semantic("return with a value in a void function", span)),
            (Some(e), _) => {
                let ety = self.expr_list(e)?;
                if !assignable(&ret_ty, &ety) {
                    return Err(CompileError::semantic(
                        format!("cannot return '{ety}' from a function returning '{ret_ty}'"),
                        e.span,
                    ));
                }
                Ok(())
            }
        }
    }

    fn expr_list(&self, el: &Node<ExprList>) -> Result<Type, CompileError> {
        self.expr_list_bare(&el.node)
    }

    fn expr_list_bare(&self, el: &ExprList) -> Result<Type, CompileError> {
        let mut last = types::VOID;
        for e in &el.exprs {
            last = self.expr(e)?;
        }
        *el.ctype.borrow_mut() = Some(last.clone());
        Ok(last)
    }

    // --- Expressions -----------------------------------------------------------

    fn expr(&self, e: &Node<Expr>) -> Result<Type, CompileError> {
        let ty = self.expr_kind(&e.node.kind, e.span)?;
        *e.node.ctype.borrow_mut() = Some(ty.clone());
        Ok(ty)
    }

    fn expr_kind(&self, kind: &ExprKind, span: Span) -> Result<Type, CompileError> {
        match kind {
            ExprKind::Identifier { name, symbol } => {
                let sym = self
                    .symtab
                    .lookup(name)
                    .ok_or_else(|| CompileError::semantic(format!("undeclared identifier '{name}'"), span))?;
                if sym.kind == SymbolKind::Type {
                    return Err(CompileError::semantic(format!("'{name}' is a type, not a value"), span));
                }
                let ty = sym.ty.clone();
                *symbol.borrow_mut() = Some(sym);
                Ok(ty)
            }
            ExprKind::Integer(_) => Ok(types::INT),
            ExprKind::Decimal(_) => Ok(types::FLOAT),
            ExprKind::Character(_) => Ok(types::CHAR),
            ExprKind::String(_) => Ok(Type::array_of(types::CHAR, None)),
            ExprKind::Bool(_) => Ok(types::BOOL),
            ExprKind::NullPtr => Ok(types::NULLPTR),
            ExprKind::Assign { op, left, right } => self.assign_expr(*op, left, right, span),
            ExprKind::Binary { op, left, right } => {
                let lty = self.expr(left)?;
                let rty = self.expr(right)?;
                binary_op_type(*op, &lty, &rty)
                    .ok_or_else(|| CompileError::semantic(format!("invalid operand types '{lty}' and '{rty}' for '{op:?}'"), span))
            }
            ExprKind::Unary { op, operand } => {
                let oty = self.expr(operand)?;
                let lv = is_lvalue(operand);
                unary_op_type(*op, &oty, lv)
                    .ok_or_else(|| CompileError::semantic(format!("invalid operand type '{oty}' for unary '{op:?}'"), span))
            }
            ExprKind::Postfix { op, operand } => {
                let oty = self.expr(operand)?;
                if !is_lvalue(operand) {
                    return Err(CompileError::semantic("operand of increment/decrement must be an l-value", operand.span));
                }
                typerules::postfix_op_type(&oty, true)
                    .ok_or_else(|| CompileError::semantic(format!("invalid operand type '{oty}' for '{op:?}'"), span))
            }
            ExprKind::Call { func, args } => self.call_expr(func, args, span),
            ExprKind::ArrayAccess { array, index } => {
                let aty = self.expr(array)?;
                let ity = self.expr(index)?;
                if !matches!(ity, Type::Basic(BasicKind::Int)) {
                    return Err(CompileError::semantic("array index must be int-typed", index.span));
                }
                aty.elem()
                    .cloned()
                    .ok_or_else(|| CompileError::semantic(format!("'{aty}' is not an array or pointer"), array.span))
            }
            ExprKind::MemberAccess { object, member, arrow, index } => {
                self.member_access_expr(object, member, *arrow, index)
            }
        }
    }

    fn assign_expr(&self, op: AssignOp, left: &Node<Expr>, right: &Node<Expr>, span: Span) -> Result<Type, CompileError> {
        let lty = self.expr(left)?;
        if !is_lvalue(left) {
            return Err(CompileError::semantic("left side of assignment is not an l-value", left.span));
        }
        let rty = self.expr(right)?;
        let effective_rty = match op {
            AssignOp::Assign => rty,
            _ => {
                let bop = typerules::compound_assign_op(op);
                binary_op_type(bop, &lty, &rty)
                    .ok_or_else(|| CompileError::semantic(format!("invalid operand types '{lty}' and '{rty}' for '{op:?}'"), span))?
            }
        };
        if !assignable(&lty, &effective_rty) {
            return Err(CompileError::semantic(format!("cannot assign '{effective_rty}' to '{lty}'"), span));
        }
        Ok(lty)
    }

    fn call_expr(&self, func: &Node<Expr>, args: &[Node<Expr>], span: Span) -> Result<Type, CompileError> {
        let name = match &func.node.kind {
            ExprKind::Identifier { name, .. } => name.clone(),
            _ => return Err(CompileError::semantic("callee must be a named function", func.span)),
        };
        let sym = self
            .symtab
            .lookup(&name)
            .ok_or_else(|| CompileError::semantic(format!("call to undeclared function '{name}'"), func.span))?;
        let (ret, params) = match &sym.ty {
            Type::Function(ret, params) => ((**ret).clone(), params.clone()),
            other => return Err(CompileError::semantic(format!("'{name}' of type '{other}' is not callable"), func.span)),
        };
        if let ExprKind::Identifier { symbol, .. } = &func.node.kind {
            *symbol.borrow_mut() = Some(sym.clone());
        }
        *func.node.ctype.borrow_mut() = Some(sym.ty.clone());

        if is_builtin(&name) {
            for arg in args {
                self.expr(arg)?;
            }
        } else {
            if args.len() != params.len() {
                return Err(CompileError::semantic(
                    format!("'{name}' expects {} argument(s), got {}", params.len(), args.len()),
                    span,
                ));
            }
            for (arg, pty) in args.iter().zip(params.iter()) {
                let aty = self.expr(arg)?;
                if !assignable(pty, &aty) {
                    return Err(CompileError::semantic(
                        format!("cannot pass '{aty}' as '{pty}' argument to '{name}'"),
                        arg.span,
                    ));
                }
            }
        }
        Ok(ret)
    }

    fn member_access_expr(
        &self,
        object: &Node<Expr>,
        member: &Node<Identifier>,
        arrow: bool,
        index: &std::cell::Cell<Option<u32>>,
    ) -> Result<Type, CompileError> {
        let oty = self.expr(object)?;
        let compound_ty = if arrow {
            match &oty {
                Type::Pointer(inner) => (**inner).clone(),
                _ => return Err(CompileError::semantic("'->' requires a pointer operand", object.span)),
            }
        } else {
            oty.clone()
        };
        let compound = match &compound_ty {
            Type::Compound(c) => c,
            _ => return Err(CompileError::semantic(format!("'{compound_ty}' is not a struct or union"), object.span)),
        };
        let members = compound.members.borrow();
        let members = members.as_ref().expect("compound members resolved before member access");
        let pos = members
            .get_index_of(&member.node.name)
            .ok_or_else(|| CompileError::semantic(format!("no member named '{}' in '{}'", member.node.name, compound.name), member.span))?;
        index.set(Some(pos as u32));
        Ok(members[pos].clone())
    }
}

fn is_builtin(name: &str) -> bool {
    name == "printf" || name == "scanf"
}
