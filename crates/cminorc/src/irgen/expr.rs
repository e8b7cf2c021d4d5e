//! Expression and l-value lowering, casts, and constant folding for
//! global initializers.

use inkwell::types::BasicType;
use inkwell::values::{BasicMetadataValueEnum, BasicValueEnum, GlobalValue, IntValue, PointerValue};
use inkwell::{FloatPredicate, IntPredicate};

use cminor_ast::ast::*;
use cminor_ast::span::Node;
use cminor_ast::symbol::{Symbol, SymbolKind};
use cminor_ast::types::{BasicKind, Type};

use super::Codegen;

fn ctype_of(e: &Node<Expr>) -> Type {
    e.node.ctype.borrow().clone().expect("expression reached lowering with no resolved type")
}

fn is_int_like(ty: &Type) -> bool {
    matches!(ty, Type::Basic(BasicKind::Int | BasicKind::Char | BasicKind::Bool) | Type::Enum(_))
}

fn is_ptr_like(ty: &Type) -> bool {
    ty.is_pointer() || matches!(ty, Type::Basic(BasicKind::NullPtr))
}

fn int_predicate(op: BinaryOp) -> IntPredicate {
    match op {
        BinaryOp::Eq => IntPredicate::EQ,
        BinaryOp::Ne => IntPredicate::NE,
        BinaryOp::Lt => IntPredicate::SLT,
        BinaryOp::Gt => IntPredicate::SGT,
        BinaryOp::Le => IntPredicate::SLE,
        BinaryOp::Ge => IntPredicate::SGE,
        _ => unreachable!("not a comparison operator"),
    }
}

fn float_predicate(op: BinaryOp) -> FloatPredicate {
    match op {
        BinaryOp::Eq => FloatPredicate::OEQ,
        BinaryOp::Ne => FloatPredicate::ONE,
        BinaryOp::Lt => FloatPredicate::OLT,
        BinaryOp::Gt => FloatPredicate::OGT,
        BinaryOp::Le => FloatPredicate::OLE,
        BinaryOp::Ge => FloatPredicate::OGE,
        _ => unreachable!("not a comparison operator"),
    }
}

impl<'ctx> Codegen<'ctx> {
    pub(super) fn gen_expr(&self, e: &Node<Expr>) -> BasicValueEnum<'ctx> {
        match &e.node.kind {
            ExprKind::Identifier { symbol, .. } => self.gen_identifier(symbol),
            ExprKind::Integer(text) => {
                self.context.i32_type().const_int(cminor_ast::literal::parse_int_literal(text) as i64 as u64, true).into()
            }
            ExprKind::Decimal(text) => {
                self.context.f32_type().const_float(cminor_ast::literal::parse_float_literal(text) as f64).into()
            }
            ExprKind::Character(text) => {
                self.context.i8_type().const_int(cminor_ast::literal::parse_char_literal(text) as i64 as u64, true).into()
            }
            ExprKind::String(text) => self.intern_string(text).as_pointer_value().into(),
            ExprKind::Bool(b) => self.context.bool_type().const_int(u64::from(*b), false).into(),
            ExprKind::NullPtr => self.context.ptr_type(inkwell::AddressSpace::default()).const_null().into(),
            ExprKind::Assign { op, left, right } => self.gen_assign(*op, left, right),
            ExprKind::Binary { op, left, right } => self.gen_binary(*op, left, right),
            ExprKind::Unary { op, operand } => self.gen_unary(*op, operand),
            ExprKind::Postfix { op, operand } => self.gen_incdec(operand, matches!(op, PostfixOp::PostInc), true),
            ExprKind::Call { func, args } => self.gen_call(func, args),
            ExprKind::ArrayAccess { .. } => {
                let addr = self.gen_address(e);
                let ty = ctype_of(e);
                self.builder.build_load(self.lower_type(&ty), addr, "arr.load").unwrap()
            }
            ExprKind::MemberAccess { .. } => {
                let addr = self.gen_address(e);
                let ty = ctype_of(e);
                self.builder.build_load(self.lower_type(&ty), addr, "member.load").unwrap()
            }
        }
    }

    fn gen_identifier(&self, symbol: &std::cell::RefCell<Option<std::rc::Rc<Symbol>>>) -> BasicValueEnum<'ctx> {
        let sym = symbol.borrow().clone().expect("identifier missing resolved symbol at lowering");
        if matches!(sym.ty, Type::Function(..)) {
            return match self.values.borrow().get(&sym.id) {
                Some(super::LoweredValue::Function(f)) => f.as_global_value().as_pointer_value().into(),
                _ => unreachable!("function symbol '{}' has no lowered function value", sym.name),
            };
        }
        if sym.ty.is_array() {
            // Arrays decay to the address of their first element, which
            // under opaque pointers is numerically identical to the
            // array's own address — no separate decay instruction needed.
            return self.gen_address_from_symbol(&sym).into();
        }
        if sym.kind == SymbolKind::Const {
            if let Type::Enum(en) = &sym.ty {
                let v = *en.enumerators.get(&sym.name).expect("enum constant missing its folded value");
                return self.context.i32_type().const_int(v as i64 as u64, true).into();
            }
        }
        let addr = self.gen_address_from_symbol(&sym);
        self.builder.build_load(self.lower_type(&sym.ty), addr, &sym.name).unwrap()
    }

    fn gen_address_from_symbol(&self, sym: &Symbol) -> PointerValue<'ctx> {
        match self.values.borrow().get(&sym.id) {
            Some(super::LoweredValue::Address(p)) => *p,
            _ => unreachable!("symbol '{}' has no addressable lowered value at lowering time", sym.name),
        }
    }

    /// The address an l-value expression designates: where to load from
    /// to read it, or store to to write it.
    pub(super) fn gen_address(&self, e: &Node<Expr>) -> PointerValue<'ctx> {
        match &e.node.kind {
            ExprKind::Identifier { symbol, .. } => {
                let sym = symbol.borrow().clone().expect("identifier missing resolved symbol at lowering");
                self.gen_address_from_symbol(&sym)
            }
            ExprKind::ArrayAccess { array, index } => {
                let aty = ctype_of(array);
                let idx = self.gen_expr(index).into_int_value();
                let elem_ty = self.lower_type(aty.elem().expect("array-access base is not an array or pointer"));
                if aty.is_array() {
                    let base_addr = self.gen_address(array);
                    let base_llvm_ty = self.lower_type(&aty);
                    let i32t = self.context.i32_type();
                    unsafe {
                        self.builder
                            .build_gep(base_llvm_ty, base_addr, &[i32t.const_zero(), idx], "arr.elem")
                            .unwrap()
                    }
                } else {
                    let base_val = self.gen_expr(array).into_pointer_value();
                    unsafe { self.builder.build_gep(elem_ty, base_val, &[idx], "ptr.elem").unwrap() }
                }
            }
            ExprKind::MemberAccess { object, arrow, index, .. } => {
                let idx = index.get().expect("member access missing resolved member index at lowering");
                let obj_ty = ctype_of(object);
                let (compound_ty, base_addr) = if *arrow {
                    let inner = match &obj_ty {
                        Type::Pointer(inner) => (**inner).clone(),
                        _ => unreachable!("'->' operand is not pointer-typed"),
                    };
                    (inner, self.gen_expr(object).into_pointer_value())
                } else {
                    (obj_ty.clone(), self.gen_address(object))
                };
                let struct_llvm_ty = self.lower_type(&compound_ty);
                let is_union = matches!(&compound_ty, Type::Compound(c) if c.is_union);
                // A union's lowered struct has exactly one field (its
                // largest member); every member access addresses that
                // field regardless of which member was named, with the
                // member's own type supplied at the subsequent load/store.
                let field = if is_union { 0 } else { idx };
                let i32t = self.context.i32_type();
                unsafe {
                    self.builder
                        .build_gep(struct_llvm_ty, base_addr, &[i32t.const_zero(), i32t.const_int(field as u64, false)], "member.addr")
                        .unwrap()
                }
            }
            ExprKind::Unary { op: UnaryOp::Deref, operand } => self.gen_expr(operand).into_pointer_value(),
            _ => unreachable!("expression is not an l-value at lowering time"),
        }
    }

    /// A total conversion function: every `(src, target)` pair this
    /// analyzer's `assignable` rule permits lowers to a concrete
    /// instruction sequence (or a no-op when the representations already
    /// coincide, as with any pointer-to-pointer cast under opaque
    /// pointers).
    pub(super) fn gen_cast(&self, value: BasicValueEnum<'ctx>, src: &Type, tgt: &Type) -> BasicValueEnum<'ctx> {
        if src == tgt {
            return value;
        }
        if is_ptr_like(src) && is_ptr_like(tgt) {
            return value;
        }
        let float_kind = Type::Basic(BasicKind::Float);
        if *src == float_kind && is_int_like(tgt) {
            let iv = self.builder.build_float_to_signed_int(value.into_float_value(), self.int_type_for(tgt), "fptosi").unwrap();
            return iv.into();
        }
        if is_int_like(src) && *tgt == float_kind {
            let fv = self.builder.build_signed_int_to_float(value.into_int_value(), self.context.f32_type(), "sitofp").unwrap();
            return fv.into();
        }
        if is_int_like(src) && is_int_like(tgt) {
            let iv = value.into_int_value();
            let src_w = iv.get_type().get_bit_width();
            let tgt_ty = self.int_type_for(tgt);
            let tgt_w = tgt_ty.get_bit_width();
            return if src_w < tgt_w {
                self.builder.build_int_s_extend(iv, tgt_ty, "sext").unwrap().into()
            } else if src_w > tgt_w {
                self.builder.build_int_truncate(iv, tgt_ty, "trunc").unwrap().into()
            } else {
                value
            };
        }
        value
    }

    fn int_type_for(&self, ty: &Type) -> inkwell::types::IntType<'ctx> {
        match ty {
            Type::Basic(BasicKind::Bool) => self.context.bool_type(),
            Type::Basic(BasicKind::Char) => self.context.i8_type(),
            Type::Basic(BasicKind::Int) | Type::Enum(_) => self.context.i32_type(),
            other => unreachable!("{other} has no integer representation"),
        }
    }

    fn to_i1(&self, v: BasicValueEnum<'ctx>) -> IntValue<'ctx> {
        match v {
            BasicValueEnum::IntValue(i) if i.get_type().get_bit_width() == 1 => i,
            BasicValueEnum::IntValue(i) => {
                let zero = i.get_type().const_zero();
                self.builder.build_int_compare(IntPredicate::NE, i, zero, "tobool").unwrap()
            }
            BasicValueEnum::FloatValue(f) => {
                let zero = f.get_type().const_zero();
                self.builder.build_float_compare(FloatPredicate::ONE, f, zero, "tobool").unwrap()
            }
            BasicValueEnum::PointerValue(p) => self.builder.build_is_not_null(p, "tobool").unwrap(),
            _ => unreachable!("non-scalar value used as a condition"),
        }
    }

    pub(super) fn gen_condition(&self, el: &Node<ExprList>) -> IntValue<'ctx> {
        let v = self.gen_expr_list(el).expect("condition expression produced no value");
        self.to_i1(v)
    }

    pub(super) fn gen_expr_list(&self, el: &Node<ExprList>) -> Option<BasicValueEnum<'ctx>> {
        self.gen_expr_list_bare(&el.node)
    }

    pub(super) fn gen_expr_list_bare(&self, el: &ExprList) -> Option<BasicValueEnum<'ctx>> {
        let mut last = None;
        for e in &el.exprs {
            last = Some(self.gen_expr(e));
        }
        last
    }

    fn gen_assign(&self, op: AssignOp, left: &Node<Expr>, right: &Node<Expr>) -> BasicValueEnum<'ctx> {
        let left_addr = self.gen_address(left);
        let lty = ctype_of(left);
        let rty = ctype_of(right);
        let rval = self.gen_expr(right);

        let stored = match op {
            AssignOp::Assign => self.gen_cast(rval, &rty, &lty),
            _ => {
                let bop = crate::semantic::compound_assign_op(op);
                let llvm_lty = self.lower_type(&lty);
                let loaded = self.builder.build_load(llvm_lty, left_addr, "compound.load").unwrap();
                let result_ty = crate::semantic::binary_op_type(bop, &lty, &rty)
                    .expect("compound assignment operand types rejected by semantic analysis");
                let combined = self.combine_binary(bop, loaded, &lty, rval, &rty);
                self.gen_cast(combined, &result_ty, &lty)
            }
        };
        self.builder.build_store(left_addr, stored).unwrap();
        stored
    }

    fn gen_binary(&self, op: BinaryOp, left: &Node<Expr>, right: &Node<Expr>) -> BasicValueEnum<'ctx> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            return self.gen_short_circuit(op, left, right).into();
        }
        let lty = ctype_of(left);
        let rty = ctype_of(right);
        let lval = self.gen_expr(left);
        let rval = self.gen_expr(right);
        self.combine_binary(op, lval, &lty, rval, &rty)
    }

    /// The `&&`/`||` short-circuit diamond: evaluate `left`; if that
    /// already decides the result, skip `right` entirely. Both arms store
    /// through the same `alloca` so the merge point has a single value to
    /// load, rather than needing a `phi`.
    fn gen_short_circuit(&self, op: BinaryOp, left: &Node<Expr>, right: &Node<Expr>) -> IntValue<'ctx> {
        let is_and = matches!(op, BinaryOp::And);
        let function = self.current_function.get().expect("logical operator used outside a function");
        let lval = self.gen_expr(left);
        let lcond = self.to_i1(lval);

        let result_addr = self.build_entry_alloca(self.context.bool_type().into(), "logic.result");
        self.builder.build_store(result_addr, lcond).unwrap();

        let next_bb = self.context.append_basic_block(function, "logic.rhs");
        let end_bb = self.context.append_basic_block(function, "logic.end");
        if is_and {
            self.builder.build_conditional_branch(lcond, next_bb, end_bb).unwrap();
        } else {
            self.builder.build_conditional_branch(lcond, end_bb, next_bb).unwrap();
        }

        self.builder.position_at_end(next_bb);
        let rval = self.gen_expr(right);
        let rcond = self.to_i1(rval);
        self.builder.build_store(result_addr, rcond).unwrap();
        self.builder.build_unconditional_branch(end_bb).unwrap();

        self.builder.position_at_end(end_bb);
        self.builder.build_load(self.context.bool_type(), result_addr, "logic.value").unwrap().into_int_value()
    }

    /// Combines two already-lowered operand values given their source
    /// types: pointer arithmetic and pointer comparisons read the types
    /// directly rather than inspecting the LLVM values (which carry no
    /// pointee information once lowered), everything else promotes
    /// `int`→`float` as needed and dispatches to the matching LLVM
    /// instruction.
    pub(super) fn combine_binary(
        &self,
        op: BinaryOp,
        mut lval: BasicValueEnum<'ctx>,
        lty: &Type,
        mut rval: BasicValueEnum<'ctx>,
        rty: &Type,
    ) -> BasicValueEnum<'ctx> {
        use BinaryOp::*;

        if lty.is_pointer() && matches!(rty, Type::Basic(BasicKind::Int)) && matches!(op, Add | Sub | Mul | Div) {
            let elem_ty = self.lower_type(lty.elem().expect("pointer operand missing element type"));
            let idx = rval.into_int_value();
            let idx = if op == Sub { self.builder.build_int_neg(idx, "ptr.sub.neg").unwrap() } else { idx };
            return unsafe { self.builder.build_gep(elem_ty, lval.into_pointer_value(), &[idx], "ptr.add").unwrap() }.into();
        }
        if op == Add && matches!(lty, Type::Basic(BasicKind::Int)) && rty.is_pointer() {
            let elem_ty = self.lower_type(rty.elem().expect("pointer operand missing element type"));
            return unsafe { self.builder.build_gep(elem_ty, rval.into_pointer_value(), &[lval.into_int_value()], "ptr.add").unwrap() }.into();
        }
        if op == Sub && lty.is_pointer() && rty.is_pointer() {
            let i64t = self.context.i64_type();
            let li = self.builder.build_ptr_to_int(lval.into_pointer_value(), i64t, "ptrdiff.l").unwrap();
            let ri = self.builder.build_ptr_to_int(rval.into_pointer_value(), i64t, "ptrdiff.r").unwrap();
            let diff = self.builder.build_int_sub(li, ri, "ptrdiff").unwrap();
            return self.builder.build_int_truncate(diff, self.context.i32_type(), "ptrdiff.trunc").unwrap().into();
        }
        if matches!(op, Eq | Ne | Lt | Gt | Le | Ge) && (is_ptr_like(lty) || is_ptr_like(rty)) {
            let i64t = self.context.i64_type();
            let li = self.builder.build_ptr_to_int(lval.into_pointer_value(), i64t, "ptrcmp.l").unwrap();
            let ri = self.builder.build_ptr_to_int(rval.into_pointer_value(), i64t, "ptrcmp.r").unwrap();
            return self.builder.build_int_compare(int_predicate(op), li, ri, "ptrcmp").unwrap().into();
        }

        let float_kind = Type::Basic(BasicKind::Float);
        if lty.is_arithmetic() && rty.is_arithmetic() && (*lty == float_kind || *rty == float_kind) {
            if *lty != float_kind {
                lval = self.builder.build_signed_int_to_float(lval.into_int_value(), self.context.f32_type(), "promote").unwrap().into();
            }
            if *rty != float_kind {
                rval = self.builder.build_signed_int_to_float(rval.into_int_value(), self.context.f32_type(), "promote").unwrap().into();
            }
        }

        match (op, lval, rval) {
            (Add, BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => self.builder.build_float_add(l, r, "fadd").unwrap().into(),
            (Sub, BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => self.builder.build_float_sub(l, r, "fsub").unwrap().into(),
            (Mul, BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => self.builder.build_float_mul(l, r, "fmul").unwrap().into(),
            (Div, BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => self.builder.build_float_div(l, r, "fdiv").unwrap().into(),
            (Add, BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => self.builder.build_int_add(l, r, "add").unwrap().into(),
            (Sub, BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => self.builder.build_int_sub(l, r, "sub").unwrap().into(),
            (Mul, BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => self.builder.build_int_mul(l, r, "mul").unwrap().into(),
            (Div, BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => self.builder.build_int_signed_div(l, r, "sdiv").unwrap().into(),
            (Mod, BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => self.builder.build_int_signed_rem(l, r, "srem").unwrap().into(),
            (Eq | Ne | Lt | Gt | Le | Ge, BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => {
                self.builder.build_float_compare(float_predicate(op), l, r, "fcmp").unwrap().into()
            }
            (Eq | Ne | Lt | Gt | Le | Ge, BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => {
                self.builder.build_int_compare(int_predicate(op), l, r, "icmp").unwrap().into()
            }
            (And | Or, ..) => unreachable!("&&/|| lower via the short-circuit diamond, not combine_binary"),
            _ => unreachable!("binary operator {op:?} reached with mismatched operand kinds"),
        }
    }

    fn gen_unary(&self, op: UnaryOp, operand: &Node<Expr>) -> BasicValueEnum<'ctx> {
        match op {
            UnaryOp::Plus => self.gen_expr(operand),
            UnaryOp::Minus => match self.gen_expr(operand) {
                BasicValueEnum::FloatValue(f) => self.builder.build_float_neg(f, "fneg").unwrap().into(),
                BasicValueEnum::IntValue(i) => self.builder.build_int_neg(i, "neg").unwrap().into(),
                _ => unreachable!("unary '-' over a non-arithmetic value"),
            },
            UnaryOp::Not => {
                let v = self.gen_expr(operand);
                let cond = self.to_i1(v);
                self.builder.build_not(cond, "not").unwrap().into()
            }
            UnaryOp::Addr => self.gen_address(operand).into(),
            UnaryOp::Deref => {
                let ptr = self.gen_expr(operand).into_pointer_value();
                let ty = ctype_of(operand);
                let elem_ty = ty.elem().expect("dereference of a non-pointer type");
                self.builder.build_load(self.lower_type(elem_ty), ptr, "deref").unwrap()
            }
            UnaryOp::PreInc => self.gen_incdec(operand, true, false),
            UnaryOp::PreDec => self.gen_incdec(operand, false, false),
        }
    }

    /// Shared by prefix `++`/`--` (returns the *new* value) and postfix
    /// `++`/`--` (returns the *old* value).
    fn gen_incdec(&self, operand: &Node<Expr>, is_inc: bool, is_post: bool) -> BasicValueEnum<'ctx> {
        let addr = self.gen_address(operand);
        let ty = ctype_of(operand);
        let llvm_ty = self.lower_type(&ty);
        let old = self.builder.build_load(llvm_ty, addr, "incdec.old").unwrap();
        let new = if ty.is_pointer() {
            let elem_ty = self.lower_type(ty.elem().expect("pointer operand missing element type"));
            let step = if is_inc { 1i64 } else { -1i64 };
            let step = self.context.i32_type().const_int(step as u64, true);
            unsafe { self.builder.build_gep(elem_ty, old.into_pointer_value(), &[step], "incdec.ptr").unwrap() }.into()
        } else {
            match old {
                BasicValueEnum::FloatValue(f) => {
                    let one = f.get_type().const_float(1.0);
                    if is_inc { self.builder.build_float_add(f, one, "finc").unwrap().into() } else { self.builder.build_float_sub(f, one, "fdec").unwrap().into() }
                }
                BasicValueEnum::IntValue(i) => {
                    let one = i.get_type().const_int(1, false);
                    if is_inc { self.builder.build_int_add(i, one, "inc").unwrap().into() } else { self.builder.build_int_sub(i, one, "dec").unwrap().into() }
                }
                _ => unreachable!("increment/decrement over a non-scalar value"),
            }
        };
        self.builder.build_store(addr, new).unwrap();
        if is_post { old } else { new }
    }

    fn gen_call(&self, func: &Node<Expr>, args: &[Node<Expr>]) -> BasicValueEnum<'ctx> {
        let name = match &func.node.kind {
            ExprKind::Identifier { name, .. } => name.clone(),
            _ => unreachable!("call target is not a named function at lowering time"),
        };
        if name == "printf" || name == "scanf" {
            return self.gen_builtin_call(&name, args);
        }
        let sym = match &func.node.kind {
            ExprKind::Identifier { symbol, .. } => symbol.borrow().clone().expect("call target missing resolved symbol at lowering"),
            _ => unreachable!(),
        };
        let function = match self.values.borrow().get(&sym.id) {
            Some(super::LoweredValue::Function(f)) => *f,
            _ => unreachable!("function '{}' has no lowered function value at lowering time", sym.name),
        };
        let param_types = match &sym.ty {
            Type::Function(_, params) => params.clone(),
            other => unreachable!("callee symbol resolved to non-function type {other}"),
        };
        let mut arg_vals: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        for (arg, pty) in args.iter().zip(param_types.iter()) {
            let v = self.gen_expr(arg);
            let aty = ctype_of(arg);
            arg_vals.push(self.gen_cast(v, &aty, pty).into());
        }
        let call_site = self.builder.build_call(function, &arg_vals, "call").unwrap();
        call_site.try_as_basic_value().left().unwrap_or_else(|| self.context.i32_type().const_zero().into())
    }

    /// `printf` widens `float` arguments to `double` (C's default
    /// argument promotion for variadic calls); `scanf` takes the address
    /// of each output argument instead of its value.
    fn gen_builtin_call(&self, name: &str, args: &[Node<Expr>]) -> BasicValueEnum<'ctx> {
        let function = self.module.get_function(name).expect("builtin was not predeclared at module init");
        let mut arg_vals: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        arg_vals.push(self.gen_expr(&args[0]).into());
        for arg in &args[1..] {
            if name == "printf" {
                let v = match self.gen_expr(arg) {
                    BasicValueEnum::FloatValue(f) => self.builder.build_float_ext(f, self.context.f64_type(), "fpext").unwrap().into(),
                    other => other,
                };
                arg_vals.push(v.into());
            } else {
                arg_vals.push(self.gen_address(arg).into());
            }
        }
        let call_site = self.builder.build_call(function, &arg_vals, "call").unwrap();
        call_site.try_as_basic_value().left().expect("printf/scanf declared with a non-void return type")
    }

    /// Recursively stores a (possibly brace-enclosed) initializer into an
    /// already-allocated local, GEPing into nested arrays/structs one
    /// level per recursive call.
    pub(super) fn gen_init(&self, init: &Node<Initializer>, addr: PointerValue<'ctx>, ty: &Type) {
        match &init.node {
            Initializer::Expr(e) => {
                if let (Type::Array(elem, size), ExprKind::String(text)) = (ty, &e.node.kind) {
                    if matches!(elem.as_ref(), Type::Basic(BasicKind::Char)) {
                        self.gen_string_init(text, addr, *size);
                        return;
                    }
                }
                let v = self.gen_expr(e);
                let ety = ctype_of(e);
                let casted = self.gen_cast(v, &ety, ty);
                self.builder.build_store(addr, casted).unwrap();
            }
            Initializer::List(items) => {
                let base_llvm_ty = self.lower_type(ty);
                let i32t = self.context.i32_type();
                match ty {
                    Type::Array(elem, _) => {
                        for (i, item) in items.iter().enumerate() {
                            let elem_addr = unsafe {
                                self.builder
                                    .build_gep(base_llvm_ty, addr, &[i32t.const_zero(), i32t.const_int(i as u64, false)], "init.elem")
                                    .unwrap()
                            };
                            self.gen_init(item, elem_addr, elem);
                        }
                    }
                    Type::Compound(c) => {
                        let members = c.members.borrow();
                        let members = members.as_ref().expect("compound type reached lowering with members unresolved");
                        for (i, (item, mty)) in items.iter().zip(members.values()).enumerate() {
                            let member_addr = unsafe {
                                self.builder
                                    .build_gep(base_llvm_ty, addr, &[i32t.const_zero(), i32t.const_int(i as u64, false)], "init.member")
                                    .unwrap()
                            };
                            self.gen_init(item, member_addr, mty);
                        }
                    }
                    other => unreachable!("brace initializer over non-aggregate type {other}"),
                }
            }
        }
    }

    /// Stores a string literal's bytes (nul-terminated, zero-padded or
    /// truncated to `size`) directly into a local `char` array, one byte
    /// per `store` rather than materializing the pointer `intern_string`
    /// would hand back for a `char*` target.
    fn gen_string_init(&self, text: &str, addr: PointerValue<'ctx>, size: Option<u32>) {
        let mut bytes = cminor_ast::literal::decode_string_literal(text);
        bytes.push(0);
        let i8t = self.context.i8_type();
        let i32t = self.context.i32_type();
        let n = size.unwrap_or(bytes.len() as u32) as usize;
        let arr_ty = i8t.array_type(n as u32);
        for i in 0..n {
            let byte = bytes.get(i).copied().unwrap_or(0);
            let elem_addr = unsafe {
                self.builder
                    .build_gep(arr_ty, addr, &[i32t.const_zero(), i32t.const_int(i as u64, false)], "str.init.elem")
                    .unwrap()
            };
            self.builder.build_store(elem_addr, i8t.const_int(byte as u64, false)).unwrap();
        }
    }

    pub(super) fn intern_string(&self, raw: &str) -> GlobalValue<'ctx> {
        if let Some(existing) = self.strings.borrow().get(raw) {
            return *existing;
        }
        let mut bytes = cminor_ast::literal::decode_string_literal(raw);
        bytes.push(0);
        let i8t = self.context.i8_type();
        let arr_ty = i8t.array_type(bytes.len() as u32);
        let name = format!(".str.{}", self.strings.borrow().len());
        let global = self.module.add_global(arr_ty, None, &name);
        let const_bytes: Vec<_> = bytes.iter().map(|b| i8t.const_int(*b as u64, false)).collect();
        global.set_initializer(&i8t.const_array(&const_bytes));
        global.set_linkage(inkwell::module::Linkage::Private);
        global.set_constant(true);
        self.strings.borrow_mut().insert(raw.to_string(), global);
        global
    }

    /// Folds a global initializer expression to an LLVM constant. Unlike
    /// the body-statement evaluator, this never touches the builder: a
    /// global's initializer has to be a compile-time constant, which the
    /// semantic analyzer already verified via `is_constant_initializer`.
    pub(super) fn const_expr(&self, e: &Node<Expr>) -> BasicValueEnum<'ctx> {
        match &e.node.kind {
            ExprKind::Integer(text) => self.context.i32_type().const_int(cminor_ast::literal::parse_int_literal(text) as i64 as u64, true).into(),
            ExprKind::Decimal(text) => self.context.f32_type().const_float(cminor_ast::literal::parse_float_literal(text) as f64).into(),
            ExprKind::Character(text) => self.context.i8_type().const_int(cminor_ast::literal::parse_char_literal(text) as i64 as u64, true).into(),
            ExprKind::Bool(b) => self.context.bool_type().const_int(u64::from(*b), false).into(),
            ExprKind::NullPtr => self.context.ptr_type(inkwell::AddressSpace::default()).const_null().into(),
            ExprKind::String(text) => self.intern_string(text).as_pointer_value().into(),
            ExprKind::Identifier { symbol, .. } => {
                let sym = symbol.borrow().clone().expect("identifier missing resolved symbol at lowering");
                match &sym.ty {
                    Type::Enum(en) => {
                        let v = *en.enumerators.get(&sym.name).expect("enum constant missing its folded value");
                        self.context.i32_type().const_int(v as i64 as u64, true).into()
                    }
                    other => unreachable!("non-constant identifier of type {other} reached a global initializer"),
                }
            }
            ExprKind::Unary { op, operand } => {
                let v = self.const_expr(operand);
                match (op, v) {
                    (UnaryOp::Plus, v) => v,
                    (UnaryOp::Minus, BasicValueEnum::IntValue(i)) => i.const_neg().into(),
                    (UnaryOp::Minus, BasicValueEnum::FloatValue(f)) => f.const_neg().into(),
                    (UnaryOp::Not, BasicValueEnum::IntValue(i)) => {
                        i.const_int_compare(IntPredicate::EQ, i.get_type().const_zero()).into()
                    }
                    _ => unreachable!("invalid operand for a unary operator in a constant expression"),
                }
            }
            ExprKind::Binary { op, left, right } => {
                let l = self.const_expr(left);
                let r = self.const_expr(right);
                self.const_binary(*op, l, r)
            }
            _ => unreachable!("non-constant expression reached global-initializer lowering"),
        }
    }

    fn const_binary(&self, op: BinaryOp, l: BasicValueEnum<'ctx>, r: BasicValueEnum<'ctx>) -> BasicValueEnum<'ctx> {
        use BinaryOp::*;
        match (l, r) {
            (BasicValueEnum::IntValue(l), BasicValueEnum::IntValue(r)) => match op {
                Add => l.const_add(r).into(),
                Sub => l.const_sub(r).into(),
                Mul => l.const_mul(r).into(),
                Eq => l.const_int_compare(IntPredicate::EQ, r).into(),
                Ne => l.const_int_compare(IntPredicate::NE, r).into(),
                Lt => l.const_int_compare(IntPredicate::SLT, r).into(),
                Gt => l.const_int_compare(IntPredicate::SGT, r).into(),
                Le => l.const_int_compare(IntPredicate::SLE, r).into(),
                Ge => l.const_int_compare(IntPredicate::SGE, r).into(),
                _ => unreachable!("operator {op:?} is not supported in a constant expression"),
            },
            (BasicValueEnum::FloatValue(l), BasicValueEnum::FloatValue(r)) => match op {
                Add => l.const_add(r).into(),
                Sub => l.const_sub(r).into(),
                Mul => l.const_mul(r).into(),
                _ => unreachable!("operator {op:?} is not supported over float constants"),
            },
            _ => unreachable!("mismatched operand kinds in a constant expression"),
        }
    }

    /// A (possibly brace-enclosed) global initializer folded entirely to
    /// LLVM constants.
    pub(super) fn const_init(&self, init: &Node<Initializer>, ty: &Type) -> BasicValueEnum<'ctx> {
        match &init.node {
            Initializer::Expr(e) => {
                if let (Type::Array(elem, size), ExprKind::String(text)) = (ty, &e.node.kind) {
                    if matches!(elem.as_ref(), Type::Basic(BasicKind::Char)) {
                        return self.const_string_array(text, *size);
                    }
                }
                let v = self.const_expr(e);
                let ety = ctype_of(e);
                self.const_cast(v, &ety, ty)
            }
            Initializer::List(items) => match ty {
                Type::Array(elem, size) => {
                    let elem_llvm = self.lower_type(elem);
                    let n = size.unwrap_or(items.len() as u32) as usize;
                    let mut vals: Vec<BasicValueEnum> = items.iter().map(|i| self.const_init(i, elem)).collect();
                    while vals.len() < n {
                        vals.push(self.zero_value(elem_llvm));
                    }
                    elem_llvm.array_type(n as u32).const_array(&vals).into()
                }
                Type::Compound(c) if !c.is_union => {
                    let members = c.members.borrow();
                    let members = members.as_ref().expect("compound type reached lowering with members unresolved");
                    let vals: Vec<BasicValueEnum> = items.iter().zip(members.values()).map(|(i, mty)| self.const_init(i, mty)).collect();
                    self.lower_type(ty).into_struct_type().const_named_struct(&vals).into()
                }
                Type::Compound(_) => {
                    // A union global initializer only ever supplies its
                    // first member; the sole lowered field takes that
                    // value directly.
                    let first = items.first().expect("brace initializer for a union must name a member");
                    let v = self.const_init(first, ty);
                    self.lower_type(ty).into_struct_type().const_named_struct(&[v]).into()
                }
                other => unreachable!("brace initializer over non-aggregate type {other}"),
            },
        }
    }

    /// The constant-folded analogue of [`Self::gen_string_init`] for a
    /// global `char` array initialized from a string literal.
    fn const_string_array(&self, text: &str, size: Option<u32>) -> BasicValueEnum<'ctx> {
        let mut bytes = cminor_ast::literal::decode_string_literal(text);
        bytes.push(0);
        let i8t = self.context.i8_type();
        let n = size.unwrap_or(bytes.len() as u32) as usize;
        let vals: Vec<_> = (0..n).map(|i| i8t.const_int(bytes.get(i).copied().unwrap_or(0) as u64, false)).collect();
        i8t.const_array(&vals).into()
    }

    /// A constant-context analogue of [`Self::gen_cast`] for the handful
    /// of conversions a global scalar initializer can need.
    fn const_cast(&self, value: BasicValueEnum<'ctx>, src: &Type, tgt: &Type) -> BasicValueEnum<'ctx> {
        if src == tgt || (is_ptr_like(src) && is_ptr_like(tgt)) {
            return value;
        }
        let float_kind = Type::Basic(BasicKind::Float);
        if is_int_like(src) && *tgt == float_kind {
            return value.into_int_value().const_signed_to_float(self.context.f32_type()).into();
        }
        if *src == float_kind && is_int_like(tgt) {
            return value.into_float_value().const_to_signed_int(self.int_type_for(tgt)).into();
        }
        value
    }

    pub(super) fn zero_value(&self, ty: inkwell::types::BasicTypeEnum<'ctx>) -> BasicValueEnum<'ctx> {
        ty.const_zero()
    }
}
