//! The pure type-algebra rules the analyzer consults: assignability,
//! binary/unary operator result types, and the l-value predicate. None of
//! these touch the symbol table; they are plain functions of `Type`
//! values so they read the same whichever call site (declaration
//! checking, expression checking, argument passing) needs them.

use cminor_ast::ast::{AssignOp, BinaryOp, Expr, ExprKind, UnaryOp};
use cminor_ast::types::{BasicKind, Type, BOOL, FLOAT, INT};

/// `ltype ← rtype`.
pub fn assignable(ltype: &Type, rtype: &Type) -> bool {
    if ltype == rtype {
        return true;
    }
    match (ltype, rtype) {
        (Type::Enum(_), Type::Basic(BasicKind::Int)) | (Type::Basic(BasicKind::Int), Type::Enum(_)) => true,
        (Type::Basic(BasicKind::Bool), r) if r.is_arithmetic() || r.is_pointer() || r.is_array() => true,
        (Type::Basic(BasicKind::Float), Type::Basic(BasicKind::Int)) => true,
        (Type::Pointer(_), Type::Basic(BasicKind::NullPtr)) => true,
        (Type::Pointer(l), Type::Array(r, _)) if l.as_ref() == r.as_ref() => true,
        (Type::Pointer(l), r) if is_void_ptr_elem(l) && (r.is_pointer() || r.is_array()) => true,
        _ => false,
    }
}

fn is_void_ptr_elem(elem: &Type) -> bool {
    matches!(elem, Type::Basic(BasicKind::Void))
}

/// Converts `op`'s compound-assignment form (`+=` etc.) to the plain
/// binary operator it applies before assigning back.
pub fn compound_assign_op(op: AssignOp) -> BinaryOp {
    match op {
        AssignOp::AddAssign => BinaryOp::Add,
        AssignOp::SubAssign => BinaryOp::Sub,
        AssignOp::MulAssign => BinaryOp::Mul,
        AssignOp::DivAssign => BinaryOp::Div,
        AssignOp::ModAssign => BinaryOp::Mod,
        AssignOp::Assign => unreachable!("Assign has no binary-op equivalent"),
    }
}

pub fn binary_op_type(op: BinaryOp, l: &Type, r: &Type) -> Option<Type> {
    use BinaryOp::*;
    match op {
        Add | Sub | Mul | Div => {
            if l.is_pointer() && matches!(r, Type::Basic(BasicKind::Int)) {
                return Some(l.clone());
            }
            if op == Add && r.is_pointer() && matches!(l, Type::Basic(BasicKind::Int)) {
                return Some(r.clone());
            }
            if op == Sub && l.is_pointer() && r.is_pointer() && l.elem() == r.elem() {
                return Some(INT);
            }
            numeric_result(l, r)
        }
        Mod => {
            if matches!(l, Type::Basic(BasicKind::Int)) && matches!(r, Type::Basic(BasicKind::Int)) {
                Some(INT)
            } else {
                None
            }
        }
        Eq | Ne | Lt | Gt | Le | Ge | And | Or => {
            if l.is_arithmetic() && r.is_arithmetic() {
                return Some(BOOL);
            }
            if (l.is_pointer() || l.is_array()) && (r.is_pointer() || r.is_array()) && l == r {
                return Some(BOOL);
            }
            if l.is_pointer() && matches!(r, Type::Basic(BasicKind::NullPtr)) {
                return Some(BOOL);
            }
            if r.is_pointer() && matches!(l, Type::Basic(BasicKind::NullPtr)) {
                return Some(BOOL);
            }
            None
        }
    }
}

fn numeric_result(l: &Type, r: &Type) -> Option<Type> {
    match (l, r) {
        (Type::Basic(BasicKind::Float), x) | (x, Type::Basic(BasicKind::Float)) if x.is_arithmetic() => Some(FLOAT),
        (Type::Basic(BasicKind::Int), Type::Basic(BasicKind::Int)) => Some(INT),
        _ => None,
    }
}

pub fn unary_op_type(op: UnaryOp, ty: &Type, operand_is_lvalue: bool) -> Option<Type> {
    match op {
        UnaryOp::Plus | UnaryOp::Minus => {
            matches!(ty, Type::Basic(BasicKind::Int) | Type::Basic(BasicKind::Float)).then(|| ty.clone())
        }
        UnaryOp::Not => assignable(&BOOL, ty).then_some(BOOL),
        UnaryOp::Deref => ty.elem().cloned(),
        UnaryOp::Addr => operand_is_lvalue.then(|| Type::pointer_to(ty.clone())),
        UnaryOp::PreInc | UnaryOp::PreDec => {
            let modifiable = matches!(
                ty,
                Type::Basic(BasicKind::Int) | Type::Basic(BasicKind::Float) | Type::Pointer(_)
            );
            (operand_is_lvalue && modifiable).then(|| ty.clone())
        }
    }
}

/// A postfix `++`/`--` operand follows the same typing rule as the
/// prefix form.
pub fn postfix_op_type(ty: &Type, operand_is_lvalue: bool) -> Option<Type> {
    unary_op_type(UnaryOp::PreInc, ty, operand_is_lvalue)
}

/// `Identifier` (non-const), `ArrayAccess`, `MemberAccess`, and
/// `UnaryOp{op=*}` are l-values; a `CONST` symbol (enumerator) is not.
pub fn is_lvalue(e: &Expr) -> bool {
    match &e.kind {
        ExprKind::Identifier { symbol, .. } => {
            symbol.borrow().as_ref().is_some_and(|s| s.kind != cminor_ast::symbol::SymbolKind::Const)
        }
        ExprKind::ArrayAccess { .. } | ExprKind::MemberAccess { .. } => true,
        ExprKind::Unary { op: UnaryOp::Deref, .. } => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cminor_ast::types::{CHAR, NULLPTR, VOID};

    #[test]
    fn enum_int_assignability_is_symmetric() {
        let e = Type::Enum(std::rc::Rc::new(cminor_ast::types::EnumType {
            name: "E".into(),
            enumerators: Default::default(),
        }));
        assert!(assignable(&e, &INT));
        assert!(assignable(&INT, &e));
    }

    #[test]
    fn bool_accepts_any_scalar() {
        assert!(assignable(&BOOL, &INT));
        assert!(assignable(&BOOL, &FLOAT));
        assert!(assignable(&BOOL, &Type::pointer_to(CHAR)));
    }

    #[test]
    fn float_accepts_int_not_reverse() {
        assert!(assignable(&FLOAT, &INT));
        assert!(!assignable(&INT, &FLOAT));
    }

    #[test]
    fn pointer_accepts_nullptr_and_decayed_array() {
        let pc = Type::pointer_to(CHAR);
        assert!(assignable(&pc, &NULLPTR));
        assert!(assignable(&pc, &Type::array_of(CHAR, Some(4))));
    }

    #[test]
    fn void_pointer_accepts_any_pointer() {
        let void_ptr = Type::pointer_to(VOID);
        assert!(assignable(&void_ptr, &Type::pointer_to(INT)));
        assert!(!assignable(&Type::pointer_to(INT), &void_ptr));
    }

    #[test]
    fn pointer_arithmetic_types() {
        let p = Type::pointer_to(INT);
        assert_eq!(binary_op_type(BinaryOp::Add, &p, &INT), Some(p.clone()));
        assert_eq!(binary_op_type(BinaryOp::Sub, &p, &p), Some(INT));
        // `*` and `/` get the same pointer±int result as `+`/`-`.
        assert_eq!(binary_op_type(BinaryOp::Mul, &p, &INT), Some(p.clone()));
        assert_eq!(binary_op_type(BinaryOp::Div, &p, &INT), Some(p.clone()));
    }
}
