//! Integer constant folding and the narrower "is this a constant
//! expression at all" check used to validate global initializers.
//!
//! Both functions are pure readers of the AST: they never touch the
//! symbol table directly, only the `ctype`/`symbol` slots the main
//! expression-checking pass has already filled in. Folding and
//! type-checking an expression twice must agree, so keeping folding as a
//! pure function of the (already-annotated) tree is what makes that true.

use cminor_ast::ast::{BinaryOp, Expr, ExprKind, UnaryOp};
use cminor_ast::span::{Node, Span};
use cminor_ast::symbol::SymbolKind;
use cminor_ast::types::Type;

use crate::error::CompileError;

/// Folds an already type-checked expression to an `int` value, or `None`
/// if some sub-expression isn't foldable (a variable read, a call, ...).
/// Division/modulus by a literal zero is the one case that is foldable
/// and still an error, so this returns `Result` rather than plain
/// `Option`.
pub fn fold(expr: &Node<Expr>) -> Result<Option<i32>, CompileError> {
    match &expr.node.kind {
        ExprKind::Integer(text) => Ok(Some(cminor_ast::literal::parse_int_literal(text))),
        ExprKind::Character(text) => Ok(Some(cminor_ast::literal::parse_char_literal(text))),
        ExprKind::Bool(b) => Ok(Some(i32::from(*b))),
        ExprKind::Identifier { symbol, .. } => {
            let symbol = symbol.borrow();
            match symbol.as_ref() {
                // Only a CONST symbol (an enumerator) resolves to a value;
                // the enum's own type name must not.
                Some(sym) if sym.kind == SymbolKind::Const => match &sym.ty {
                    Type::Enum(e) => Ok(e.enumerators.get(&sym.name).copied()),
                    _ => Ok(None),
                },
                _ => Ok(None),
            }
        }
        ExprKind::Unary { op, operand } => {
            let v = fold(operand)?;
            Ok(match (op, v) {
                (UnaryOp::Plus, Some(v)) => Some(v),
                (UnaryOp::Minus, Some(v)) => Some(v.wrapping_neg()),
                (UnaryOp::Not, Some(v)) => Some(i32::from(v == 0)),
                _ => None,
            })
        }
        ExprKind::Binary { op, left, right } => {
            match (fold(left)?, fold(right)?) {
                (Some(l), Some(r)) => fold_binary(*op, l, r, expr.span).map(Some),
                _ => Ok(None),
            }
        }
        _ => Ok(None),
    }
}

fn fold_binary(op: BinaryOp, l: i32, r: i32, span: Span) -> Result<i32, CompileError> {
    use BinaryOp::*;
    Ok(match op {
        Add => l.wrapping_add(r),
        Sub => l.wrapping_sub(r),
        Mul => l.wrapping_mul(r),
        Div => {
            if r == 0 {
                return Err(CompileError::semantic("division by zero in constant expression", span));
            }
            l.wrapping_div(r)
        }
        Mod => {
            if r == 0 {
                return Err(CompileError::semantic("modulus by zero in constant expression", span));
            }
            l.wrapping_rem(r)
        }
        Eq => i32::from(l == r),
        Ne => i32::from(l != r),
        Lt => i32::from(l < r),
        Gt => i32::from(l > r),
        Le => i32::from(l <= r),
        Ge => i32::from(l >= r),
        And => i32::from(l != 0 && r != 0),
        Or => i32::from(l != 0 || r != 0),
    })
}

/// A looser check used for global initializers, which may be `float`-
/// (or other non-`int`-) typed and so cannot go through [`fold`]: true
/// iff the expression tree contains nothing but literals, enum
/// constants, and `+`/`-`/`!`/binary operators over those.
pub fn is_constant_expr(expr: &Node<Expr>) -> bool {
    match &expr.node.kind {
        ExprKind::Integer(_)
        | ExprKind::Decimal(_)
        | ExprKind::Character(_)
        | ExprKind::String(_)
        | ExprKind::Bool(_)
        | ExprKind::NullPtr => true,
        ExprKind::Identifier { symbol, .. } => {
            symbol.borrow().as_ref().is_some_and(|s| s.kind == SymbolKind::Const)
        }
        ExprKind::Unary { op, operand } => {
            matches!(op, UnaryOp::Plus | UnaryOp::Minus | UnaryOp::Not) && is_constant_expr(operand)
        }
        ExprKind::Binary { left, right, .. } => is_constant_expr(left) && is_constant_expr(right),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cminor_ast::ast::Expr as AstExpr;

    fn int(n: &str) -> Node<AstExpr> {
        Node::new(AstExpr::new(ExprKind::Integer(n.to_string())), Span::none())
    }

    fn binary(op: BinaryOp, l: Node<AstExpr>, r: Node<AstExpr>) -> Node<AstExpr> {
        Node::new(
            AstExpr::new(ExprKind::Binary { op, left: Box::new(l), right: Box::new(r) }),
            Span::none(),
        )
    }

    #[test]
    fn folds_arithmetic() {
        let e = binary(BinaryOp::Add, int("2"), binary(BinaryOp::Mul, int("3"), int("4")));
        assert_eq!(fold(&e).unwrap(), Some(14));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let e = binary(BinaryOp::Div, int("1"), int("0"));
        assert!(fold(&e).is_err());
    }

    #[test]
    fn truncates_toward_zero() {
        let e = binary(BinaryOp::Div, int("-7"), int("2"));
        assert_eq!(fold(&e).unwrap(), Some(-3));
    }

    #[test]
    fn idempotent() {
        let e = binary(BinaryOp::Add, int("1"), int("1"));
        assert_eq!(fold(&e).unwrap(), fold(&e).unwrap());
    }
}
