//! Free functions the grammar's actions call into.
//!
//! Keeping the rewrite logic here (rather than inline in `grammar.lalrpop`)
//! is what "a subsequent rewrite pass produces the AST" means in practice:
//! the grammar only shapes the parse, these functions merge declarator
//! suffixes, collapse the generic `Declaration` shape into the concrete
//! `ExternalDecl`/`Declaration` variant, and stamp `Span`s from the
//! left-most token offset the grammar captured with `@L`.

use std::cell::{Cell, RefCell};

use crate::ast::*;
use crate::span::{Node, Span};
use crate::token::LineIndex;

pub fn span_at(li: &LineIndex, offset: usize) -> Span {
    let (line, column) = li.resolve(offset as u32);
    Span::new(line, column)
}

pub fn identifier(name: String) -> Identifier {
    Identifier { name }
}

pub fn declarator(
    pointer: bool,
    name: Node<Identifier>,
    suffix: Vec<Suffix>,
    init: Option<Node<Initializer>>,
) -> Declarator {
    Declarator {
        name,
        pointer,
        suffix,
        init,
        ctype: RefCell::new(None),
        symbol: RefCell::new(None),
    }
}

pub fn expr(kind: ExprKind) -> Expr {
    Expr::new(kind)
}

pub fn identifier_expr(name: String) -> ExprKind {
    ExprKind::Identifier {
        name,
        symbol: RefCell::new(None),
    }
}

pub fn member_access(object: Box<Node<Expr>>, member: Node<Identifier>, arrow: bool) -> ExprKind {
    ExprKind::MemberAccess {
        object,
        member,
        arrow,
        index: Cell::new(None),
    }
}

pub fn expr_list(exprs: Vec<Node<Expr>>) -> ExprList {
    ExprList {
        exprs,
        ctype: RefCell::new(None),
    }
}

/// A function definition always has exactly one declarator and no
/// initializer; the grammar enforces the shape, this just wraps it.
pub fn function_definition(
    spec: Node<Specifier>,
    decl: Node<Declarator>,
    body: Node<Block>,
) -> ExternalDecl {
    ExternalDecl::Function(FunctionDefinition {
        spec,
        decl,
        body,
        ctype: RefCell::new(None),
    })
}

pub fn compound_definition(
    is_union: bool,
    name: Node<Identifier>,
    members: Vec<Node<Member>>,
) -> CompoundDefinition {
    CompoundDefinition {
        is_union,
        name,
        members,
    }
}

pub fn enum_definition(name: Node<Identifier>, enumerators: Vec<Node<Enumerator>>) -> EnumDefinition {
    EnumDefinition { name, enumerators }
}

/// Does this declarator's *outer* (last-written) suffix make it a
/// function? `int *f(int)` is a function returning `int*`; `int (*a)[3]`
/// (parenthesized declarators) is out of scope, so the outer suffix of
/// the flat `Suffix` list is always the deciding one.
fn is_function_declarator(decl: &Declarator) -> bool {
    matches!(decl.suffix.last(), Some(Suffix::Param(_)))
}

fn is_array_declarator(decl: &Declarator) -> bool {
    decl.suffix.iter().any(|s| matches!(s, Suffix::Array(_)))
}

/// Collapses a `Specifier` + declarator-list external declaration into
/// the concrete `ExternalDecl` variant, classifying on the shape of the
/// *first* declarator (this language does not mix function and
/// non-function declarators in one declaration, so that is sufficient).
pub fn classify_external_decl(spec: Node<Specifier>, decls: Vec<Node<Declarator>>) -> ExternalDecl {
    let first = &decls[0].node;
    if is_function_declarator(first) {
        ExternalDecl::FuncDecl(FunctionDeclaration { spec, decls })
    } else if is_array_declarator(first) {
        ExternalDecl::ArrDecl(ArrayDeclaration { spec, decls })
    } else {
        ExternalDecl::VarDecl(VariableDeclaration { spec, decls })
    }
}

/// Same classification, for declarations nested inside a block.
pub fn classify_block_decl(spec: Node<Specifier>, decls: Vec<Node<Declarator>>) -> Declaration {
    let first = &decls[0].node;
    if is_function_declarator(first) {
        Declaration::Func(FunctionDeclaration { spec, decls })
    } else if is_array_declarator(first) {
        Declaration::Arr(ArrayDeclaration { spec, decls })
    } else {
        Declaration::Var(VariableDeclaration { spec, decls })
    }
}

pub fn binary(op: BinaryOp, left: Node<Expr>, right: Node<Expr>, span: Span) -> Node<Expr> {
    Node::new(
        Expr::new(ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }),
        span,
    )
}

pub fn unary(op: UnaryOp, operand: Node<Expr>, span: Span) -> Node<Expr> {
    Node::new(
        Expr::new(ExprKind::Unary {
            op,
            operand: Box::new(operand),
        }),
        span,
    )
}

pub fn postfix(op: PostfixOp, operand: Node<Expr>, span: Span) -> Node<Expr> {
    Node::new(
        Expr::new(ExprKind::Postfix {
            op,
            operand: Box::new(operand),
        }),
        span,
    )
}

pub fn assign(op: AssignOp, left: Node<Expr>, right: Node<Expr>, span: Span) -> Node<Expr> {
    Node::new(
        Expr::new(ExprKind::Assign {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }),
        span,
    )
}

pub fn call(func: Node<Expr>, args: Vec<Node<Expr>>, span: Span) -> Node<Expr> {
    Node::new(
        Expr::new(ExprKind::Call {
            func: Box::new(func),
            args,
        }),
        span,
    )
}

pub fn array_access(array: Node<Expr>, index: Node<Expr>, span: Span) -> Node<Expr> {
    Node::new(
        Expr::new(ExprKind::ArrayAccess {
            array: Box::new(array),
            index: Box::new(index),
        }),
        span,
    )
}
