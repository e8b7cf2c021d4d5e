//! Drives the lexer and parser against source snippets and asserts on the
//! resulting AST shape, and on `LexicalError`/`SyntaxError` positions.

use cminor_ast::ast::{ExternalDecl, Stmt};
use cminor_ast::CminorParseError;

fn parse_ok(src: &str) -> cminor_ast::ast::Program {
    cminor_ast::parse(src).unwrap_or_else(|e| panic!("expected successful parse, got {e}"))
}

#[test]
fn empty_program_parses() {
    let program = parse_ok("");
    assert!(program.decls.is_empty());
}

#[test]
fn function_definition_shape() {
    let program = parse_ok("int main(){return 0;}");
    assert_eq!(program.decls.len(), 1);
    match &program.decls[0].node {
        ExternalDecl::Function(f) => {
            assert_eq!(f.decl.node.name.node.name, "main");
            assert_eq!(f.body.node.items.len(), 1);
        }
        other => panic!("expected a function definition, got {other:?}"),
    }
}

#[test]
fn declarator_suffixes_merge_right_to_left() {
    // `int *p[4]` is "array-of-4 pointer-to-int": the declarator carries
    // both suffixes in source order, left for the analyzer to fold
    // right-to-left when it builds the effective type.
    let program = parse_ok("int *p[4];");
    match &program.decls[0].node {
        ExternalDecl::ArrDecl(d) => {
            let decl = &d.decls[0].node;
            assert!(decl.pointer);
            assert_eq!(decl.suffix.len(), 1);
        }
        other => panic!("expected an array declaration, got {other:?}"),
    }
}

#[test]
fn struct_definition_collects_members() {
    let program = parse_ok("struct P { int x; int y; };");
    match &program.decls[0].node {
        ExternalDecl::Compound(c) => {
            assert!(!c.is_union);
            assert_eq!(c.name.node.name, "P");
            assert_eq!(c.members.len(), 2);
        }
        other => panic!("expected a struct definition, got {other:?}"),
    }
}

#[test]
fn enum_with_explicit_reset() {
    let program = parse_ok("enum E { A, B = 5, C };");
    match &program.decls[0].node {
        ExternalDecl::Enum(e) => {
            assert_eq!(e.enumerators.len(), 3);
            assert_eq!(e.enumerators[1].node.name.node.name, "B");
        }
        other => panic!("expected an enum definition, got {other:?}"),
    }
}

#[test]
fn dangling_else_binds_to_nearest_if() {
    let program = parse_ok("int main(){if(1) if(2) return 1; else return 2;}");
    let ExternalDecl::Function(f) = &program.decls[0].node else { panic!("expected function") };
    let cminor_ast::ast::BlockItem::Stmt(Stmt::If(outer)) = &f.body.node.items[0].node else {
        panic!("expected an if statement")
    };
    let Stmt::If(inner) = &outer.then.node else { panic!("expected a nested if") };
    assert!(inner.or_else.is_some(), "the else must bind to the inner if");
    assert!(outer.or_else.is_none());
}

#[test]
fn for_loop_with_empty_clauses() {
    let program = parse_ok("int main(){for(;;) break;}");
    let ExternalDecl::Function(f) = &program.decls[0].node else { panic!("expected function") };
    let cminor_ast::ast::BlockItem::Stmt(Stmt::For(f)) = &f.body.node.items[0].node else {
        panic!("expected a for statement")
    };
    assert!(f.init.is_none());
    assert!(f.cond.is_none());
    assert!(f.post.is_none());
}

#[test]
fn lexical_error_reports_position() {
    let err = cminor_ast::parse("int main(){ int x = 1 @ 2; }").unwrap_err();
    match err {
        CminorParseError::Lexical(e) => {
            assert_eq!(e.line, 1);
            assert_eq!(e.column, 23);
        }
        other => panic!("expected a lexical error, got {other}"),
    }
}

#[test]
fn syntax_error_reports_position() {
    let err = cminor_ast::parse("int main() { return }").unwrap_err();
    match err {
        CminorParseError::Syntax(e) => assert_eq!(e.line, 1),
        other => panic!("expected a syntax error, got {other}"),
    }
}

#[test]
fn member_access_and_arrow_both_parse() {
    let program = parse_ok("int main(){ p.x = 1; q->y = 2; }");
    let ExternalDecl::Function(f) = &program.decls[0].node else { panic!("expected function") };
    assert_eq!(f.body.node.items.len(), 2);
}
