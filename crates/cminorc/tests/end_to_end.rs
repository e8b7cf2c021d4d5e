//! Drives `analyze` and `codegen` together, including the JIT-executed
//! end-to-end scenarios and the documented boundary-behavior errors,
//! asserting each is raised with the right `(line, column)`.

use inkwell::context::Context;
use inkwell::targets::{InitializationConfig, Target};
use inkwell::OptimizationLevel;

use cminorc::CompileError;

/// Compiles `source` and JIT-executes its `main`, returning the exit value
/// the way an executable produced via the external toolchain would.
fn run(source: &str) -> i32 {
    Target::initialize_native(&InitializationConfig::default()).expect("failed to initialize native target");
    let context = Context::create();
    let module = cminorc::compile(&context, "test", source, true).unwrap_or_else(|e| panic!("compile failed: {e}"));
    let ee = module
        .create_jit_execution_engine(OptimizationLevel::None)
        .expect("failed to create JIT execution engine");
    unsafe {
        let main = ee
            .get_function::<unsafe extern "C" fn() -> i32>("main")
            .expect("module has no `main`");
        main.call()
    }
}

fn compile_err(source: &str) -> CompileError {
    let context = Context::create();
    cminorc::compile(&context, "test", source, true).expect_err("expected compilation to fail")
}

// --- End-to-end scenarios (spec §8) -------------------------------------

#[test]
fn returns_zero() {
    assert_eq!(run("int main(){return 0;}"), 0);
}

#[test]
fn adds_two_locals() {
    assert_eq!(run("int main(){int a=3,b=4;return a+b;}"), 7);
}

#[test]
fn recursive_fibonacci() {
    let src = "int f(int n){if(n<=1)return n;return f(n-1)+f(n-2);} int main(){return f(10);}";
    assert_eq!(run(src), 55);
}

#[test]
fn array_initializer_and_for_loop() {
    let src = "int main(){int a[3]={1,2,3};int s=0;for(int i=0;i<3;i=i+1)s=s+a[i];return s;}";
    assert_eq!(run(src), 6);
}

#[test]
fn struct_member_access() {
    let src = "struct P{int x;int y;}; int main(){struct P p; p.x=2; p.y=3; return p.x*p.y;}";
    assert_eq!(run(src), 6);
}

#[test]
fn pointer_dereference_and_store() {
    let src = "int main(){int x=5;int *p=&x;*p=*p+10;return x;}";
    assert_eq!(run(src), 15);
}

#[test]
fn enum_with_explicit_value_and_continuation() {
    let src = "enum E{A,B=5,C}; int main(){return C;}";
    assert_eq!(run(src), 6);
}

#[test]
fn compound_assignment() {
    let src = "int main(){int x=1; x+=2; return x;}";
    assert_eq!(run(src), 3);
}

#[test]
fn while_loop_sums_to_ten() {
    let src = "int main(){int i=0;int s=0;while(i<5){s=s+i;i=i+1;}return s;}";
    assert_eq!(run(src), 10);
}

#[test]
fn short_circuit_and_skips_rhs_side_effect() {
    // The right-hand side increments `calls`; `&&`'s left side is false so
    // it must never run, leaving `calls` at 0.
    let src = "int calls; int bump(){calls=calls+1;return 1;} \
               int main(){calls=0; int r = 0 && bump(); return calls + r;}";
    assert_eq!(run(src), 0);
}

#[test]
fn union_layout_round_trips_through_largest_member() {
    let src = "union U{int i;char c;}; int main(){union U u; u.i=65; return u.i;}";
    assert_eq!(run(src), 65);
}

#[test]
fn string_literal_initializes_a_char_array() {
    let src = "int main(){char buf[6]=\"hello\"; if(buf[0]=='h' && buf[4]=='o') return 1; return 0;}";
    assert_eq!(run(src), 1);
}

#[test]
fn two_runs_produce_byte_identical_ir() {
    let src = "int main(){int a=3,b=4;return a+b;}";
    let c1 = Context::create();
    let m1 = cminorc::compile(&c1, "test", src, true).unwrap();
    let c2 = Context::create();
    let m2 = cminorc::compile(&c2, "test", src, true).unwrap();
    assert_eq!(m1.print_to_string().to_string(), m2.print_to_string().to_string());
}

// --- Boundary behaviors (spec §8) ---------------------------------------

#[test]
fn division_by_zero_in_constant_expression_is_an_error() {
    let err = compile_err("int a[1/0]; int main(){return 0;}");
    assert!(matches!(err, CompileError::Semantic { .. }));
}

#[test]
fn array_without_size_or_initializer_is_an_error() {
    let err = compile_err("int main(){int a[]; return 0;}");
    assert!(matches!(err, CompileError::Semantic { .. }));
}

#[test]
fn assignment_to_enum_constant_is_an_error() {
    let err = compile_err("enum E{A,B}; int main(){A = 1; return 0;}");
    assert!(matches!(err, CompileError::Semantic { .. }));
}

#[test]
fn break_outside_loop_is_an_error() {
    let err = compile_err("int main(){break; return 0;}");
    assert!(matches!(err, CompileError::Semantic { .. }));
}

#[test]
fn continue_outside_loop_is_an_error() {
    let err = compile_err("int main(){continue; return 0;}");
    assert!(matches!(err, CompileError::Semantic { .. }));
}

#[test]
fn return_with_value_in_void_function_is_an_error() {
    let err = compile_err("void f(){return 1;} int main(){return 0;}");
    assert!(matches!(err, CompileError::Semantic { .. }));
}

#[test]
fn return_without_value_in_non_void_function_is_an_error() {
    let err = compile_err("int f(){return;} int main(){return 0;}");
    assert!(matches!(err, CompileError::Semantic { .. }));
}

#[test]
fn duplicate_function_definition_is_an_error() {
    let err = compile_err("int f(){return 0;} int f(){return 1;} int main(){return 0;}");
    assert!(matches!(err, CompileError::Semantic { .. }));
}

#[test]
fn prototype_definition_signature_mismatch_is_an_error() {
    let err = compile_err("int f(int); float f(int n){return 0;} int main(){return 0;}");
    assert!(matches!(err, CompileError::Semantic { .. }));
}

#[test]
fn error_message_matches_the_documented_wire_format() {
    let err = compile_err("int main(){break; return 0;}");
    let text = err.to_string();
    assert!(text.starts_with("SemanticError("), "got: {text}");
}
