//! Symbol resolution, type checking and LLVM IR lowering for the cminor
//! language.
//!
//! This crate picks up where [`cminor_ast::parse`] leaves off: [`analyze`]
//! resolves names against a scoped symbol table, infers and checks every
//! expression's type, and folds the constant expressions enum values and
//! array sizes need; [`irgen::codegen_to_module`] then lowers the
//! now-fully-typed tree to an `inkwell` [`Module`](inkwell::module::Module).
//! [`compile`] chains both steps for the common case of wanting one from
//! the other.

pub mod error;
pub mod irgen;
pub mod semantic;
pub mod symtab;

pub use error::CompileError;
pub use semantic::analyze;

use inkwell::context::Context;
use inkwell::module::Module;

/// Parses, analyzes and lowers one translation unit in one call.
///
/// `predeclare_io` controls whether `printf`/`scanf` get their variadic
/// declarations emitted up front (see [`irgen::Codegen::new`]).
pub fn compile<'ctx>(
    context: &'ctx Context,
    module_name: &str,
    source: &str,
    predeclare_io: bool,
) -> Result<Module<'ctx>, CompileError> {
    let program = cminor_ast::parse(source)?;
    log::debug!("parsed {} external declaration(s)", program.decls.len());
    analyze(&program)?;
    log::debug!("semantic analysis succeeded");
    let codegen = irgen::Codegen::new(context, module_name, predeclare_io);
    codegen.generate_program(&program);
    Ok(codegen.finish())
}
