//! The two user-visible error kinds produced before semantic analysis.
//!
//! Both carry `(message, line, column)` and format as
//! `<ClassName>(<line>, <column>): <message>`, matching the rest of the
//! pipeline's `CompileError` wire format.

#[derive(Debug, Clone, thiserror::Error)]
#[error("LexicalError({line}, {column}): {message}")]
pub struct LexicalError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("SyntaxError({line}, {column}): {message}")]
pub struct SyntaxError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}
