//! The single public error type this crate's pipeline returns.
//!
//! `CompileError` wraps all three user-visible diagnostic kinds behind one
//! `Display` impl that reproduces `<ClassName>(<line>, <column>): <message>`
//! verbatim for each. Internal contract violations (a missing `ctype`
//! slot, a `Compound` reaching lowering with no members, IR verification
//! failure on code this crate generated) are programmer errors and are
//! raised with `unreachable!`, never as a `CompileError` variant.

use cminor_ast::error::{LexicalError, SyntaxError};

#[derive(Debug, Clone, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Lexical(#[from] LexicalError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("SemanticError({line}, {column}): {message}")]
    Semantic {
        message: String,
        line: u32,
        column: u32,
    },
}

impl CompileError {
    pub fn semantic(message: impl Into<String>, span: cminor_ast::span::Span) -> Self {
        CompileError::Semantic {
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }
}

impl From<cminor_ast::CminorParseError> for CompileError {
    fn from(e: cminor_ast::CminorParseError) -> Self {
        match e {
            cminor_ast::CminorParseError::Lexical(e) => CompileError::Lexical(e),
            cminor_ast::CminorParseError::Syntax(e) => CompileError::Syntax(e),
        }
    }
}
