//! Lexer, LALR(1) parser and abstract syntax tree for the cminor language.
//!
//! The pipeline this crate covers is: source text → [`token::Tok`] stream
//! (via `logos`) → concrete parse via the `lalrpop`-generated `grammar`
//! module → [`ast::Program`]. Declarator-suffix merging, punctuation
//! discarding and span stamping all happen inside the grammar's actions,
//! which call into [`builder`] so the rewrite logic is readable outside
//! the generated parser.

pub mod ast;
pub mod builder;
pub mod error;
pub mod lexer;
pub mod literal;
pub mod span;
pub mod symbol;
pub mod token;
pub mod types;

#[allow(clippy::all)]
mod grammar {
    include!(concat!(env!("OUT_DIR"), "/grammar.rs"));
}

use error::SyntaxError;
use lexer::Lexer;
use token::LineIndex;

/// Lex and parse a complete translation unit.
///
/// This is the crate's single public entry point: callers never touch
/// `grammar` or `lexer` directly.
pub fn parse(source: &str) -> Result<ast::Program, CminorParseError> {
    let line_index = LineIndex::new(source);
    let lexer = Lexer::new(source, &line_index);
    grammar::ProgramParser::new()
        .parse(&line_index, lexer)
        .map_err(|e| to_syntax_error(e, &line_index))
}

#[derive(Debug, thiserror::Error)]
pub enum CminorParseError {
    #[error(transparent)]
    Lexical(#[from] error::LexicalError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

type LalrpopError = lalrpop_util::ParseError<usize, token::Tok, error::LexicalError>;

fn to_syntax_error(e: LalrpopError, li: &LineIndex) -> CminorParseError {
    use lalrpop_util::ParseError::*;
    match e {
        User { error } => CminorParseError::Lexical(error),
        InvalidToken { location } => {
            let (line, column) = li.resolve(location as u32);
            CminorParseError::Syntax(SyntaxError {
                message: "invalid token".to_string(),
                line,
                column,
            })
        }
        UnrecognizedEof { location, expected } => {
            let (line, column) = li.resolve(location as u32);
            CminorParseError::Syntax(SyntaxError {
                message: format!("unexpected end of input, expected one of {}", expected.join(", ")),
                line,
                column,
            })
        }
        UnrecognizedToken { token: (l, tok, _), expected } => {
            let (line, column) = li.resolve(l as u32);
            CminorParseError::Syntax(SyntaxError {
                message: format!("unexpected token {tok:?}, expected one of {}", expected.join(", ")),
                line,
                column,
            })
        }
        ExtraToken { token: (l, tok, _) } => {
            let (line, column) = li.resolve(l as u32);
            CminorParseError::Syntax(SyntaxError {
                message: format!("extra token {tok:?}"),
                line,
                column,
            })
        }
    }
}
