//! Adapts the `logos`-generated scanner to `lalrpop_util`'s external-lexer
//! interface: an iterator of `Result<(start, Tok, end), LexicalError>`.

use logos::Logos;

use crate::error::LexicalError;
use crate::token::{LineIndex, Tok};

pub struct Lexer<'input> {
    inner: logos::Lexer<'input, Tok>,
    line_index: &'input LineIndex,
}

impl<'input> Lexer<'input> {
    pub fn new(source: &'input str, line_index: &'input LineIndex) -> Self {
        Lexer {
            inner: Tok::lexer(source),
            line_index,
        }
    }
}

pub type Spanned = Result<(usize, Tok, usize), LexicalError>;

impl<'input> Iterator for Lexer<'input> {
    type Item = Spanned;

    fn next(&mut self) -> Option<Self::Item> {
        let tok = self.inner.next()?;
        let span = self.inner.span();
        match tok {
            Ok(tok) => Some(Ok((span.start, tok, span.end))),
            Err(()) => {
                let (line, column) = self.line_index.resolve(span.start as u32);
                Some(Err(LexicalError {
                    message: format!("unrecognized character {:?}", self.inner.slice()),
                    line,
                    column,
                }))
            }
        }
    }
}
