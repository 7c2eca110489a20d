//! TkSystem Lexer
//!
//! Tokenizes property expressions from `.tk` widget files into a flat stream
//! of tokens. Every token carries a [`Span`] of [`Position`]s so later stages
//! can point back into the source when something goes wrong.
//!
//! # Example
//!
//! ```
//! use tks_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize("<TkSystem>", "1 + 2").unwrap();
//! assert_eq!(tokens[1].kind, TokenKind::Plus);
//! assert_eq!(tokens.last().unwrap().kind, TokenKind::Eof);
//! ```

pub mod diagnostic;
pub mod position;
pub mod scanner;
pub mod token;

use std::fmt;

pub use position::{Position, Span};
pub use scanner::Scanner;
pub use token::{Token, TokenKind};

/// What went wrong while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexerErrorKind {
    /// A character that starts no token.
    IllegalCharacter,
    /// End of input inside a quoted string.
    UnterminatedString,
    /// `!` or `=` not followed by `=`.
    ExpectedOperator,
}

impl LexerErrorKind {
    /// Heading used when the error is rendered for users.
    pub fn title(self) -> &'static str {
        match self {
            Self::IllegalCharacter => "Illegal Character",
            Self::UnterminatedString | Self::ExpectedOperator => "Invalid Syntax",
        }
    }
}

impl fmt::Display for LexerErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Lexer error with the span of the offending text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {details}")]
pub struct LexerError {
    pub kind: LexerErrorKind,
    pub details: String,
    pub span: Span,
}

impl LexerError {
    /// Full report: heading, file and line, then the underlined excerpt.
    pub fn render(&self, row: Option<usize>) -> String {
        diagnostic::report(self.kind.title(), &self.details, &self.span, row)
    }
}
