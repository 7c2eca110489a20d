//! TkSystem Parser
//!
//! Parses the token stream of one property expression into a single
//! [`Node`] tree. Recursive descent, one function per precedence level,
//! no error recovery: the first syntax error ends the parse.
//!
//! ```
//! use tks_lexer::Scanner;
//! use tks_parser::{NodeKind, Parser};
//!
//! let tokens = Scanner::tokenize("<TkSystem>", "1 + 2 * 3").unwrap();
//! let node = Parser::parse(tokens).unwrap();
//! assert!(matches!(node.kind, NodeKind::BinOp { .. }));
//! ```

pub mod ast;
pub mod parser;

pub use ast::{BinaryOp, FuncDef, Name, Node, NodeKind, NumberLit, UnaryOp};
pub use parser::Parser;

use tks_lexer::Span;

/// Parser error with the span of the offending token.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Invalid Syntax: {details}")]
pub struct ParseError {
    pub details: String,
    pub span: Span,
}

impl ParseError {
    /// Full report: heading, file and line, then the underlined excerpt.
    pub fn render(&self, row: Option<usize>) -> String {
        tks_lexer::diagnostic::report("Invalid Syntax", &self.details, &self.span, row)
    }
}
