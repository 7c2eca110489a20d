use std::fmt;

use crate::position::Span;

/// Token classification for property expressions.
///
/// Data-carrying variants embed their value directly (no separate `value` field on Token).
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals (carry data)
    Int(i64),
    Float(f64),
    String(String),
    Identifier(String),

    // Keywords
    And,
    Or,
    Not,
    Lambda,

    // Arithmetic
    Plus,
    Minus,
    Mul,
    Div,
    Power,

    // Comparison
    Lt,
    Gt,
    Lte,
    Gte,
    Eq,
    Ne,

    // Structure
    LParen,
    RParen,
    LSquare,
    RSquare,
    LCurly,
    RCurly,
    Comma,
    Colon,
    Dot,
    Arrow,

    // End of input
    Eof,
}

impl TokenKind {
    /// Keyword for `word`, if it is one.
    pub fn keyword(word: &str) -> Option<Self> {
        match word {
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            "lambda" => Some(Self::Lambda),
            _ => None,
        }
    }

    /// Single-character operators and punctuation.
    pub fn single(ch: char) -> Option<Self> {
        let kind = match ch {
            '+' => Self::Plus,
            '*' => Self::Mul,
            '/' => Self::Div,
            '^' => Self::Power,
            '(' => Self::LParen,
            ')' => Self::RParen,
            '[' => Self::LSquare,
            ']' => Self::RSquare,
            '{' => Self::LCurly,
            '}' => Self::RCurly,
            ',' => Self::Comma,
            ':' => Self::Colon,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "INT:{n}"),
            Self::Float(n) => write!(f, "FLOAT:{n:?}"),
            Self::String(s) => write!(f, "STRING:{s}"),
            Self::Identifier(name) => write!(f, "IDENTIFIER:{name}"),
            Self::And => f.write_str("KEYWORD:and"),
            Self::Or => f.write_str("KEYWORD:or"),
            Self::Not => f.write_str("KEYWORD:not"),
            Self::Lambda => f.write_str("KEYWORD:lambda"),
            Self::Plus => f.write_str("PLUS"),
            Self::Minus => f.write_str("MINUS"),
            Self::Mul => f.write_str("MUL"),
            Self::Div => f.write_str("DIV"),
            Self::Power => f.write_str("POWER"),
            Self::Lt => f.write_str("LT"),
            Self::Gt => f.write_str("GT"),
            Self::Lte => f.write_str("LTE"),
            Self::Gte => f.write_str("GTE"),
            Self::Eq => f.write_str("EQ"),
            Self::Ne => f.write_str("NE"),
            Self::LParen => f.write_str("LPAREN"),
            Self::RParen => f.write_str("RPAREN"),
            Self::LSquare => f.write_str("LSQUARE"),
            Self::RSquare => f.write_str("RSQUARE"),
            Self::LCurly => f.write_str("LCURLY"),
            Self::RCurly => f.write_str("RCURLY"),
            Self::Comma => f.write_str("COMMA"),
            Self::Colon => f.write_str("COLON"),
            Self::Dot => f.write_str("DOT"),
            Self::Arrow => f.write_str("ARROW"),
            Self::Eof => f.write_str("EOF"),
        }
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
