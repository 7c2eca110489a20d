use crate::position::{Position, Span};
use crate::token::{Token, TokenKind};
use crate::{LexerError, LexerErrorKind};

/// Property expression scanner.
///
/// Tokenizes one expression string. Follows the same shape as the `.tk`
/// document scanner:
/// - `Vec<char>` source for index-based navigation
/// - a [`Position`] cursor advanced one character at a time
/// - position tracking on every token
pub struct Scanner {
    chars: Vec<char>,
    pos: Position,
    tokens: Vec<Token>,
}

impl Scanner {
    /// Create a new scanner for `source`, reported under `filename`.
    pub fn new(filename: &str, source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: Position::start(filename, source),
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source into a vector of tokens ending in `Eof`.
    pub fn tokenize(filename: &str, source: &str) -> Result<Vec<Token>, LexerError> {
        let mut scanner = Scanner::new(filename, source);
        scanner.scan_tokens()?;
        Ok(scanner.tokens)
    }

    fn scan_tokens(&mut self) -> Result<(), LexerError> {
        while !self.is_at_end() {
            self.scan_token()?;
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, Span::empty(self.pos.clone())));
        Ok(())
    }

    fn scan_token(&mut self) -> Result<(), LexerError> {
        let ch = self.peek();

        if let Some(kind) = TokenKind::single(ch) {
            let start = self.pos.clone();
            self.advance();
            self.push(kind, start);
            return Ok(());
        }

        match ch {
            ' ' | '\t' | '\n' | '\r' => {
                self.advance();
                Ok(())
            }

            '0'..='9' => {
                self.scan_number();
                Ok(())
            }

            c if c.is_ascii_alphabetic() || c == '_' => {
                self.scan_identifier();
                Ok(())
            }

            '<' | '>' | '=' | '!' | '-' => self.scan_operator(),

            '"' | '\'' => self.scan_string(),

            '#' => {
                self.skip_comment();
                Ok(())
            }

            '.' => {
                let start = self.pos.clone();
                self.advance();
                self.push(TokenKind::Dot, start);
                Ok(())
            }

            _ => {
                let start = self.pos.clone();
                self.advance();
                Err(self.error(LexerErrorKind::IllegalCharacter, format!("'{ch}'"), start))
            }
        }
    }

    // --- Scanners ---

    /// Scan a number literal. A second `.` ends the literal instead of failing,
    /// so `1.2.3` is `1.2`, `.`, `3`.
    fn scan_number(&mut self) {
        let start = self.pos.clone();
        let mut text = String::new();
        let mut seen_dot = false;

        while !self.is_at_end() && (self.peek().is_ascii_digit() || self.peek() == '.') {
            if self.peek() == '.' {
                if seen_dot {
                    break;
                }
                seen_dot = true;
            }
            text.push(self.peek());
            self.advance();
        }

        // Digits and at most one dot always parse as f64; i64 can overflow.
        let float = text.parse::<f64>().unwrap_or(f64::INFINITY);
        let kind = if seen_dot {
            TokenKind::Float(float)
        } else {
            text.parse::<i64>()
                .map_or(TokenKind::Float(float), TokenKind::Int)
        };
        self.push(kind, start);
    }

    /// Scan an identifier or keyword.
    fn scan_identifier(&mut self) {
        let start = self.pos.clone();
        let mut ident = String::new();

        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == '_') {
            ident.push(self.peek());
            self.advance();
        }

        let kind = TokenKind::keyword(&ident).unwrap_or(TokenKind::Identifier(ident));
        self.push(kind, start);
    }

    /// Scan a comparison operator, `-` or `->`, taking the longest match.
    fn scan_operator(&mut self) -> Result<(), LexerError> {
        let start = self.pos.clone();
        let first = self.peek();
        self.advance();

        let next = self.peek();
        let kind = match (first, next) {
            ('-', '>') => Some(TokenKind::Arrow),
            ('<', '=') => Some(TokenKind::Lte),
            ('>', '=') => Some(TokenKind::Gte),
            ('=', '=') => Some(TokenKind::Eq),
            ('!', '=') => Some(TokenKind::Ne),
            _ => None,
        };

        let kind = match kind {
            Some(kind) => {
                self.advance();
                kind
            }
            None => match first {
                '-' => TokenKind::Minus,
                '<' => TokenKind::Lt,
                '>' => TokenKind::Gt,
                _ => {
                    return Err(self.error(
                        LexerErrorKind::ExpectedOperator,
                        format!("Expected '{first}='"),
                        start,
                    ));
                }
            },
        };

        self.push(kind, start);
        Ok(())
    }

    /// Scan a quoted string. `\n` and `\t` translate; any other escaped
    /// character is taken literally, including the quote itself.
    fn scan_string(&mut self) -> Result<(), LexerError> {
        let quote = self.peek();
        let start = self.pos.clone();
        self.advance(); // consume opening quote

        let mut value = String::new();

        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == '\\' {
                self.advance(); // consume backslash
                if self.is_at_end() {
                    break;
                }
                match self.peek() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    c => value.push(c),
                }
            } else {
                value.push(self.peek());
            }
            self.advance();
        }

        if self.is_at_end() {
            return Err(self.error(
                LexerErrorKind::UnterminatedString,
                format!("Expected {quote}"),
                start,
            ));
        }

        self.advance(); // consume closing quote
        self.push(TokenKind::String(value), start);
        Ok(())
    }

    /// `#` swallows the rest of the input, newlines included.
    fn skip_comment(&mut self) {
        while !self.is_at_end() {
            self.advance();
        }
    }

    // --- Helpers ---

    fn push(&mut self, kind: TokenKind, start: Position) {
        let span = Span::new(start, self.pos.clone());
        self.tokens.push(Token::new(kind, span));
    }

    fn peek(&self) -> char {
        self.chars.get(self.pos.index).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if let Some(&c) = self.chars.get(self.pos.index) {
            self.pos.advance(c);
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos.index >= self.chars.len()
    }

    fn error(&self, kind: LexerErrorKind, details: String, start: Position) -> LexerError {
        LexerError {
            kind,
            details,
            span: Span::new(start, self.pos.clone()),
        }
    }
}
