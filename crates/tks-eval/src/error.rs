//! Evaluation errors and how they are reported.
//!
//! Lexer and parser errors render as a heading plus an underlined excerpt.
//! Errors raised while evaluating also carry the [`Context`] they occurred
//! in, and render with a traceback of every active call above the heading.

use std::fmt;
use std::rc::Rc;

use tks_lexer::{diagnostic, LexerError, Span};
use tks_parser::ParseError;

use crate::context::Context;

/// What went wrong at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UndefinedName,
    IllegalOperation,
    DivisionByZero,
    Arity,
    NotCallable,
    RecursionLimit,
    /// A member chain step or attribute the host object does not provide.
    NoMember,
    /// A repetition too large to allocate.
    TooLarge,
    /// A built-in or host callable rejected its arguments.
    BadArgument,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("RunTimeError: {details}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub details: String,
    pub span: Span,
    pub context: Rc<Context>,
}

impl RuntimeError {
    pub fn new(
        kind: RuntimeErrorKind,
        details: impl Into<String>,
        span: Span,
        context: &Rc<Context>,
    ) -> Self {
        Self {
            kind,
            details: details.into(),
            span,
            context: Rc::clone(context),
        }
    }

    pub fn render(&self, row: Option<usize>) -> String {
        render_with_traceback("RunTimeError", &self.details, &self.span, &self.context, row)
    }
}

/// Which stage an [`Error`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntax,
    Runtime,
}

/// Any failure of [`evaluate`](crate::evaluate). Displays as the full
/// user-facing report.
#[derive(Debug, Clone)]
pub enum Error {
    Lexical(LexerError),
    Syntax(ParseError),
    Runtime(RuntimeError),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Lexical(_) => ErrorKind::Lexical,
            Self::Syntax(_) => ErrorKind::Syntax,
            Self::Runtime(_) => ErrorKind::Runtime,
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            Self::Lexical(e) => &e.span,
            Self::Syntax(e) => &e.span,
            Self::Runtime(e) => &e.span,
        }
    }

    pub fn details(&self) -> &str {
        match self {
            Self::Lexical(e) => &e.details,
            Self::Syntax(e) => &e.details,
            Self::Runtime(e) => &e.details,
        }
    }

    /// Full report. `row` replaces every line number shown, for callers
    /// that evaluate one line of a larger file at a time.
    pub fn render(&self, row: Option<usize>) -> String {
        match self {
            Self::Lexical(e) => e.render(row),
            Self::Syntax(e) => e.render(row),
            Self::Runtime(e) => e.render(row),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(None))
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Lexical(e) => Some(e),
            Self::Syntax(e) => Some(e),
            Self::Runtime(e) => Some(e),
        }
    }
}

impl From<LexerError> for Error {
    fn from(e: LexerError) -> Self {
        Self::Lexical(e)
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Self::Syntax(e)
    }
}

impl From<RuntimeError> for Error {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}

fn render_with_traceback(
    title: &str,
    details: &str,
    span: &Span,
    context: &Rc<Context>,
    row: Option<usize>,
) -> String {
    let mut out = traceback(span, context, row);
    out.push_str(&format!("{title}: {details}\n\n"));
    out.push_str(&diagnostic::excerpt(span));
    out
}

/// One `File ..., line ... in ...` line per active context, outermost first.
fn traceback(span: &Span, context: &Rc<Context>, row: Option<usize>) -> String {
    let mut frames = Vec::new();
    let mut pos = Some(&span.start);
    let mut ctx = Some(context.as_ref());
    while let Some(current) = ctx {
        if let Some(pos) = pos {
            let line = row.unwrap_or_else(|| pos.display_line());
            frames.push(format!(
                "  File {}, line {} in {}\n",
                pos.filename, line, current.name
            ));
        }
        pos = current.parent_pos.as_ref();
        ctx = current.parent.as_deref();
    }
    frames.reverse();
    format!("Traceback (most recent call last): \n{}", frames.concat())
}
