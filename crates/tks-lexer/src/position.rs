use std::rc::Rc;

/// A cursor into a source text.
///
/// `index` and `column` are 0-based character offsets, `line` is 0-based.
/// Every position keeps a handle on the source name and the full text so an
/// error can always render an excerpt from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub index: usize,
    pub line: usize,
    pub column: usize,
    pub filename: Rc<str>,
    pub text: Rc<str>,
}

impl Position {
    /// Position of the first character of `text`.
    pub fn start(filename: &str, text: &str) -> Self {
        Self {
            index: 0,
            line: 0,
            column: 0,
            filename: Rc::from(filename),
            text: Rc::from(text),
        }
    }

    /// Step past `current`. Leaving a newline moves to the next line.
    pub fn advance(&mut self, current: char) -> &mut Self {
        self.index += 1;
        if current == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        self
    }

    /// Line number as shown to users.
    pub fn display_line(&self) -> usize {
        self.line + 1
    }
}

/// Half-open range `[start, end)` of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Zero-width span at `at`.
    pub fn empty(at: Position) -> Self {
        Self {
            end: at.clone(),
            start: at,
        }
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Self {
        Self {
            start: self.start.clone(),
            end: other.end.clone(),
        }
    }

    /// The source text this span covers.
    pub fn slice(&self) -> String {
        self.start
            .text
            .chars()
            .skip(self.start.index)
            .take(self.end.index.saturating_sub(self.start.index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_within_line() {
        let mut pos = Position::start("t", "ab");
        pos.advance('a');
        assert_eq!((pos.index, pos.line, pos.column), (1, 0, 1));
    }

    #[test]
    fn test_advance_past_newline() {
        let mut pos = Position::start("t", "a\nb");
        pos.advance('a').advance('\n');
        assert_eq!((pos.index, pos.line, pos.column), (2, 1, 0));
        assert_eq!(pos.display_line(), 2);
    }

    #[test]
    fn test_slice() {
        let mut start = Position::start("t", "1 + 22");
        for c in "1 + ".chars() {
            start.advance(c);
        }
        let mut end = start.clone();
        end.advance('2').advance('2');
        assert_eq!(Span::new(start, end).slice(), "22");
    }

    #[test]
    fn test_empty_span_slice() {
        let pos = Position::start("t", "abc");
        assert_eq!(Span::empty(pos).slice(), "");
    }
}
