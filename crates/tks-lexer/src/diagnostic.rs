//! Source excerpts for error reports.
//!
//! ```text
//! Invalid Syntax: Expected ')'. File <TkSystem>, line 1
//!
//! (1 + 2
//!       ^
//! ```

use crate::position::Span;

/// Standard report for errors without a traceback.
///
/// `row` replaces the line number from the span; loaders pass the line of the
/// enclosing file because each expression is lexed on its own.
pub fn report(title: &str, details: &str, span: &Span, row: Option<usize>) -> String {
    let line = row.unwrap_or_else(|| span.start.display_line());
    format!(
        "{title}: {details}. File {}, line {line}\n\n{}",
        span.start.filename,
        excerpt(span)
    )
}

/// Lines covered by `span`, each followed by a line of `^` under the covered columns.
///
/// The first line is underlined from the start column, the last line up to the
/// end column, lines in between entirely. Tabs are dropped from the output.
pub fn excerpt(span: &Span) -> String {
    let lines: Vec<&str> = span.start.text.split('\n').collect();
    let first = span.start.line;
    let last = span.end.line.max(first);
    let mut out = Vec::new();

    for line_no in first..=last {
        let line = lines.get(line_no).copied().unwrap_or("");
        let len = line.chars().count();
        let col_start = if line_no == first { span.start.column } else { 0 };
        let col_end = if line_no == last { span.end.column } else { len };
        let width = if first == last && col_end <= col_start {
            1
        } else {
            col_end.saturating_sub(col_start)
        };

        out.push(line.replace('\t', ""));
        out.push(format!("{}{}", " ".repeat(col_start), "^".repeat(width)));
    }

    out.join("\n")
}
