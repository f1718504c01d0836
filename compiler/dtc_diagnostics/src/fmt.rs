//! Compact source window formatting for dtc diagnostics.

use ansi_term::Color;
use dtc_utils::span::Span;
use line_span::LineSpanExt;

use crate::Severity;

/// Format and display the 'source window' -- the lines of span within str with
/// the underline where the span lies.
///
/// Empty spans (such as an unexpected end of file) are underlined with a single
/// caret at their position.
pub fn display_source_window(severity: &Severity, span: Span, source: &str) -> String {
    // Widen empty spans by one byte so they intersect the line they sit on.
    let (start, end) = if span.start() == span.end() {
        (span.start(), span.end() + 1)
    } else {
        (span.start(), span.end())
    };

    // A line is displayed if its span (including the terminator) overlaps the
    // half-open range [start, end). For each one we keep the underlined range
    // relative to the line start.
    let lines = source
        .line_spans()
        .enumerate()
        .filter(|(_, line)| line.start() < end && start < line.ending().max(line.start() + 1))
        .map(|(n, line)| {
            let underline_start = start.max(line.start()) - line.start();
            let underline_end = end.min(line.end().max(underline_start + line.start() + 1))
                - line.start();
            (
                n + 1,
                &source[line.range()],
                (underline_start, underline_end.max(underline_start + 1)),
            )
        })
        .collect::<Vec<_>>();

    // How much padding goes on each line number?
    let max_line_number_length = lines
        .iter()
        .map(|(line, _, _)| line.to_string().len())
        .max()
        .unwrap_or(1)
        + 1;

    // Display format:
    // line | CODE CODE CODE CODE
    //      |      ^^^^
    lines
        .into_iter()
        .map(|(line_number, string, (start, end))| {
            format!(
                "{} {string}\n{} {} {}",
                Color::Blue
                    .bold()
                    .paint(format!("{line_number: >max_line_number_length$} |")),
                " ".repeat(max_line_number_length),
                Color::Blue.bold().paint("|"),
                severity
                    .style()
                    .paint(format!("{}{}", " ".repeat(start), "^".repeat(end - start)))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use dtc_utils::span::SourceId;

    use super::*;

    /// Strip the ANSI escapes from a rendered window
    fn plain(rendered: &str) -> String {
        let mut out = String::new();
        let mut in_escape = false;
        for c in rendered.chars() {
            match c {
                '\u{1b}' => in_escape = true,
                'm' if in_escape => in_escape = false,
                _ if in_escape => {}
                _ => out.push(c),
            }
        }
        out
    }

    /// Span in the entry unit
    fn span(start: usize, end: usize) -> Span {
        Span::from_positions_and_source(start, end, SourceId::new(0))
    }

    #[test]
    fn single_line_span_is_underlined() {
        let window = plain(&display_source_window(
            &Severity::Error,
            span(4, 7),
            "x = foo()\ny = 2\n",
        ));

        assert_eq!(window, " 1 | x = foo()\n   |     ^^^");
    }

    #[test]
    fn span_covering_two_lines_shows_both() {
        let window = plain(&display_source_window(
            &Severity::Error,
            span(4, 13),
            "x = [1,\n  2]\nz = 3\n",
        ));

        assert!(window.contains(" 1 | x = [1,"));
        assert!(window.contains(" 2 |   2]"));
        assert!(!window.contains("z = 3"));
    }

    #[test]
    fn empty_span_gets_one_caret() {
        let window = plain(&display_source_window(&Severity::Error, span(2, 2), "f(\n"));

        assert_eq!(window, " 1 | f(\n   |   ^");
    }
}
