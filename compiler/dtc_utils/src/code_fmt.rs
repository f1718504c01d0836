//! Utilities for formatting reprinted Python code in outputs

use std::fmt::Display;

/// Indent every non-empty line of `code` by `prefix`
///
/// Empty lines stay empty so that reprinted blocks do not carry trailing
/// whitespace.
#[must_use]
pub fn indent_lines(code: &str, prefix: &str) -> String {
    code.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Display every item of `items` and join the results with `separator`
#[must_use]
pub fn join_display<T: Display>(items: impl IntoIterator<Item = T>, separator: &str) -> String {
    items
        .into_iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indent_lines_prefixes_each_line() {
        assert_eq!(indent_lines("a = 1\n\nreturn a", "    "), "    a = 1\n\n    return a");
    }

    #[test]
    fn join_display_uses_separator() {
        assert_eq!(join_display([1, 2, 3], ", "), "1, 2, 3");
        assert_eq!(join_display(Vec::<u8>::new(), ", "), "");
    }
}
