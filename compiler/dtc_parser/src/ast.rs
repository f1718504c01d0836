//! Abstract Syntax Tree representation for Python source
//!
//! This module contains the AST representation emitted by the parser. Every
//! node carries the [`Span`](dtc_utils::span::Span) it was parsed from, and
//! every node prints back as Python through its [`Display`] implementation.

use std::fmt::Display;

use dtc_utils::code_fmt::join_display;

pub mod expr;
pub mod params;
pub mod stmt;

/// A complete Python module (its top-level statements, in order)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program(pub Vec<stmt::Stmt>);

impl Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", join_display(&self.0, "\n"))
    }
}

#[cfg(test)]
mod tests {
    use dtc_utils::span::SourceId;

    #[test]
    fn program_display_works() {
        let input = indoc::indoc! {"
            def main():
                return 42
            def helper(x):
                return (x) + (1)
        "};

        let expected = indoc::indoc! {"
            def main():
                return 42
            def helper(x):
                return (x + 1)"};

        let program = crate::parser::parse_program(input, SourceId::new(0))
            .expect("test case should have parsed correctly");

        assert_eq!(program.to_string(), expected);
    }
}
