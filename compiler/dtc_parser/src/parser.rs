//! Parsing and parser errors
//!
//! This module contains thin wrappers around the
//! [hand-written parser](crate::python_parser) for Python, converting its
//! errors into [`Diagnostic`]s.
//!
//! In most cases, you will be using the [`parse_program`] function to parse
//! some input code. In some more specific situations, you may need to use
//! [`parse_expr`] to parse a singular expression.
//!
//! # Error handling
//! The parser returns a [`Result`] that either yields the parsed
//! [AST](super::ast) or the [`Diagnostic`] for the first lexical or syntax
//! error in the input.
//!
//! # Example
//! For more examples, read the documentation for the corresponding parser
//! function.
//! ```
//! use dtc_parser::parser::parse_program;
//! use dtc_utils::span::SourceId;
//! let ast = parse_program("def main():\n    pass\n", SourceId::new(0));
//! ```

use dtc_diagnostics::{Diagnostic, DiagnosticKind, SpanExt, SpannedExt};
use dtc_utils::span::SourceId;

use crate::{
    ast::{expr::Expr, Program},
    lexer::LexicalError,
    python_parser::{ParseError, PythonParser},
};

/// Converts from a [`ParseError`] to a corresponding [`Diagnostic`].
pub(crate) fn parser_error_to_diagnostic(error: ParseError<'_>) -> Diagnostic {
    match error {
        ParseError::UnexpectedEof { at, expected } => {
            at.error(DiagnosticKind::UnexpectedEof(expected))
        }

        ParseError::UnexpectedToken { found, expected } => {
            found.error(|found| DiagnosticKind::UnrecognizedToken(found, expected))
        }

        ParseError::InvalidAssignmentTarget(target) => {
            target.error(DiagnosticKind::InvalidAssignmentTarget)
        }

        ParseError::LexicalError(error) => error.error(|error| match error {
            LexicalError::UnknownToken(token) => DiagnosticKind::UnknownToken(token.to_string()),
            LexicalError::UnterminatedStringLiteral => DiagnosticKind::UnterminatedStringLiteral,
            LexicalError::InconsistentDedent => DiagnosticKind::InconsistentDedent,
        }),
    }
}

/// Parses a Python module, yielding its [`Program`].
///
/// This function runs an **entire module** through the parser and returns
/// either a complete [AST](super::ast) consisting of the module's top-level
/// statements, or the [`Diagnostic`] for the first error encountered. Every
/// span in the result belongs to `source`.
///
/// # Example
/// Obtaining the AST of a program:
/// ```
/// use dtc_parser::parser::parse_program;
/// use dtc_utils::span::SourceId;
/// let ast = parse_program("x = f(1)\n", SourceId::new(0));
/// assert!(ast.is_ok());
/// ```
///
/// # Errors
/// This function returns [`Err`] with a [`Diagnostic`] if any error was
/// encountered while parsing the input program.
pub fn parse_program(input: &str, source: SourceId) -> Result<Program, Diagnostic> {
    PythonParser::new(input, source)
        .and_then(|mut parser| parser.parse_program())
        .map_err(parser_error_to_diagnostic)
}

/// Parses a singular Python expression, yielding an AST [`Expr`] node.
///
/// This function only parses a single Python [expression](Expr), and not an
/// entire module. Unless you are trying to do some special integration with
/// partial programs, you probably want to use the [`parse_program`] function
/// instead.
///
/// # Example
/// Obtaining the AST of an expression:
/// ```
/// use dtc_parser::parser::parse_expr;
/// use dtc_utils::span::SourceId;
/// let ast = parse_expr("1 + 2", SourceId::new(0));
/// assert!(ast.is_ok());
/// ```
///
/// # Errors
/// This function returns [`Err`] with a [`Diagnostic`] if any error was
/// encountered while parsing the input expression.
pub fn parse_expr(input: &str, source: SourceId) -> Result<Expr, Diagnostic> {
    PythonParser::new(input, source)
        .and_then(|mut parser| parser.parse_expression())
        .map_err(parser_error_to_diagnostic)
}

#[cfg(test)]
mod tests {
    use dtc_utils::span::Span;

    use super::*;

    #[test]
    fn syntax_errors_become_diagnostics_with_spans() {
        let diagnostic = parse_program("x = (1 +\n", SourceId::new(3))
            .expect_err("test case should have failed to parse");

        assert!(matches!(
            diagnostic.kind(),
            DiagnosticKind::UnrecognizedToken(..) | DiagnosticKind::UnexpectedEof(..)
        ));
        assert_eq!(diagnostic.1.span().source(), SourceId::new(3));
    }

    #[test]
    fn lexical_errors_become_diagnostics() {
        let diagnostic = parse_program("x = $\n", SourceId::new(0))
            .expect_err("test case should have failed to parse");

        assert_eq!(
            diagnostic.kind(),
            &DiagnosticKind::UnknownToken("$".to_string())
        );
        assert_eq!(
            diagnostic.1.span(),
            Span::from_positions_and_source(4, 5, SourceId::new(0))
        );
    }

    #[test]
    fn inconsistent_dedent_is_reported() {
        let diagnostic = parse_program("if x:\n        a\n    b\n", SourceId::new(0))
            .expect_err("test case should have failed to parse");

        assert_eq!(diagnostic.kind(), &DiagnosticKind::InconsistentDedent);
    }

    #[test]
    fn invalid_target_is_reported() {
        let diagnostic = parse_program("a + b = 1\n", SourceId::new(0))
            .expect_err("test case should have failed to parse");

        assert_eq!(
            diagnostic.kind(),
            &DiagnosticKind::InvalidAssignmentTarget("(a + b)".to_string())
        );
    }

    #[test]
    fn trailing_tokens_after_expression_fail() {
        assert!(parse_expr("1 2", SourceId::new(0)).is_err());
        assert!(parse_expr("1, 2", SourceId::new(0)).is_ok());
    }
}
