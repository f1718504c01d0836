//! Defines all possible dtc diagnostics.

use dtc_utils::span::{Span, Spannable};
use thiserror::Error;

use crate::{Diagnostic, Severity};

/// The list of possible errors
#[allow(missing_docs)]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    // LEXER ERRORS
    #[error("unknown token `{0}`")]
    UnknownToken(String),
    #[error("unterminated string literal")]
    UnterminatedStringLiteral,
    #[error("unindent does not match any outer indentation level")]
    InconsistentDedent,

    // PARSER ERRORS
    #[error("unexpected end of file, expected one of: {}", .0.join(", "))]
    UnexpectedEof(Vec<String>),
    #[error("unrecognized token `{0}`, expected one of: {}", .1.join(", "))]
    UnrecognizedToken(String, Vec<String>),
    #[error("`{0}` cannot be assigned to")]
    InvalidAssignmentTarget(String),
    #[error("contract parameter `{0}` must be written as `name=type`")]
    ContractParameterMustBeNamed(String),

    // FOREST ERRORS
    #[error("cannot read source file {path}: {error}")]
    CannotReadFile { path: String, error: String },

    // REGISTRATION ERRORS
    #[error("function `{0}` not found in the program")]
    FunctionNotFound(String),
    #[error("function `{function}` takes {expected} parameters but the contract names {got}")]
    ParameterCountMismatch {
        function: String,
        expected: usize,
        got: usize,
    },
    #[error("parameter `{param}` not found in the function `{function}`")]
    UnknownParameter { function: String, param: String },
    #[error("unsupported argument type: {0}")]
    UnsupportedTypeSpec(String),

    // INFERENCE ERRORS
    #[error("variable `{0}` could not be inferred")]
    VariableNotInferred(String),
    #[error("unsupported expression `{0}`")]
    UnsupportedExpression(String),
    #[error("unsupported call form `{0}`: only calls by plain name are understood")]
    UnsupportedCall(String),
    #[error("parameter `{param}` is not bound by the call to `{function}`")]
    ParameterNotBound { function: String, param: String },
    #[error("parameter `{param}` could not be inferred: `{function}` is never called")]
    ParameterHasNoCallers { function: String, param: String },
    #[error("inference cycle detected: {}", .0.join(" -> "))]
    InferenceCycle(Vec<String>),

    // CONTRACT VIOLATIONS
    #[error(
        "in line {line}, function `{function}` called with wrong arguments: parameter `{param}` \
         expected {expected}, got {got}"
    )]
    ArgumentContractViolation {
        line: usize,
        function: String,
        param: String,
        expected: String,
        got: String,
    },
    #[error("in line {line}, function `{function}` returned wrong type, expected {expected}, got {got}")]
    ReturnContractViolation {
        line: usize,
        function: String,
        expected: String,
        got: String,
    },
}
impl DiagnosticKind {
    /// Create an [error] diagnostic in a given [`Span`]
    ///
    /// [error]: [`Severity::Error`]
    #[must_use]
    #[inline]
    pub fn error_in(self, span: Span) -> Diagnostic {
        Diagnostic(Severity::Error, self.in_span(span))
    }

    /// Create an [error] diagnostic that is not tied to any source unit
    ///
    /// [error]: [`Severity::Error`]
    #[must_use]
    #[inline]
    pub fn detached_error(self) -> Diagnostic {
        self.error_in(Span::detached())
    }

    /// Determine if this diagnostic reports a broken contract, as opposed to a
    /// failure of the checker to understand the program
    #[must_use]
    pub const fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::ArgumentContractViolation { .. } | Self::ReturnContractViolation { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_payloads_are_joined() {
        assert_eq!(
            DiagnosticKind::UnexpectedEof(vec!["`)`".to_string(), "`,`".to_string()]).to_string(),
            "unexpected end of file, expected one of: `)`, `,`"
        );
        assert_eq!(
            DiagnosticKind::InferenceCycle(vec!["f".to_string(), "g".to_string(), "f".to_string()])
                .to_string(),
            "inference cycle detected: f -> g -> f"
        );
    }

    #[test]
    fn violations_mention_line_and_sets() {
        let message = DiagnosticKind::ArgumentContractViolation {
            line: 12,
            function: "fun1".to_string(),
            param: "x".to_string(),
            expected: "{int}".to_string(),
            got: "{str}".to_string(),
        }
        .to_string();

        assert!(message.starts_with("in line 12"));
        assert!(message.contains("expected {int}, got {str}"));
    }

    #[test]
    fn contract_violations_are_classified() {
        assert!(DiagnosticKind::ReturnContractViolation {
            line: 1,
            function: "f".to_string(),
            expected: "{None}".to_string(),
            got: "{int}".to_string(),
        }
        .is_contract_violation());
        assert!(!DiagnosticKind::FunctionNotFound("f".to_string()).is_contract_violation());
    }

    #[test]
    fn detached_error_has_detached_span() {
        let diagnostic = DiagnosticKind::FunctionNotFound("f".to_string()).detached_error();

        assert!(diagnostic.1.source().is_detached());
    }
}
