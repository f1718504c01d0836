//! Contract declarations written as text
//!
//! A contract declaration looks like a call followed by a return annotation:
//!
//! ```text
//! fun2(y=int | str, z=[int, 'A']) -> None
//! ```
//!
//! Every parameter must be given by name. The type specifications are kept as
//! plain [`Expr`]s; turning them into type sets is up to the checker.

use std::fmt::Display;

use dtc_diagnostics::{Diagnostic, DiagnosticKind, SpannedExt};
use dtc_utils::span::{SourceId, Spannable, Spanned};

use crate::{
    ast::expr::Expr, parser::parser_error_to_diagnostic, python_parser::PythonParser,
};

/// A parsed `name(param=SPEC, ...) -> SPEC` declaration
#[derive(Debug, Clone, PartialEq)]
pub struct ContractDecl {
    /// The function the contract is for
    pub name: Spanned<String>,
    /// Each named parameter with its type specification, in written order
    pub params: Vec<(Spanned<String>, Expr)>,
    /// The return type specification
    pub returns: Expr,
}

impl Display for ContractDecl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        for (index, (param, spec)) in self.params.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{param}={spec}")?;
        }
        write!(f, ") -> {}", self.returns)
    }
}

/// Parse a contract declaration
///
/// # Example
/// ```
/// use dtc_parser::contract::parse_contract;
/// use dtc_utils::span::SourceId;
/// let decl = parse_contract("fun1(x=int) -> None", SourceId::new(0))
///     .expect("declaration should parse");
/// assert_eq!(decl.name.value(), "fun1");
/// ```
///
/// # Errors
/// Returns a [`Diagnostic`] for any syntax error, and for any parameter that
/// is not written as `name=SPEC`.
pub fn parse_contract(input: &str, source: SourceId) -> Result<ContractDecl, Diagnostic> {
    let signature = PythonParser::new(input, source)
        .and_then(|mut parser| parser.parse_signature())
        .map_err(parser_error_to_diagnostic)?;

    if let Some(positional) = signature.args.first() {
        return Err(positional
            .to_string()
            .in_span(positional.span())
            .error(DiagnosticKind::ContractParameterMustBeNamed));
    }

    let params = signature
        .keywords
        .into_iter()
        .map(|keyword| match keyword.name {
            Some(name) => Ok((name, keyword.value)),
            None => Err(format!("**{}", keyword.value)
                .in_span(keyword.value.span())
                .error(DiagnosticKind::ContractParameterMustBeNamed)),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ContractDecl {
        name: signature.name,
        params,
        returns: signature.returns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declaration_keeps_parameter_order() {
        let decl = parse_contract("fun2(y=int | str, z=[int, 'A']) -> None", SourceId::new(0))
            .expect("test case should have parsed correctly");

        let names: Vec<_> = decl.params.iter().map(|(name, _)| name.value().as_str()).collect();
        assert_eq!(names, vec!["y", "z"]);
        assert_eq!(decl.params[1].1.to_string(), "[int, 'A']");
        assert_eq!(decl.returns.to_string(), "None");
    }

    #[test]
    fn display_reprints_declaration() {
        let decl = parse_contract("f(a={'B', 'C'}) -> int", SourceId::new(0))
            .expect("test case should have parsed correctly");

        assert_eq!(decl.to_string(), "f(a={'B', 'C'}) -> int");
    }

    #[test]
    fn empty_parameter_list_is_allowed() {
        let decl = parse_contract("main() -> None", SourceId::new(0))
            .expect("test case should have parsed correctly");

        assert!(decl.params.is_empty());
    }

    #[test]
    fn positional_parameter_is_rejected() {
        let diagnostic = parse_contract("f(int) -> None", SourceId::new(0))
            .expect_err("test case should have failed");

        assert_eq!(
            diagnostic.kind(),
            &DiagnosticKind::ContractParameterMustBeNamed("int".to_string())
        );
    }

    #[test]
    fn missing_return_is_a_syntax_error() {
        let diagnostic = parse_contract("f(x=int)", SourceId::new(0))
            .expect_err("test case should have failed");

        assert!(matches!(
            diagnostic.kind(),
            DiagnosticKind::UnrecognizedToken(..) | DiagnosticKind::UnexpectedEof(..)
        ));
    }
}
