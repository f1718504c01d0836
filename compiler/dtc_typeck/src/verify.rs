//! Checking registered contracts against every call site

use dtc_diagnostics::{Diagnostic, DiagnosticKind, SpanExt};
use dtc_forest::Forest;
use log::debug;

use crate::{
    contract::ContractRegistry,
    infer::{explicit_arguments, InferenceEngine},
};

/// Check every contract in `registry` against the calls made in `forest`
///
/// Contracts are checked in registration order and call sites in walk order.
/// At each call site, every argument is checked before the return value.
/// A contracted function that is never called is not checked.
///
/// # Errors
/// Returns the first contract violation, or the first failure to infer a type
/// needed to check one.
pub fn check_types(forest: &Forest, registry: &ContractRegistry) -> Result<(), Diagnostic> {
    let mut engine = InferenceEngine::new(forest);

    for (function, contract) in registry.iter() {
        let Some(def) = engine.index().function(function) else {
            return Err(DiagnosticKind::FunctionNotFound(function.to_string()).detached_error());
        };

        let calls = engine.index().calls_to(function);
        if calls.is_empty() {
            debug!("`{function}` has a contract but is never called");
            continue;
        }

        for call in calls {
            let span = call.call.span();
            let line = forest.line_of(span).unwrap_or_default();
            debug!("checking call to `{function}` on line {line}");

            for (param, arg) in explicit_arguments(def, &call) {
                let Some(expected) = contract.param(param.name.value()) else {
                    continue;
                };
                let got = engine.infer(arg, call.enclosing)?;
                if !got.is_compatible_with(expected) {
                    return Err(span.error(DiagnosticKind::ArgumentContractViolation {
                        line,
                        function: function.to_string(),
                        param: param.name.value().clone(),
                        expected: expected.to_string(),
                        got: got.to_string(),
                    }));
                }
            }

            let got = engine.return_types(function, span)?;
            if !got.is_compatible_with(contract.returns()) {
                return Err(span.error(DiagnosticKind::ReturnContractViolation {
                    line,
                    function: function.to_string(),
                    expected: contract.returns().to_string(),
                    got: got.to_string(),
                }));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use dtc_parser::contract::parse_contract;
    use dtc_utils::span::SourceId;
    use indoc::indoc;

    use super::*;

    /// Check `contracts` against `source`
    fn check(source: &str, contracts: &[&str]) -> Result<(), DiagnosticKind> {
        let forest =
            Forest::parse_str(source, "check.py").expect("test case should have parsed correctly");
        let index = forest.index();
        let mut registry = ContractRegistry::new();
        for contract in contracts {
            let decl = parse_contract(contract, SourceId::new(0))
                .expect("test case should have parsed correctly");
            registry
                .register_declaration(&index, &decl)
                .expect("contract should register");
        }

        check_types(&forest, &registry).map_err(|diagnostic| diagnostic.1.into_value())
    }

    #[test]
    fn argument_violations_name_the_line() {
        let source = indoc! {"
            def fun1(x):
                pass

            fun1(1)
            fun1('no')
        "};

        assert_eq!(
            check(source, &["fun1(x=int) -> None"]),
            Err(DiagnosticKind::ArgumentContractViolation {
                line: 5,
                function: "fun1".to_string(),
                param: "x".to_string(),
                expected: "{int}".to_string(),
                got: "{str}".to_string(),
            })
        );
    }

    #[test]
    fn return_violations_are_reported() {
        let source = indoc! {"
            def half(n):
                return 0.5

            half(1)
        "};

        assert_eq!(
            check(source, &["half(n=int) -> int"]),
            Err(DiagnosticKind::ReturnContractViolation {
                line: 4,
                function: "half".to_string(),
                expected: "{int}".to_string(),
                got: "{float}".to_string(),
            })
        );
    }

    #[test]
    fn strict_subsets_pass_and_overlaps_fail() {
        let source = indoc! {"
            def f(v):
                return v

            f(1)
            f(True)
        "};

        assert_eq!(check(source, &["f(v=[int, bool, str]) -> int | bool | str"]), Ok(()));
        assert!(matches!(
            check(source, &["f(v=[int, str]) -> [int, bool]"]),
            Err(DiagnosticKind::ArgumentContractViolation { got, .. }) if got == "{bool}"
        ));
        // every argument passes, but the return set is only an overlap
        assert!(matches!(
            check(source, &["f(v=[int, bool]) -> int"]),
            Err(DiagnosticKind::ReturnContractViolation { got, .. }) if got == "{int, bool}"
        ));
    }

    #[test]
    fn any_accepts_everything() {
        let source = indoc! {"
            def f(v):
                return v

            for item in [1, 'a']:
                f(item)
        "};

        assert_eq!(check(source, &["f(v=float) -> float"]), Ok(()));
    }

    #[test]
    fn uncalled_functions_are_not_checked() {
        let source = indoc! {"
            def lonely(a):
                return a
        "};

        assert_eq!(check(source, &["lonely(a=int) -> int"]), Ok(()));
    }

    #[test]
    fn contracts_are_checked_in_registration_order() {
        let source = indoc! {"
            def first(a):
                pass

            def second(b):
                pass

            first('x')
            second('y')
        "};

        assert!(matches!(
            check(source, &["second(b=int) -> None", "first(a=int) -> None"]),
            Err(DiagnosticKind::ArgumentContractViolation { function, .. }) if function == "second"
        ));
    }

    #[test]
    fn keyword_arguments_are_checked() {
        let source = indoc! {"
            def f(a, b=1):
                pass

            f(1, b='x')
        "};

        assert!(matches!(
            check(source, &["f(a=int, b=int) -> None"]),
            Err(DiagnosticKind::ArgumentContractViolation { param, .. }) if param == "b"
        ));
    }

    #[test]
    fn inference_failures_abort_the_check() {
        let source = indoc! {"
            def f(a):
                pass

            f(unknown)
        "};

        assert_eq!(
            check(source, &["f(a=int) -> None"]),
            Err(DiagnosticKind::VariableNotInferred("unknown".to_string()))
        );
    }

    #[test]
    fn checking_twice_gives_the_same_answer() {
        let forest = Forest::parse_str("def f(a):\n    pass\n\nf('s')\n", "twice.py")
            .expect("test case should have parsed correctly");
        let mut registry = ContractRegistry::new();
        let decl = parse_contract("f(a=int) -> None", SourceId::new(0))
            .expect("test case should have parsed correctly");
        registry
            .register_declaration(&forest.index(), &decl)
            .expect("contract should register");

        let first = check_types(&forest, &registry).map_err(|diagnostic| diagnostic.to_string());
        let second = check_types(&forest, &registry).map_err(|diagnostic| diagnostic.to_string());
        assert!(first.is_err());
        assert_eq!(first, second);
    }
}
