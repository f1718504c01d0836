//! Parameter lists of `def` statements and `lambda` expressions

use std::fmt::Display;

use dtc_utils::{code_fmt::join_display, span::Spanned};

use super::expr::Expr;

/// How a parameter may be bound by a caller
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub enum ParameterKind {
    /// Declared before a `/` marker: positional only
    PositionalOnly,
    /// An ordinary parameter: positional or keyword
    Positional,
    /// Declared after `*` or `*args`: keyword only
    KeywordOnly,
    /// `*args`
    VarPositional,
    /// `**kwargs`
    VarKeyword,
}

/// A single declared parameter
#[derive(PartialEq, Debug, Clone)]
pub struct Parameter {
    /// The parameter's name
    pub name: Spanned<String>,
    /// How the parameter may be bound
    pub kind: ParameterKind,
    /// The annotation, if one was written
    pub annotation: Option<Expr>,
    /// The default value, if one was written
    pub default: Option<Expr>,
}
impl Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ParameterKind::VarPositional => write!(f, "*")?,
            ParameterKind::VarKeyword => write!(f, "**")?,
            _ => {}
        }
        write!(f, "{}", self.name)?;
        match (&self.annotation, &self.default) {
            (Some(annotation), Some(default)) => write!(f, ": {annotation} = {default}"),
            (Some(annotation), None) => write!(f, ": {annotation}"),
            (None, Some(default)) => write!(f, "={default}"),
            (None, None) => Ok(()),
        }
    }
}

/// An ordered parameter list
#[derive(PartialEq, Debug, Clone, Default)]
pub struct Parameters(pub Vec<Spanned<Parameter>>);

impl Parameters {
    /// Determine if no parameters are declared
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over every declared parameter
    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.0.iter().map(Spanned::value)
    }

    /// Iterate over the parameters that can be bound by position, in order
    ///
    /// These are the positional-only and ordinary parameters, which is what a
    /// contract has to name exactly.
    pub fn positional(&self) -> impl Iterator<Item = &Parameter> {
        self.iter().filter(|param| {
            matches!(
                param.kind,
                ParameterKind::PositionalOnly | ParameterKind::Positional
            )
        })
    }

    /// Find the parameter called `name`
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&Parameter> {
        self.iter().find(|param| param.name.value() == name)
    }
}

impl Display for Parameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut rendered = Vec::with_capacity(self.0.len() + 2);
        let mut previous = None;
        for param in self.iter() {
            if previous == Some(ParameterKind::PositionalOnly)
                && param.kind != ParameterKind::PositionalOnly
            {
                rendered.push("/".to_string());
            }
            if param.kind == ParameterKind::KeywordOnly
                && !matches!(
                    previous,
                    Some(ParameterKind::KeywordOnly | ParameterKind::VarPositional)
                )
            {
                rendered.push("*".to_string());
            }
            rendered.push(param.to_string());
            previous = Some(param.kind);
        }
        if previous == Some(ParameterKind::PositionalOnly) {
            rendered.push("/".to_string());
        }
        write!(f, "{}", join_display(rendered, ", "))
    }
}

#[cfg(test)]
mod tests {
    use dtc_utils::span::SourceId;

    use super::*;
    use crate::{ast::stmt::StmtKind, parser::parse_program};

    /// Parse a single `def` and return its parameters
    fn params_of(input: &str) -> Parameters {
        let program = parse_program(input, SourceId::new(0))
            .expect("test case should have parsed correctly");
        match program.0[0].kind() {
            StmtKind::FunctionDef(def) => def.params.clone(),
            other => panic!("expected a function, got {other}"),
        }
    }

    #[test]
    fn kinds_follow_markers() {
        let params = params_of("def f(a, /, b, *args, c, d=1, **kw):\n    pass\n");
        let kinds: Vec<_> = params.iter().map(|p| p.kind).collect();

        assert_eq!(
            kinds,
            vec![
                ParameterKind::PositionalOnly,
                ParameterKind::Positional,
                ParameterKind::VarPositional,
                ParameterKind::KeywordOnly,
                ParameterKind::KeywordOnly,
                ParameterKind::VarKeyword,
            ]
        );
    }

    #[test]
    fn positional_excludes_star_and_keyword_only() {
        let params = params_of("def f(a, b=2, *, c, **kw):\n    pass\n");
        let names: Vec<_> = params.positional().map(|p| p.name.value().as_str()).collect();

        assert_eq!(names, vec!["a", "b"]);
        assert!(params.find("c").is_some());
        assert!(params.find("z").is_none());
    }

    #[test]
    fn display_restores_markers() {
        assert_eq!(
            params_of("def f(a, /, b: int = 2, *, c, **kw):\n    pass\n").to_string(),
            "a, /, b: int = 2, *, c, **kw"
        );
        assert_eq!(
            params_of("def f(*args, c):\n    pass\n").to_string(),
            "*args, c"
        );
    }
}
