//! Contracts and their registry
//!
//! A contract is written against raw [`TypeSpec`]s, the shapes a user may
//! write a type in: a name string, one of a few built-in types, a collection
//! of those, or a `|` union. [`parse_type_spec`] flattens any of them into a
//! [`TypeSet`].


use derive_more::Display;
use dtc_diagnostics::{Diagnostic, DiagnosticKind, SpanExt};
use dtc_forest::ForestIndex;
use dtc_parser::{
    ast::expr::{BinOp, Constant, Expr, ExprKind},
    contract::ContractDecl,
};
use indexmap::IndexMap;
use log::debug;

use crate::ty::{TypeName, TypeSet};

/// A built-in type that may be written directly in a type specification
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum BuiltinType {
    #[display("int")]
    Int,
    #[display("str")]
    Str,
    #[display("float")]
    Float,
    #[display("bool")]
    Bool,
    #[display("None")]
    None,
}

impl BuiltinType {
    /// Resolve the spelling of a built-in type
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "int" => Self::Int,
            "str" => Self::Str,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "None" => Self::None,
            _ => return None,
        })
    }

    /// The canonical name of this type
    #[must_use]
    pub const fn type_name(self) -> TypeName {
        match self {
            Self::Int => TypeName::Int,
            Self::Str => TypeName::Str,
            Self::Float => TypeName::Float,
            Self::Bool => TypeName::Bool,
            Self::None => TypeName::NoneType,
        }
    }
}

/// A raw type specification, before normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// A type name string, such as `'A'` or `"int"`
    Name(String),
    /// A built-in type written as a value, such as `int` or `None`
    Builtin(BuiltinType),
    /// A list, set or tuple of specifications
    Collection(Vec<TypeSpec>),
    /// `a | b`
    Union(Vec<TypeSpec>),
    /// Anything else, kept in printed form for the error message
    Unsupported(String),
}

impl TypeSpec {
    /// Convert a Python expression into a type specification
    ///
    /// Never fails: forms with no meaning become [`TypeSpec::Unsupported`],
    /// which [`parse_type_spec`] rejects.
    #[must_use]
    pub fn from_expr(expr: &Expr) -> Self {
        match expr.kind() {
            ExprKind::Constant(Constant::Str(name)) => Self::Name(name.clone()),
            ExprKind::Constant(Constant::None) => Self::Builtin(BuiltinType::None),
            ExprKind::Name(name) => BuiltinType::from_name(name)
                .map_or_else(|| Self::Unsupported(name.clone()), Self::Builtin),
            ExprKind::List(items) | ExprKind::Set(items) | ExprKind::Tuple(items) => {
                Self::Collection(items.iter().map(Self::from_expr).collect())
            }
            ExprKind::BinOp(lhs, BinOp::BitOr, rhs) => {
                let mut members = Vec::new();
                for side in [lhs, rhs] {
                    match Self::from_expr(side) {
                        Self::Union(inner) => members.extend(inner),
                        other => members.push(other),
                    }
                }
                Self::Union(members)
            }
            _ => Self::Unsupported(expr.to_string()),
        }
    }
}

impl From<&str> for TypeSpec {
    fn from(value: &str) -> Self {
        Self::Name(value.to_string())
    }
}

impl From<String> for TypeSpec {
    fn from(value: String) -> Self {
        Self::Name(value)
    }
}

impl From<BuiltinType> for TypeSpec {
    fn from(value: BuiltinType) -> Self {
        Self::Builtin(value)
    }
}

impl Display for TypeSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name(name) => write!(f, "'{name}'"),
            Self::Builtin(builtin) => write!(f, "{builtin}"),
            Self::Collection(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Union(members) => {
                for (index, member) in members.iter().enumerate() {
                    if index > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            Self::Unsupported(text) => write!(f, "{text}"),
        }
    }
}

/// Normalize a raw type specification into a flat [`TypeSet`]
///
/// # Errors
/// Fails with [`DiagnosticKind::UnsupportedTypeSpec`] for a collection element
/// that is neither a name nor a built-in, and for any unsupported form.
pub fn parse_type_spec(spec: &TypeSpec) -> Result<TypeSet, Diagnostic> {
    match spec {
        TypeSpec::Name(name) => Ok(TypeSet::single(TypeName::parse(name))),
        TypeSpec::Builtin(builtin) => Ok(TypeSet::single(builtin.type_name())),
        TypeSpec::Collection(items) => items
            .iter()
            .map(|item| match item {
                TypeSpec::Name(name) => Ok(TypeName::parse(name)),
                TypeSpec::Builtin(builtin) => Ok(builtin.type_name()),
                other => Err(DiagnosticKind::UnsupportedTypeSpec(other.to_string()).detached_error()),
            })
            .collect(),
        TypeSpec::Union(members) => {
            let mut set = TypeSet::new();
            for member in members {
                set.union_with(parse_type_spec(member)?);
            }
            Ok(set)
        }
        TypeSpec::Unsupported(text) => {
            Err(DiagnosticKind::UnsupportedTypeSpec(text.clone()).detached_error())
        }
    }
}

/// The normalized contract of one function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    /// Declared type set of every positional parameter, in declaration order
    params: IndexMap<String, TypeSet>,
    /// Declared type set of the return value
    returns: TypeSet,
}

impl Contract {
    /// The declared type set of `param`
    #[must_use]
    pub fn param(&self, param: &str) -> Option<&TypeSet> {
        self.params.get(param)
    }

    /// Every parameter with its declared type set
    pub fn params(&self) -> impl Iterator<Item = (&str, &TypeSet)> {
        self.params.iter().map(|(name, set)| (name.as_str(), set))
    }

    /// The declared type set of the return value
    #[must_use]
    pub const fn returns(&self) -> &TypeSet {
        &self.returns
    }
}

/// Contracts keyed by function name, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractRegistry {
    /// The registered contracts
    contracts: IndexMap<String, Contract>,
}

impl ContractRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a contract for `function` against the program and store it
    ///
    /// Registering a function again replaces its previous contract, keeping
    /// its original position in the registry.
    ///
    /// # Errors
    /// Fails if `function` is not defined in the program, if the number of
    /// named parameters differs from its positional parameters, if a name is
    /// not one of its parameters, or if a type specification is unsupported.
    pub fn register<K: Into<String>>(
        &mut self,
        index: &ForestIndex<'_>,
        function: &str,
        params: impl IntoIterator<Item = (K, TypeSpec)>,
        returns: &TypeSpec,
    ) -> Result<(), Diagnostic> {
        let def = index
            .function(function)
            .ok_or_else(|| DiagnosticKind::FunctionNotFound(function.to_string()).detached_error())?;

        let params: IndexMap<String, TypeSpec> = params
            .into_iter()
            .map(|(name, spec)| (name.into(), spec))
            .collect();

        let expected = def.params.positional().count();
        if params.len() != expected {
            return Err(def.name.span().error(DiagnosticKind::ParameterCountMismatch {
                function: function.to_string(),
                expected,
                got: params.len(),
            }));
        }

        let mut normalized = IndexMap::with_capacity(params.len());
        for (name, spec) in &params {
            if !def.params.positional().any(|param| param.name.value() == name) {
                return Err(def.name.span().error(DiagnosticKind::UnknownParameter {
                    function: function.to_string(),
                    param: name.clone(),
                }));
            }
            normalized.insert(name.clone(), parse_type_spec(spec)?);
        }

        let contract = Contract {
            params: normalized,
            returns: parse_type_spec(returns)?,
        };
        debug!("registered contract for `{function}`");
        if self.contracts.insert(function.to_string(), contract).is_some() {
            debug!("the new contract for `{function}` replaces the previous one");
        }

        Ok(())
    }

    /// Register a parsed contract declaration
    ///
    /// # Errors
    /// Fails like [`ContractRegistry::register`].
    pub fn register_declaration(
        &mut self,
        index: &ForestIndex<'_>,
        decl: &ContractDecl,
    ) -> Result<(), Diagnostic> {
        self.register(
            index,
            decl.name.value(),
            decl.params
                .iter()
                .map(|(name, spec)| (name.value().clone(), TypeSpec::from_expr(spec))),
            &TypeSpec::from_expr(&decl.returns),
        )
    }

    /// The contract of `function`, if one is registered
    #[must_use]
    pub fn get(&self, function: &str) -> Option<&Contract> {
        self.contracts.get(function)
    }

    /// Every contract, in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Contract)> {
        self.contracts
            .iter()
            .map(|(name, contract)| (name.as_str(), contract))
    }

    /// The number of registered contracts
    #[must_use]
    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    /// Determine if no contract is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

impl Display for ContractRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (name, contract) in &self.contracts {
            write!(f, "{name}(")?;
            for (index, (param, set)) in contract.params.iter().enumerate() {
                if index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{param}: {set}")?;
            }
            writeln!(f, ") -> {}", contract.returns)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use dtc_forest::Forest;
    use dtc_parser::{contract::parse_contract, parser::parse_expr};
    use dtc_utils::span::SourceId;
    use indoc::indoc;

    use super::*;

    /// Parse a type specification from Python source
    fn spec(source: &str) -> TypeSpec {
        TypeSpec::from_expr(
            &parse_expr(source, SourceId::new(0)).expect("test case should have parsed correctly"),
        )
    }

    /// Normalize a type specification written as Python source
    fn normalized(source: &str) -> Result<String, DiagnosticKind> {
        parse_type_spec(&spec(source))
            .map(|set| set.to_string())
            .map_err(|diagnostic| diagnostic.1.into_value())
    }

    /// A small program with two functions and a class
    fn program() -> Forest {
        Forest::parse_str(
            indoc! {"
                class A:
                    pass

                def fun1(x):
                    pass

                def fun2(y, *rest, z=1, **extra):
                    return y
            "},
            "program.py",
        )
        .expect("test case should have parsed correctly")
    }

    #[test]
    fn expressions_become_specs() {
        assert_eq!(spec("'A'"), TypeSpec::Name("A".to_string()));
        assert_eq!(spec("int"), TypeSpec::Builtin(BuiltinType::Int));
        assert_eq!(spec("None"), TypeSpec::Builtin(BuiltinType::None));
        assert_eq!(
            spec("int | str | 'B'"),
            TypeSpec::Union(vec![
                TypeSpec::Builtin(BuiltinType::Int),
                TypeSpec::Builtin(BuiltinType::Str),
                TypeSpec::Name("B".to_string()),
            ])
        );
        assert_eq!(spec("A"), TypeSpec::Unsupported("A".to_string()));
        assert_eq!(spec("f(1)"), TypeSpec::Unsupported("f(1)".to_string()));
    }

    #[test]
    fn specs_normalize_to_flat_sets() {
        assert_eq!(normalized("'int'"), Ok("{int}".to_string()));
        assert_eq!(normalized("float"), Ok("{float}".to_string()));
        assert_eq!(normalized("[int, 'str', None]"), Ok("{int, str, None}".to_string()));
        assert_eq!(normalized("{'B', 'C'}"), Ok("{B, C}".to_string()));
        assert_eq!(normalized("int | str"), Ok("{int, str}".to_string()));
        assert_eq!(normalized("[None]"), Ok("{None}".to_string()));
    }

    #[test]
    fn unsupported_specs_are_rejected() {
        assert!(matches!(
            normalized("[int, [str]]"),
            Err(DiagnosticKind::UnsupportedTypeSpec(text)) if text == "[str]"
        ));
        assert!(matches!(
            normalized("[int, list]"),
            Err(DiagnosticKind::UnsupportedTypeSpec(text)) if text == "list"
        ));
        assert!(normalized("3").is_err());
    }

    #[test]
    fn register_validates_against_the_program() {
        let forest = program();
        let index = forest.index();
        let mut registry = ContractRegistry::new();

        let missing = registry
            .register(&index, "nope", [("x", TypeSpec::from("int"))], &"None".into())
            .expect_err("unknown function should fail");
        assert_eq!(
            missing.kind(),
            &DiagnosticKind::FunctionNotFound("nope".to_string())
        );

        let class = registry
            .register(&index, "A", Vec::<(String, TypeSpec)>::new(), &"None".into())
            .expect_err("classes have no contract");
        assert!(matches!(class.kind(), DiagnosticKind::FunctionNotFound(_)));

        let count = registry
            .register(
                &index,
                "fun1",
                [("x", TypeSpec::from("int")), ("y", TypeSpec::from("int"))],
                &"None".into(),
            )
            .expect_err("arity should be checked");
        assert!(matches!(
            count.kind(),
            DiagnosticKind::ParameterCountMismatch { expected: 1, got: 2, .. }
        ));

        let unknown = registry
            .register(&index, "fun2", [("a", TypeSpec::from("int"))], &"int".into())
            .expect_err("parameter names should be checked");
        assert!(matches!(
            unknown.kind(),
            DiagnosticKind::UnknownParameter { param, .. } if param == "a"
        ));

        assert!(registry.is_empty());
    }

    #[test]
    fn arity_counts_positional_parameters_only() {
        let forest = program();
        let index = forest.index();
        let mut registry = ContractRegistry::new();

        registry
            .register(&index, "fun2", [("y", TypeSpec::from("int"))], &"int".into())
            .expect("fun2 has one positional parameter");
        assert!(registry
            .register(&index, "fun2", [("z", TypeSpec::from("int"))], &"int".into())
            .is_err());
    }

    #[test]
    fn registering_again_replaces() {
        let forest = program();
        let index = forest.index();
        let mut registry = ContractRegistry::new();

        for decl in [
            "fun2(y=[int, str]) -> None",
            "fun1(x=int) -> None",
            "fun2(y='int') -> [None]",
        ] {
            let decl = parse_contract(decl, SourceId::new(0))
                .expect("test case should have parsed correctly");
            registry
                .register_declaration(&index, &decl)
                .expect("contract should register");
        }

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.to_string(),
            "fun2(y: {int}) -> {None}\nfun1(x: {int}) -> {None}\n"
        );
        assert_eq!(
            registry.get("fun2").and_then(|contract| contract.param("y")),
            Some(&TypeSet::single(TypeName::Int))
        );
    }
}
