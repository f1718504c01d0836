//! The programmatic entry point of dtc
//!
//! A [`Session`] owns one forest and the contracts registered against it:
//!
//! ```no_run
//! use dtc_typeck::{contract::TypeSpec, Session};
//!
//! let mut session = Session::open("project/main.py")?;
//! session.given("fun2", [("y", TypeSpec::from("int"))], "None")?;
//! session.given_declaration("fun1(x=int | str) -> None")?;
//! session.run()?;
//! # Ok::<(), dtc_diagnostics::Diagnostic>(())
//! ```

use std::path::Path;

use dtc_diagnostics::Diagnostic;
use dtc_forest::{BuildOptions, Forest, ForestBuilder};
use dtc_parser::contract::parse_contract;
use dtc_utils::span::SourceId;

use crate::{
    contract::{ContractRegistry, TypeSpec},
    verify::check_types,
};

/// One program and the contracts it must satisfy
#[derive(Debug)]
pub struct Session {
    /// The program being checked
    forest: Forest,
    /// The contracts registered so far
    registry: ContractRegistry,
}

impl Session {
    /// Load `entry` and the units it imports
    ///
    /// # Errors
    /// Fails if a unit cannot be read or does not parse.
    pub fn open(entry: impl AsRef<Path>) -> Result<Self, Diagnostic> {
        Self::open_with_options(entry, BuildOptions::default())
    }

    /// Load `entry` and the units it imports, with explicit build options
    ///
    /// # Errors
    /// Fails if a unit cannot be read or does not parse.
    pub fn open_with_options(
        entry: impl AsRef<Path>,
        options: BuildOptions,
    ) -> Result<Self, Diagnostic> {
        ForestBuilder::new(options)
            .build(entry.as_ref())
            .map(Self::from_forest)
    }

    /// Start a session over an already built forest
    #[must_use]
    pub fn from_forest(forest: Forest) -> Self {
        Self {
            forest,
            registry: ContractRegistry::new(),
        }
    }

    /// The program being checked
    #[must_use]
    pub const fn forest(&self) -> &Forest {
        &self.forest
    }

    /// The contracts registered so far
    #[must_use]
    pub const fn contracts(&self) -> &ContractRegistry {
        &self.registry
    }

    /// Declare the parameter and return types of `function`
    ///
    /// Declaring a function again replaces its previous contract.
    ///
    /// # Errors
    /// Fails if `function` is not defined, if `params` does not name exactly
    /// its positional parameters, or if a type specification is unsupported.
    pub fn given<K: Into<String>>(
        &mut self,
        function: &str,
        params: impl IntoIterator<Item = (K, TypeSpec)>,
        returns: impl Into<TypeSpec>,
    ) -> Result<(), Diagnostic> {
        self.registry
            .register(&self.forest.index(), function, params, &returns.into())
    }

    /// Declare a contract written as `name(param=SPEC, ...) -> SPEC`
    ///
    /// # Errors
    /// Fails if the declaration does not parse, or like [`Session::given`].
    pub fn given_declaration(&mut self, declaration: &str) -> Result<(), Diagnostic> {
        let decl = parse_contract(declaration, SourceId::DETACHED)?;
        self.registry
            .register_declaration(&self.forest.index(), &decl)
    }

    /// Check every registered contract
    ///
    /// # Errors
    /// Returns the first contract violation, or the first failure to infer a
    /// type needed to check one.
    pub fn run(&self) -> Result<(), Diagnostic> {
        check_types(&self.forest, &self.registry)
    }
}
