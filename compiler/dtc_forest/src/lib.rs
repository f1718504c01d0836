//! Syntax forest construction for dtc
//!
//! A dtc analysis runs over one logical program: the entry unit's top-level
//! statements followed by those of every locally imported unit. Unlike a
//! textual include, each unit is parsed separately and the trees are
//! concatenated, so every node keeps a [`Span`] pointing into its own
//! [`SourceFile`] and diagnostics can still name the right file and line.
//!
//! - [`ForestBuilder`] loads the entry unit and inlines its imports.
//! - [`Forest`] owns the loaded sources and the merged statement list.
//! - [`ForestIndex`] is the read-only parent table used to walk upward from a
//!   node to its enclosing function.

#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    clippy::missing_docs_in_private_items,
    missing_docs
)]
#![allow(
    clippy::multiple_crate_versions,
    clippy::cargo_common_metadata,
    clippy::module_name_repetitions
)]

use std::{fmt::Display, path::PathBuf};

use dtc_diagnostics::Diagnostic;
use dtc_parser::{ast::stmt::Stmt, parser::parse_program};
use dtc_utils::{
    code_fmt::join_display,
    span::{SourceId, Span},
};

mod builder;
mod index;
mod source;

pub use builder::{BuildOptions, ForestBuilder};
pub use index::{CallSite, ForestIndex, Node, NodeId};
pub use source::SourceFile;

/// One logical program assembled from one or more source units
#[derive(Debug, Clone, PartialEq)]
pub struct Forest {
    /// Every loaded unit, indexed by [`SourceId`]
    sources: Vec<SourceFile>,
    /// The merged top-level statements, entry unit first
    body: Vec<Stmt>,
}

impl Forest {
    /// Assemble a forest from already loaded sources and their merged body
    pub(crate) fn new(sources: Vec<SourceFile>, body: Vec<Stmt>) -> Self {
        Self { sources, body }
    }

    /// Build a single-unit forest from source text, without resolving imports
    ///
    /// `path` is only used to name the unit in diagnostics.
    ///
    /// # Errors
    /// Returns the parser's [`Diagnostic`] if `content` does not parse.
    pub fn parse_str(content: &str, path: impl Into<PathBuf>) -> Result<Self, Diagnostic> {
        let id = SourceId::new(0);
        let program = parse_program(content, id)?;

        Ok(Self::new(
            vec![SourceFile::new(id, path.into(), content.to_string())],
            program.0,
        ))
    }

    /// The merged top-level statements
    #[must_use]
    pub fn body(&self) -> &[Stmt] {
        &self.body
    }

    /// Every loaded source unit, in load order
    #[must_use]
    pub fn sources(&self) -> &[SourceFile] {
        &self.sources
    }

    /// Look up a loaded source unit
    #[must_use]
    pub fn source(&self, id: SourceId) -> Option<&SourceFile> {
        self.sources.get(id.index())
    }

    /// The 1-based line on which `span` starts, if it points into a loaded unit
    #[must_use]
    pub fn line_of(&self, span: Span) -> Option<usize> {
        self.source(span.source())
            .map(|source| source.line_of(span.start()))
    }

    /// Build the parent table for this forest
    #[must_use]
    pub fn index(&self) -> ForestIndex<'_> {
        ForestIndex::new(&self.body)
    }
}

impl Display for Forest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", join_display(&self.body, "\n"))
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn parse_str_builds_single_unit() {
        let forest = Forest::parse_str("x = 1\ny = x\n", "inline.py")
            .expect("test case should have parsed correctly");

        assert_eq!(forest.sources().len(), 1);
        assert_eq!(forest.body().len(), 2);
        assert_eq!(forest.to_string(), "x = 1\ny = x");
    }

    #[test]
    fn line_of_maps_spans_to_lines() {
        let forest = Forest::parse_str(
            indoc! {"
                a = 1

                b = 2
            "},
            "lines.py",
        )
        .expect("test case should have parsed correctly");

        let lines: Vec<_> = forest
            .body()
            .iter()
            .map(|stmt| forest.line_of(stmt.span()))
            .collect();
        assert_eq!(lines, vec![Some(1), Some(3)]);
        assert_eq!(forest.line_of(Span::detached()), None);
    }

    #[test]
    fn parse_str_propagates_syntax_errors() {
        assert!(Forest::parse_str("def f(:\n", "bad.py").is_err());
    }
}
