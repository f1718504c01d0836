//! dtc driver
//!
//! This module contains the main driver function for dtc, which loads the
//! program, registers the contracts and checks them, stopping early for the
//! outputs that only need part of that work.

use std::path::Path;

use dtc_diagnostics::Diagnostic;
use dtc_forest::{BuildOptions, ForestBuilder, SourceFile};
use dtc_typeck::Session;
use log::debug;

use crate::cli::OutputFormat;

/// Render `diagnostic` against the unit it points into, if it is one of
/// `sources`
fn render(diagnostic: &Diagnostic, sources: &[SourceFile]) -> String {
    sources
        .get(diagnostic.1.span().source().index())
        .map_or_else(
            || diagnostic.print(None),
            |source| diagnostic.print_with_filename(source.content(), source.path()),
        )
}

/// Drive a check of the program at `entry`.
///
/// Returns the text to print on success. On failure, returns the first
/// diagnostic, already rendered against its source.
///
/// # Arguments
///
/// * `entry` - The entry file of the program.
/// * `contracts` - Contract declarations, in the order to register them.
/// * `emit` - The desired output format.
/// * `options` - How to treat imports.
pub fn check(
    entry: &Path,
    contracts: &[String],
    emit: OutputFormat,
    options: BuildOptions,
) -> Result<String, String> {
    // === FOREST ===
    let mut builder = ForestBuilder::new(options);
    let forest = builder
        .build(entry)
        .map_err(|diagnostic| render(&diagnostic, builder.sources()))?;
    debug!("loaded {} source units", forest.sources().len());

    match emit {
        OutputFormat::Ast => return Ok(forest.to_string()),
        OutputFormat::AstDebug => return Ok(format!("{:#?}", forest.body())),
        OutputFormat::Check | OutputFormat::Contracts => {}
    }

    // === CONTRACTS ===
    let mut session = Session::from_forest(forest);
    for contract in contracts {
        session.given_declaration(contract).map_err(|diagnostic| {
            format!(
                "{}\nnote: in the contract `{contract}`",
                render(&diagnostic, session.forest().sources())
            )
        })?;
    }

    if emit == OutputFormat::Contracts {
        return Ok(session.contracts().to_string());
    }

    // === CHECK ===
    session
        .run()
        .map_err(|diagnostic| render(&diagnostic, session.forest().sources()))?;

    Ok(format!(
        "{} contract(s) checked, all hold",
        session.contracts().len()
    ))
}
