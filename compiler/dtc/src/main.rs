#![doc=include_str!("../README.md")]
#![allow(unknown_lints)] // in case you use non-nightly clippy
#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    clippy::missing_docs_in_private_items,
    missing_docs,
    clippy::as_conversions,
    clippy::dbg_macro,
    clippy::decimal_literal_representation,
    clippy::deref_by_slicing,
    clippy::disallowed_script_idents,
    clippy::else_if_without_else,
    clippy::empty_structs_with_brackets,
    clippy::format_push_string,
    clippy::if_then_some_else_none,
    clippy::let_underscore_must_use,
    clippy::min_ident_chars,
    clippy::mixed_read_write_in_expression,
    clippy::multiple_inherent_impl,
    clippy::non_ascii_literal,
    clippy::redundant_type_annotations,
    clippy::rest_pat_in_fully_bound_structs,
    clippy::same_name_method,
    clippy::semicolon_inside_block,
    clippy::unseparated_literal_suffix,
    clippy::string_to_string,
    clippy::todo,
    clippy::unimplemented,
    clippy::unneeded_field_pattern,
    clippy::wildcard_enum_match_arm,
    let_underscore_drop,
    macro_use_extern_crate,
    missing_debug_implementations,
    unused_crate_dependencies,
    unused_qualifications,
    clippy::unwrap_used
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

mod build_info;
mod check;
mod cli;
mod ice;
mod io;

use std::process::ExitCode;

use anyhow::bail;
use clap::Parser;
use dtc_forest::BuildOptions;
use log::debug;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

use crate::cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
    ice::setup_panic_hook();

    // `log` records from the library crates are forwarded to this subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.version {
        println!("{}", build_info::version());
        return Ok(ExitCode::SUCCESS);
    }

    let Some(path) = cli.path else {
        bail!("no input file provided");
    };

    let mut contracts = cli.given;
    if let Some(file) = cli.contracts {
        contracts.extend(io::read_contracts(&file)?);
    }
    debug!("checking {} with {} contract(s)", path.display(), contracts.len());

    let result = check::check(
        &path,
        &contracts,
        cli.emit,
        BuildOptions {
            skip_missing_imports: cli.skip_missing_imports,
        },
    );

    match result {
        Ok(output) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(diagnostic) => {
            eprintln!("{diagnostic}");
            Ok(ExitCode::FAILURE)
        }
    }
}
