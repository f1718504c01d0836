//! Defines the dtc command line interface

use std::path::PathBuf;

use clap::Parser;
use derive_more::Display;

/// Check type contracts on a Python program without running it
#[derive(Debug, Parser)]
#[command(version=None)]
pub struct Cli {
    /// See what version of dtc you are using
    #[arg(short, long)]
    pub version: bool,

    /// The entry file of the program to check
    pub path: Option<PathBuf>,

    /// A contract to check, written as `name(param=TYPE, ...) -> TYPE`
    ///
    /// May be given more than once.
    #[arg(short, long, value_name = "CONTRACT")]
    pub given: Vec<String>,

    /// A file of contracts, one per line. Lines starting with `#` are
    /// ignored.
    #[arg(short, long, value_name = "FILE")]
    pub contracts: Option<PathBuf>,

    /// What output format to emit
    #[arg(long)]
    #[clap(default_value_t = OutputFormat::Check)]
    pub emit: OutputFormat,

    /// Skip imports that have no file next to the entry file, such as
    /// standard library modules
    #[arg(long)]
    pub skip_missing_imports: bool,
}

/// The list of possible outputs `dtc` can emit
///
/// Usually you will want to use `check`.
#[derive(Debug, Clone, Copy, clap::ValueEnum, PartialEq, Eq, Display)]
pub enum OutputFormat {
    /// Check every contract and report the result
    #[display("check")]
    Check,
    /// The loaded program, stringified to Python again
    ///
    /// Imported units follow the entry file, and compound expressions gain
    /// parentheses.
    #[display("ast")]
    Ast,
    /// The loaded program's syntax tree, in Rust-like format
    #[display("ast-debug")]
    AstDebug,
    /// The contracts after normalization, without checking them
    #[display("contracts")]
    Contracts,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn contracts_may_be_repeated() {
        let cli = Cli::try_parse_from([
            "dtc",
            "main.py",
            "--given",
            "f(x=int) -> None",
            "-g",
            "g(y=str) -> str",
            "--emit",
            "contracts",
        ])
        .expect("arguments should parse");

        assert_eq!(cli.path, Some(PathBuf::from("main.py")));
        assert_eq!(cli.given, vec!["f(x=int) -> None", "g(y=str) -> str"]);
        assert_eq!(cli.emit, OutputFormat::Contracts);
        assert!(!cli.skip_missing_imports);
    }

    #[test]
    fn check_is_the_default_output() {
        let cli = Cli::try_parse_from(["dtc", "main.py"]).expect("arguments should parse");

        assert_eq!(cli.emit, OutputFormat::Check);
        assert!(cli.given.is_empty());
        assert_eq!(cli.contracts, None);
    }

    #[test]
    fn unknown_outputs_are_rejected() {
        assert!(Cli::try_parse_from(["dtc", "main.py", "--emit", "llvm"]).is_err());
    }
}
