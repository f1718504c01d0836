//! Lexer and parser for the Python subset understood by dtc
//!
//! The [`parser`] module is the entry point: [`parser::parse_program`] turns a
//! source unit into an [AST](ast) whose nodes all carry spans, and
//! [`contract::parse_contract`] reads `name(param=SPEC) -> SPEC` contract
//! declarations.

#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    clippy::missing_docs_in_private_items,
    missing_docs
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

pub mod ast;
pub mod contract;
pub mod lexer;
pub mod parser;
pub mod python_lexer;
pub mod python_parser;
