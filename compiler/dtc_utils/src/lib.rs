//! Shared utilities for the dtc contract checker
//!
//! This crate contains small building blocks used by every other crate in the
//! workspace: [source spans](span), [line lookup](line_finder) and
//! [code formatting helpers](code_fmt).

#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    clippy::missing_docs_in_private_items,
    missing_docs
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

pub mod code_fmt;
pub mod line_finder;
pub mod span;
