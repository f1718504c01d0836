//! Diagnostics for the dtc contract checker
//!
//! Every fallible operation in the workspace returns a [`Diagnostic`]: a
//! [`Severity`] together with a spanned [`DiagnosticKind`]. The kinds cover the
//! whole pipeline, from lexing and parsing a source unit, through loading the
//! import forest and registering contracts, to inference failures and the
//! contract violations that are the point of the whole exercise.

#![warn(
    clippy::cargo,
    clippy::nursery,
    clippy::pedantic,
    clippy::missing_docs_in_private_items,
    missing_docs
)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

mod diagnostic;
mod diagnostic_kind;
mod ext;
mod fmt;

pub use diagnostic::{Diagnostic, Severity};
pub use diagnostic_kind::DiagnosticKind;
pub use ext::{SpanExt, SpannedExt};
