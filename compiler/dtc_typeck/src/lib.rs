//! Contract checker for dtc
//!
//! This crate checks user-declared type contracts against a Python program
//! without running it. The pieces build on each other:
//!
//! - [`ty`] defines type names and the flat [type sets](ty::TypeSet) every
//!   answer is expressed in.
//! - [`contract`] normalizes raw type specifications and keeps the registry of
//!   contracts.
//! - [`infer`] infers the types an expression may hold.
//! - [`verify`] checks every call site of every contracted function.
//! - [`Session`] ties a loaded program to its contracts.

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

pub mod contract;
pub mod infer;
mod session;
pub mod ty;
pub mod verify;

pub use session::Session;
