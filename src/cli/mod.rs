//! Command-line interface
//!
//! Handlers behind the `lindasign` binary.

pub mod commands;

pub use commands::*;
