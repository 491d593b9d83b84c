//! Subcommand implementations

pub mod catalog;
pub mod diagnostics;
pub mod search;
