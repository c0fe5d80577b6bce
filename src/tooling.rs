//! Tooling & Integration Layer
//!
//! Command-line surface over tree building, subtree retrieval and treemap export.

pub mod cli;
mod format;

pub use cli::{Cli, CliContext, Commands};
