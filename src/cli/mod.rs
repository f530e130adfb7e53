//! Command-line interface for chorale.
//!
//! This module provides CLI commands for indexing the collection,
//! managing scan folders, and maintaining the artwork cache.

mod commands;

pub use commands::{Cli, Commands, run_command};
