//! Chorale - a music collection indexer.
//!
//! Walks configured music folders, reconciles what is on disk against a
//! SQLite track database, extracts and normalizes tag metadata, and
//! resolves album artwork (embedded, external, online) into a local
//! cache. Everything is driven from CLI subcommands.

pub mod artwork;
pub mod cli;
pub mod config;
pub mod error;
pub mod fields;
pub mod indexing;
pub mod keys;
pub mod metadata;
pub mod model;
pub mod repository;
pub mod scanner;
pub mod ticks;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(EnvFilter::from_default_env().add_directive("chorale=info".parse().unwrap()))
        .init();

    cli::run_command(&args)
}
