//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialize diagnostics
//! - Delegate to command handlers
//! - Does NOT perform file mutations directly
//!
//! The CLI layer is thin: it parses arguments via clap and dispatches
//! into the library layers.

pub mod args;
pub mod commands;

pub use args::{Cli, Command, Shell};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let default_filter = if cli.debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    commands::dispatch(cli.command, cli.quiet)
}
