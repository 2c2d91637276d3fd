//! cli::args
//!
//! Command-line argument definitions using clap derive.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use clap_complete::Shell;

/// h5conv - conventions and layout validation for hierarchical
/// scientific data files
#[derive(Parser, Debug)]
#[command(name = "h5c")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage and apply layout specifications
    #[command(subcommand)]
    Layout(LayoutCommand),

    /// Inspect standard-name tables and check files against them
    #[command(name = "standard-name", subcommand)]
    StandardName(StandardNameCommand),

    /// Print the structure of a data file
    Dump {
        /// The data file to dump
        file: PathBuf,
    },

    /// Show the user configuration directories
    UserDirs,

    /// Generate shell completions
    Completion {
        /// Target shell
        shell: Shell,
    },
}

/// Layout subcommands.
#[derive(Subcommand, Debug)]
pub enum LayoutCommand {
    /// List registered layouts
    List,

    /// Register a layout file under a name
    Register {
        /// Path of the layout specification (JSON)
        file: PathBuf,

        /// Registry name; defaults to the file stem
        #[arg(long)]
        name: Option<String>,

        /// Replace an existing registration
        #[arg(long)]
        overwrite: bool,
    },

    /// Delete a registered layout
    Delete {
        /// Registry name
        name: String,
    },

    /// Validate a data file against a layout
    Check {
        /// Registered layout name, or path of a layout file
        layout: String,

        /// The data file to validate
        file: PathBuf,
    },
}

/// Standard-name subcommands.
#[derive(Subcommand, Debug)]
pub enum StandardNameCommand {
    /// List registered standard-name tables
    List,

    /// Check a data file's standard names against a table
    Check {
        /// Registered table name, or path of a table file (YAML/XML)
        table: String,

        /// The data file to check
        file: PathBuf,

        /// Only check root-level datasets
        #[arg(long)]
        no_recursive: bool,
    },
}
