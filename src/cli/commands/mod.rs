//! cli::commands
//!
//! Command handlers. Each handler is a thin adapter from parsed
//! arguments to the library layers.

mod completion;
mod dump;
mod layout_cmd;
mod standard_name_cmd;
mod user_dirs;

use anyhow::{Context, Result};

use super::args::Command;
use crate::core::config::GlobalConfig;
use crate::core::paths::UserDirs;

/// Dispatch a parsed command.
pub fn dispatch(command: Command, quiet: bool) -> Result<()> {
    let dirs = UserDirs::discover();
    let config = GlobalConfig::load(&dirs.config_path())
        .with_context(|| format!("invalid config at {}", dirs.config_path().display()))?;
    match command {
        Command::Layout(cmd) => layout_cmd::run(cmd, &dirs, quiet),
        Command::StandardName(cmd) => standard_name_cmd::run(cmd, &dirs, &config, quiet),
        Command::Dump { file } => dump::run(&file),
        Command::UserDirs => user_dirs::run(&dirs),
        Command::Completion { shell } => completion::run(shell),
    }
}
