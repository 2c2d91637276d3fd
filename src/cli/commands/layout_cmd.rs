//! cli::commands::layout_cmd
//!
//! The `layout` subcommands: list, register, delete, check.

use std::path::Path;

use anyhow::{Context, Result};

use crate::cli::args::LayoutCommand;
use crate::core::paths::UserDirs;
use crate::layout::{registry, Layout};

pub fn run(command: LayoutCommand, dirs: &UserDirs, quiet: bool) -> Result<()> {
    match command {
        LayoutCommand::List => {
            for name in registry::registered_names(dirs)? {
                println!("{name}");
            }
            Ok(())
        }

        LayoutCommand::Register {
            file,
            name,
            overwrite,
        } => {
            let layout = Layout::load(&file)
                .with_context(|| format!("cannot load layout from {}", file.display()))?;
            let name = match name {
                Some(name) => name,
                None => file
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .context("cannot derive a layout name; pass --name")?
                    .to_string(),
            };
            registry::register(&layout, &name, dirs, overwrite)?;
            if !quiet {
                println!("registered layout '{name}'");
            }
            Ok(())
        }

        LayoutCommand::Delete { name } => {
            registry::delete_registered(dirs, &name)?;
            if !quiet {
                println!("deleted layout '{name}'");
            }
            Ok(())
        }

        LayoutCommand::Check { layout, file } => {
            let spec = resolve_layout(&layout, dirs)?;
            let report = spec.validate_path(&file)?;
            if !quiet {
                print!("{}", report.render());
            }
            if report.is_ok() {
                Ok(())
            } else {
                anyhow::bail!("{} required check(s) failed", report.fails())
            }
        }
    }
}

/// A registered name first, a file path second.
fn resolve_layout(name_or_path: &str, dirs: &UserDirs) -> Result<Layout> {
    match registry::load_registered(dirs, name_or_path) {
        Ok(layout) => Ok(layout),
        Err(_) if Path::new(name_or_path).exists() => {
            Layout::load(Path::new(name_or_path)).map_err(Into::into)
        }
        Err(e) => Err(e.into()),
    }
}
