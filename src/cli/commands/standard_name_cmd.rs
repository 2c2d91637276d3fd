//! cli::commands::standard_name_cmd
//!
//! The `standard-name` subcommands: list registered tables, check a
//! file against a table.

use std::path::Path;

use anyhow::Result;

use crate::cli::args::StandardNameCommand;
use crate::core::config::GlobalConfig;
use crate::core::paths::UserDirs;
use crate::standard_name::{registry, xml, StandardNameTable};
use crate::store::DataFile;

pub fn run(
    command: StandardNameCommand,
    dirs: &UserDirs,
    config: &GlobalConfig,
    quiet: bool,
) -> Result<()> {
    match command {
        StandardNameCommand::List => {
            for table in registry::list_registered(dirs)? {
                println!("{} ({} entries)", table.versionname(), table.len());
            }
            Ok(())
        }

        StandardNameCommand::Check {
            table,
            file,
            no_recursive,
        } => {
            let recursive = !no_recursive
                && config
                    .check
                    .as_ref()
                    .and_then(|c| c.recursive)
                    .unwrap_or(true);
            let table = resolve_table(&table, dirs)?;
            let data = DataFile::open(&file)?;
            let issues = table.check_file(&data, recursive);
            if !quiet {
                for issue in &issues {
                    println!("{issue}");
                }
            }
            if issues.is_empty() {
                if !quiet {
                    println!("all standard names valid against '{}'", table.versionname());
                }
                Ok(())
            } else {
                anyhow::bail!("{} dataset(s) failed the check", issues.len())
            }
        }
    }
}

/// A registered name first, a YAML/XML file path second.
fn resolve_table(name_or_path: &str, dirs: &UserDirs) -> Result<StandardNameTable> {
    if let Ok(table) = registry::load_registered(dirs, name_or_path) {
        return Ok(table);
    }
    let path = Path::new(name_or_path);
    if path.exists() {
        let table = match path.extension().and_then(|e| e.to_str()) {
            Some("xml") => xml::from_xml(path)?,
            _ => StandardNameTable::from_yaml(path)?,
        };
        return Ok(table);
    }
    anyhow::bail!("no registered table or file named '{name_or_path}'")
}
