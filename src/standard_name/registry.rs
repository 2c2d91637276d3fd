//! standard_name::registry
//!
//! Process-wide registration of standard-name tables under their
//! `<name>-<version>` key, persisted in the user directory.

use std::path::PathBuf;

use super::table::{StandardNameTable, TableError};
use crate::core::paths::UserDirs;

/// Register a table under its versionname.
///
/// Writes `<tables dir>/<name>-<version>.yaml`, stamping the
/// modification time.
///
/// # Errors
///
/// Returns `TableError::AlreadyRegistered` when the key exists and
/// `overwrite` is false.
pub fn register(
    table: &mut StandardNameTable,
    dirs: &UserDirs,
    overwrite: bool,
) -> Result<PathBuf, TableError> {
    dirs.ensure_dirs()?;
    let path = dirs.table_path(&table.versionname());
    if path.exists() && !overwrite {
        return Err(TableError::AlreadyRegistered(table.versionname()));
    }
    table.to_yaml(&path)?;
    tracing::info!(versionname = %table.versionname(), path = %path.display(), "registered table");
    Ok(path)
}

/// Load a registered table by versionname, or by bare name when that
/// is unambiguous.
///
/// # Errors
///
/// `TableError::NotRegistered` when nothing matches,
/// `TableError::Ambiguous` when a bare name matches several versions.
pub fn load_registered(dirs: &UserDirs, name: &str) -> Result<StandardNameTable, TableError> {
    let exact = dirs.table_path(name);
    if exact.exists() {
        return StandardNameTable::from_yaml(&exact);
    }

    let candidates: Vec<String> = registered_names(dirs)?
        .into_iter()
        .filter(|versionname| {
            versionname == name || versionname.starts_with(&format!("{name}-v"))
        })
        .collect();
    match candidates.as_slice() {
        [] => Err(TableError::NotRegistered(name.to_string())),
        [single] => StandardNameTable::from_yaml(&dirs.table_path(single)),
        _ => Err(TableError::Ambiguous(name.to_string(), candidates)),
    }
}

/// All registered versionnames, sorted.
pub fn registered_names(dirs: &UserDirs) -> Result<Vec<String>, TableError> {
    let dir = dirs.standard_name_tables_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        })
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    names.sort();
    Ok(names)
}

/// Load every registered table, sorted by versionname.
pub fn list_registered(dirs: &UserDirs) -> Result<Vec<StandardNameTable>, TableError> {
    registered_names(dirs)?
        .iter()
        .map(|name| StandardNameTable::from_yaml(&dirs.table_path(name)))
        .collect()
}
