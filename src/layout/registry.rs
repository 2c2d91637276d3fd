//! layout::registry
//!
//! Named layout registration in the user directory.

use super::{Layout, LayoutError};
use crate::core::paths::UserDirs;

/// Register a layout under a name.
///
/// # Errors
///
/// Returns `LayoutError::AlreadyRegistered` when the name is taken
/// and `overwrite` is false.
pub fn register(
    layout: &Layout,
    name: &str,
    dirs: &UserDirs,
    overwrite: bool,
) -> Result<(), LayoutError> {
    dirs.ensure_dirs()?;
    let path = dirs.layout_path(name);
    if path.exists() && !overwrite {
        return Err(LayoutError::AlreadyRegistered(name.to_string()));
    }
    layout.save(&path)?;
    tracing::info!(layout = name, path = %path.display(), "registered layout");
    Ok(())
}

/// Load a registered layout by name.
///
/// # Errors
///
/// Returns `LayoutError::NotRegistered` when nothing is stored under
/// the name.
pub fn load_registered(dirs: &UserDirs, name: &str) -> Result<Layout, LayoutError> {
    let path = dirs.layout_path(name);
    if !path.exists() {
        return Err(LayoutError::NotRegistered(name.to_string()));
    }
    Layout::load(&path)
}

/// Delete a registered layout.
///
/// # Errors
///
/// Returns `LayoutError::NotRegistered` when nothing is stored under
/// the name.
pub fn delete_registered(dirs: &UserDirs, name: &str) -> Result<(), LayoutError> {
    let path = dirs.layout_path(name);
    if !path.exists() {
        return Err(LayoutError::NotRegistered(name.to_string()));
    }
    std::fs::remove_file(path)?;
    Ok(())
}

/// Registered layout names, sorted.
pub fn registered_names(dirs: &UserDirs) -> Result<Vec<String>, LayoutError> {
    let dir = dirs.layouts_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
        .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ValueMatcher;

    fn test_dirs() -> (tempfile::TempDir, UserDirs) {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = UserDirs::at(tmp.path().to_path_buf());
        (tmp, dirs)
    }

    fn demo_layout() -> Layout {
        let mut layout = Layout::new();
        layout.root().require_attr("title", ValueMatcher::Any);
        layout
    }

    #[test]
    fn register_load_delete() {
        let (_tmp, dirs) = test_dirs();
        register(&demo_layout(), "basic", &dirs, false).unwrap();
        assert_eq!(registered_names(&dirs).unwrap(), vec!["basic"]);

        let loaded = load_registered(&dirs, "basic").unwrap();
        assert_eq!(loaded, demo_layout());

        delete_registered(&dirs, "basic").unwrap();
        assert!(registered_names(&dirs).unwrap().is_empty());
        assert!(matches!(
            load_registered(&dirs, "basic"),
            Err(LayoutError::NotRegistered(_))
        ));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let (_tmp, dirs) = test_dirs();
        register(&demo_layout(), "basic", &dirs, false).unwrap();
        assert!(matches!(
            register(&demo_layout(), "basic", &dirs, false),
            Err(LayoutError::AlreadyRegistered(_))
        ));
        assert!(register(&demo_layout(), "basic", &dirs, true).is_ok());
    }

    #[test]
    fn delete_missing_errors() {
        let (_tmp, dirs) = test_dirs();
        assert!(matches!(
            delete_registered(&dirs, "nope"),
            Err(LayoutError::NotRegistered(_))
        ));
    }
}
