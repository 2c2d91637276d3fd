//! core::paths
//!
//! Centralized path routing for user-scoped storage locations.
//!
//! # Architecture
//!
//! All registries (conventions, standard-name tables, layouts) live
//! under a single user directory. No code outside this module should
//! compute registry paths by hand.
//!
//! # Storage Layout
//!
//! All data is stored under `<root>/`:
//! - `config.toml` - Global configuration
//! - `conventions/` - Registered convention documents (YAML)
//! - `standard_name_tables/` - Registered tables (`<name>-<version>.yaml`)
//! - `layouts/` - Registered layout specifications (JSON)
//!
//! The root is `$H5CONV_HOME` if set, otherwise the platform config
//! directory (e.g. `~/.config/h5conv`).
//!
//! # Example
//!
//! ```
//! use h5conv::core::paths::UserDirs;
//! use std::path::PathBuf;
//!
//! let dirs = UserDirs::at(PathBuf::from("/home/u/.config/h5conv"));
//! assert_eq!(
//!     dirs.config_path(),
//!     PathBuf::from("/home/u/.config/h5conv/config.toml")
//! );
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the storage root.
pub const HOME_ENV: &str = "H5CONV_HOME";

/// Centralized path routing for user-scoped storage.
///
/// # Invariants
///
/// - All registry storage lives below a single root
/// - No code outside this module computes registry subpaths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDirs {
    root: PathBuf,
}

impl UserDirs {
    /// Create UserDirs rooted at an explicit directory.
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    /// Discover the storage root.
    ///
    /// Resolution order:
    /// 1. `$H5CONV_HOME` if set and non-empty
    /// 2. `<platform config dir>/h5conv`
    /// 3. `.h5conv` in the current directory as a last resort
    pub fn discover() -> Self {
        if let Ok(home) = std::env::var(HOME_ENV) {
            if !home.is_empty() {
                return Self::at(PathBuf::from(home));
            }
        }
        match dirs::config_dir() {
            Some(cfg) => Self::at(cfg.join("h5conv")),
            None => Self::at(PathBuf::from(".h5conv")),
        }
    }

    /// The storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the global configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Directory of registered convention documents.
    pub fn conventions_dir(&self) -> PathBuf {
        self.root.join("conventions")
    }

    /// Directory of registered standard-name tables.
    pub fn standard_name_tables_dir(&self) -> PathBuf {
        self.root.join("standard_name_tables")
    }

    /// Directory of registered layout specifications.
    pub fn layouts_dir(&self) -> PathBuf {
        self.root.join("layouts")
    }

    /// Path a registered table is stored at (`<name>-<version>.yaml`).
    pub fn table_path(&self, versionname: &str) -> PathBuf {
        self.standard_name_tables_dir()
            .join(format!("{versionname}.yaml"))
    }

    /// Path a registered layout is stored at (`<name>.json`).
    pub fn layout_path(&self, name: &str) -> PathBuf {
        self.layouts_dir().join(format!("{name}.json"))
    }

    /// Path a registered convention is stored at (`<name>.yaml`).
    pub fn convention_path(&self, name: &str) -> PathBuf {
        self.conventions_dir().join(format!("{name}.yaml"))
    }

    /// Ensure the storage directory structure exists.
    ///
    /// # Errors
    ///
    /// Returns an IO error if directory creation fails.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.conventions_dir())?;
        std::fs::create_dir_all(self.standard_name_tables_dir())?;
        std::fs::create_dir_all(self.layouts_dir())?;
        Ok(())
    }
}
