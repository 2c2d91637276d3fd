//! core::config
//!
//! Global configuration schema and loading.
//!
//! # Location
//!
//! `<user dir>/config.toml` (see [`crate::core::paths::UserDirs`]).
//!
//! # Validation
//!
//! Config values are validated after parsing to ensure they conform to
//! expected formats (e.g. the similarity threshold must be within
//! `0.0..=1.0`).

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// default_convention = "tbx"
///
/// [check]
/// recursive = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Convention an embedding application activates at startup
    pub default_convention: Option<String>,

    /// Defaults for file checking
    pub check: Option<CheckDefaults>,
}

impl GlobalConfig {
    /// Load the configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on unreadable or malformed files, or on
    /// invalid values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: GlobalConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(name) = &self.default_convention {
            if name.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "default_convention cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// File-checking defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CheckDefaults {
    /// Walk the hierarchy recursively
    pub recursive: Option<bool>,
}
