//! standard_name::name
//!
//! The [`StandardName`] type and its syntax rules.
//!
//! A standard name is a controlled-vocabulary variable identifier in
//! the climate-forecast style: lowercase words joined by underscores,
//! carrying a canonical physical unit and a description.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::Pattern;
use crate::units::{Unit, UnitsError};

/// Errors from standard-name syntax checking.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StandardNameError {
    #[error("standard name must not be empty")]
    Empty,

    #[error("invalid characters in standard name '{name}': characters matching '{disallowed}' are not allowed")]
    InvalidCharacters { name: String, disallowed: String },

    #[error("standard name '{name}' matches the forbidden pattern '{pattern}'")]
    ForbiddenPattern { name: String, pattern: String },
}

/// Character and pattern rules a table imposes on its names.
///
/// - `disallowed` matches characters that must not appear anywhere
/// - `forbidden` is a pattern the whole name must *not* match
///   (by default: names starting with a digit or a space)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxRules {
    pub disallowed: Pattern,
    pub forbidden: Pattern,
}

/// Characters that are not allowed anywhere in a name.
pub const DEFAULT_DISALLOWED: &str = "[^a-zA-Z0-9_]";

/// Pattern a name must not match (leading digit or space).
pub const DEFAULT_FORBIDDEN: &str = "^[0-9 ].*";

impl Default for SyntaxRules {
    fn default() -> Self {
        // both defaults are literals; compilation cannot fail
        let disallowed = Pattern::new(DEFAULT_DISALLOWED).expect("default disallowed pattern");
        let forbidden = Pattern::new(DEFAULT_FORBIDDEN).expect("default forbidden pattern");
        Self {
            disallowed,
            forbidden,
        }
    }
}

impl SyntaxRules {
    /// Check a candidate name against these rules.
    ///
    /// # Errors
    ///
    /// Returns the specific [`StandardNameError`] kind on violation.
    pub fn check(&self, name: &str) -> Result<(), StandardNameError> {
        if name.is_empty() {
            return Err(StandardNameError::Empty);
        }
        if name.chars().any(|c| {
            let mut buf = [0u8; 4];
            self.disallowed.matches(c.encode_utf8(&mut buf))
        }) {
            return Err(StandardNameError::InvalidCharacters {
                name: name.to_string(),
                disallowed: self.disallowed.as_str().to_string(),
            });
        }
        if self.forbidden.matches(name) {
            return Err(StandardNameError::ForbiddenPattern {
                name: name.to_string(),
                pattern: self.forbidden.as_str().to_string(),
            });
        }
        Ok(())
    }
}

/// A standard name: identifier, canonical unit, and description.
///
/// # Example
///
/// ```
/// use h5conv::standard_name::StandardName;
///
/// let sn = StandardName::new("x_velocity", "m/s", "x component of velocity").unwrap();
/// assert!(sn.equal_unit("m s^-1").unwrap());
/// assert!(!sn.equal_unit("kg").unwrap());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardName {
    name: String,
    units: Unit,
    description: String,
}

impl StandardName {
    /// Create a standard name, validating syntax (default rules) and
    /// parsing the unit.
    ///
    /// # Errors
    ///
    /// Returns [`StandardNameError`] on syntax violations; unit parse
    /// failures surface as [`UnitsError`] through `From`.
    pub fn new(
        name: &str,
        units: &str,
        description: &str,
    ) -> Result<Self, StandardNameBuildError> {
        Self::with_rules(name, units, description, &SyntaxRules::default())
    }

    /// Create a standard name under explicit table rules.
    pub fn with_rules(
        name: &str,
        units: &str,
        description: &str,
        rules: &SyntaxRules,
    ) -> Result<Self, StandardNameBuildError> {
        rules.check(name)?;
        let units = Unit::parse(units)?;
        Ok(Self {
            name: name.to_string(),
            units,
            description: description.to_string(),
        })
    }

    /// Build from an already-parsed unit (used by transformations).
    pub(crate) fn from_parts(name: String, units: Unit, description: String) -> Self {
        Self {
            name,
            units,
            description,
        }
    }

    /// Syntax check against the default rules.
    ///
    /// # Errors
    ///
    /// Returns the specific [`StandardNameError`] kind on violation.
    pub fn check_syntax(name: &str) -> Result<(), StandardNameError> {
        SyntaxRules::default().check(name)
    }

    /// The identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The canonical unit.
    pub fn units(&self) -> &Unit {
        &self.units
    }

    /// The description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Compare this name's canonical unit with another unit expression
    /// by base-unit equivalence.
    ///
    /// # Errors
    ///
    /// Returns `UnitsError` if the other expression does not parse.
    pub fn equal_unit(&self, other: &str) -> Result<bool, UnitsError> {
        Ok(self.units.base_equivalent(&Unit::parse(other)?))
    }
}

impl std::fmt::Display for StandardName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Errors from building a standard name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StandardNameBuildError {
    #[error(transparent)]
    Syntax(#[from] StandardNameError),

    #[error(transparent)]
    Units(#[from] UnitsError),
}
