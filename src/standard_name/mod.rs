//! standard_name
//!
//! Controlled vocabularies for dataset identifiers: the
//! [`StandardName`] type, the [`StandardNameTable`] with its lookup
//! and transformation engine, and table persistence (YAML, XML,
//! Markdown/LaTeX renderings).
//!
//! # Lookup
//!
//! `table.resolve(name)` tries, in order: the table itself, the
//! transformation strategy list (first match wins), and the alias
//! maps. Failures carry similarity-based suggestions. Unknown device
//! or location tokens inside a transformation are a *distinct* error
//! kind from "name not found" - they indicate a misconfigured
//! vocabulary rather than a misspelled name.

pub mod name;
pub mod registry;
pub mod table;
pub mod transform;
pub mod xml;

pub use name::{StandardName, StandardNameBuildError, StandardNameError, SyntaxRules};
pub use table::{NameCheckIssue, StandardNameTable, TableEntry, TableError};

use thiserror::Error;

use crate::units::UnitsError;

/// Similarity ratio above which a known name is offered as a
/// suggestion in "not found" errors.
pub const SIMILARITY_THRESHOLD: f64 = 0.75;

/// Vocabulary kind referenced by a transformation affix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffixKind {
    Device,
    Location,
}

impl std::fmt::Display for AffixKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AffixKind::Device => write!(f, "device"),
            AffixKind::Location => write!(f, "location"),
        }
    }
}

/// Errors from standard-name resolution.
#[derive(Debug, Error, PartialEq)]
pub enum LookupError {
    /// The name is unknown, after exhausting direct lookup,
    /// transformations, and aliases.
    #[error("standard name '{name}' not found in standard name table '{table}'{}", render_suggestions(.suggestions))]
    NotFound {
        name: String,
        table: String,
        suggestions: Vec<String>,
    },

    /// A transformation referenced a device/location token that is not
    /// registered in the table's vocabulary.
    #[error("{kind} '{token}' not found in registry of standard name table '{table}'; available {kind}s: {available:?}")]
    UnknownAffix {
        kind: AffixKind,
        token: String,
        table: String,
        available: Vec<String>,
    },

    /// Two operands of a difference transformation carry incompatible
    /// units.
    #[error("units of '{left}' ('{left_units}') and '{right}' ('{right_units}') are not compatible")]
    IncompatibleOperands {
        left: String,
        left_units: String,
        right: String,
        right_units: String,
    },

    /// A unit expression failed to parse during resolution.
    #[error(transparent)]
    Units(#[from] UnitsError),

    /// A synthesized or stored name violates the table's syntax rules.
    #[error(transparent)]
    Syntax(#[from] StandardNameError),
}

fn render_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else {
        format!(". Did you mean one of these: {suggestions:?}?")
    }
}
