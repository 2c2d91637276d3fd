//! layout
//!
//! Declarative structural validation of hierarchical data files.
//!
//! # Usage
//!
//! A [`Layout`] is built declaratively, then validated against a file
//! or a path. Wildcard nodes (`*`) let one rule cover every matching
//! object; optional nodes express advisory structure.
//!
//! ```
//! use h5conv::convention::Convention;
//! use h5conv::layout::{Layout, ValueMatcher};
//! use h5conv::store::{AttrInit, DataFile};
//!
//! let mut layout = Layout::new();
//! layout.root().require_attr("title", ValueMatcher::Any);
//! layout.group("*").optional_attr("long_name", ValueMatcher::Any);
//!
//! let convention = Convention::baseline();
//! let mut file = DataFile::create(&convention, AttrInit::new()).unwrap();
//! file.create_group(&convention, "/", "grp", AttrInit::new()).unwrap();
//!
//! let report = layout.validate(&file);
//! // 'title' is missing (required), 'long_name' is advisory
//! assert_eq!(report.fails(), 1);
//! ```
//!
//! # Propagation policy
//!
//! Layout checking is a *reporting* mechanism: violations accumulate
//! in the [`Report`] and never abort. This is deliberately different
//! from attribute validation, which gates writes and fails closed.

pub mod registry;
pub mod report;
pub mod spec;

pub use report::{Report, ValidationResult};
pub use spec::{AttrSpec, DatasetProperty, DatasetSpec, GroupSpec, Matcher, PropSpec, ValueMatcher};

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::ObjectPath;
use crate::store::{DataFile, StoreError};

/// Errors from layout persistence and path validation.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("cannot read or write layout: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse layout: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("layout '{0}' is already registered (pass overwrite to replace)")]
    AlreadyRegistered(String),

    #[error("no registered layout named '{0}'")]
    NotRegistered(String),
}

/// A declarative structural specification, validated by tree-walking.
///
/// The root is a pure container: its attribute checks run against the
/// file root's attributes, its child nodes against the root's
/// children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    root: RootSpec,
}

/// The root container: like a group spec, but with no identity of its
/// own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct RootSpec(GroupSpec);

impl Default for RootSpec {
    fn default() -> Self {
        Self(GroupSpec::new(Matcher::Any))
    }
}

impl Layout {
    /// An empty layout that validates anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// The root container, for attribute and dataset rules on the
    /// file root itself.
    pub fn root(&mut self) -> &mut GroupSpec {
        &mut self.root.0
    }

    /// A group rule at the top level. `*` matches every group in the
    /// file (recursively); `a/b` style paths nest.
    pub fn group(&mut self, path: &str) -> &mut GroupSpec {
        let mut current = &mut self.root.0;
        for component in path.split('/').filter(|c| !c.is_empty()) {
            current = current.group(component);
        }
        current
    }

    /// A dataset rule on the file root level.
    pub fn dataset(&mut self, name: &str) -> &mut DatasetSpec {
        self.root.0.dataset(name)
    }

    /// Validate an open file.
    ///
    /// Results are fresh per call; the layout itself is never
    /// mutated.
    pub fn validate(&self, file: &DataFile) -> Report {
        let base = ObjectPath::root();
        let root = file.root();
        let mut results = Vec::new();
        for attr in &self.root.0.attrs {
            results.extend(attr.validate(&root.attributes, &base));
        }
        for dataset in &self.root.0.datasets {
            results.extend(dataset.validate(root, &base));
        }
        for group in &self.root.0.groups {
            results.extend(group.validate(root, &base));
        }
        tracing::debug!(
            checks = results.len(),
            fails = results.iter().filter(|r| r.failed()).count(),
            "layout validated"
        );
        Report::new(results)
    }

    /// Validate a file on disk: open read-only, validate, close.
    ///
    /// # Errors
    ///
    /// Returns `LayoutError::Store` when the file cannot be opened.
    pub fn validate_path(&self, path: &Path) -> Result<Report, LayoutError> {
        let file = DataFile::open(path)?;
        Ok(self.validate(&file))
    }

    /// Persist as JSON. A saved-and-loaded layout reproduces
    /// identical validation behavior.
    pub fn save(&self, path: &Path) -> Result<(), LayoutError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a persisted layout.
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Render the specification tree for inspection.
    pub fn dumps(&self) -> String {
        let mut out = String::new();
        self.root.0.dumps_into(0, &mut out);
        out
    }
}
