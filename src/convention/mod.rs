//! convention
//!
//! The convention engine: registration of standard attributes against
//! storage-object categories and creation operations, and the
//! derivation of per-operation [`CreationOptions`].
//!
//! # Architecture
//!
//! A [`Convention`] owns two tables:
//!
//! - `properties`: target category → attribute name → definition,
//!   used when setting/reading attributes on existing objects
//! - `methods`: creation operation → attribute name → requirement
//!   (optional/default/position/alternative), used to build the
//!   [`CreationOptions`] consumed by the creation operations in
//!   [`crate::store`]
//!
//! Rather than rewriting shared type definitions at activation time,
//! creation operations take the active convention explicitly and
//! derive a fresh options struct from it. Activating a convention is
//! therefore nothing more than a registry pointer swap, and the
//! activation state machine (exactly one current convention, explicit
//! deactivate-then-activate transition) lives in
//! [`registry::ConventionRegistry`].

pub mod registry;
pub mod standard_attribute;
pub mod validators;
pub mod yaml;

pub use registry::ConventionRegistry;
pub use standard_attribute::{ReadValue, ReturnType, StandardAttribute, StandardAttributeError};
pub use validators::{AttrContext, TypeDef, TypeSpec, Validator, ValidatorError};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::types::TypeError;
use crate::store::AttrValue;

/// Errors from convention definition and registration.
///
/// All of these are configuration errors: they surface at definition
/// or registration time, never at attribute-set time.
#[derive(Debug, Error)]
pub enum ConventionError {
    #[error("standard attribute '{name}' already registered for {target} in convention '{convention}' (pass overwrite to replace)")]
    DuplicateAttribute {
        convention: String,
        target: Target,
        name: String,
    },

    #[error("standard attribute '{name}' already bound to method '{method}' in convention '{convention}' (pass overwrite to replace)")]
    DuplicateBinding {
        convention: String,
        method: Method,
        name: String,
    },

    #[error("invalid standard attribute definition for '{name}': {reason}")]
    InvalidDefinition { name: String, reason: String },

    #[error("unknown validator key '{0}'")]
    UnknownValidator(String),

    #[error("unknown return type '{0}'")]
    UnknownReturnType(String),

    #[error("unknown target method '{0}': expected 'init', 'create_group' or 'create_dataset'")]
    UnknownMethod(String),

    #[error("no standard attribute '{name}' bound to method '{method}' in convention '{convention}'")]
    UnknownAttribute {
        convention: String,
        method: Method,
        name: String,
    },

    #[error("convention '{0}' is not registered")]
    UnknownConvention(String),

    #[error("convention '{0}' is already registered (pass overwrite to replace)")]
    AlreadyRegistered(String),

    #[error("cannot parse convention document: {0}")]
    Document(String),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("cannot read convention: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Storage-object category a standard attribute applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Target {
    File,
    Group,
    Dataset,
}

impl Target {
    /// The creation operation this category structurally corresponds
    /// to (used when a binding names no explicit method).
    pub fn default_method(&self) -> Method {
        match self {
            Target::File => Method::Init,
            Target::Group => Method::CreateGroup,
            Target::Dataset => Method::CreateDataset,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::File => write!(f, "file"),
            Target::Group => write!(f, "group"),
            Target::Dataset => write!(f, "dataset"),
        }
    }
}

/// A creation operation a standard attribute can augment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Method {
    /// File initialization.
    Init,
    /// Group creation.
    CreateGroup,
    /// Dataset creation.
    CreateDataset,
}

impl Method {
    /// The category of object this operation produces.
    pub fn target(&self) -> Target {
        match self {
            Method::Init => Target::File,
            Method::CreateGroup => Target::Group,
            Method::CreateDataset => Target::Dataset,
        }
    }

    /// Resolve a method key.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::UnknownMethod` for unrecognized keys.
    pub fn from_key(key: &str) -> Result<Self, ConventionError> {
        match key {
            "init" | "__init__" => Ok(Method::Init),
            "create_group" => Ok(Method::CreateGroup),
            "create_dataset" => Ok(Method::CreateDataset),
            other => Err(ConventionError::UnknownMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Init => write!(f, "init"),
            Method::CreateGroup => write!(f, "create_group"),
            Method::CreateDataset => write!(f, "create_dataset"),
        }
    }
}

/// Default-value policy of a standard attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// Required with no fallback ("positional").
    Empty,
    /// Optional; absent means the attribute is not written.
    None,
    /// A concrete default written when no value is supplied.
    Literal(AttrValue),
}

impl DefaultValue {
    /// Parse the document form: `$empty`, `$none`, or a literal.
    pub fn from_attr_value(value: AttrValue) -> Self {
        if let AttrValue::Str(s) = &value {
            match s.to_lowercase().as_str() {
                "$empty" => return DefaultValue::Empty,
                "$none" | "none" => return DefaultValue::None,
                _ => {}
            }
        }
        DefaultValue::Literal(value)
    }
}

/// Insertion point of an attribute in a creation operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// Insert before the named attribute.
    Before(String),
    /// Insert after the named attribute.
    After(String),
}

/// Injection metadata of one attribute on one creation operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    /// The attribute definition (shared across targets).
    pub attribute: Arc<StandardAttribute>,
    /// Optional attributes never fail the creation when absent.
    pub optional: bool,
    /// Effective default policy for this operation.
    pub default: DefaultValue,
    /// Position in the derived options listing.
    pub position: Option<Position>,
    /// Fallback attribute satisfying the same requirement.
    pub alternative: Option<String>,
}

impl Requirement {
    /// Required with no fallback value.
    pub fn is_required(&self) -> bool {
        !self.optional && matches!(self.default, DefaultValue::Empty)
    }
}

/// A registration request for [`Convention::add`].
///
/// Only `attribute` is mandatory; everything else defaults to the
/// attribute's own declaration.
#[derive(Debug, Clone)]
pub struct AttrBinding {
    /// The attribute definition.
    pub attribute: StandardAttribute,
    /// Target categories; empty means "infer from the attribute's
    /// target methods".
    pub targets: Vec<Target>,
    /// Explicit method; `None` means "infer from the target category".
    pub method: Option<Method>,
    /// Record the attribute in the method-injection table.
    pub inject: bool,
    /// Mark the binding optional.
    pub optional: bool,
    /// Override the attribute's alternative.
    pub alternative: Option<String>,
    /// Override the attribute's position.
    pub position: Option<Position>,
    /// Override the attribute's default policy.
    pub default_value: Option<DefaultValue>,
    /// Replace an existing registration.
    pub overwrite: bool,
}

impl AttrBinding {
    /// Bind an attribute with defaults taken from its declaration.
    pub fn new(attribute: StandardAttribute) -> Self {
        Self {
            attribute,
            targets: Vec::new(),
            method: None,
            inject: true,
            optional: false,
            alternative: None,
            position: None,
            default_value: None,
            overwrite: false,
        }
    }

    /// Mark the binding optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Name a fallback attribute.
    pub fn alternative(mut self, name: &str) -> Self {
        self.alternative = Some(name.to_string());
        self
    }

    /// Set the position in the options listing.
    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Bind to an explicit method instead of inferring it.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Bind to explicit target categories.
    pub fn targets(mut self, targets: Vec<Target>) -> Self {
        self.targets = targets;
        self
    }

    /// Replace an existing registration.
    pub fn overwrite(mut self) -> Self {
        self.overwrite = true;
        self
    }

    /// Keep the attribute out of the method-injection table (it stays
    /// settable/readable on existing objects only).
    pub fn no_inject(mut self) -> Self {
        self.inject = false;
        self
    }
}

/// An activatable bundle of standard-attribute rules.
#[derive(Debug, Clone, Default)]
pub struct Convention {
    name: String,
    properties: BTreeMap<Target, IndexMap<String, Arc<StandardAttribute>>>,
    methods: BTreeMap<Method, IndexMap<String, Requirement>>,
}

impl Convention {
    /// Create an empty convention.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            properties: BTreeMap::new(),
            methods: BTreeMap::new(),
        }
    }

    /// The built-in no-op convention: no standard attributes, nothing
    /// injected. This is what "no convention active" means.
    pub fn baseline() -> Self {
        Self::new("raw")
    }

    /// The convention name (process-wide registry key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an attribute.
    ///
    /// # Errors
    ///
    /// All checks are fail-fast and happen before any state mutation:
    /// duplicate registrations error unless `overwrite` is set.
    pub fn add(&mut self, binding: AttrBinding) -> Result<(), ConventionError> {
        let AttrBinding {
            attribute,
            targets,
            method,
            inject,
            optional,
            alternative,
            position,
            default_value,
            overwrite,
        } = binding;

        let name = attribute.name().to_string();
        let targets: Vec<Target> = if targets.is_empty() {
            let mut inferred: Vec<Target> =
                attribute.target_methods().iter().map(|m| m.target()).collect();
            inferred.dedup();
            inferred
        } else {
            targets
        };

        // precondition checks before any mutation
        for target in &targets {
            if !overwrite
                && self
                    .properties
                    .get(target)
                    .is_some_and(|table| table.contains_key(&name))
            {
                return Err(ConventionError::DuplicateAttribute {
                    convention: self.name.clone(),
                    target: *target,
                    name,
                });
            }
        }
        let method = method.unwrap_or_else(|| {
            targets
                .first()
                .copied()
                .unwrap_or(Target::Dataset)
                .default_method()
        });
        if inject
            && !overwrite
            && self
                .methods
                .get(&method)
                .is_some_and(|table| table.contains_key(&name))
        {
            return Err(ConventionError::DuplicateBinding {
                convention: self.name.clone(),
                method,
                name,
            });
        }

        let default = default_value.unwrap_or_else(|| attribute.default_value().clone());
        let default = if optional && matches!(default, DefaultValue::Empty) {
            // optional with no fallback means "skip when absent"
            DefaultValue::None
        } else {
            default
        };
        let alternative = alternative.or_else(|| attribute.alternative().map(str::to_string));
        let position = position.or_else(|| attribute.position().cloned());

        let attribute = Arc::new(attribute);
        for target in &targets {
            self.properties
                .entry(*target)
                .or_default()
                .insert(name.clone(), Arc::clone(&attribute));
        }
        if inject {
            self.methods.entry(method).or_default().insert(
                name.clone(),
                Requirement {
                    attribute: Arc::clone(&attribute),
                    optional,
                    default,
                    position,
                    alternative,
                },
            );
        }
        tracing::debug!(convention = %self.name, attribute = %name, %method, "registered standard attribute");
        Ok(())
    }

    /// Make a bound attribute required on an operation.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::UnknownAttribute` when the attribute
    /// is not bound to the method.
    pub fn make_required(&mut self, method: Method, name: &str) -> Result<(), ConventionError> {
        let requirement = self
            .methods
            .get_mut(&method)
            .and_then(|table| table.get_mut(name))
            .ok_or_else(|| ConventionError::UnknownAttribute {
                convention: self.name.clone(),
                method,
                name: name.to_string(),
            })?;
        requirement.optional = false;
        requirement.default = DefaultValue::Empty;
        Ok(())
    }

    /// Make a bound attribute optional on an operation.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::UnknownAttribute` when the attribute
    /// is not bound to the method.
    pub fn make_optional(&mut self, method: Method, name: &str) -> Result<(), ConventionError> {
        let requirement = self
            .methods
            .get_mut(&method)
            .and_then(|table| table.get_mut(name))
            .ok_or_else(|| ConventionError::UnknownAttribute {
                convention: self.name.clone(),
                method,
                name: name.to_string(),
            })?;
        requirement.optional = true;
        if matches!(requirement.default, DefaultValue::Empty) {
            requirement.default = DefaultValue::None;
        }
        Ok(())
    }

    /// The standard attribute registered under `name` for a target
    /// category, if any.
    pub fn standard_attribute(
        &self,
        target: Target,
        name: &str,
    ) -> Option<&Arc<StandardAttribute>> {
        self.properties.get(&target)?.get(name)
    }

    /// All attributes registered for a target category.
    pub fn properties_for(
        &self,
        target: Target,
    ) -> impl Iterator<Item = (&str, &Arc<StandardAttribute>)> {
        self.properties
            .get(&target)
            .into_iter()
            .flat_map(|table| table.iter().map(|(k, v)| (k.as_str(), v)))
    }

    /// Derive the creation options for an operation.
    ///
    /// This replaces runtime signature injection: the options struct
    /// enumerates the recognized standard-attribute keys in position
    /// order and is built fresh from this convention on every call.
    pub fn creation_options(&self, method: Method) -> CreationOptions {
        let Some(table) = self.methods.get(&method) else {
            return CreationOptions {
                method,
                entries: Vec::new(),
            };
        };

        // insertion order first, then apply declared positions
        let mut names: Vec<&String> = table.keys().collect();
        for (name, requirement) in table {
            let Some(position) = &requirement.position else {
                continue;
            };
            let anchor = match position {
                Position::Before(anchor) | Position::After(anchor) => anchor,
            };
            let (Some(from), Some(mut to)) = (
                names.iter().position(|n| *n == name),
                names.iter().position(|n| *n == anchor),
            ) else {
                continue; // unknown anchor: keep declaration order
            };
            names.remove(from);
            if from < to {
                to -= 1;
            }
            let to = match position {
                Position::Before(_) => to,
                Position::After(_) => to + 1,
            };
            names.insert(to.min(names.len()), name);
        }

        let entries = names
            .into_iter()
            .filter_map(|name| {
                table.get(name).map(|requirement| OptionEntry {
                    name: name.clone(),
                    optional: requirement.optional,
                    default: requirement.default.clone(),
                    alternative: requirement.alternative.clone(),
                    attribute: Arc::clone(&requirement.attribute),
                })
            })
            .collect();
        CreationOptions { method, entries }
    }
}

/// The recognized standard-attribute keys of one creation operation,
/// derived from the active convention.
#[derive(Debug, Clone, PartialEq)]
pub struct CreationOptions {
    /// The operation these options describe.
    pub method: Method,
    /// Recognized attributes, in position order.
    pub entries: Vec<OptionEntry>,
}

/// One recognized attribute in a [`CreationOptions`].
#[derive(Debug, Clone, PartialEq)]
pub struct OptionEntry {
    /// Attribute name.
    pub name: String,
    /// Never fails the creation when absent.
    pub optional: bool,
    /// Default policy.
    pub default: DefaultValue,
    /// Fallback attribute satisfying the same requirement.
    pub alternative: Option<String>,
    /// The attribute definition.
    pub attribute: Arc<StandardAttribute>,
}

impl OptionEntry {
    /// Required with no fallback value.
    pub fn is_required(&self) -> bool {
        !self.optional && matches!(self.default, DefaultValue::Empty)
    }
}

impl CreationOptions {
    /// Recognized attribute names, in order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&OptionEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// The `(name, optional)` signature, used to compare activation
    /// states.
    pub fn signature(&self) -> Vec<(String, bool)> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), e.optional))
            .collect()
    }
}
