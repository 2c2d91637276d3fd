//! convention::validators
//!
//! Validator primitives: a closed tagged union of single-purpose
//! checks applied to candidate attribute values.
//!
//! # Contract
//!
//! `validator.validate(value, ctx) -> Result<AttrValue, ValidatorError>`
//! is pure apart from reading the context (the hierarchy the attribute
//! is being written into). On success the possibly-normalized value is
//! returned; on failure the specific error kind. Validators never
//! write anything.
//!
//! The context exists because some validators are relational: a
//! `standard_name` is only valid against the table referenced by the
//! file root, together with the `units` attribute of the same node
//! (which may still be pending in the same creation call).

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{ObjectPath, Orcid, Pattern, TypeError};
use crate::standard_name::{LookupError, StandardNameTable};
use crate::store::{AttrValue, Group};
use crate::units::{Quantity, Unit, UnitsError};

/// Errors from validator application.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("expected {expected}, got {got}")]
    WrongType {
        expected: &'static str,
        got: &'static str,
    },

    #[error("value '{value}' does not equal '{expected}'")]
    NotEqual { value: String, expected: String },

    #[error("value '{value}' is not one of {allowed:?}")]
    NotInSet {
        value: String,
        allowed: Vec<String>,
    },

    #[error("value '{value}' does not match pattern '{pattern}'")]
    PatternMismatch { value: String, pattern: String },

    #[error("length {len} is below the minimum of {min}")]
    TooShort { len: usize, min: usize },

    #[error("length {len} exceeds the maximum of {max}")]
    TooLong { len: usize, max: usize },

    #[error(transparent)]
    Units(#[from] UnitsError),

    #[error(transparent)]
    Identifier(#[from] TypeError),

    #[error("invalid URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },

    #[error("no standard name table defined for this file")]
    NoTable,

    #[error("no units defined for this dataset")]
    NoUnits,

    #[error("cannot load standard name table: {0}")]
    TableLoad(String),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error("standard name '{name}' has incompatible units '{units}'; expected units equivalent to '{expected}'")]
    IncompatibleUnits {
        name: String,
        units: String,
        expected: String,
    },

    #[error("missing field '{field}' for structured type '{type_name}'")]
    MissingField {
        field: String,
        type_name: String,
    },

    #[error("field '{field}' of structured type '{type_name}' must be {expected}")]
    WrongFieldType {
        field: String,
        type_name: String,
        expected: &'static str,
    },

    #[error("missing required value")]
    MissingRequired,
}

/// Read-only view of the hierarchy an attribute is written into.
///
/// `pending` carries values supplied in the same creation call that
/// have not been persisted yet; it shadows stored attributes.
#[derive(Debug, Clone, Copy)]
pub struct AttrContext<'a> {
    root: &'a Group,
    path: &'a ObjectPath,
    pending: Option<&'a BTreeMap<String, AttrValue>>,
}

impl<'a> AttrContext<'a> {
    /// Context for an attribute on the node at `path`.
    pub fn new(root: &'a Group, path: &'a ObjectPath) -> Self {
        Self {
            root,
            path,
            pending: None,
        }
    }

    /// Attach pending values from the surrounding creation call.
    pub fn with_pending(mut self, pending: &'a BTreeMap<String, AttrValue>) -> Self {
        self.pending = Some(pending);
        self
    }

    /// The path of the node being written.
    pub fn path(&self) -> &ObjectPath {
        self.path
    }

    fn node_attrs(&self) -> Option<&'a BTreeMap<String, AttrValue>> {
        if self.path.is_root() {
            return Some(&self.root.attributes);
        }
        self.root.get(self.path).map(|node| node.attributes())
    }

    /// An attribute of the node being written: pending values first,
    /// then stored attributes.
    pub fn local_attr(&self, name: &str) -> Option<&'a AttrValue> {
        if let Some(pending) = self.pending {
            if let Some(value) = pending.get(name) {
                return Some(value);
            }
        }
        self.node_attrs().and_then(|attrs| attrs.get(name))
    }

    /// An attribute of the file root. When the root itself is being
    /// written, pending values shadow stored ones here too.
    pub fn root_attr(&self, name: &str) -> Option<&'a AttrValue> {
        if self.path.is_root() {
            if let Some(pending) = self.pending {
                if let Some(value) = pending.get(name) {
                    return Some(value);
                }
            }
        }
        self.root.attributes.get(name)
    }
}

/// Scalar type specification for `$type` validators and structured
/// type fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeSpec {
    Str,
    Int,
    Float,
    Bool,
    List,
}

impl TypeSpec {
    /// Resolve a type key (`str`, `int`, `float`, `bool`, `list`).
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "str" | "string" => Some(TypeSpec::Str),
            "int" | "integer" => Some(TypeSpec::Int),
            "float" | "number" => Some(TypeSpec::Float),
            "bool" | "boolean" => Some(TypeSpec::Bool),
            "list" => Some(TypeSpec::List),
            _ => None,
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            TypeSpec::Str => "a string",
            TypeSpec::Int => "an integer",
            TypeSpec::Float => "a number",
            TypeSpec::Bool => "a boolean",
            TypeSpec::List => "a list",
        }
    }

    fn accepts(&self, value: &AttrValue) -> bool {
        matches!(
            (self, value),
            (TypeSpec::Str, AttrValue::Str(_))
                | (TypeSpec::Int, AttrValue::Int(_))
                | (TypeSpec::Float, AttrValue::Float(_))
                | (TypeSpec::Float, AttrValue::Int(_))
                | (TypeSpec::Bool, AttrValue::Bool(_))
                | (TypeSpec::List, AttrValue::List(_))
        )
    }

    fn accepts_json(&self, value: &serde_json::Value) -> bool {
        match self {
            TypeSpec::Str => value.is_string(),
            TypeSpec::Int => value.is_i64() || value.is_u64(),
            TypeSpec::Float => value.is_number(),
            TypeSpec::Bool => value.is_boolean(),
            TypeSpec::List => value.is_array(),
        }
    }
}

/// A reusable structured-type definition (`$TypeName` in convention
/// documents): the value must be a JSON map carrying the declared
/// fields with the declared scalar types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDef {
    pub name: String,
    pub fields: IndexMap<String, TypeSpec>,
}

impl TypeDef {
    fn validate(&self, value: &AttrValue) -> Result<(), ValidatorError> {
        let map = value.as_json().ok_or(ValidatorError::WrongType {
            expected: "a JSON map",
            got: value.kind(),
        })?;
        for (field, spec) in &self.fields {
            let Some(field_value) = map.get(field) else {
                return Err(ValidatorError::MissingField {
                    field: field.clone(),
                    type_name: self.name.clone(),
                });
            };
            if !spec.accepts_json(field_value) {
                return Err(ValidatorError::WrongFieldType {
                    field: field.clone(),
                    type_name: self.name.clone(),
                    expected: spec.expected(),
                });
            }
        }
        Ok(())
    }
}

/// The closed set of validator variants.
///
/// String specs in convention documents map onto these through a
/// compile-time-checked table (see [`crate::convention::yaml`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "param", rename_all = "snake_case")]
pub enum Validator {
    /// Strict equality against a reference; `*` accepts anything.
    Equal(String),
    /// Membership in a fixed set.
    In(Vec<String>),
    /// Anchored regex match on string values.
    Regex(Pattern),
    /// Always true: "exists, any value accepted".
    Any,
    /// Scalar type check.
    Type(TypeSpec),
    /// Value must parse as a physical unit.
    Units,
    /// Value must parse as a quantity (magnitude + unit).
    Quantity,
    /// Value must be a valid ORCID iD (or a list of them).
    Orcid,
    /// Value must be an absolute http(s) URL (or a list of them).
    Url,
    /// Minimum string/list length.
    MinLength(usize),
    /// Maximum string/list length.
    MaxLength(usize),
    /// Value must resolve in the file's standard-name table with
    /// units compatible to the node's `units` attribute.
    StandardName,
    /// Value must itself be (or reference) a standard-name table;
    /// normalized to its JSON form.
    StandardNameTable,
    /// Structured type check against a `$TypeName` definition.
    TypeDef(TypeDef),
}

impl Validator {
    /// Apply the validator.
    ///
    /// # Errors
    ///
    /// Returns the specific [`ValidatorError`] kind on failure.
    pub fn validate(
        &self,
        value: &AttrValue,
        ctx: &AttrContext<'_>,
    ) -> Result<AttrValue, ValidatorError> {
        match self {
            Validator::Any => Ok(value.clone()),

            Validator::Equal(reference) => {
                if reference == "*" {
                    return Ok(value.clone());
                }
                let rendered = value.encode();
                if rendered == *reference {
                    Ok(value.clone())
                } else {
                    Err(ValidatorError::NotEqual {
                        value: rendered,
                        expected: reference.clone(),
                    })
                }
            }

            Validator::In(allowed) => {
                let rendered = value.encode();
                if allowed.contains(&rendered) {
                    Ok(value.clone())
                } else {
                    Err(ValidatorError::NotInSet {
                        value: rendered,
                        allowed: allowed.clone(),
                    })
                }
            }

            Validator::Regex(pattern) => {
                let s = expect_str(value)?;
                if pattern.matches(s) {
                    Ok(value.clone())
                } else {
                    Err(ValidatorError::PatternMismatch {
                        value: s.to_string(),
                        pattern: pattern.as_str().to_string(),
                    })
                }
            }

            Validator::Type(spec) => {
                if spec.accepts(value) {
                    Ok(value.clone())
                } else {
                    Err(ValidatorError::WrongType {
                        expected: spec.expected(),
                        got: value.kind(),
                    })
                }
            }

            Validator::Units => {
                let s = expect_str(value)?;
                Unit::parse(s)?;
                Ok(value.clone())
            }

            Validator::Quantity => {
                let s = expect_str(value)?;
                Quantity::parse(s)?;
                Ok(value.clone())
            }

            Validator::Orcid => {
                match value {
                    AttrValue::Str(s) => {
                        Orcid::new(s)?;
                    }
                    AttrValue::List(items) => {
                        for item in items {
                            Orcid::new(expect_str(item)?)?;
                        }
                    }
                    other => {
                        return Err(ValidatorError::WrongType {
                            expected: "a string or list of strings",
                            got: other.kind(),
                        })
                    }
                }
                Ok(value.clone())
            }

            Validator::Url => {
                match value {
                    AttrValue::Str(s) => check_url(s)?,
                    AttrValue::List(items) => {
                        for item in items {
                            check_url(expect_str(item)?)?;
                        }
                    }
                    other => {
                        return Err(ValidatorError::WrongType {
                            expected: "a string or list of strings",
                            got: other.kind(),
                        })
                    }
                }
                Ok(value.clone())
            }

            Validator::MinLength(min) => {
                let len = value_len(value)?;
                if len < *min {
                    Err(ValidatorError::TooShort { len, min: *min })
                } else {
                    Ok(value.clone())
                }
            }

            Validator::MaxLength(max) => {
                let len = value_len(value)?;
                if len > *max {
                    Err(ValidatorError::TooLong { len, max: *max })
                } else {
                    Ok(value.clone())
                }
            }

            Validator::StandardName => {
                let name = expect_str(value)?;
                let table_value = ctx
                    .root_attr("standard_name_table")
                    .ok_or(ValidatorError::NoTable)?;
                let table = StandardNameTable::from_attr_value(table_value)
                    .map_err(|e| ValidatorError::TableLoad(e.to_string()))?;
                let units_value = ctx.local_attr("units").ok_or(ValidatorError::NoUnits)?;
                let units = expect_str(units_value)?;

                let sn = table.resolve(name)?;
                if !sn.equal_unit(units)? {
                    return Err(ValidatorError::IncompatibleUnits {
                        name: name.to_string(),
                        units: units.to_string(),
                        expected: sn.units().to_string(),
                    });
                }
                Ok(value.clone())
            }

            Validator::StandardNameTable => {
                let table = StandardNameTable::from_attr_value(value)
                    .map_err(|e| ValidatorError::TableLoad(e.to_string()))?;
                let json = table
                    .to_json_value()
                    .map_err(|e| ValidatorError::TableLoad(e.to_string()))?;
                match json {
                    serde_json::Value::Object(map) => Ok(AttrValue::Json(map)),
                    _ => Err(ValidatorError::TableLoad(
                        "table did not serialize to a JSON object".to_string(),
                    )),
                }
            }

            Validator::TypeDef(def) => {
                def.validate(value)?;
                Ok(value.clone())
            }
        }
    }
}

fn expect_str(value: &AttrValue) -> Result<&str, ValidatorError> {
    value.as_str().ok_or(ValidatorError::WrongType {
        expected: "a string",
        got: value.kind(),
    })
}

fn value_len(value: &AttrValue) -> Result<usize, ValidatorError> {
    match value {
        AttrValue::Str(s) => Ok(s.chars().count()),
        AttrValue::List(items) => Ok(items.len()),
        other => Err(ValidatorError::WrongType {
            expected: "a string or list",
            got: other.kind(),
        }),
    }
}

fn check_url(s: &str) -> Result<(), ValidatorError> {
    let parsed = url::Url::parse(s).map_err(|e| ValidatorError::InvalidUrl {
        value: s.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidatorError::InvalidUrl {
            value: s.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    Ok(())
}
