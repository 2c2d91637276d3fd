//! convention::standard_attribute
//!
//! A standard attribute binds a validator chain to a named attribute,
//! a description, a default-value policy, and the creation operations
//! it augments.
//!
//! # Failure semantics
//!
//! Validator failures surface synchronously at attribute-set time as a
//! [`StandardAttributeError`] carrying the attribute name and the
//! original cause. Misconfigured definitions fail at construction
//! time, never at use time.

use std::collections::BTreeMap;

use thiserror::Error;

use super::validators::{AttrContext, Validator, ValidatorError};
use super::{ConventionError, DefaultValue, Method, Position};
use crate::standard_name::StandardNameTable;
use crate::store::AttrValue;
use crate::units::{Quantity, Unit};

/// A validator failure bound to the attribute it occurred on.
///
/// The original cause is preserved as the error source.
#[derive(Debug, Error)]
#[error("{action} standard attribute '{attribute}' failed: {source}")]
pub struct StandardAttributeError {
    /// The attribute name.
    pub attribute: String,
    /// `"setting"` or `"reading"`.
    pub action: &'static str,
    /// The underlying validator failure.
    #[source]
    pub source: ValidatorError,
}

impl StandardAttributeError {
    pub(crate) fn setting(attribute: &str, source: ValidatorError) -> Self {
        Self {
            attribute: attribute.to_string(),
            action: "setting",
            source,
        }
    }

    pub(crate) fn reading(attribute: &str, source: ValidatorError) -> Self {
        Self {
            attribute: attribute.to_string(),
            action: "reading",
            source,
        }
    }
}

/// Declared coercion applied when reading an attribute back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Int,
    Float,
    Str,
    Bool,
    List,
    Quantity,
    Unit,
    StandardNameTable,
}

impl ReturnType {
    /// Resolve a return-type key.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::UnknownReturnType` for unrecognized
    /// keys - a definition-time failure.
    pub fn from_key(key: &str) -> Result<Self, ConventionError> {
        match key {
            "int" => Ok(ReturnType::Int),
            "float" => Ok(ReturnType::Float),
            "str" => Ok(ReturnType::Str),
            "bool" => Ok(ReturnType::Bool),
            "list" => Ok(ReturnType::List),
            "quantity" => Ok(ReturnType::Quantity),
            "unit" => Ok(ReturnType::Unit),
            "standard_name_table" => Ok(ReturnType::StandardNameTable),
            other => Err(ConventionError::UnknownReturnType(other.to_string())),
        }
    }
}

/// A value read back through a standard attribute, after coercion.
#[derive(Debug, Clone)]
pub enum ReadValue {
    /// Stored (or coerced scalar) value.
    Value(AttrValue),
    /// Coerced through [`ReturnType::Quantity`].
    Quantity(Quantity),
    /// Coerced through [`ReturnType::Unit`].
    Unit(Unit),
    /// Coerced through [`ReturnType::StandardNameTable`].
    Table(Box<StandardNameTable>),
}

/// A named, validated metadata field.
///
/// Constructed once at convention-definition time; immutable
/// thereafter. The same instance may be bound to several target
/// classes through [`crate::convention::Convention::add`].
#[derive(Debug, Clone, PartialEq)]
pub struct StandardAttribute {
    name: String,
    description: String,
    validators: Vec<Validator>,
    target_methods: Vec<Method>,
    default_value: DefaultValue,
    alternative: Option<String>,
    position: Option<Position>,
    return_type: Option<ReturnType>,
}

impl StandardAttribute {
    /// Define a standard attribute.
    ///
    /// An empty validator chain is coerced to [`Validator::Any`].
    ///
    /// # Errors
    ///
    /// Fails fast on an empty name, a name containing whitespace, or
    /// an empty target-method set.
    pub fn new(
        name: &str,
        description: &str,
        validators: Vec<Validator>,
        target_methods: Vec<Method>,
    ) -> Result<Self, ConventionError> {
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(ConventionError::InvalidDefinition {
                name: name.to_string(),
                reason: "attribute name must be non-empty and free of whitespace".to_string(),
            });
        }
        if target_methods.is_empty() {
            return Err(ConventionError::InvalidDefinition {
                name: name.to_string(),
                reason: "at least one target method is required".to_string(),
            });
        }
        let validators = if validators.is_empty() {
            vec![Validator::Any]
        } else {
            validators
        };
        Ok(Self {
            name: name.to_string(),
            description: description.to_string(),
            validators,
            target_methods,
            default_value: DefaultValue::Empty,
            alternative: None,
            position: None,
            return_type: None,
        })
    }

    /// Set the default-value policy.
    pub fn with_default(mut self, default_value: DefaultValue) -> Self {
        self.default_value = default_value;
        self
    }

    /// Name an alternative attribute satisfying the same requirement.
    pub fn with_alternative(mut self, alternative: &str) -> Self {
        self.alternative = Some(alternative.to_string());
        self
    }

    /// Set the insertion position in the target operation.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    /// Declare a read-back coercion.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::UnknownReturnType` for unknown keys.
    pub fn with_return_type(mut self, key: &str) -> Result<Self, ConventionError> {
        self.return_type = Some(ReturnType::from_key(key)?);
        Ok(self)
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The validator chain.
    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// The operations this attribute augments.
    pub fn target_methods(&self) -> &[Method] {
        &self.target_methods
    }

    /// The default-value policy.
    pub fn default_value(&self) -> &DefaultValue {
        &self.default_value
    }

    /// The alternative attribute, if declared.
    pub fn alternative(&self) -> Option<&str> {
        self.alternative.as_deref()
    }

    /// The declared position, if any.
    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Required with no fallback (the `EMPTY` policy).
    pub fn is_positional(&self) -> bool {
        matches!(self.default_value, DefaultValue::Empty)
    }

    /// Run the whole validator chain against a candidate value.
    ///
    /// All validators must pass; the last normalized value wins.
    ///
    /// # Errors
    ///
    /// Wraps the first validator failure as a
    /// [`StandardAttributeError`] with this attribute's name.
    pub fn validate_value(
        &self,
        value: &AttrValue,
        ctx: &AttrContext<'_>,
    ) -> Result<AttrValue, StandardAttributeError> {
        let mut current = value.clone();
        for validator in &self.validators {
            current = validator
                .validate(&current, ctx)
                .map_err(|e| StandardAttributeError::setting(&self.name, e))?;
        }
        Ok(current)
    }

    /// Read this attribute from an attribute map, falling back to the
    /// configured default and applying the declared coercion.
    ///
    /// Returns `None` when the value is absent and the policy is
    /// `Empty` or `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`StandardAttributeError`] when coercion fails.
    pub fn read(
        &self,
        attrs: &BTreeMap<String, AttrValue>,
    ) -> Result<Option<ReadValue>, StandardAttributeError> {
        let stored = attrs.get(&self.name).cloned().or(match &self.default_value {
            DefaultValue::Literal(v) => Some(v.clone()),
            DefaultValue::Empty | DefaultValue::None => None,
        });
        let Some(value) = stored else {
            return Ok(None);
        };
        self.coerce(value).map(Some)
    }

    fn coerce(&self, value: AttrValue) -> Result<ReadValue, StandardAttributeError> {
        let Some(return_type) = self.return_type else {
            return Ok(ReadValue::Value(value));
        };
        let wrap = |e: ValidatorError| StandardAttributeError::reading(&self.name, e);
        match return_type {
            ReturnType::Str => Ok(ReadValue::Value(AttrValue::Str(value.encode()))),
            ReturnType::Int => match &value {
                AttrValue::Int(_) => Ok(ReadValue::Value(value)),
                AttrValue::Str(s) => s
                    .parse::<i64>()
                    .map(|i| ReadValue::Value(AttrValue::Int(i)))
                    .map_err(|_| {
                        wrap(ValidatorError::WrongType {
                            expected: "an integer",
                            got: "string",
                        })
                    }),
                other => Err(wrap(ValidatorError::WrongType {
                    expected: "an integer",
                    got: other.kind(),
                })),
            },
            ReturnType::Float => match &value {
                AttrValue::Float(_) | AttrValue::Int(_) => Ok(ReadValue::Value(AttrValue::Float(
                    value.as_float().unwrap_or(f64::NAN),
                ))),
                AttrValue::Str(s) => s
                    .parse::<f64>()
                    .map(|f| ReadValue::Value(AttrValue::Float(f)))
                    .map_err(|_| {
                        wrap(ValidatorError::WrongType {
                            expected: "a number",
                            got: "string",
                        })
                    }),
                other => Err(wrap(ValidatorError::WrongType {
                    expected: "a number",
                    got: other.kind(),
                })),
            },
            ReturnType::Bool => match &value {
                AttrValue::Bool(_) => Ok(ReadValue::Value(value)),
                other => Err(wrap(ValidatorError::WrongType {
                    expected: "a boolean",
                    got: other.kind(),
                })),
            },
            ReturnType::List => match value {
                AttrValue::List(_) => Ok(ReadValue::Value(value)),
                single => Ok(ReadValue::Value(AttrValue::List(vec![single]))),
            },
            ReturnType::Quantity => {
                let s = value.as_str().ok_or_else(|| {
                    wrap(ValidatorError::WrongType {
                        expected: "a string",
                        got: value.kind(),
                    })
                })?;
                Quantity::parse(s)
                    .map(ReadValue::Quantity)
                    .map_err(|e| wrap(e.into()))
            }
            ReturnType::Unit => {
                let s = value.as_str().ok_or_else(|| {
                    wrap(ValidatorError::WrongType {
                        expected: "a string",
                        got: value.kind(),
                    })
                })?;
                Unit::parse(s)
                    .map(ReadValue::Unit)
                    .map_err(|e| wrap(e.into()))
            }
            ReturnType::StandardNameTable => StandardNameTable::from_attr_value(&value)
                .map(|t| ReadValue::Table(Box::new(t)))
                .map_err(|e| wrap(ValidatorError::TableLoad(e.to_string()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ObjectPath;
    use crate::store::Group;

    fn units_attribute() -> StandardAttribute {
        StandardAttribute::new(
            "units",
            "physical unit of the dataset",
            vec![Validator::Units],
            vec![Method::CreateDataset],
        )
        .unwrap()
    }

    #[test]
    fn definition_fails_fast() {
        assert!(StandardAttribute::new("", "d", vec![], vec![Method::Init]).is_err());
        assert!(StandardAttribute::new("has space", "d", vec![], vec![Method::Init]).is_err());
        assert!(StandardAttribute::new("ok", "d", vec![], vec![]).is_err());
    }

    #[test]
    fn unknown_return_type_fails_fast() {
        let attr = units_attribute();
        assert!(matches!(
            attr.with_return_type("florble"),
            Err(ConventionError::UnknownReturnType(_))
        ));
    }

    #[test]
    fn empty_chain_coerces_to_any() {
        let attr =
            StandardAttribute::new("comment", "d", vec![], vec![Method::CreateGroup]).unwrap();
        assert_eq!(attr.validators(), &[Validator::Any]);
    }

    #[test]
    fn validate_wraps_cause_with_attribute_name() {
        let attr = units_attribute();
        let root = Group::new();
        let path = ObjectPath::root();
        let ctx = AttrContext::new(&root, &path);
        let err = attr
            .validate_value(&AttrValue::from("florble"), &ctx)
            .unwrap_err();
        assert_eq!(err.attribute, "units");
        assert!(matches!(err.source, ValidatorError::Units(_)));
    }

    #[test]
    fn positional_by_default() {
        assert!(units_attribute().is_positional());
        assert!(!units_attribute()
            .with_default(DefaultValue::None)
            .is_positional());
    }

    #[test]
    fn read_falls_back_to_literal_default() {
        let attr = StandardAttribute::new("comment", "d", vec![], vec![Method::CreateGroup])
            .unwrap()
            .with_default(DefaultValue::Literal(AttrValue::from("n/a")));
        let attrs = BTreeMap::new();
        match attr.read(&attrs).unwrap() {
            Some(ReadValue::Value(AttrValue::Str(s))) => assert_eq!(s, "n/a"),
            other => panic!("unexpected read result: {other:?}"),
        }
    }

    #[test]
    fn read_absent_without_default_is_none() {
        let attr = units_attribute();
        assert!(attr.read(&BTreeMap::new()).unwrap().is_none());
    }

    #[test]
    fn read_coerces_int() {
        let attr = StandardAttribute::new("run_id", "d", vec![], vec![Method::Init])
            .unwrap()
            .with_return_type("int")
            .unwrap();
        let attrs = BTreeMap::from([("run_id".to_string(), AttrValue::from("42"))]);
        match attr.read(&attrs).unwrap() {
            Some(ReadValue::Value(AttrValue::Int(42))) => {}
            other => panic!("unexpected read result: {other:?}"),
        }
    }

    #[test]
    fn read_coerces_quantity() {
        let attr = StandardAttribute::new("scale", "d", vec![], vec![Method::CreateDataset])
            .unwrap()
            .with_return_type("quantity")
            .unwrap();
        let attrs = BTreeMap::from([("scale".to_string(), AttrValue::from("2.5 m/s"))]);
        match attr.read(&attrs).unwrap() {
            Some(ReadValue::Quantity(q)) => assert!((q.magnitude - 2.5).abs() < 1e-12),
            other => panic!("unexpected read result: {other:?}"),
        }
    }

    #[test]
    fn read_coercion_failure_is_reading_error() {
        let attr = StandardAttribute::new("run_id", "d", vec![], vec![Method::Init])
            .unwrap()
            .with_return_type("int")
            .unwrap();
        let attrs = BTreeMap::from([("run_id".to_string(), AttrValue::from("notanint"))]);
        let err = attr.read(&attrs).unwrap_err();
        assert_eq!(err.action, "reading");
        assert_eq!(err.attribute, "run_id");
    }
}
