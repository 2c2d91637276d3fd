//! convention::yaml
//!
//! Parsing of persisted convention documents.
//!
//! # Format
//!
//! One YAML document per convention. Top-level keys are either
//! `$TypeName` (a reusable structured-type definition with
//! `field: type` pairs) or an attribute name mapping to its
//! definition:
//!
//! ```yaml
//! $person:
//!   name: str
//!   orcid: str
//!
//! units:
//!   validator: $units
//!   description: physical unit of the dataset
//!   target_methods: create_dataset
//!   default_value: $empty
//!
//! standard_name:
//!   validator: $standard_name
//!   description: standard name of the dataset
//!   target_methods: create_dataset
//!   alternative_standard_attribute: long_name
//!   position:
//!     after: units
//!
//! title:
//!   validator: regex(^[A-Z].*)
//!   description: file title
//!   target_methods: init
//!   default_value: $none
//! ```
//!
//! A `validator` value of the literal form `regex(...)` is
//! special-cased: the parenthesized content becomes the pattern.

use std::path::Path;

use indexmap::IndexMap;
use serde_yaml::Value;

use super::standard_attribute::StandardAttribute;
use super::validators::{TypeDef, TypeSpec, Validator};
use super::{AttrBinding, Convention, ConventionError, DefaultValue, Method, Position};
use crate::core::types::Pattern;

/// Parse a convention document from a YAML string.
///
/// # Errors
///
/// Returns `ConventionError` on malformed documents, unknown
/// validator keys, or invalid attribute definitions - all at parse
/// time.
pub fn parse_convention_str(name: &str, yaml: &str) -> Result<Convention, ConventionError> {
    let doc: Value = serde_yaml::from_str(yaml)?;
    let Value::Mapping(map) = doc else {
        return Err(ConventionError::Document(
            "top level must be a mapping".to_string(),
        ));
    };

    // first pass: collect $TypeName definitions
    let mut typedefs: IndexMap<String, TypeDef> = IndexMap::new();
    for (key, value) in &map {
        let Some(key) = key.as_str() else {
            return Err(ConventionError::Document(
                "top-level keys must be strings".to_string(),
            ));
        };
        let Some(type_name) = key.strip_prefix('$') else {
            continue;
        };
        let Value::Mapping(fields) = value else {
            return Err(ConventionError::Document(format!(
                "type definition '{key}' must be a mapping of field: type pairs"
            )));
        };
        let mut parsed = IndexMap::new();
        for (field, ty) in fields {
            let (Some(field), Some(ty)) = (field.as_str(), ty.as_str()) else {
                return Err(ConventionError::Document(format!(
                    "type definition '{key}' has a non-string field or type"
                )));
            };
            let spec = TypeSpec::from_key(ty).ok_or_else(|| {
                ConventionError::Document(format!(
                    "type definition '{key}': unknown field type '{ty}'"
                ))
            })?;
            parsed.insert(field.to_string(), spec);
        }
        typedefs.insert(
            type_name.to_lowercase(),
            TypeDef {
                name: type_name.to_string(),
                fields: parsed,
            },
        );
    }

    // second pass: attribute definitions
    let mut convention = Convention::new(name);
    for (key, value) in &map {
        let Some(attr_name) = key.as_str() else {
            continue;
        };
        if attr_name.starts_with('$') {
            continue;
        }
        let Value::Mapping(def) = value else {
            return Err(ConventionError::Document(format!(
                "attribute '{attr_name}' must map to a definition"
            )));
        };
        let binding = parse_attribute(attr_name, def, &typedefs)?;
        convention.add(binding)?;
    }
    Ok(convention)
}

/// Load a convention from a YAML file; the file stem is the name.
pub fn load_convention(path: &Path) -> Result<Convention, ConventionError> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ConventionError::Document("cannot derive convention name".to_string()))?;
    let raw = std::fs::read_to_string(path)?;
    parse_convention_str(name, &raw)
}

/// Register a convention document in the user directory.
///
/// The document is parsed (and thereby validated) first; registration
/// stores it under `<conventions dir>/<name>.yaml`.
///
/// # Errors
///
/// Returns `ConventionError::AlreadyRegistered` when the name is
/// taken and `overwrite` is false.
pub fn register_file(
    path: &Path,
    dirs: &crate::core::paths::UserDirs,
    overwrite: bool,
) -> Result<String, ConventionError> {
    let convention = load_convention(path)?;
    dirs.ensure_dirs()?;
    let target = dirs.convention_path(convention.name());
    if target.exists() && !overwrite {
        return Err(ConventionError::AlreadyRegistered(
            convention.name().to_string(),
        ));
    }
    std::fs::copy(path, &target)?;
    tracing::info!(convention = %convention.name(), path = %target.display(), "registered convention document");
    Ok(convention.name().to_string())
}

/// Load every registered convention document, sorted by name.
pub fn load_registered(
    dirs: &crate::core::paths::UserDirs,
) -> Result<Vec<Convention>, ConventionError> {
    let dir = dirs.conventions_dir();
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        })
        .collect();
    paths.sort();
    paths.iter().map(|p| load_convention(p)).collect()
}

fn parse_attribute(
    name: &str,
    def: &serde_yaml::Mapping,
    typedefs: &IndexMap<String, TypeDef>,
) -> Result<AttrBinding, ConventionError> {
    let get = |key: &str| def.get(key);

    let description = get("description").and_then(Value::as_str).unwrap_or("");

    let validator_value = get("validator").ok_or_else(|| {
        ConventionError::Document(format!("attribute '{name}' has no validator"))
    })?;
    let validators = parse_validator_spec(validator_value, typedefs)?;

    let methods = match get("target_methods") {
        None => {
            return Err(ConventionError::Document(format!(
                "attribute '{name}' has no target_methods"
            )))
        }
        Some(Value::String(s)) => vec![Method::from_key(s)?],
        Some(Value::Sequence(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .ok_or_else(|| {
                        ConventionError::Document(format!(
                            "attribute '{name}': target_methods must be strings"
                        ))
                    })
                    .and_then(Method::from_key)
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(ConventionError::Document(format!(
                "attribute '{name}': target_methods must be a string or list"
            )))
        }
    };

    let mut attribute = StandardAttribute::new(name, description, validators, methods)?;

    let default = get("default_value")
        .map(yaml_to_attr_value)
        .transpose()?
        .map(DefaultValue::from_attr_value)
        .unwrap_or(DefaultValue::Empty);
    attribute = attribute.with_default(default.clone());

    if let Some(alt) = get("alternative_standard_attribute")
        .or_else(|| get("alternative"))
        .and_then(Value::as_str)
    {
        attribute = attribute.with_alternative(alt);
    }

    if let Some(position) = get("position") {
        let Value::Mapping(position) = position else {
            return Err(ConventionError::Document(format!(
                "attribute '{name}': position must be a mapping"
            )));
        };
        let parsed = if let Some(anchor) = position.get("before").and_then(Value::as_str) {
            Position::Before(anchor.to_string())
        } else if let Some(anchor) = position.get("after").and_then(Value::as_str) {
            Position::After(anchor.to_string())
        } else {
            return Err(ConventionError::Document(format!(
                "attribute '{name}': position must carry 'before' or 'after'"
            )));
        };
        attribute = attribute.with_position(parsed);
    }

    if let Some(return_type) = get("return_type").and_then(Value::as_str) {
        attribute = attribute.with_return_type(return_type)?;
    }

    let optional = !matches!(default, DefaultValue::Empty);
    let mut binding = AttrBinding::new(attribute);
    if optional {
        binding = binding.optional();
    }
    Ok(binding)
}

/// Parse a validator spec: a `$key` string, a `regex(...)` literal, a
/// `$TypeName` reference, or a `{key: param}` mapping. A mapping with
/// several keys yields a validator chain.
fn parse_validator_spec(
    value: &Value,
    typedefs: &IndexMap<String, TypeDef>,
) -> Result<Vec<Validator>, ConventionError> {
    match value {
        Value::String(s) => Ok(vec![parse_validator_key(s, None, typedefs)?]),
        Value::Mapping(map) => {
            let mut out = Vec::new();
            for (key, param) in map {
                let Some(key) = key.as_str() else {
                    return Err(ConventionError::Document(
                        "validator keys must be strings".to_string(),
                    ));
                };
                out.push(parse_validator_key(key, Some(param), typedefs)?);
            }
            Ok(out)
        }
        other => Err(ConventionError::Document(format!(
            "unsupported validator spec: {other:?}"
        ))),
    }
}

fn parse_validator_key(
    key: &str,
    param: Option<&Value>,
    typedefs: &IndexMap<String, TypeDef>,
) -> Result<Validator, ConventionError> {
    // the regex(...) literal form
    if let Some(inner) = key.strip_prefix("regex(").and_then(|rest| rest.strip_suffix(')')) {
        return Ok(Validator::Regex(Pattern::new(inner)?));
    }

    let param_str = || -> Result<&str, ConventionError> {
        param.and_then(Value::as_str).ok_or_else(|| {
            ConventionError::Document(format!("validator '{key}' needs a string parameter"))
        })
    };

    match key {
        "$any" => Ok(Validator::Any),
        "$equal" => Ok(Validator::Equal(param_str()?.to_string())),
        "$in" => {
            let Some(Value::Sequence(items)) = param else {
                return Err(ConventionError::Document(
                    "validator '$in' needs a list parameter".to_string(),
                ));
            };
            let set = items
                .iter()
                .map(|item| {
                    item.as_str().map(str::to_string).ok_or_else(|| {
                        ConventionError::Document(
                            "validator '$in' entries must be strings".to_string(),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Validator::In(set))
        }
        "$regex" => Ok(Validator::Regex(Pattern::new(param_str()?)?)),
        "$type" => {
            let spec = TypeSpec::from_key(param_str()?).ok_or_else(|| {
                ConventionError::Document(format!("unknown type '{:?}' for '$type'", param))
            })?;
            Ok(Validator::Type(spec))
        }
        "$units" | "$pintunit" => Ok(Validator::Units),
        "$quantity" | "$pintquantity" => Ok(Validator::Quantity),
        "$orcid" => Ok(Validator::Orcid),
        "$url" | "$ref" => Ok(Validator::Url),
        "$minlength" => Ok(Validator::MinLength(param_usize(key, param)?)),
        "$maxlength" => Ok(Validator::MaxLength(param_usize(key, param)?)),
        "$standard_name" => Ok(Validator::StandardName),
        "$standard_name_table" => Ok(Validator::StandardNameTable),
        other => {
            // a $TypeName reference?
            if let Some(type_name) = other.strip_prefix('$') {
                if let Some(def) = typedefs.get(&type_name.to_lowercase()) {
                    return Ok(Validator::TypeDef(def.clone()));
                }
            }
            Err(ConventionError::UnknownValidator(other.to_string()))
        }
    }
}

fn param_usize(key: &str, param: Option<&Value>) -> Result<usize, ConventionError> {
    param
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .ok_or_else(|| {
            ConventionError::Document(format!("validator '{key}' needs an integer parameter"))
        })
}

fn yaml_to_attr_value(value: &Value) -> Result<crate::store::AttrValue, ConventionError> {
    use crate::store::AttrValue;
    match value {
        Value::String(s) => Ok(AttrValue::Str(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(AttrValue::Int(i))
            } else {
                Ok(AttrValue::Float(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        Value::Bool(b) => Ok(AttrValue::Bool(*b)),
        Value::Null => Ok(AttrValue::Str("$none".to_string())),
        other => Err(ConventionError::Document(format!(
            "unsupported default value: {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::Target;

    const DOC: &str = r#"
$person:
  name: str
  orcid: str

units:
  validator: $units
  description: physical unit of the dataset
  target_methods: create_dataset
  default_value: $empty

standard_name:
  validator: $standard_name
  description: standard name of the dataset
  target_methods: create_dataset
  alternative_standard_attribute: long_name
  position:
    after: units
  default_value: $empty

long_name:
  validator:
    $minlength: 1
  description: free-text name
  target_methods: create_dataset
  default_value: $none

title:
  validator: regex(^[A-Z].*)
  description: file title
  target_methods: init
  default_value: $none

responsible_person:
  validator: $person
  description: who created the file
  target_methods: init
  default_value: $none
"#;

    #[test]
    fn parses_document() {
        let cv = parse_convention_str("tbx", DOC).unwrap();
        assert_eq!(cv.name(), "tbx");

        let ds = cv.creation_options(Method::CreateDataset);
        assert_eq!(ds.names(), vec!["units", "standard_name", "long_name"]);
        assert!(ds.get("units").unwrap().is_required());
        assert!(!ds.get("long_name").unwrap().is_required());
        assert_eq!(
            ds.get("standard_name").unwrap().alternative.as_deref(),
            Some("long_name")
        );

        let init = cv.creation_options(Method::Init);
        assert_eq!(init.names(), vec!["title", "responsible_person"]);
    }

    #[test]
    fn regex_literal_special_case() {
        let cv = parse_convention_str("tbx", DOC).unwrap();
        let title = cv.standard_attribute(Target::File, "title").unwrap();
        assert!(matches!(title.validators()[0], Validator::Regex(_)));
    }

    #[test]
    fn typedef_reference() {
        let cv = parse_convention_str("tbx", DOC).unwrap();
        let person = cv
            .standard_attribute(Target::File, "responsible_person")
            .unwrap();
        match &person.validators()[0] {
            Validator::TypeDef(def) => {
                assert_eq!(def.name, "person");
                assert_eq!(def.fields.len(), 2);
            }
            other => panic!("expected TypeDef, got {other:?}"),
        }
    }

    #[test]
    fn unknown_validator_rejected() {
        let doc = "x:\n  validator: $florble\n  target_methods: init\n";
        assert!(matches!(
            parse_convention_str("t", doc),
            Err(ConventionError::UnknownValidator(_))
        ));
    }

    #[test]
    fn unknown_method_rejected() {
        let doc = "x:\n  validator: $any\n  target_methods: create_string_dataset\n";
        assert!(matches!(
            parse_convention_str("t", doc),
            Err(ConventionError::UnknownMethod(_))
        ));
    }

    #[test]
    fn missing_validator_rejected() {
        let doc = "x:\n  target_methods: init\n";
        assert!(matches!(
            parse_convention_str("t", doc),
            Err(ConventionError::Document(_))
        ));
    }

    #[test]
    fn bad_regex_rejected_at_parse_time() {
        let doc = "x:\n  validator: regex(unclosed[)\n  target_methods: init\n";
        assert!(parse_convention_str("t", doc).is_err());
    }

    #[test]
    fn file_roundtrip() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("tbx.yaml");
        std::fs::write(&path, DOC).unwrap();
        let cv = load_convention(&path).unwrap();
        assert_eq!(cv.name(), "tbx");
    }

    #[test]
    fn register_and_list_documents() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = crate::core::paths::UserDirs::at(tmp.path().join("home"));
        let doc_path = tmp.path().join("tbx.yaml");
        std::fs::write(&doc_path, DOC).unwrap();

        let name = register_file(&doc_path, &dirs, false).unwrap();
        assert_eq!(name, "tbx");
        assert!(matches!(
            register_file(&doc_path, &dirs, false),
            Err(ConventionError::AlreadyRegistered(_))
        ));

        let registered = load_registered(&dirs).unwrap();
        assert_eq!(registered.len(), 1);
        assert_eq!(registered[0].name(), "tbx");
    }
}
