//! semantic
//!
//! The semantic-annotation tagging contract: attributes and objects
//! can be tagged with RDF-style IRIs (predicates for attributes, a
//! type for the object itself), stored in reserved JSON-map
//! attributes alongside the data.
//!
//! Graph serialization is out of scope; this module only maintains
//! the tags.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::types::ObjectPath;
use crate::store::{AttrValue, DataFile, StoreError};

/// Reserved attribute carrying `attribute name → predicate IRI`.
pub const PREDICATE_ATTR: &str = "RDF_PREDICATE";

/// Reserved attribute carrying the object's type IRI.
pub const TYPE_ATTR: &str = "RDF_TYPE";

/// Key under which the object itself (rather than one of its
/// attributes) is tagged in the predicate map.
pub const SELF_KEY: &str = "SELF";

/// Errors from semantic tagging.
#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("invalid IRI '{value}': {reason}")]
    InvalidIri { value: String, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Validate an IRI: an absolute `http(s)` URL or a `prefix:local`
/// CURIE.
fn check_iri(s: &str) -> Result<(), SemanticError> {
    if s.starts_with("http://") || s.starts_with("https://") {
        return url::Url::parse(s).map(|_| ()).map_err(|e| SemanticError::InvalidIri {
            value: s.to_string(),
            reason: e.to_string(),
        });
    }
    // CURIE form
    if let Some((prefix, local)) = s.split_once(':') {
        let prefix_ok = !prefix.is_empty()
            && prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if prefix_ok && !local.is_empty() && !local.contains(char::is_whitespace) {
            return Ok(());
        }
    }
    Err(SemanticError::InvalidIri {
        value: s.to_string(),
        reason: "expected an absolute http(s) URL or a prefix:local CURIE".to_string(),
    })
}

/// Tag an attribute of an object with a predicate IRI.
///
/// Pass [`SELF_KEY`] as `attr_name` to tag the object itself.
///
/// # Errors
///
/// Fails on malformed IRIs or missing objects.
pub fn set_predicate(
    file: &mut DataFile,
    path: &str,
    attr_name: &str,
    iri: &str,
) -> Result<(), SemanticError> {
    check_iri(iri)?;
    let path = ObjectPath::new(path).map_err(StoreError::from)?;

    let mut map = predicate_map(file, &path).unwrap_or_default();
    map.insert(attr_name.to_string(), Value::String(iri.to_string()));
    file.set_attr_raw(&path, PREDICATE_ATTR, AttrValue::Json(map))?;
    Ok(())
}

/// The predicate IRI tagged onto an attribute, if any.
pub fn predicate(file: &DataFile, path: &str, attr_name: &str) -> Option<String> {
    let path = ObjectPath::new(path).ok()?;
    predicate_map(file, &path)?
        .get(attr_name)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Tag an object with a type IRI.
///
/// # Errors
///
/// Fails on malformed IRIs or missing objects.
pub fn set_type(file: &mut DataFile, path: &str, iri: &str) -> Result<(), SemanticError> {
    check_iri(iri)?;
    let path = ObjectPath::new(path).map_err(StoreError::from)?;
    file.set_attr_raw(&path, TYPE_ATTR, AttrValue::Str(iri.to_string()))?;
    Ok(())
}

/// The type IRI tagged onto an object, if any.
pub fn type_of(file: &DataFile, path: &str) -> Option<String> {
    file.attr_at(path, TYPE_ATTR)
        .and_then(AttrValue::as_str)
        .map(str::to_string)
}

fn predicate_map(file: &DataFile, path: &ObjectPath) -> Option<Map<String, Value>> {
    file.attr_at(path.as_str(), PREDICATE_ATTR)
        .and_then(AttrValue::as_json)
        .cloned()
}
