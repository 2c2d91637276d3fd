//! store::attrs
//!
//! Tagged attribute values and their flat-string encoding.
//!
//! # Design
//!
//! Attribute values are an explicit tagged variant rather than sniffed
//! strings: a value is a scalar, a list, a reference to another object
//! in the hierarchy, or a JSON map. In memory and in the persisted
//! file the tag travels with the value.
//!
//! The legacy flat-string encoding (used when attributes must be
//! rendered into a single string cell, e.g. XML export or `dump`
//! output) tags by first character: `{` marks a JSON map, `/` marks an
//! object reference. [`AttrValue::encode`]/[`AttrValue::decode`] form
//! a total, round-trip-safe pair: literal strings that would collide
//! with a tag character are escaped with a leading backslash.
//!
//! # Example
//!
//! ```
//! use h5conv::store::AttrValue;
//!
//! let value = AttrValue::from("m/s");
//! assert_eq!(AttrValue::decode(&value.encode()), value);
//!
//! let reference = AttrValue::reference("/devices/fan").unwrap();
//! assert_eq!(reference.encode(), "/devices/fan");
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::types::{ObjectPath, TypeError};

/// An attribute value.
///
/// The variant is the type tag; no string sniffing happens outside the
/// flat-string (de)serialization boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    /// A string scalar.
    Str(String),
    /// An integer scalar.
    Int(i64),
    /// A floating-point scalar.
    Float(f64),
    /// A boolean scalar.
    Bool(bool),
    /// A list of values.
    List(Vec<AttrValue>),
    /// A JSON map, e.g. structured provenance records.
    Json(Map<String, Value>),
    /// A reference to another object in the same hierarchy.
    Reference(ObjectPath),
}

impl AttrValue {
    /// Build a reference value from a path string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidObjectPath` for non-absolute paths.
    pub fn reference(path: &str) -> Result<Self, TypeError> {
        Ok(AttrValue::Reference(ObjectPath::new(path)?))
    }

    /// The string content, if this is a string scalar.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The integer content, if this is an integer scalar.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The float content; integers widen.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(f) => Some(*f),
            AttrValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The JSON map content, if this is a map.
    pub fn as_json(&self) -> Option<&Map<String, Value>> {
        match self {
            AttrValue::Json(map) => Some(map),
            _ => None,
        }
    }

    /// The referenced path, if this is a reference.
    pub fn as_reference(&self) -> Option<&ObjectPath> {
        match self {
            AttrValue::Reference(path) => Some(path),
            _ => None,
        }
    }

    /// Short kind name for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            AttrValue::Str(_) => "string",
            AttrValue::Int(_) => "integer",
            AttrValue::Float(_) => "float",
            AttrValue::Bool(_) => "boolean",
            AttrValue::List(_) => "list",
            AttrValue::Json(_) => "json map",
            AttrValue::Reference(_) => "object reference",
        }
    }

    /// Encode into the flat-string form.
    ///
    /// - `Json` renders as a JSON object (first character `{`)
    /// - `Reference` renders as the path (first character `/`)
    /// - `List` renders as a JSON array (first character `[`)
    /// - `Str` renders verbatim; a leading `{`, `/`, `[` or `\` is
    ///   escaped with a backslash so decoding is unambiguous
    /// - numeric and boolean scalars render as their display form (the
    ///   flat format does not distinguish them from strings)
    pub fn encode(&self) -> String {
        match self {
            AttrValue::Str(s) => {
                if s.starts_with('{') || s.starts_with('/') || s.starts_with('[') || s.starts_with('\\')
                {
                    format!("\\{s}")
                } else {
                    s.clone()
                }
            }
            AttrValue::Int(i) => i.to_string(),
            AttrValue::Float(f) => f.to_string(),
            AttrValue::Bool(b) => b.to_string(),
            AttrValue::List(items) => {
                let fragments: Vec<Value> = items.iter().map(|v| v.to_json_fragment()).collect();
                Value::Array(fragments).to_string() // always `[`-prefixed
            }
            AttrValue::Json(map) => {
                Value::Object(map.clone()).to_string() // always `{`-prefixed
            }
            AttrValue::Reference(path) => path.to_string(),
        }
    }

    /// Decode the flat-string form.
    ///
    /// Total: every input maps to a value. Malformed JSON after a `{`
    /// or `[` and malformed paths after a `/` fall back to plain
    /// strings.
    pub fn decode(s: &str) -> AttrValue {
        if let Some(rest) = s.strip_prefix('\\') {
            return AttrValue::Str(rest.to_string());
        }
        if s.starts_with('{') {
            if let Ok(Value::Object(map)) = serde_json::from_str(s) {
                return AttrValue::Json(map);
            }
            return AttrValue::Str(s.to_string());
        }
        if s.starts_with('[') {
            if let Ok(Value::Array(items)) = serde_json::from_str(s) {
                return AttrValue::List(
                    items.into_iter().map(AttrValue::from_json_fragment).collect(),
                );
            }
            return AttrValue::Str(s.to_string());
        }
        if s.starts_with('/') {
            if let Ok(path) = ObjectPath::new(s) {
                return AttrValue::Reference(path);
            }
            return AttrValue::Str(s.to_string());
        }
        AttrValue::Str(s.to_string())
    }

    /// Render as a JSON fragment for list encoding. References become
    /// `/`-prefixed strings, colliding literal strings are escaped.
    fn to_json_fragment(&self) -> Value {
        match self {
            AttrValue::Str(s) => {
                if s.starts_with('{') || s.starts_with('/') || s.starts_with('[') || s.starts_with('\\')
                {
                    Value::String(format!("\\{s}"))
                } else {
                    Value::String(s.clone())
                }
            }
            AttrValue::Int(i) => Value::from(*i),
            AttrValue::Float(f) => Value::from(*f),
            AttrValue::Bool(b) => Value::from(*b),
            AttrValue::List(items) => {
                Value::Array(items.iter().map(|v| v.to_json_fragment()).collect())
            }
            AttrValue::Json(map) => Value::Object(map.clone()),
            AttrValue::Reference(path) => Value::String(path.to_string()),
        }
    }

    /// Rebuild a value from a JSON fragment produced by
    /// [`Self::to_json_fragment`].
    fn from_json_fragment(value: Value) -> AttrValue {
        match value {
            Value::String(s) => {
                if let Some(rest) = s.strip_prefix('\\') {
                    AttrValue::Str(rest.to_string())
                } else if s.starts_with('/') {
                    match ObjectPath::new(&s) {
                        Ok(path) => AttrValue::Reference(path),
                        Err(_) => AttrValue::Str(s),
                    }
                } else {
                    AttrValue::Str(s)
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AttrValue::Int(i)
                } else {
                    AttrValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::Bool(b) => AttrValue::Bool(b),
            Value::Array(items) => {
                AttrValue::List(items.into_iter().map(AttrValue::from_json_fragment).collect())
            }
            Value::Object(map) => AttrValue::Json(map),
            Value::Null => AttrValue::Str(String::new()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => write!(f, "{s}"),
            other => write!(f, "{}", other.encode()),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Str(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(value: AttrValue) {
        assert_eq!(AttrValue::decode(&value.encode()), value);
    }

    #[test]
    fn plain_string_roundtrip() {
        roundtrip(AttrValue::from("x component of velocity"));
    }

    #[test]
    fn json_map_roundtrip() {
        let mut map = Map::new();
        map.insert("device".to_string(), Value::String("fan".to_string()));
        map.insert("serial".to_string(), Value::from(42));
        roundtrip(AttrValue::Json(map));
    }

    #[test]
    fn reference_roundtrip() {
        roundtrip(AttrValue::reference("/devices/fan").unwrap());
    }

    #[test]
    fn colliding_strings_escape() {
        // literal strings that look like tags still round-trip
        roundtrip(AttrValue::from("{not json"));
        roundtrip(AttrValue::from("/not/a/registered/ref"));
        roundtrip(AttrValue::from("[not a list"));
        roundtrip(AttrValue::from("\\already escaped"));
    }

    #[test]
    fn list_roundtrip() {
        roundtrip(AttrValue::List(vec![
            AttrValue::from("a"),
            AttrValue::Int(2),
            AttrValue::Bool(true),
            AttrValue::reference("/grp/ds").unwrap(),
        ]));
    }

    #[test]
    fn json_encoding_is_brace_prefixed() {
        let mut map = Map::new();
        map.insert("k".to_string(), Value::from(1));
        let encoded = AttrValue::Json(map).encode();
        assert!(encoded.starts_with('{'));
    }

    #[test]
    fn reference_encoding_is_slash_prefixed() {
        let encoded = AttrValue::reference("/a/b").unwrap().encode();
        assert!(encoded.starts_with('/'));
    }

    #[test]
    fn malformed_json_decodes_as_string() {
        assert_eq!(
            AttrValue::decode("{oops"),
            AttrValue::Str("{oops".to_string())
        );
    }

    #[test]
    fn float_widening() {
        assert_eq!(AttrValue::Int(3).as_float(), Some(3.0));
    }

    #[test]
    fn serde_tagged_representation() {
        let v = AttrValue::from("m/s");
        let json = serde_json::to_string(&v).unwrap();
        assert!(json.contains("\"kind\""));
        let back: AttrValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }
}
