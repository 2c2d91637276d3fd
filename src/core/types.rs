//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`Version`] - Validated table/convention version (`vMAJOR[.MINOR][a|b|rc|dev]`)
//! - [`Orcid`] - Validated ORCID identifier (pattern + ISO 7064 checksum)
//! - [`Contact`] - Contact field, either an email address or a URL
//! - [`ObjectPath`] - Absolute path of an object inside a data file
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use h5conv::core::types::{Version, Orcid, Contact};
//!
//! // Valid constructions
//! let version = Version::new("v1.2rc").unwrap();
//! let orcid = Orcid::new("0000-0002-1825-0097").unwrap();
//! let contact = Contact::new("someone@example.org").unwrap();
//!
//! // Invalid constructions fail at creation time
//! assert!(Version::new("1.2").is_err());
//! assert!(Orcid::new("0000-0002-1825-0090").is_err()); // bad checksum
//! assert!(Contact::new("not a contact").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid version: {0}")]
    InvalidVersion(String),

    #[error("invalid ORCID: {0}")]
    InvalidOrcid(String),

    #[error("invalid contact: {0}")]
    InvalidContact(String),

    #[error("invalid object path: {0}")]
    InvalidObjectPath(String),

    #[error("invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Version suffix of a pre-release table or convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionSuffix {
    /// Alpha release (`a`)
    A,
    /// Beta release (`b`)
    B,
    /// Release candidate (`rc`)
    Rc,
    /// Development snapshot (`dev`)
    Dev,
}

impl VersionSuffix {
    fn as_str(&self) -> &'static str {
        match self {
            VersionSuffix::A => "a",
            VersionSuffix::B => "b",
            VersionSuffix::Rc => "rc",
            VersionSuffix::Dev => "dev",
        }
    }
}

/// A validated version string.
///
/// Versions follow the pattern `vMAJOR[.MINOR][a|b|rc|dev]`:
/// - `v1`
/// - `v2.3`
/// - `v1.0rc`
///
/// # Example
///
/// ```
/// use h5conv::core::types::Version;
///
/// let v = Version::new("v2.3dev").unwrap();
/// assert_eq!(v.major(), 2);
/// assert_eq!(v.minor(), Some(3));
/// assert_eq!(v.to_string(), "v2.3dev");
///
/// assert!(Version::new("v").is_err());
/// assert!(Version::new("2.3").is_err());
/// assert!(Version::new("v1.2.3").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    major: u32,
    minor: Option<u32>,
    suffix: Option<VersionSuffix>,
}

impl Version {
    /// Parse and validate a version string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidVersion` if the string does not match
    /// `vMAJOR[.MINOR][a|b|rc|dev]`.
    pub fn new(s: &str) -> Result<Self, TypeError> {
        let rest = s
            .strip_prefix('v')
            .ok_or_else(|| TypeError::InvalidVersion(format!("'{s}' must start with 'v'")))?;

        let (numeric, suffix) = if let Some(n) = rest.strip_suffix("dev") {
            (n, Some(VersionSuffix::Dev))
        } else if let Some(n) = rest.strip_suffix("rc") {
            (n, Some(VersionSuffix::Rc))
        } else if let Some(n) = rest.strip_suffix('b') {
            (n, Some(VersionSuffix::B))
        } else if let Some(n) = rest.strip_suffix('a') {
            (n, Some(VersionSuffix::A))
        } else {
            (rest, None)
        };

        let mut parts = numeric.split('.');
        let major = parts
            .next()
            .filter(|p| !p.is_empty())
            .and_then(|p| p.parse::<u32>().ok())
            .ok_or_else(|| {
                TypeError::InvalidVersion(format!("'{s}' has no numeric major version"))
            })?;
        let minor = match parts.next() {
            Some(p) => Some(p.parse::<u32>().map_err(|_| {
                TypeError::InvalidVersion(format!("'{s}' has a non-numeric minor version"))
            })?),
            None => None,
        };
        if parts.next().is_some() {
            return Err(TypeError::InvalidVersion(format!(
                "'{s}' has too many version components"
            )));
        }

        Ok(Self {
            major,
            minor,
            suffix,
        })
    }

    /// Major version number.
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Minor version number, if present.
    pub fn minor(&self) -> Option<u32> {
        self.minor
    }

    /// Pre-release suffix, if present.
    pub fn suffix(&self) -> Option<VersionSuffix> {
        self.suffix
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.major)?;
        if let Some(minor) = self.minor {
            write!(f, ".{minor}")?;
        }
        if let Some(suffix) = self.suffix {
            write!(f, "{}", suffix.as_str())?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Version {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Version::new(&s)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> String {
        v.to_string()
    }
}

impl std::str::FromStr for Version {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::new(s)
    }
}

/// A validated ORCID identifier.
///
/// ORCID iDs are 16-digit identifiers grouped in four blocks of four,
/// where the last character is a checksum digit (ISO 7064 mod 11-2)
/// that may be `X`.
///
/// # Example
///
/// ```
/// use h5conv::core::types::Orcid;
///
/// let id = Orcid::new("0000-0002-1825-0097").unwrap();
/// assert_eq!(id.as_str(), "0000-0002-1825-0097");
/// assert_eq!(id.url(), "https://orcid.org/0000-0002-1825-0097");
///
/// // The full URL form is accepted too
/// assert!(Orcid::new("https://orcid.org/0000-0002-1825-0097").is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Orcid(String);

impl Orcid {
    /// Parse and validate an ORCID identifier.
    ///
    /// Accepts the bare `XXXX-XXXX-XXXX-XXXX` form or the
    /// `https://orcid.org/...` URL form.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOrcid` on pattern or checksum failure.
    pub fn new(s: &str) -> Result<Self, TypeError> {
        let id = s
            .strip_prefix("https://orcid.org/")
            .or_else(|| s.strip_prefix("http://orcid.org/"))
            .unwrap_or(s);

        let blocks: Vec<&str> = id.split('-').collect();
        if blocks.len() != 4 {
            return Err(TypeError::InvalidOrcid(format!(
                "'{s}' must have four blocks separated by '-'"
            )));
        }
        for (i, block) in blocks.iter().enumerate() {
            if block.len() != 4 {
                return Err(TypeError::InvalidOrcid(format!(
                    "'{s}' block {} must be four characters",
                    i + 1
                )));
            }
        }
        let digits: String = blocks.concat();
        for (i, c) in digits.chars().enumerate() {
            let last = i == 15;
            if !(c.is_ascii_digit() || (last && c == 'X')) {
                return Err(TypeError::InvalidOrcid(format!(
                    "'{s}' contains an invalid character '{c}'"
                )));
            }
        }

        if Self::checksum(&digits[..15]) != digits.chars().nth(15).unwrap_or('?') {
            return Err(TypeError::InvalidOrcid(format!("'{s}' has a bad checksum")));
        }

        Ok(Self(id.to_string()))
    }

    /// Compute the ISO 7064 mod 11-2 check character for the 15 base digits.
    fn checksum(base: &str) -> char {
        let mut total: u32 = 0;
        for c in base.chars() {
            let digit = c.to_digit(10).unwrap_or(0);
            total = (total + digit) * 2;
        }
        let remainder = total % 11;
        let result = (12 - remainder) % 11;
        if result == 10 {
            'X'
        } else {
            char::from_digit(result, 10).unwrap_or('0')
        }
    }

    /// The bare identifier (`XXXX-XXXX-XXXX-XXXX`).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical URL form.
    pub fn url(&self) -> String {
        format!("https://orcid.org/{}", self.0)
    }
}

impl fmt::Display for Orcid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Orcid {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Orcid::new(&s)
    }
}

impl From<Orcid> for String {
    fn from(o: Orcid) -> String {
        o.0
    }
}

/// A contact field: either an email address or a URL.
///
/// Standard-name tables carry a `contact` entry that must be
/// syntactically valid; both forms are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Contact(String);

impl Contact {
    /// Parse and validate a contact string.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidContact` if the string is neither a
    /// syntactically valid email address nor an absolute URL.
    pub fn new(s: &str) -> Result<Self, TypeError> {
        if is_valid_email(s) {
            return Ok(Self(s.to_string()));
        }
        if url::Url::parse(s).is_ok() && (s.starts_with("http://") || s.starts_with("https://")) {
            return Ok(Self(s.to_string()));
        }
        Err(TypeError::InvalidContact(format!(
            "'{s}' is neither an email address nor a URL"
        )))
    }

    /// Get the contact as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Contact {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Contact::new(&s)
    }
}

impl From<Contact> for String {
    fn from(c: Contact) -> String {
        c.0
    }
}

/// Syntactic email check: one `@`, non-empty local part, dotted domain.
fn is_valid_email(s: &str) -> bool {
    let mut parts = s.splitn(2, '@');
    let (local, domain) = match (parts.next(), parts.next()) {
        (Some(l), Some(d)) => (l, d),
        _ => return false,
    };
    if local.is_empty() || domain.is_empty() || s.contains(' ') {
        return false;
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    domain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

/// An absolute path of an object inside a data file.
///
/// Paths start with `/`; the root group is `/`. Components are
/// separated by `/` and must be non-empty.
///
/// # Example
///
/// ```
/// use h5conv::core::types::ObjectPath;
///
/// let path = ObjectPath::new("/devices/fan").unwrap();
/// assert_eq!(path.basename(), "fan");
/// assert_eq!(path.parent().unwrap().as_str(), "/devices");
///
/// assert!(ObjectPath::new("relative/path").is_err());
/// assert!(ObjectPath::new("/a//b").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectPath(String);

impl ObjectPath {
    /// The root group path.
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Parse and validate an object path.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidObjectPath` for relative paths, empty
    /// components, or trailing slashes (other than the bare root).
    pub fn new(s: &str) -> Result<Self, TypeError> {
        if s == "/" {
            return Ok(Self::root());
        }
        if !s.starts_with('/') {
            return Err(TypeError::InvalidObjectPath(format!(
                "'{s}' must be absolute (start with '/')"
            )));
        }
        if s.ends_with('/') {
            return Err(TypeError::InvalidObjectPath(format!(
                "'{s}' must not end with '/'"
            )));
        }
        if s[1..].split('/').any(|c| c.is_empty()) {
            return Err(TypeError::InvalidObjectPath(format!(
                "'{s}' contains an empty component"
            )));
        }
        Ok(Self(s.to_string()))
    }

    /// True for the root group path.
    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    /// Path components, excluding the root.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// The final path component (the object name); `/` for the root.
    pub fn basename(&self) -> &str {
        self.0
            .rsplit('/')
            .next()
            .filter(|c| !c.is_empty())
            .unwrap_or("/")
    }

    /// The parent path, or `None` for the root.
    pub fn parent(&self) -> Option<ObjectPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rsplit_once('/') {
            Some(("", _)) => Some(ObjectPath::root()),
            Some((parent, _)) => Some(ObjectPath(parent.to_string())),
            None => None,
        }
    }

    /// Append a child component.
    pub fn join(&self, child: &str) -> ObjectPath {
        if self.is_root() {
            ObjectPath(format!("/{child}"))
        } else {
            ObjectPath(format!("{}/{child}", self.0))
        }
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for ObjectPath {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        ObjectPath::new(&s)
    }
}

impl From<ObjectPath> for String {
    fn from(p: ObjectPath) -> String {
        p.0
    }
}

/// A validated, compiled regex pattern.
///
/// Compilation happens at construction (and at deserialization), so a
/// `Pattern` held by a validator or layout node can never fail to
/// compile at match time. Matching is anchored at the start of the
/// candidate.
///
/// # Example
///
/// ```
/// use h5conv::core::types::Pattern;
///
/// let p = Pattern::new("[a-z]+_velocity").unwrap();
/// assert!(p.matches("x_velocity"));
/// assert!(!p.matches("Velocity"));
/// assert!(Pattern::new("unclosed(").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    raw: String,
    regex: regex::Regex,
}

impl Pattern {
    /// Compile a pattern.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidPattern` if the regex does not compile.
    pub fn new(pattern: &str) -> Result<Self, TypeError> {
        // matching is anchored at the start, not a substring search
        let anchored = if pattern.starts_with('^') {
            pattern.to_string()
        } else {
            format!("^(?:{pattern})")
        };
        let regex = regex::Regex::new(&anchored).map_err(|e| TypeError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            raw: pattern.to_string(),
            regex,
        })
    }

    /// True when the candidate matches from the start.
    pub fn matches(&self, candidate: &str) -> bool {
        self.regex.is_match(candidate)
    }

    /// The original pattern text.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl TryFrom<String> for Pattern {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Pattern::new(&s)
    }
}

impl From<Pattern> for String {
    fn from(p: Pattern) -> String {
        p.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod version {
        use super::*;

        #[test]
        fn major_only() {
            let v = Version::new("v1").unwrap();
            assert_eq!(v.major(), 1);
            assert_eq!(v.minor(), None);
            assert_eq!(v.suffix(), None);
            assert_eq!(v.to_string(), "v1");
        }

        #[test]
        fn major_minor() {
            let v = Version::new("v10.04").unwrap();
            assert_eq!(v.major(), 10);
            assert_eq!(v.minor(), Some(4));
        }

        #[test]
        fn suffixes() {
            assert_eq!(Version::new("v1a").unwrap().suffix(), Some(VersionSuffix::A));
            assert_eq!(Version::new("v1b").unwrap().suffix(), Some(VersionSuffix::B));
            assert_eq!(
                Version::new("v1.2rc").unwrap().suffix(),
                Some(VersionSuffix::Rc)
            );
            assert_eq!(
                Version::new("v3dev").unwrap().suffix(),
                Some(VersionSuffix::Dev)
            );
        }

        #[test]
        fn rejects_malformed() {
            for bad in ["", "v", "1.2", "v1.2.3", "vx", "v1.x", "v1.2beta"] {
                assert!(Version::new(bad).is_err(), "expected '{bad}' to fail");
            }
        }

        #[test]
        fn roundtrip_serde() {
            let v = Version::new("v2.1rc").unwrap();
            let json = serde_json::to_string(&v).unwrap();
            assert_eq!(json, "\"v2.1rc\"");
            let back: Version = serde_json::from_str(&json).unwrap();
            assert_eq!(back, v);
        }
    }

    mod orcid {
        use super::*;

        #[test]
        fn valid_ids() {
            // Well-known example iDs with valid checksums
            assert!(Orcid::new("0000-0002-1825-0097").is_ok());
            assert!(Orcid::new("0000-0001-5109-3700").is_ok());
            assert!(Orcid::new("0000-0002-1694-233X").is_ok());
        }

        #[test]
        fn url_form_accepted() {
            let id = Orcid::new("https://orcid.org/0000-0002-1825-0097").unwrap();
            assert_eq!(id.as_str(), "0000-0002-1825-0097");
        }

        #[test]
        fn bad_checksum_rejected() {
            assert!(Orcid::new("0000-0002-1825-0090").is_err());
        }

        #[test]
        fn bad_shape_rejected() {
            assert!(Orcid::new("0000-0002-1825").is_err());
            assert!(Orcid::new("0000-0002-1825-00979").is_err());
            assert!(Orcid::new("0000_0002_1825_0097").is_err());
            assert!(Orcid::new("0000-0002-18X5-0097").is_err());
        }
    }

    mod contact {
        use super::*;

        #[test]
        fn email_accepted() {
            assert!(Contact::new("user@example.org").is_ok());
            assert!(Contact::new("first.last@sub.example.org").is_ok());
        }

        #[test]
        fn url_accepted() {
            assert!(Contact::new("https://example.org/contact").is_ok());
        }

        #[test]
        fn garbage_rejected() {
            assert!(Contact::new("not a contact").is_err());
            assert!(Contact::new("user@").is_err());
            assert!(Contact::new("@example.org").is_err());
            assert!(Contact::new("user@nodot").is_err());
        }
    }

    mod pattern {
        use super::*;

        #[test]
        fn matches_from_start() {
            let p = Pattern::new("[a-z]+").unwrap();
            assert!(p.matches("abc"));
            assert!(p.matches("abc123")); // prefix match
            assert!(!p.matches("123abc"));
        }

        #[test]
        fn explicit_anchor_preserved() {
            let p = Pattern::new("^x_.*$").unwrap();
            assert!(p.matches("x_velocity"));
            assert!(!p.matches("y_velocity"));
        }

        #[test]
        fn bad_pattern_rejected() {
            assert!(Pattern::new("unclosed(").is_err());
        }

        #[test]
        fn serde_roundtrip_recompiles() {
            let p = Pattern::new("dev[0-9]+").unwrap();
            let json = serde_json::to_string(&p).unwrap();
            let back: Pattern = serde_json::from_str(&json).unwrap();
            assert_eq!(back, p);
            assert!(back.matches("dev42"));
        }
    }

    mod object_path {
        use super::*;

        #[test]
        fn root() {
            let p = ObjectPath::root();
            assert!(p.is_root());
            assert_eq!(p.basename(), "/");
            assert_eq!(p.parent(), None);
        }

        #[test]
        fn nested() {
            let p = ObjectPath::new("/a/b/c").unwrap();
            assert_eq!(p.basename(), "c");
            assert_eq!(p.parent().unwrap().as_str(), "/a/b");
            assert_eq!(p.components().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        }

        #[test]
        fn join() {
            assert_eq!(ObjectPath::root().join("a").as_str(), "/a");
            assert_eq!(ObjectPath::new("/a").unwrap().join("b").as_str(), "/a/b");
        }

        #[test]
        fn rejects_malformed() {
            assert!(ObjectPath::new("relative").is_err());
            assert!(ObjectPath::new("/a/").is_err());
            assert!(ObjectPath::new("/a//b").is_err());
            assert!(ObjectPath::new("").is_err());
        }
    }
}
