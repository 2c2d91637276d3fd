//! standard_name::table
//!
//! The standard-name table: a domain vocabulary mapping names to
//! canonical units and descriptions, with transformation-based lookup
//! and unit-compatibility checking.
//!
//! # Invariants
//!
//! - Every entry's unit expression parses
//! - Every entry name and alias satisfies the table's syntax rules
//! - The version matches `vMAJOR[.MINOR][a|b|rc|dev]`
//!
//! These hold by construction: the only ways to build a table are the
//! validating constructors and the validating document conversion.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::name::{StandardName, SyntaxRules};
use super::transform::TRANSFORMATIONS;
use super::{LookupError, StandardNameError, SIMILARITY_THRESHOLD};
use crate::core::types::{Contact, ObjectPath, Pattern, TypeError, Version};
use crate::store::{AttrValue, DataFile, Group};
use crate::units::{Unit, UnitsError};

/// Recursion bound for nested transformations and alias chains.
const MAX_LOOKUP_DEPTH: u32 = 32;

/// Errors from table construction, mutation, and persistence.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("entry '{name}': {source}")]
    EntryUnits {
        name: String,
        source: UnitsError,
    },

    #[error(transparent)]
    Syntax(#[from] StandardNameError),

    #[error(transparent)]
    Type(#[from] TypeError),

    #[error("no entry named '{0}' in the table")]
    UnknownEntry(String),

    #[error("cannot read table: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse table document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("cannot parse table document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot parse XML table: {0}")]
    Xml(String),

    #[error("standard name table '{0}' already registered (pass overwrite to replace)")]
    AlreadyRegistered(String),

    #[error("no registered standard name table named '{0}'")]
    NotRegistered(String),

    #[error("registered table name '{0}' is ambiguous; candidates: {1:?}")]
    Ambiguous(String, Vec<String>),

    #[error("cannot interpret '{0}' as a standard name table")]
    Unrecognized(String),
}

/// One table entry: canonical units, description, optional alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableEntry {
    /// Canonical unit expression. Legacy documents may use the key
    /// `canonical_units`.
    #[serde(alias = "canonical_units")]
    pub units: String,
    /// Human-readable description.
    pub description: String,
    /// Alternative name resolving to this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// A domain vocabulary: name → canonical unit + description, plus
/// transformation rules, alias maps, and device/location vocabularies.
///
/// # Example
///
/// ```
/// use h5conv::core::types::Version;
/// use h5conv::standard_name::StandardNameTable;
///
/// let mut table = StandardNameTable::new("demo", Version::new("v1").unwrap());
/// table.set("x_velocity", "m/s", "x component of velocity").unwrap();
///
/// assert!(table.check("x_velocity", Some("m s^-1")));
/// assert!(!table.check("x_velocity", Some("kg")));
/// assert!(!table.check("not_there", Some("m/s")));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TableDoc", into = "TableDoc")]
pub struct StandardNameTable {
    name: String,
    version: Version,
    institution: Option<String>,
    contact: Option<Contact>,
    last_modified: Option<DateTime<Utc>>,
    valid_characters: Option<Pattern>,
    pattern: Option<Pattern>,
    devices: Vec<String>,
    locations: Vec<String>,
    entries: BTreeMap<String, TableEntry>,
    alias: BTreeMap<String, String>,
    translation: BTreeMap<String, String>,
}

impl StandardNameTable {
    /// Create an empty table.
    pub fn new(name: &str, version: Version) -> Self {
        Self {
            name: name.to_string(),
            version,
            institution: None,
            contact: None,
            last_modified: None,
            valid_characters: None,
            pattern: None,
            devices: Vec::new(),
            locations: Vec::new(),
            entries: BTreeMap::new(),
            alias: BTreeMap::new(),
            translation: BTreeMap::new(),
        }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table version.
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Registry key: `<name>-<version>`.
    pub fn versionname(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Issuing institution, if recorded.
    pub fn institution(&self) -> Option<&str> {
        self.institution.as_deref()
    }

    /// Contact, if recorded.
    pub fn contact(&self) -> Option<&Contact> {
        self.contact.as_ref()
    }

    /// Last modification timestamp, if recorded.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// Registered device vocabulary.
    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    /// Registered location vocabulary.
    pub fn locations(&self) -> &[String] {
        &self.locations
    }

    /// Dataset-name → standard-name translation map.
    pub fn translation(&self) -> &BTreeMap<String, String> {
        &self.translation
    }

    /// Entries in name order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &TableEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Direct containment (no transformations, no aliases).
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Set metadata fields.
    pub fn with_institution(mut self, institution: &str) -> Self {
        self.institution = Some(institution.to_string());
        self
    }

    /// Set the contact.
    pub fn with_contact(mut self, contact: Contact) -> Self {
        self.contact = Some(contact);
        self
    }

    /// Set the device vocabulary.
    pub fn with_devices(mut self, devices: Vec<String>) -> Self {
        self.devices = devices;
        self
    }

    /// Set the location vocabulary.
    pub fn with_locations(mut self, locations: Vec<String>) -> Self {
        self.locations = locations;
        self
    }

    /// The syntax rules this table imposes on names.
    pub fn syntax_rules(&self) -> SyntaxRules {
        let mut rules = SyntaxRules::default();
        if let Some(vc) = &self.valid_characters {
            rules.disallowed = vc.clone();
        }
        if let Some(p) = &self.pattern {
            rules.forbidden = p.clone();
        }
        rules
    }

    // --- mutation ---------------------------------------------------------

    /// Insert or replace an entry, validating name syntax and units.
    ///
    /// # Errors
    ///
    /// Returns `TableError` on syntax or unit violations.
    pub fn set(&mut self, name: &str, units: &str, description: &str) -> Result<&mut Self, TableError> {
        self.syntax_rules().check(name)?;
        Unit::parse(units).map_err(|source| TableError::EntryUnits {
            name: name.to_string(),
            source,
        })?;
        self.entries.insert(
            name.to_string(),
            TableEntry {
                units: units.to_string(),
                description: description.to_string(),
                alias: None,
            },
        );
        Ok(self)
    }

    /// Insert a validated standard name.
    pub fn set_standard_name(&mut self, sn: &StandardName) -> Result<&mut Self, TableError> {
        self.set(sn.name(), &sn.units().to_string(), sn.description())
    }

    /// Bulk insert.
    pub fn update<'a>(
        &mut self,
        names: impl IntoIterator<Item = (&'a str, &'a str, &'a str)>,
    ) -> Result<&mut Self, TableError> {
        for (name, units, description) in names {
            self.set(name, units, description)?;
        }
        Ok(self)
    }

    /// Modify an existing entry's units and/or description.
    ///
    /// # Errors
    ///
    /// Returns `TableError::UnknownEntry` if the entry does not exist.
    pub fn modify(
        &mut self,
        name: &str,
        units: Option<&str>,
        description: Option<&str>,
    ) -> Result<&mut Self, TableError> {
        if !self.entries.contains_key(name) {
            return Err(TableError::UnknownEntry(name.to_string()));
        }
        if let Some(units) = units {
            Unit::parse(units).map_err(|source| TableError::EntryUnits {
                name: name.to_string(),
                source,
            })?;
        }
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| TableError::UnknownEntry(name.to_string()))?;
        if let Some(units) = units {
            entry.units = units.to_string();
        }
        if let Some(description) = description {
            entry.description = description.to_string();
        }
        Ok(self)
    }

    /// Register an alias for an existing entry.
    pub fn set_alias(&mut self, alias: &str, canonical: &str) -> Result<&mut Self, TableError> {
        self.syntax_rules().check(alias)?;
        if !self.entries.contains_key(canonical) {
            return Err(TableError::UnknownEntry(canonical.to_string()));
        }
        self.alias.insert(alias.to_string(), canonical.to_string());
        Ok(self)
    }

    // --- lookup -----------------------------------------------------------

    /// All alias → canonical pairs: entry-level aliases plus the
    /// table-level alias map.
    pub fn aliases(&self) -> BTreeMap<String, String> {
        let mut out: BTreeMap<String, String> = self
            .entries
            .iter()
            .filter_map(|(name, entry)| entry.alias.clone().map(|a| (a, name.clone())))
            .collect();
        out.extend(self.alias.iter().map(|(a, c)| (a.clone(), c.clone())));
        out
    }

    /// Resolve a name to a [`StandardName`].
    ///
    /// Algorithm, in order:
    /// 1. exact table entry
    /// 2. transformations, first match whose sub-names resolve
    /// 3. alias maps, recursing once into the canonical name
    /// 4. failure with similarity suggestions
    ///
    /// # Errors
    ///
    /// `LookupError::NotFound` for unknown names (with suggestions);
    /// `LookupError::UnknownAffix` when a transformation references an
    /// unregistered device/location (a distinct, stricter kind).
    pub fn resolve(&self, name: &str) -> Result<StandardName, LookupError> {
        self.resolve_at_depth(name, 0)
    }

    pub(crate) fn resolve_at_depth(
        &self,
        name: &str,
        depth: u32,
    ) -> Result<StandardName, LookupError> {
        if depth >= MAX_LOOKUP_DEPTH {
            return Err(self.not_found(name));
        }

        if let Some(entry) = self.entries.get(name) {
            let units = Unit::parse(&entry.units)?;
            return Ok(StandardName::from_parts(
                name.to_string(),
                units,
                entry.description.clone(),
            ));
        }

        for (i, transformation) in TRANSFORMATIONS.iter().enumerate() {
            if let Some(sn) = transformation.apply(i, name, self, depth + 1)? {
                tracing::debug!(
                    name,
                    transformation = transformation.name,
                    "synthesized standard name"
                );
                return Ok(sn);
            }
        }

        if let Some(canonical) = self.aliases().get(name) {
            return self.resolve_at_depth(canonical, depth + 1);
        }

        Err(self.not_found(name))
    }

    fn not_found(&self, name: &str) -> LookupError {
        let mut suggestions: Vec<String> = self
            .entries
            .keys()
            .cloned()
            .chain(self.aliases().keys().cloned())
            .filter(|candidate| {
                strsim::normalized_levenshtein(name, candidate) > SIMILARITY_THRESHOLD
            })
            .collect();
        suggestions.sort();
        suggestions.dedup();
        LookupError::NotFound {
            name: name.to_string(),
            table: self.name.clone(),
            suggestions,
        }
    }

    /// True when the name resolves (directly, via a transformation, or
    /// via an alias). Hard lookup errors count as "does not resolve".
    pub fn check_name(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// Check a name, and optionally that the supplied units are
    /// base-unit-equivalent to the canonical units.
    pub fn check(&self, name: &str, units: Option<&str>) -> bool {
        let Ok(sn) = self.resolve(name) else {
            return false;
        };
        match units {
            None => true,
            Some(units) => sn.equal_unit(units).unwrap_or(false),
        }
    }

    // --- hierarchy checking -----------------------------------------------

    /// Walk a group and report datasets whose `standard_name`/`units`
    /// pair fails the table check.
    ///
    /// This is a reporting mechanism: violations accumulate, nothing
    /// aborts.
    pub fn check_group(
        &self,
        group: &Group,
        base: &ObjectPath,
        recursive: bool,
    ) -> Vec<NameCheckIssue> {
        let mut issues = Vec::new();
        let datasets: Vec<(ObjectPath, &crate::store::Dataset)> = if recursive {
            group.descendant_datasets(base)
        } else {
            group
                .child_datasets()
                .map(|(name, d)| (base.join(name), d))
                .collect()
        };
        for (path, dataset) in datasets {
            let Some(value) = dataset.attributes.get("standard_name") else {
                continue;
            };
            let Some(standard_name) = value.as_str() else {
                issues.push(NameCheckIssue {
                    path,
                    standard_name: value.encode(),
                    units: None,
                    message: "standard_name attribute is not a string".to_string(),
                });
                continue;
            };
            let units = dataset
                .attributes
                .get("units")
                .and_then(|v| v.as_str())
                .map(str::to_string);
            if !self.check(standard_name, units.as_deref()) {
                let message = match self.resolve(standard_name) {
                    Err(e) => e.to_string(),
                    Ok(sn) => format!(
                        "units '{}' are not compatible with canonical units '{}'",
                        units.as_deref().unwrap_or(""),
                        sn.units()
                    ),
                };
                issues.push(NameCheckIssue {
                    path,
                    standard_name: standard_name.to_string(),
                    units,
                    message,
                });
            }
        }
        issues
    }

    /// Check a whole file. See [`Self::check_group`].
    pub fn check_file(&self, file: &DataFile, recursive: bool) -> Vec<NameCheckIssue> {
        self.check_group(file.root(), &ObjectPath::root(), recursive)
    }

    /// Walk a file and assign `standard_name` attributes to datasets
    /// whose names appear in the translation map.
    ///
    /// Returns the number of datasets updated.
    pub fn apply_translation(
        &self,
        file: &mut DataFile,
        translation: &BTreeMap<String, String>,
        recursive: bool,
    ) -> usize {
        let targets: Vec<(ObjectPath, String)> = {
            let datasets: Vec<(ObjectPath, &crate::store::Dataset)> = if recursive {
                file.root().descendant_datasets(&ObjectPath::root())
            } else {
                file.root()
                    .child_datasets()
                    .map(|(name, d)| (ObjectPath::root().join(name), d))
                    .collect()
            };
            datasets
                .into_iter()
                .filter_map(|(path, _)| {
                    translation
                        .get(path.basename())
                        .or_else(|| translation.get(path.as_str()))
                        .map(|sn| (path, sn.clone()))
                })
                .collect()
        };
        let mut count = 0;
        for (path, standard_name) in targets {
            tracing::debug!(path = %path, standard_name, "assigning standard name");
            if file
                .set_attr_raw(&path, "standard_name", AttrValue::Str(standard_name))
                .is_ok()
            {
                count += 1;
            }
        }
        count
    }

    /// Apply this table's own translation map.
    pub fn update_datasets(&self, file: &mut DataFile, recursive: bool) -> usize {
        let translation = self.translation.clone();
        self.apply_translation(file, &translation, recursive)
    }

    // --- persistence ------------------------------------------------------

    /// Load a table from a YAML document string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, TableError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a table from a YAML file.
    ///
    /// A document without a `name` key takes the file stem as name.
    pub fn from_yaml(path: &Path) -> Result<Self, TableError> {
        let raw = std::fs::read_to_string(path)?;
        let mut doc: TableDoc = serde_yaml::from_str(&raw)?;
        if doc.name.is_empty() {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                doc.name = stem.to_string();
            }
        }
        Self::try_from(doc)
    }

    /// Serialize to a YAML document string.
    pub fn to_yaml_string(&self) -> Result<String, TableError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write to a YAML file, stamping `last_modified`.
    pub fn to_yaml(&mut self, path: &Path) -> Result<(), TableError> {
        self.touch(Utc::now());
        let yaml = self.to_yaml_string()?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Update the modification timestamp.
    pub(crate) fn touch(&mut self, when: DateTime<Utc>) {
        self.last_modified = Some(when);
    }

    /// Render as a JSON object (used to store tables in attributes).
    pub fn to_json_value(&self) -> Result<serde_json::Value, TableError> {
        Ok(serde_json::to_value(TableDoc::from(self.clone()))?)
    }

    /// Rebuild from a JSON object produced by [`Self::to_json_value`].
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, TableError> {
        let doc: TableDoc = serde_json::from_value(value)?;
        Self::try_from(doc)
    }

    /// Interpret an attribute value as a table: an inline JSON map, a
    /// YAML file path, or a registered `name[-version]`.
    pub fn from_attr_value(value: &AttrValue) -> Result<Self, TableError> {
        match value {
            AttrValue::Json(map) => {
                Self::from_json_value(serde_json::Value::Object(map.clone()))
            }
            AttrValue::Str(s) => {
                let path = Path::new(s);
                if path.extension().and_then(|e| e.to_str()).is_some_and(|e| {
                    e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml")
                }) && path.exists()
                {
                    return Self::from_yaml(path);
                }
                let dirs = crate::core::paths::UserDirs::discover();
                super::registry::load_registered(&dirs, s)
            }
            other => Err(TableError::Unrecognized(other.encode())),
        }
    }

    /// Content equality, ignoring the modification timestamp.
    pub fn content_eq(&self, other: &Self) -> bool {
        let mut a = TableDoc::from(self.clone());
        let mut b = TableDoc::from(other.clone());
        a.last_modified = None;
        b.last_modified = None;
        a == b
    }

    // --- renderings -------------------------------------------------------

    /// Render a Markdown table.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "---\ntitle: Standard Name Table {}\n---\n\n# Standard Name Table {} ({})\n\n",
            self.name, self.name, self.version
        ));
        out.push_str("| Standard Name |     units     | Description |\n");
        out.push_str("|---------------|:-------------:|:------------|\n");
        for (name, entry) in &self.entries {
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                name, entry.units, entry.description
            ));
        }
        out
    }

    /// Render a LaTeX table body.
    pub fn to_latex(&self) -> String {
        let mut out = String::new();
        out.push_str("\\begin{table}[htbp]\n\\centering\n");
        out.push_str(&format!("\\caption{{Standard Name Table {}}}\n", self.name));
        out.push_str("\\begin{tabular}{p{0.4\\textwidth}lp{.40\\textwidth}}\n");
        for (name, entry) in &self.entries {
            out.push_str(&format!(
                "{} & {} & {} \\\\\n",
                name.replace('_', "\\_"),
                entry.units,
                entry.description.replace('_', "\\_")
            ));
        }
        out.push_str("\\end{tabular}\n\\end{table}\n");
        out
    }
}

/// One reported violation from hierarchy checking.
#[derive(Debug, Clone, PartialEq)]
pub struct NameCheckIssue {
    /// Path of the offending dataset.
    pub path: ObjectPath,
    /// The standard name carried by the dataset.
    pub standard_name: String,
    /// The units carried by the dataset, if any.
    pub units: Option<String>,
    /// Human-readable reason.
    pub message: String,
}

impl std::fmt::Display for NameCheckIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: standard_name '{}': {}",
            self.path, self.standard_name, self.message
        )
    }
}

/// The on-disk document shape (YAML/JSON/XML share it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct TableDoc {
    #[serde(default)]
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_characters: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<String>,
    #[serde(default)]
    pub table: BTreeMap<String, TableEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub alias: BTreeMap<String, String>,
    #[serde(
        default,
        rename = "translation_dict",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub translation: BTreeMap<String, String>,
}

impl TryFrom<TableDoc> for StandardNameTable {
    type Error = TableError;

    fn try_from(doc: TableDoc) -> Result<Self, Self::Error> {
        let version = Version::new(&doc.version)?;
        let contact = doc.contact.as_deref().map(Contact::new).transpose()?;
        let valid_characters = doc
            .valid_characters
            .as_deref()
            .map(Pattern::new)
            .transpose()?;
        let pattern = doc.pattern.as_deref().map(Pattern::new).transpose()?;

        let table = StandardNameTable {
            name: doc.name,
            version,
            institution: doc.institution,
            contact,
            last_modified: doc.last_modified,
            valid_characters,
            pattern,
            devices: doc.devices,
            locations: doc.locations,
            entries: doc.table,
            alias: doc.alias,
            translation: doc.translation,
        };

        // every entry must carry a parseable unit and a valid name
        let rules = table.syntax_rules();
        for (name, entry) in &table.entries {
            rules.check(name)?;
            Unit::parse(&entry.units).map_err(|source| TableError::EntryUnits {
                name: name.clone(),
                source,
            })?;
            if let Some(alias) = &entry.alias {
                rules.check(alias)?;
            }
        }
        Ok(table)
    }
}

impl From<StandardNameTable> for TableDoc {
    fn from(table: StandardNameTable) -> Self {
        TableDoc {
            name: table.name,
            version: table.version.to_string(),
            institution: table.institution,
            contact: table.contact.map(|c| c.as_str().to_string()),
            last_modified: table.last_modified,
            valid_characters: table.valid_characters.map(|p| p.as_str().to_string()),
            pattern: table.pattern.map(|p| p.as_str().to_string()),
            devices: table.devices,
            locations: table.locations,
            table: table.entries,
            alias: table.alias,
            translation: table.translation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::standard_name::AffixKind;

    fn version(s: &str) -> Version {
        Version::new(s).unwrap()
    }

    fn demo_table() -> StandardNameTable {
        let mut table = StandardNameTable::new("demo", version("v1"))
            .with_devices(vec!["fan".to_string()])
            .with_locations(vec!["inlet".to_string(), "outlet".to_string()]);
        table
            .set("x_velocity", "m/s", "x component of velocity")
            .unwrap();
        table.set("time", "s", "time").unwrap();
        table
            .set("static_pressure", "Pa", "static pressure")
            .unwrap();
        table
            .set("dynamic_pressure", "Pa", "dynamic pressure")
            .unwrap();
        table
    }

    mod lookup {
        use super::*;

        #[test]
        fn direct_hit() {
            let table = demo_table();
            let sn = table.resolve("x_velocity").unwrap();
            assert_eq!(sn.name(), "x_velocity");
            assert!(sn.equal_unit("m s^-1").unwrap());
        }

        #[test]
        fn check_with_units() {
            let table = demo_table();
            assert!(table.check("x_velocity", Some("m/s")));
            assert!(!table.check("x_velocity", Some("kg")));
            assert!(!table.check("not_there", Some("m/s")));
        }

        #[test]
        fn check_without_units() {
            let table = demo_table();
            assert!(table.check("x_velocity", None));
        }

        #[test]
        fn alias_resolution() {
            let mut table = demo_table();
            table.set_alias("u", "x_velocity").unwrap();
            let sn = table.resolve("u").unwrap();
            assert_eq!(sn.name(), "x_velocity");
        }

        #[test]
        fn entry_level_alias_resolution() {
            let mut table = demo_table();
            table.entries.get_mut("x_velocity").unwrap().alias = Some("u_comp".to_string());
            assert!(table.check_name("u_comp"));
        }

        #[test]
        fn suggestions_on_near_miss() {
            let table = demo_table();
            match table.resolve("x_velocty") {
                Err(LookupError::NotFound { suggestions, .. }) => {
                    assert!(suggestions.contains(&"x_velocity".to_string()));
                }
                other => panic!("expected NotFound with suggestions, got {other:?}"),
            }
        }

        #[test]
        fn no_suggestions_for_distant_names() {
            let table = demo_table();
            match table.resolve("completely_unrelated") {
                Err(LookupError::NotFound { suggestions, .. }) => {
                    assert!(suggestions.is_empty());
                }
                other => panic!("expected NotFound, got {other:?}"),
            }
        }
    }

    mod transformations {
        use super::*;

        #[test]
        fn derivative_divides_units() {
            let table = demo_table();
            let sn = table.resolve("derivative_of_x_velocity_wrt_time").unwrap();
            assert!(sn.equal_unit("m/s^2").unwrap());
        }

        #[test]
        fn ratio_divides_units() {
            let table = demo_table();
            let sn = table.resolve("ratio_of_x_velocity_and_time").unwrap();
            assert!(sn.equal_unit("m s^-2").unwrap());
        }

        #[test]
        fn product_multiplies_units() {
            let table = demo_table();
            let sn = table.resolve("product_of_x_velocity_and_time").unwrap();
            assert!(sn.equal_unit("m").unwrap());
        }

        #[test]
        fn square_squares_units() {
            let table = demo_table();
            let sn = table.resolve("square_of_x_velocity").unwrap();
            assert!(sn.equal_unit("m^2/s^2").unwrap());
        }

        #[test]
        fn magnitude_keeps_units() {
            let table = demo_table();
            let sn = table.resolve("magnitude_of_x_velocity").unwrap();
            assert!(sn.equal_unit("m/s").unwrap());
        }

        #[test]
        fn difference_across_known_device() {
            let table = demo_table();
            let sn = table
                .resolve("difference_of_static_pressure_across_fan")
                .unwrap();
            assert!(sn.equal_unit("Pa").unwrap());
        }

        #[test]
        fn unknown_device_is_distinct_error() {
            let table = demo_table();
            match table.resolve("difference_of_static_pressure_across_pump") {
                Err(LookupError::UnknownAffix { kind, token, .. }) => {
                    assert_eq!(kind, AffixKind::Device);
                    assert_eq!(token, "pump");
                }
                other => panic!("expected UnknownAffix, got {other:?}"),
            }
        }

        #[test]
        fn two_operand_difference_requires_equal_units() {
            let table = demo_table();
            // both operands Pa: fine
            assert!(table
                .resolve("difference_of_static_pressure_and_dynamic_pressure_across_fan")
                .is_ok());
            // x_velocity (m/s) vs time (s): incompatible
            match table.resolve("difference_of_x_velocity_and_time_across_fan") {
                Err(LookupError::IncompatibleOperands { .. }) => {}
                other => panic!("expected IncompatibleOperands, got {other:?}"),
            }
        }

        #[test]
        fn difference_between_locations() {
            let table = demo_table();
            let sn = table
                .resolve(
                    "difference_of_static_pressure_and_dynamic_pressure_between_inlet_and_outlet",
                )
                .unwrap();
            assert!(sn.equal_unit("Pa").unwrap());
        }

        #[test]
        fn name_at_location() {
            let table = demo_table();
            let sn = table.resolve("static_pressure_at_outlet").unwrap();
            assert!(sn.equal_unit("Pa").unwrap());
        }

        #[test]
        fn name_at_unknown_location_is_distinct_error() {
            let table = demo_table();
            match table.resolve("static_pressure_at_impeller") {
                Err(LookupError::UnknownAffix { kind, .. }) => {
                    assert_eq!(kind, AffixKind::Location);
                }
                other => panic!("expected UnknownAffix, got {other:?}"),
            }
        }

        #[test]
        fn nested_transformations() {
            let table = demo_table();
            let sn = table
                .resolve("square_of_derivative_of_x_velocity_wrt_time")
                .unwrap();
            assert!(sn.equal_unit("m^2 s^-4").unwrap());
        }

        #[test]
        fn check_name_covers_transformations() {
            let table = demo_table();
            assert!(table.check_name("derivative_of_x_velocity_wrt_time"));
            assert!(!table.check_name("derivative_of_florble_wrt_time"));
        }
    }

    mod mutation {
        use super::*;

        #[test]
        fn set_validates_units() {
            let mut table = demo_table();
            assert!(table.set("bad", "florble", "d").is_err());
        }

        #[test]
        fn set_validates_syntax() {
            let mut table = demo_table();
            assert!(table.set("9bad", "m", "d").is_err());
        }

        #[test]
        fn modify_unknown_entry_errors() {
            let mut table = demo_table();
            assert!(matches!(
                table.modify("nope", None, None),
                Err(TableError::UnknownEntry(_))
            ));
        }

        #[test]
        fn modify_changes_fields() {
            let mut table = demo_table();
            table.modify("time", Some("ms"), Some("time in ms")).unwrap();
            let sn = table.resolve("time").unwrap();
            assert!(sn.equal_unit("s").unwrap());
            assert_eq!(sn.description(), "time in ms");
        }

        #[test]
        fn alias_requires_existing_canonical() {
            let mut table = demo_table();
            assert!(table.set_alias("u", "not_there").is_err());
        }
    }

    mod persistence {
        use super::*;

        #[test]
        fn yaml_roundtrip_content_equal() {
            let mut table = demo_table();
            let tmp = tempfile::tempdir().unwrap();
            let path = tmp.path().join("demo.yaml");
            table.to_yaml(&path).unwrap();
            let loaded = StandardNameTable::from_yaml(&path).unwrap();
            assert!(table.content_eq(&loaded));
            // the write stamped a timestamp
            assert!(table.last_modified().is_some());
        }

        #[test]
        fn yaml_str_parse() {
            let yaml = r#"
name: fluid
version: v1.0
institution: ITS
contact: someone@example.org
table:
  x_velocity:
    units: m/s
    description: x component of velocity
  pressure:
    canonical_units: Pa
    description: pressure
"#;
            let table = StandardNameTable::from_yaml_str(yaml).unwrap();
            assert_eq!(table.name(), "fluid");
            assert_eq!(table.len(), 2);
            // legacy canonical_units key accepted
            assert!(table.check("pressure", Some("Pa")));
        }

        #[test]
        fn invalid_entry_units_rejected_at_load() {
            let yaml = r#"
name: broken
version: v1
table:
  x:
    units: florble
    description: d
"#;
            assert!(StandardNameTable::from_yaml_str(yaml).is_err());
        }

        #[test]
        fn invalid_version_rejected_at_load() {
            let yaml = "name: t\nversion: '1.0'\ntable: {}\n";
            assert!(StandardNameTable::from_yaml_str(yaml).is_err());
        }

        #[test]
        fn invalid_contact_rejected_at_load() {
            let yaml = "name: t\nversion: v1\ncontact: nope\ntable: {}\n";
            assert!(StandardNameTable::from_yaml_str(yaml).is_err());
        }

        #[test]
        fn json_value_roundtrip() {
            let table = demo_table();
            let value = table.to_json_value().unwrap();
            let back = StandardNameTable::from_json_value(value).unwrap();
            assert!(table.content_eq(&back));
        }
    }

    mod renderings {
        use super::*;

        #[test]
        fn markdown_contains_rows() {
            let md = demo_table().to_markdown();
            assert!(md.contains("| x_velocity | m/s |"));
            assert!(md.contains("# Standard Name Table demo (v1)"));
        }

        #[test]
        fn latex_escapes_underscores() {
            let tex = demo_table().to_latex();
            assert!(tex.contains("x\\_velocity & m/s"));
        }
    }
}
