//! store::file
//!
//! The data-file handle: creation operations gated by a convention,
//! attribute routing, and JSON persistence.
//!
//! # Creation gating
//!
//! Every creation operation (`create`, `create_group`,
//! `create_dataset`) takes the active [`Convention`] explicitly and
//! derives a fresh [`CreationOptions`] from it. Required standard
//! attributes must be supplied (or satisfied by their alternative);
//! supplied values run through the attribute's validator chain before
//! anything is persisted. A validator failure during dataset creation
//! deletes the partially-created dataset so no half-written object
//! survives.
//!
//! # Attribute routing
//!
//! `set_attr` routes writes through the standard attribute registered
//! for the node's category, falling back to a raw write for
//! unrecognized names. The underlying write never re-enters
//! validation.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::attrs::AttrValue;
use super::hierarchy::{Dataset, Dtype, Group, Node};
use crate::convention::{
    AttrContext, Convention, CreationOptions, DefaultValue, Method, ReadValue, StandardAttribute,
    StandardAttributeError, Target, ValidatorError,
};
use crate::core::types::{ObjectPath, TypeError};

/// Errors from file and hierarchy operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no such object: '{0}'")]
    NotFound(String),

    #[error("object '{0}' already exists")]
    AlreadyExists(String),

    #[error("'{0}' is not a group")]
    NotAGroup(String),

    #[error("invalid object name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("file has no filename; use save_as")]
    NoFilename,

    #[error(transparent)]
    Attribute(#[from] StandardAttributeError),

    #[error(transparent)]
    Path(#[from] TypeError),

    #[error("cannot read or write file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Attribute values supplied to a creation operation.
pub type AttrInit = BTreeMap<String, AttrValue>;

/// An attribute value after reference resolution.
#[derive(Debug)]
pub enum ResolvedAttr<'a> {
    /// A plain value.
    Value(&'a AttrValue),
    /// A reference that resolved to an object in this file.
    Object(&'a ObjectPath, &'a Node),
}

/// An open hierarchical data file.
///
/// # Example
///
/// ```
/// use h5conv::convention::Convention;
/// use h5conv::store::{AttrInit, AttrValue, DataFile, Dtype};
///
/// let convention = Convention::baseline();
/// let mut file = DataFile::create(&convention, AttrInit::new()).unwrap();
/// let grp = file
///     .create_group(&convention, "/", "results", AttrInit::new())
///     .unwrap();
/// file.create_dataset(
///     &convention,
///     grp.as_str(),
///     "u",
///     vec![16, 8],
///     Dtype::F64,
///     AttrInit::from([("units".to_string(), AttrValue::from("m/s"))]),
/// )
/// .unwrap();
/// assert!(file.attr_at("/results/u", "units").is_some());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DataFile {
    root: Group,
    filename: Option<PathBuf>,
}

impl DataFile {
    /// Create an in-memory file, validating file-init standard
    /// attributes against the given convention.
    ///
    /// # Errors
    ///
    /// Returns a `StandardAttributeError` (wrapped in `StoreError`)
    /// when a required attribute is missing or a validator rejects a
    /// value.
    pub fn create(convention: &Convention, attrs: AttrInit) -> Result<Self, StoreError> {
        let mut file = Self {
            root: Group::new(),
            filename: None,
        };
        let options = convention.creation_options(Method::Init);
        file.apply_creation(&options, &ObjectPath::root(), attrs)?;
        Ok(file)
    }

    /// Open a file from disk.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let root: Group = serde_json::from_str(&raw)?;
        Ok(Self {
            root,
            filename: Some(path.to_path_buf()),
        })
    }

    /// Write to the path the file was opened from or last saved to.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NoFilename` when the file never touched
    /// disk.
    pub fn save(&self) -> Result<(), StoreError> {
        let path = self.filename.as_ref().ok_or(StoreError::NoFilename)?;
        let json = serde_json::to_string_pretty(&self.root)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Write to an explicit path and remember it.
    pub fn save_as(&mut self, path: &Path) -> Result<(), StoreError> {
        self.filename = Some(path.to_path_buf());
        self.save()
    }

    /// The on-disk path, if any.
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// The root group.
    pub fn root(&self) -> &Group {
        &self.root
    }

    /// Look up a node. The root itself is not a `Node`; use
    /// [`Self::root`] for it.
    pub fn node(&self, path: &ObjectPath) -> Option<&Node> {
        self.root.get(path)
    }

    /// All objects below the root, with their paths, depth-first.
    pub fn objects(&self) -> Vec<(ObjectPath, &Node)> {
        fn walk<'a>(group: &'a Group, base: &ObjectPath, out: &mut Vec<(ObjectPath, &'a Node)>) {
            for (name, node) in &group.children {
                let path = base.join(name);
                out.push((path.clone(), node));
                if let Node::Group(child) = node {
                    walk(child, &path, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(&self.root, &ObjectPath::root(), &mut out);
        out
    }

    /// Create a group under `parent`, validating group-creation
    /// standard attributes.
    ///
    /// # Errors
    ///
    /// Fails when the parent is missing or not a group, the name is
    /// taken or invalid, or validation rejects an attribute (the
    /// partially-created group is removed again).
    pub fn create_group(
        &mut self,
        convention: &Convention,
        parent: &str,
        name: &str,
        attrs: AttrInit,
    ) -> Result<ObjectPath, StoreError> {
        let path = self.prepare_child(parent, name)?;
        self.insert_node(&path, Node::Group(Group::new()))?;

        let options = convention.creation_options(Method::CreateGroup);
        if let Err(e) = self.apply_creation(&options, &path, attrs) {
            self.remove_node(&path);
            return Err(e);
        }
        tracing::debug!(path = %path, "created group");
        Ok(path)
    }

    /// Create a dataset under `parent`, validating dataset-creation
    /// standard attributes.
    ///
    /// # Errors
    ///
    /// Fails when the parent is missing or not a group, the name is
    /// taken or invalid, or validation rejects an attribute. On
    /// validation failure the partially-created dataset is deleted
    /// (compensating action), leaving the hierarchy unchanged.
    pub fn create_dataset(
        &mut self,
        convention: &Convention,
        parent: &str,
        name: &str,
        shape: Vec<usize>,
        dtype: Dtype,
        attrs: AttrInit,
    ) -> Result<ObjectPath, StoreError> {
        let path = self.prepare_child(parent, name)?;
        self.insert_node(&path, Node::Dataset(Dataset::new(shape, dtype)))?;

        let options = convention.creation_options(Method::CreateDataset);
        if let Err(e) = self.apply_creation(&options, &path, attrs) {
            self.remove_node(&path);
            return Err(e);
        }
        tracing::debug!(path = %path, "created dataset");
        Ok(path)
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` for missing objects or the root.
    pub fn delete(&mut self, path: &str) -> Result<(), StoreError> {
        let path = ObjectPath::new(path)?;
        if self.remove_node(&path).is_none() {
            return Err(StoreError::NotFound(path.to_string()));
        }
        Ok(())
    }

    /// Set an attribute, routed through the convention.
    ///
    /// When the convention registers a standard attribute under this
    /// name for the node's category, its validator chain gates the
    /// write; otherwise the value is written raw.
    ///
    /// # Errors
    ///
    /// Validator failures surface synchronously; nothing is written.
    pub fn set_attr(
        &mut self,
        convention: &Convention,
        path: &str,
        name: &str,
        value: AttrValue,
    ) -> Result<(), StoreError> {
        let path = ObjectPath::new(path)?;
        let target = self.target_of(&path)?;
        let value = match convention.standard_attribute(target, name) {
            Some(attribute) => {
                let ctx = AttrContext::new(&self.root, &path);
                attribute.validate_value(&value, &ctx)?
            }
            None => value,
        };
        self.write_attr(&path, name, value)
    }

    /// Set an attribute without any validation.
    pub fn set_attr_raw(
        &mut self,
        path: &ObjectPath,
        name: &str,
        value: AttrValue,
    ) -> Result<(), StoreError> {
        self.write_attr(path, name, value)
    }

    /// Read a raw attribute value.
    pub fn attr_at(&self, path: &str, name: &str) -> Option<&AttrValue> {
        let path = ObjectPath::new(path).ok()?;
        self.attrs_of(&path)?.get(name)
    }

    /// Read an attribute through the convention: defaults apply and
    /// the declared return type coerces the stored value.
    ///
    /// # Errors
    ///
    /// Returns a reading `StandardAttributeError` when coercion fails.
    pub fn read_attr(
        &self,
        convention: &Convention,
        path: &str,
        name: &str,
    ) -> Result<Option<ReadValue>, StoreError> {
        let path = ObjectPath::new(path)?;
        let attrs = self
            .attrs_of(&path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        let target = self.target_of(&path)?;
        match convention.standard_attribute(target, name) {
            Some(attribute) => Ok(attribute.read(attrs)?),
            None => Ok(attrs.get(name).cloned().map(ReadValue::Value)),
        }
    }

    /// Read an attribute, resolving object references.
    ///
    /// A `Reference` value pointing at an existing object yields
    /// [`ResolvedAttr::Object`]; a dangling reference is returned as
    /// the raw value.
    pub fn resolve_attr(&self, path: &str, name: &str) -> Option<ResolvedAttr<'_>> {
        let path = ObjectPath::new(path).ok()?;
        let value = self.attrs_of(&path)?.get(name)?;
        if let AttrValue::Reference(target) = value {
            if let Some(node) = self.root.get(target) {
                return Some(ResolvedAttr::Object(target, node));
            }
        }
        Some(ResolvedAttr::Value(value))
    }

    // --- internals --------------------------------------------------------

    /// Validate parent and child name, returning the new child path.
    fn prepare_child(&self, parent: &str, name: &str) -> Result<ObjectPath, StoreError> {
        if name.is_empty() || name.contains('/') {
            return Err(StoreError::InvalidName {
                name: name.to_string(),
                reason: "object names must be non-empty and free of '/'".to_string(),
            });
        }
        let parent = ObjectPath::new(parent)?;
        let parent_group = if parent.is_root() {
            &self.root
        } else {
            match self.root.get(&parent) {
                Some(Node::Group(g)) => g,
                Some(Node::Dataset(_)) => return Err(StoreError::NotAGroup(parent.to_string())),
                None => return Err(StoreError::NotFound(parent.to_string())),
            }
        };
        if parent_group.children.contains_key(name) {
            return Err(StoreError::AlreadyExists(parent.join(name).to_string()));
        }
        Ok(parent.join(name))
    }

    fn insert_node(&mut self, path: &ObjectPath, node: Node) -> Result<(), StoreError> {
        let name = path.basename().to_string();
        let parent = path.parent().ok_or_else(|| {
            StoreError::InvalidName {
                name: path.to_string(),
                reason: "cannot create the root".to_string(),
            }
        })?;
        let parent_group = if parent.is_root() {
            &mut self.root
        } else {
            match self.root.get_mut(&parent) {
                Some(Node::Group(g)) => g,
                _ => return Err(StoreError::NotAGroup(parent.to_string())),
            }
        };
        parent_group.children.insert(name, node);
        Ok(())
    }

    fn remove_node(&mut self, path: &ObjectPath) -> Option<Node> {
        let name = path.basename().to_string();
        let parent = path.parent()?;
        let parent_group = if parent.is_root() {
            &mut self.root
        } else {
            match self.root.get_mut(&parent) {
                Some(Node::Group(g)) => g,
                _ => return None,
            }
        };
        parent_group.children.remove(&name)
    }

    fn attrs_of(&self, path: &ObjectPath) -> Option<&BTreeMap<String, AttrValue>> {
        if path.is_root() {
            return Some(&self.root.attributes);
        }
        self.root.get(path).map(Node::attributes)
    }

    fn target_of(&self, path: &ObjectPath) -> Result<Target, StoreError> {
        if path.is_root() {
            return Ok(Target::File);
        }
        match self.root.get(path) {
            Some(Node::Group(_)) => Ok(Target::Group),
            Some(Node::Dataset(_)) => Ok(Target::Dataset),
            None => Err(StoreError::NotFound(path.to_string())),
        }
    }

    fn write_attr(
        &mut self,
        path: &ObjectPath,
        name: &str,
        value: AttrValue,
    ) -> Result<(), StoreError> {
        let attrs = if path.is_root() {
            &mut self.root.attributes
        } else {
            match self.root.get_mut(path) {
                Some(node) => node.attributes_mut(),
                None => return Err(StoreError::NotFound(path.to_string())),
            }
        };
        attrs.insert(name.to_string(), value);
        Ok(())
    }

    /// Resolve supplied values against the options, check required
    /// attributes, run validator chains in position order, and write.
    fn apply_creation(
        &mut self,
        options: &CreationOptions,
        path: &ObjectPath,
        supplied: AttrInit,
    ) -> Result<(), StoreError> {
        let resolved = resolve_creation_values(options, &supplied)?;

        // values recognized by the convention, validated in order;
        // the pending map lets relational validators see sibling
        // values from this same call
        let pending: AttrInit = resolved
            .iter()
            .map(|(name, value, _)| (name.clone(), value.clone()))
            .chain(supplied.iter().map(|(k, v)| (k.clone(), v.clone())))
            .collect();

        for (name, value, attribute) in &resolved {
            let normalized = {
                let ctx = AttrContext::new(&self.root, path).with_pending(&pending);
                attribute.validate_value(value, &ctx)?
            };
            self.write_attr(path, name, normalized)?;
        }

        // unrecognized attributes are written raw
        let recognized: Vec<&str> = options.names();
        for (name, value) in supplied {
            if !recognized.contains(&name.as_str()) {
                self.write_attr(path, &name, value)?;
            }
        }
        Ok(())
    }
}

impl Default for DataFile {
    /// An empty, ungated file (equivalent to creating under the
    /// baseline convention).
    fn default() -> Self {
        Self {
            root: Group::new(),
            filename: None,
        }
    }
}

/// Resolve each recognized option to the value that will be written:
/// supplied value, literal default, skip, or missing-required error.
fn resolve_creation_values(
    options: &CreationOptions,
    supplied: &AttrInit,
) -> Result<Vec<(String, AttrValue, std::sync::Arc<StandardAttribute>)>, StoreError> {
    let mut resolved = Vec::new();
    for entry in &options.entries {
        if let Some(value) = supplied.get(&entry.name) {
            resolved.push((
                entry.name.clone(),
                value.clone(),
                std::sync::Arc::clone(&entry.attribute),
            ));
            continue;
        }
        match &entry.default {
            DefaultValue::Literal(value) => {
                resolved.push((
                    entry.name.clone(),
                    value.clone(),
                    std::sync::Arc::clone(&entry.attribute),
                ));
            }
            DefaultValue::None => {}
            DefaultValue::Empty => {
                if entry.optional {
                    continue;
                }
                // an alternative attribute may satisfy the requirement
                if let Some(alternative) = &entry.alternative {
                    if supplied.contains_key(alternative) {
                        continue;
                    }
                }
                return Err(StandardAttributeError::setting(
                    &entry.name,
                    ValidatorError::MissingRequired,
                )
                .into());
            }
        }
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convention::{AttrBinding, Validator};

    fn units_convention() -> Convention {
        let mut cv = Convention::new("test");
        cv.add(AttrBinding::new(
            StandardAttribute::new(
                "units",
                "physical unit",
                vec![Validator::Units],
                vec![Method::CreateDataset],
            )
            .unwrap(),
        ))
        .unwrap();
        cv
    }

    fn attrs(pairs: &[(&str, &str)]) -> AttrInit {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), AttrValue::from(*v)))
            .collect()
    }

    #[test]
    fn create_dataset_without_required_attr_fails() {
        let cv = units_convention();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        let err = file
            .create_dataset(&cv, "/", "u", vec![4], Dtype::F64, AttrInit::new())
            .unwrap_err();
        match err {
            StoreError::Attribute(e) => {
                assert_eq!(e.attribute, "units");
                assert!(matches!(e.source, ValidatorError::MissingRequired));
            }
            other => panic!("expected attribute error, got {other:?}"),
        }
        // the partially-created dataset was removed
        assert!(file.node(&ObjectPath::new("/u").unwrap()).is_none());
    }

    #[test]
    fn create_dataset_with_units_roundtrips() {
        let cv = units_convention();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.create_dataset(&cv, "/", "u", vec![4], Dtype::F64, attrs(&[("units", "m/s")]))
            .unwrap();
        assert_eq!(
            file.attr_at("/u", "units"),
            Some(&AttrValue::from("m/s"))
        );
    }

    #[test]
    fn invalid_units_rejected_and_compensated() {
        let cv = units_convention();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        let err = file
            .create_dataset(
                &cv,
                "/",
                "u",
                vec![4],
                Dtype::F64,
                attrs(&[("units", "florble")]),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Attribute(_)));
        assert!(file.node(&ObjectPath::new("/u").unwrap()).is_none());
    }

    #[test]
    fn alternative_satisfies_requirement() {
        let mut cv = Convention::new("test");
        cv.add(
            AttrBinding::new(
                StandardAttribute::new(
                    "standard_name",
                    "d",
                    vec![Validator::Any],
                    vec![Method::CreateDataset],
                )
                .unwrap(),
            )
            .alternative("long_name"),
        )
        .unwrap();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        // no standard_name, but long_name supplied: accepted
        file.create_dataset(
            &cv,
            "/",
            "u",
            vec![4],
            Dtype::F64,
            attrs(&[("long_name", "streamwise velocity")]),
        )
        .unwrap();
        // neither: rejected
        assert!(file
            .create_dataset(&cv, "/", "v", vec![4], Dtype::F64, AttrInit::new())
            .is_err());
    }

    #[test]
    fn literal_default_is_written() {
        let mut cv = Convention::new("test");
        cv.add(AttrBinding::new(
            StandardAttribute::new(
                "comment",
                "d",
                vec![Validator::Any],
                vec![Method::CreateGroup],
            )
            .unwrap()
            .with_default(DefaultValue::Literal(AttrValue::from("n/a"))),
        ))
        .unwrap();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.create_group(&cv, "/", "g", AttrInit::new()).unwrap();
        assert_eq!(file.attr_at("/g", "comment"), Some(&AttrValue::from("n/a")));
    }

    #[test]
    fn optional_absent_writes_nothing() {
        let mut cv = Convention::new("test");
        cv.add(
            AttrBinding::new(
                StandardAttribute::new(
                    "comment",
                    "d",
                    vec![Validator::Any],
                    vec![Method::CreateGroup],
                )
                .unwrap(),
            )
            .optional(),
        )
        .unwrap();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.create_group(&cv, "/", "g", AttrInit::new()).unwrap();
        assert!(file.attr_at("/g", "comment").is_none());
    }

    #[test]
    fn unrecognized_attributes_written_raw() {
        let cv = Convention::baseline();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.create_group(&cv, "/", "g", attrs(&[("whatever", "x")]))
            .unwrap();
        assert_eq!(file.attr_at("/g", "whatever"), Some(&AttrValue::from("x")));
    }

    #[test]
    fn set_attr_routes_through_convention() {
        let cv = units_convention();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.create_dataset(&cv, "/", "u", vec![4], Dtype::F64, attrs(&[("units", "m/s")]))
            .unwrap();
        // valid update passes
        file.set_attr(&cv, "/u", "units", AttrValue::from("km/h"))
            .unwrap();
        // invalid update is rejected, old value retained
        assert!(file
            .set_attr(&cv, "/u", "units", AttrValue::from("florble"))
            .is_err());
        assert_eq!(file.attr_at("/u", "units"), Some(&AttrValue::from("km/h")));
    }

    #[test]
    fn duplicate_child_rejected() {
        let cv = Convention::baseline();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.create_group(&cv, "/", "g", AttrInit::new()).unwrap();
        assert!(matches!(
            file.create_group(&cv, "/", "g", AttrInit::new()),
            Err(StoreError::AlreadyExists(_))
        ));
    }

    #[test]
    fn create_under_dataset_rejected() {
        let cv = Convention::baseline();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.create_dataset(&cv, "/", "u", vec![4], Dtype::F64, AttrInit::new())
            .unwrap();
        assert!(matches!(
            file.create_group(&cv, "/u", "g", AttrInit::new()),
            Err(StoreError::NotAGroup(_))
        ));
    }

    #[test]
    fn missing_parent_rejected() {
        let cv = Convention::baseline();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        assert!(matches!(
            file.create_group(&cv, "/nope", "g", AttrInit::new()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn reference_attribute_resolves() {
        let cv = Convention::baseline();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.create_group(&cv, "/", "devices", AttrInit::new())
            .unwrap();
        file.create_dataset(&cv, "/", "u", vec![4], Dtype::F64, AttrInit::new())
            .unwrap();
        file.set_attr(
            &cv,
            "/u",
            "measured_by",
            AttrValue::reference("/devices").unwrap(),
        )
        .unwrap();
        match file.resolve_attr("/u", "measured_by") {
            Some(ResolvedAttr::Object(path, node)) => {
                assert_eq!(path.as_str(), "/devices");
                assert_eq!(node.kind(), "group");
            }
            other => panic!("expected resolved object, got {other:?}"),
        }
    }

    #[test]
    fn dangling_reference_returned_raw() {
        let cv = Convention::baseline();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.set_attr(&cv, "/", "broken", AttrValue::reference("/nope").unwrap())
            .unwrap();
        assert!(matches!(
            file.resolve_attr("/", "broken"),
            Some(ResolvedAttr::Value(_))
        ));
    }

    #[test]
    fn save_and_open_roundtrip() {
        let cv = units_convention();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.create_dataset(&cv, "/", "u", vec![4], Dtype::F64, attrs(&[("units", "m/s")]))
            .unwrap();

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("run.json");
        file.save_as(&path).unwrap();

        let reopened = DataFile::open(&path).unwrap();
        assert_eq!(reopened.root(), file.root());
    }

    #[test]
    fn save_without_filename_fails() {
        let file = DataFile::default();
        assert!(matches!(file.save(), Err(StoreError::NoFilename)));
    }

    #[test]
    fn objects_walk_depth_first() {
        let cv = Convention::baseline();
        let mut file = DataFile::create(&cv, AttrInit::new()).unwrap();
        file.create_group(&cv, "/", "a", AttrInit::new()).unwrap();
        file.create_group(&cv, "/a", "b", AttrInit::new()).unwrap();
        file.create_dataset(&cv, "/a/b", "d", vec![1], Dtype::I32, AttrInit::new())
            .unwrap();
        let paths: Vec<String> = file
            .objects()
            .iter()
            .map(|(p, _)| p.to_string())
            .collect();
        assert_eq!(paths, vec!["/a", "/a/b", "/a/b/d"]);
    }
}
