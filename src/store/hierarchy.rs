//! store::hierarchy
//!
//! The in-memory hierarchy model: groups, datasets, and navigation.
//!
//! # Design
//!
//! This is the minimal collaborator interface the convention and
//! layout engines need from a storage backend: child enumeration,
//! dataset properties (shape, dtype), and attribute maps. The real
//! storage engine (chunking, compression, dimension scales) is out of
//! scope and lives behind this model.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::attrs::AttrValue;
use crate::core::types::ObjectPath;

/// Element type of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dtype {
    F32,
    F64,
    I32,
    I64,
    U8,
    Bool,
    Str,
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dtype::F32 => "f32",
            Dtype::F64 => "f64",
            Dtype::I32 => "i32",
            Dtype::I64 => "i64",
            Dtype::U8 => "u8",
            Dtype::Bool => "bool",
            Dtype::Str => "str",
        };
        write!(f, "{s}")
    }
}

/// A dataset: shape, element type, and attributes.
///
/// Dataset payloads are not modeled; the metadata layer only needs the
/// properties layouts validate against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Extent per dimension.
    pub shape: Vec<usize>,
    /// Element type.
    pub dtype: Dtype,
    /// Attributes keyed by name.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Dataset {
    /// Create a dataset with the given shape and dtype.
    pub fn new(shape: Vec<usize>, dtype: Dtype) -> Self {
        Self {
            shape,
            dtype,
            attributes: BTreeMap::new(),
        }
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }
}

/// A group: attributes plus named children.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Attributes keyed by name.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
    /// Children keyed by name.
    #[serde(default)]
    pub children: BTreeMap<String, Node>,
}

impl Group {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct child groups, in name order.
    pub fn child_groups(&self) -> impl Iterator<Item = (&str, &Group)> {
        self.children.iter().filter_map(|(name, node)| match node {
            Node::Group(g) => Some((name.as_str(), g)),
            Node::Dataset(_) => None,
        })
    }

    /// Direct child datasets, in name order.
    pub fn child_datasets(&self) -> impl Iterator<Item = (&str, &Dataset)> {
        self.children.iter().filter_map(|(name, node)| match node {
            Node::Dataset(d) => Some((name.as_str(), d)),
            Node::Group(_) => None,
        })
    }

    /// All groups at or below this group, paired with their paths
    /// relative to `base`. Includes this group itself.
    pub fn descendant_groups<'a>(&'a self, base: &ObjectPath) -> Vec<(ObjectPath, &'a Group)> {
        let mut out = vec![(base.clone(), self)];
        for (name, child) in self.child_groups() {
            out.extend(child.descendant_groups(&base.join(name)));
        }
        out
    }

    /// All datasets at or below this group, paired with their paths
    /// relative to `base`.
    pub fn descendant_datasets<'a>(&'a self, base: &ObjectPath) -> Vec<(ObjectPath, &'a Dataset)> {
        let mut out: Vec<(ObjectPath, &Dataset)> = self
            .child_datasets()
            .map(|(name, d)| (base.join(name), d))
            .collect();
        for (name, child) in self.child_groups() {
            out.extend(child.descendant_datasets(&base.join(name)));
        }
        out
    }

    /// Look up a node by path relative to this group.
    pub fn get(&self, path: &ObjectPath) -> Option<&Node> {
        let mut components = path.components();
        let first = components.next()?;
        let mut node = self.children.get(first)?;
        for component in components {
            match node {
                Node::Group(g) => node = g.children.get(component)?,
                Node::Dataset(_) => return None,
            }
        }
        Some(node)
    }

    /// Look up a node mutably by path relative to this group.
    pub fn get_mut(&mut self, path: &ObjectPath) -> Option<&mut Node> {
        let mut components = path.components();
        let first = components.next()?;
        let mut node = self.children.get_mut(first)?;
        for component in components {
            match node {
                Node::Group(g) => node = g.children.get_mut(component)?,
                Node::Dataset(_) => return None,
            }
        }
        Some(node)
    }
}

/// A node in the hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

impl Node {
    /// Attributes of this node, regardless of kind.
    pub fn attributes(&self) -> &BTreeMap<String, AttrValue> {
        match self {
            Node::Group(g) => &g.attributes,
            Node::Dataset(d) => &d.attributes,
        }
    }

    /// Mutable attributes of this node, regardless of kind.
    pub fn attributes_mut(&mut self) -> &mut BTreeMap<String, AttrValue> {
        match self {
            Node::Group(g) => &mut g.attributes,
            Node::Dataset(d) => &mut d.attributes,
        }
    }

    /// The group, if this node is one.
    pub fn as_group(&self) -> Option<&Group> {
        match self {
            Node::Group(g) => Some(g),
            Node::Dataset(_) => None,
        }
    }

    /// The dataset, if this node is one.
    pub fn as_dataset(&self) -> Option<&Dataset> {
        match self {
            Node::Dataset(d) => Some(d),
            Node::Group(_) => None,
        }
    }

    /// Short kind name for messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Node::Group(_) => "group",
            Node::Dataset(_) => "dataset",
        }
    }
}
