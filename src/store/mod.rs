//! store
//!
//! The storage-collaborator boundary: an in-memory hierarchy model
//! (groups, datasets, attributes), tagged attribute values, and the
//! convention-gated file handle.
//!
//! # Modules
//!
//! - [`attrs`] - Tagged attribute values and the flat-string encoding
//! - [`hierarchy`] - Groups, datasets, and navigation
//! - [`file`] - The [`DataFile`] handle with creation gating

pub mod attrs;
pub mod file;
pub mod hierarchy;

pub use attrs::AttrValue;
pub use file::{AttrInit, DataFile, ResolvedAttr, StoreError};
pub use hierarchy::{Dataset, Dtype, Group, Node};
