//! convention::registry
//!
//! The process-wide convention registry and the activation state
//! machine.
//!
//! # State machine
//!
//! States: no convention active, or convention X active. Transitions:
//!
//! - `activate(Some(Y))` with X active: no-op when X == Y, otherwise
//!   deactivate X then activate Y
//! - `activate(None)`: reset to the baseline (no convention)
//!
//! Exactly one convention is current at any time. The registry is an
//! explicit value handed to callers (dependency injection), not
//! hidden global state; the serialized activation protocol is *not*
//! concurrency-safe and a registry must not be shared across threads
//! mid-transition.

use std::collections::BTreeMap;

use super::{Convention, ConventionError};

/// Registry of conventions with at most one active.
#[derive(Debug, Default)]
pub struct ConventionRegistry {
    registered: BTreeMap<String, Convention>,
    current: Option<String>,
    baseline: Convention,
}

impl ConventionRegistry {
    /// Create a registry with only the baseline available and no
    /// convention active.
    pub fn new() -> Self {
        Self {
            registered: BTreeMap::new(),
            current: None,
            baseline: Convention::baseline(),
        }
    }

    /// Register a convention under its name.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::AlreadyRegistered` when the name is
    /// taken and `overwrite` is false.
    pub fn register(
        &mut self,
        convention: Convention,
        overwrite: bool,
    ) -> Result<(), ConventionError> {
        let name = convention.name().to_string();
        if self.registered.contains_key(&name) && !overwrite {
            return Err(ConventionError::AlreadyRegistered(name));
        }
        tracing::info!(convention = %name, "registered convention");
        self.registered.insert(name, convention);
        Ok(())
    }

    /// Activate a convention by name, or reset with `None`.
    ///
    /// Activating the already-current convention is a no-op; anything
    /// else deactivates the previous convention first.
    ///
    /// # Errors
    ///
    /// Returns `ConventionError::UnknownConvention` for unregistered
    /// names; the current convention is left untouched.
    pub fn activate(&mut self, name: Option<&str>) -> Result<(), ConventionError> {
        match name {
            None => {
                if let Some(previous) = self.current.take() {
                    tracing::debug!(convention = %previous, "deactivated convention");
                }
                Ok(())
            }
            Some(name) => {
                if self.current.as_deref() == Some(name) {
                    return Ok(()); // already active
                }
                if !self.registered.contains_key(name) {
                    return Err(ConventionError::UnknownConvention(name.to_string()));
                }
                if let Some(previous) = self.current.take() {
                    tracing::debug!(convention = %previous, "deactivated convention");
                }
                self.current = Some(name.to_string());
                tracing::debug!(convention = %name, "activated convention");
                Ok(())
            }
        }
    }

    /// The current convention; the baseline when none is active.
    pub fn current(&self) -> &Convention {
        match &self.current {
            Some(name) => self.registered.get(name).unwrap_or(&self.baseline),
            None => &self.baseline,
        }
    }

    /// The current convention's name, if one is active.
    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// A registered convention by name.
    pub fn get(&self, name: &str) -> Option<&Convention> {
        self.registered.get(name)
    }

    /// Registered convention names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.registered.keys().map(String::as_str).collect()
    }
}
