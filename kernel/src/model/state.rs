//! `WorldStateV1`: a named mapping from variable name to [`ValueV1`].
//!
//! Variables live in a `BTreeMap` so iteration, rendering and canonical JSON
//! are deterministic. `Clone` produces a fully independent copy; the search
//! engine relies on this when it keeps the state of an open choice point.

use std::collections::BTreeMap;

use crate::model::value::ValueV1;

/// A named world state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorldStateV1 {
    /// Diagnostic name (e.g., `"state0"`). Not part of search semantics.
    pub name: String,
    variables: BTreeMap<String, ValueV1>,
}

impl WorldStateV1 {
    /// Create an empty state.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, variable: impl Into<String>, value: impl Into<ValueV1>) -> Self {
        self.set(variable, value);
        self
    }

    #[must_use]
    pub fn get(&self, variable: &str) -> Option<&ValueV1> {
        self.variables.get(variable)
    }

    pub fn get_mut(&mut self, variable: &str) -> Option<&mut ValueV1> {
        self.variables.get_mut(variable)
    }

    /// Insert or replace a variable. Returns the previous value, if any.
    pub fn set(
        &mut self,
        variable: impl Into<String>,
        value: impl Into<ValueV1>,
    ) -> Option<ValueV1> {
        self.variables.insert(variable.into(), value.into())
    }

    pub fn remove(&mut self, variable: &str) -> Option<ValueV1> {
        self.variables.remove(variable)
    }

    #[must_use]
    pub fn contains(&self, variable: &str) -> bool {
        self.variables.contains_key(variable)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Variables in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ValueV1)> {
        self.variables.iter()
    }

    /// Read-only view of the variable map.
    #[must_use]
    pub fn variables(&self) -> &BTreeMap<String, ValueV1> {
        &self.variables
    }

    /// Shorthand for `get(variable).and_then(ValueV1::as_text)`.
    #[must_use]
    pub fn text(&self, variable: &str) -> Option<&str> {
        self.get(variable).and_then(ValueV1::as_text)
    }

    /// Shorthand for `get(variable).and_then(ValueV1::as_int)`.
    #[must_use]
    pub fn int(&self, variable: &str) -> Option<i64> {
        self.get(variable).and_then(ValueV1::as_int)
    }

    /// Shorthand for `get(variable).and_then(ValueV1::as_float)`.
    #[must_use]
    pub fn float(&self, variable: &str) -> Option<f64> {
        self.get(variable).and_then(ValueV1::as_float)
    }

    /// Shorthand for `get(variable).and_then(ValueV1::as_bool)`.
    #[must_use]
    pub fn flag(&self, variable: &str) -> Option<bool> {
        self.get(variable).and_then(ValueV1::as_bool)
    }
}
