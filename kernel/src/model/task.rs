//! `TaskV1`: a named task reference with parameters.
//!
//! Whether a task is primitive or compound is NOT recorded here; the search
//! engine resolves it against the registry when the task is reached.

use std::collections::BTreeMap;

use crate::model::value::ValueV1;

/// Task / operator / method parameters, keyed by parameter name.
pub type Params = BTreeMap<String, ValueV1>;

/// A task to be planned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TaskV1 {
    /// Task name, looked up in the registry.
    pub name: String,
    /// Parameters passed to the operator or methods.
    pub parameters: Params,
}

impl TaskV1 {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Params::new(),
        }
    }

    /// Builder-style parameter insert.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<ValueV1>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ValueV1> {
        self.parameters.get(name)
    }

    /// Shorthand for a text parameter.
    #[must_use]
    pub fn text_param(&self, name: &str) -> Option<&str> {
        self.param(name).and_then(ValueV1::as_text)
    }
}
