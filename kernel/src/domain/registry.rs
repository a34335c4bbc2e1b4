//! `DomainRegistryV1`: task name → operator and ordered method alternatives.
//!
//! # Duplicate-declaration policy
//!
//! First declaration wins, uniformly:
//!
//! - `declare_operator` on a name that already has an operator is a no-op.
//! - `declare_methods` on a name that already has a method list is a no-op.
//! - `declare_method` always appends; declaration order is the trial order
//!   during search.
//!
//! Every `declare_*` call reports whether it changed the registry.
//!
//! Handles are `Arc`-backed, so cloning the registry is cheap. The search
//! engine takes a clone when a search slice starts and never observes
//! declarations made while it runs.
//!
//! The registry is content-addressed via a canonical JSON manifest of names
//! (operator and method *names*, in declaration order) for inclusion in plan
//! bundles as `registry.json`.

use std::collections::BTreeMap;

use crate::domain::operator::{MethodHandle, OperatorHandle};
use crate::proof::canon::canonical_json_bytes;
use crate::proof::hash::{canonical_hash, ContentHash};
use crate::proof::hash_domain::HashDomain;

/// Schema tag written into the canonical manifest.
pub const REGISTRY_SCHEMA_VERSION: &str = "domain_registry.v1";

/// Error type for registry serialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Canonical JSON serialization failed.
    CanonicalizationError { detail: String },
}

impl std::fmt::Display for RegistryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CanonicalizationError { detail } => {
                write!(f, "domain registry canonicalization failed: {detail}")
            }
        }
    }
}

impl std::error::Error for RegistryError {}

/// The planning domain: operators and methods keyed by task name.
#[derive(Debug, Clone, Default)]
pub struct DomainRegistryV1 {
    operators: BTreeMap<String, OperatorHandle>,
    methods: BTreeMap<String, Vec<MethodHandle>>,
}

impl DomainRegistryV1 {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the operator for primitive task `name`.
    ///
    /// Returns `false` (and changes nothing) if `name` already has one.
    pub fn declare_operator(&mut self, name: impl Into<String>, op: OperatorHandle) -> bool {
        match self.operators.entry(name.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(op);
                true
            }
        }
    }

    /// Bulk [`declare_operator`](Self::declare_operator), keyed by each
    /// handle's own name. Returns how many were registered.
    pub fn declare_operators(&mut self, ops: impl IntoIterator<Item = OperatorHandle>) -> usize {
        ops.into_iter()
            .filter(|op| {
                let name = op.name().to_string();
                self.declare_operator(name, op.clone())
            })
            .count()
    }

    /// Append `method` to the alternatives for compound task `name`.
    pub fn declare_method(&mut self, name: impl Into<String>, method: MethodHandle) {
        self.methods.entry(name.into()).or_default().push(method);
    }

    /// Set the full alternative list for `name`.
    ///
    /// Returns `false` (and changes nothing) if `name` already has a list.
    pub fn declare_methods(&mut self, name: impl Into<String>, methods: Vec<MethodHandle>) -> bool {
        match self.methods.entry(name.into()) {
            std::collections::btree_map::Entry::Occupied(_) => false,
            std::collections::btree_map::Entry::Vacant(slot) => {
                slot.insert(methods);
                true
            }
        }
    }

    #[must_use]
    pub fn get_operator(&self, name: &str) -> Option<&OperatorHandle> {
        self.operators.get(name)
    }

    #[must_use]
    pub fn get_methods(&self, name: &str) -> Option<&[MethodHandle]> {
        self.methods.get(name).map(Vec::as_slice)
    }

    /// Remove every operator and method.
    pub fn clear(&mut self) {
        self.operators.clear();
        self.methods.clear();
    }

    /// Task names with an operator, sorted.
    pub fn operator_names(&self) -> impl Iterator<Item = &str> {
        self.operators.keys().map(String::as_str)
    }

    /// Task names with at least one declared method list, sorted.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    /// Number of task names with an operator or a method list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len() + self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty() && self.methods.is_empty()
    }

    /// Canonical JSON manifest of the declared names.
    ///
    /// Keys sorted; method lists kept in declaration order because that
    /// order is semantic.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CanonicalizationError`] if canonical JSON
    /// serialization fails.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, RegistryError> {
        let operators: serde_json::Map<String, serde_json::Value> = self
            .operators
            .iter()
            .map(|(task, op)| (task.clone(), serde_json::json!(op.name())))
            .collect();
        let methods: serde_json::Map<String, serde_json::Value> = self
            .methods
            .iter()
            .map(|(task, list)| {
                let names: Vec<&str> = list.iter().map(MethodHandle::name).collect();
                (task.clone(), serde_json::json!(names))
            })
            .collect();

        let value = serde_json::json!({
            "methods": methods,
            "operators": operators,
            "schema_version": REGISTRY_SCHEMA_VERSION,
        });

        canonical_json_bytes(&value).map_err(|e| RegistryError::CanonicalizationError {
            detail: e.to_string(),
        })
    }

    /// Content hash of [`canonical_bytes`](Self::canonical_bytes).
    ///
    /// # Errors
    ///
    /// Propagates [`RegistryError`] from canonicalization.
    pub fn digest(&self) -> Result<ContentHash, RegistryError> {
        let bytes = self.canonical_bytes()?;
        Ok(canonical_hash(HashDomain::RegistryManifest, &bytes))
    }
}
