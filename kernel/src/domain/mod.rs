//! Planning domain: operator/method capabilities and the registry.
//!
//! Depends on `model` and `proof`.

pub mod operator;
pub mod registry;
