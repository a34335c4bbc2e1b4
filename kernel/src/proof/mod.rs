//! Proof module: canonical JSON, typed hash domains, content hashing.
//!
//! Depends on `model` only for fingerprint helpers.

pub mod canon;
pub mod hash;
pub mod hash_domain;
