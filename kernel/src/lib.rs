//! HOP kernel: the data model and planning domain of the HOP HTN planner.
//!
//! # API Surface
//!
//! - [`model`]: `ValueV1`, `WorldStateV1`, `TaskV1`, and the describe formatter
//! - [`domain`]: the `Operator` / `Method` capability traits and
//!   `DomainRegistryV1`
//! - [`proof`]: canonical JSON and domain-separated SHA-256 content hashing
//!
//! The kernel knows nothing about search. Classification of a task as
//! primitive or compound happens in `hop_search` by registry lookup.
//!
//! # Module Dependency Direction
//!
//! `model` ← `proof` ← `domain`
//!
//! `proof` reaches into `model` only for the fingerprint helpers.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod domain;
pub mod model;
pub mod proof;
