//! HOP harness: world-level orchestration for the planner.
//!
//! The harness runs a world through the planner (`plan` → `resume` until
//! complete) and packages the result as a self-contained, content-addressed
//! artifact bundle.
//!
//! The harness does NOT implement search logic; it delegates to
//! `hop_search`. Worlds provide domain data only; the harness owns
//! orchestration.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod bundle;
pub mod bundle_dir;
pub mod contract;
pub mod runner;
pub mod worlds;
