//! HOP search: depth-first HTN decomposition with cooperative suspension.
//!
//! This crate provides the planner engine. It depends only on `hop_kernel`;
//! it does NOT depend on `hop_harness`.
//!
//! # Crate dependency graph
//!
//! ```text
//! hop_kernel  ←  hop_search  ←  hop_harness
//! (model,        (engine,        (worlds, runner,
//!  registry)      planner)        bundles)
//! ```
//!
//! # Key types
//!
//! - [`Planner`] - registry owner and single-search state machine
//! - [`PlanPolicyV1`] - time budget, verbosity, depth guard
//! - [`PlanResultV1`] / [`PlanOutcomeV1`] - `Success`, `Failure`, or `Paused`
//! - [`SuspensionSnapshotV1`] - a paused search, resumable exactly
//! - [`PlannerError`] - misuse and pre-flight failures
//!
//! # Example
//!
//! ```
//! use hop_kernel::domain::operator::OperatorHandle;
//! use hop_kernel::model::state::WorldStateV1;
//! use hop_kernel::model::task::{Params, TaskV1};
//! use hop_search::{PlanPolicyV1, Planner};
//!
//! let planner = Planner::new();
//! planner.declare_operator(
//!     "wave",
//!     OperatorHandle::new("wave", |s: &WorldStateV1, _: &Params| -> Option<WorldStateV1> {
//!         Some(s.clone().with("waved", true))
//!     }),
//! );
//! let result = planner
//!     .plan(WorldStateV1::new("s0"), vec![TaskV1::new("wave")], &PlanPolicyV1::default())
//!     .unwrap();
//! assert_eq!(result.plan().unwrap().final_state.flag("waved"), Some(true));
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

mod engine;
pub mod error;
pub mod outcome;
pub mod planner;
pub mod policy;
pub mod snapshot;

pub use error::{CallbackStageV1, PlannerError};
pub use outcome::{
    DeadEndReasonV1, DeadEndV1, FailureTraceV1, PlanOutcomeV1, PlanResultV1, PlanV1,
    SearchStatsV1,
};
pub use planner::{PauseHandle, Planner, PlannerStatusV1};
pub use policy::{PlanPolicyV1, Verbosity};
pub use snapshot::{ChoicePointV1, SuspensionSnapshotV1};
