//! Harness runner: drives the planner over a world and packages a bundle.
//!
//! # Pipeline
//!
//! ```text
//! policy.validate()
//!   → world.install() → Planner::with_registry_value()
//!   → plan() → [resume() while Paused]
//!   → canonical JSON artifacts → build_bundle()
//! ```
//!
//! The runner uses ONLY planner and kernel APIs. It does not decompose tasks
//! itself.

use hop_kernel::model::describe::{state_to_json, tasks_to_json};
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::TaskV1;
use hop_kernel::proof::canon::canonical_json_bytes;
use hop_search::{
    FailureTraceV1, PlanOutcomeV1, PlanPolicyV1, PlanResultV1, Planner, PlannerError,
};

use crate::bundle::{
    build_bundle, ArtifactInput, BundleBuildError, PlanBundleV1, FAILURE_TRACE_ARTIFACT,
    FINAL_STATE_ARTIFACT, GOAL_TASKS_ARTIFACT, INITIAL_STATE_ARTIFACT, OUTCOME_ARTIFACT,
    PLAN_ARTIFACT, POLICY_ARTIFACT, REGISTRY_ARTIFACT, STATS_ARTIFACT,
};
use crate::contract::PlanningWorldV1;

/// Upper bound on `resume` calls for one run.
pub const MAX_SLICES: u64 = 1_000_000;

/// Error during a harness run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    Planner(PlannerError),
    /// The search was still paused after [`MAX_SLICES`] slices.
    SliceLimit { slices: u64 },
    CanonFailed { detail: String },
    BundleFailed(BundleBuildError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Planner(e) => write!(f, "planner error: {e}"),
            Self::SliceLimit { slices } => write!(f, "search still paused after {slices} slices"),
            Self::CanonFailed { detail } => write!(f, "canonical JSON error: {detail}"),
            Self::BundleFailed(e) => write!(f, "bundle assembly failed: {e}"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<PlannerError> for RunError {
    fn from(e: PlannerError) -> Self {
        Self::Planner(e)
    }
}

impl From<BundleBuildError> for RunError {
    fn from(e: BundleBuildError) -> Self {
        Self::BundleFailed(e)
    }
}

/// Plan, then resume through every pause until the search completes.
///
/// # Errors
///
/// Returns [`RunError::Planner`] on planner misuse or callback panic, and
/// [`RunError::SliceLimit`] if the search never completes.
pub fn drive_to_completion(
    planner: &Planner,
    state: WorldStateV1,
    tasks: Vec<TaskV1>,
    policy: &PlanPolicyV1,
) -> Result<PlanResultV1, RunError> {
    let mut result = planner.plan(state, tasks, policy)?;
    while result.is_paused() {
        if result.stats.slices >= MAX_SLICES {
            return Err(RunError::SliceLimit {
                slices: result.stats.slices,
            });
        }
        result = planner.resume()?;
    }
    Ok(result)
}

/// Run `world` to completion under `policy` and package the result.
///
/// # Errors
///
/// Returns [`RunError`] if the planner fails or bundle assembly fails.
pub fn run_world(
    world: &dyn PlanningWorldV1,
    policy: &PlanPolicyV1,
) -> Result<PlanBundleV1, RunError> {
    policy.validate()?;
    let registry = world.registry();
    let registry_bytes = registry
        .canonical_bytes()
        .map_err(|e| RunError::CanonFailed {
            detail: e.to_string(),
        })?;
    let planner = Planner::with_registry_value(registry);

    let initial_state = world.initial_state();
    let goal_tasks = world.goal_tasks();
    let mut artifacts = vec![
        ArtifactInput::normative(INITIAL_STATE_ARTIFACT, canon(&state_to_json(&initial_state))?),
        ArtifactInput::normative(GOAL_TASKS_ARTIFACT, canon(&tasks_to_json(&goal_tasks))?),
        ArtifactInput::normative(REGISTRY_ARTIFACT, registry_bytes),
        ArtifactInput::observational(POLICY_ARTIFACT, canon(&policy.to_json())?),
    ];

    let result = drive_to_completion(&planner, initial_state, goal_tasks, policy)?;
    tracing::info!(
        world = world.world_id(),
        outcome = result.outcome.as_str(),
        steps = result.stats.steps,
        slices = result.stats.slices,
        "world run finished"
    );

    artifacts.push(ArtifactInput::observational(
        STATS_ARTIFACT,
        canon(&result.stats.to_json())?,
    ));
    match result.outcome {
        PlanOutcomeV1::Success(plan) => {
            let plan_bytes = canon(&plan.to_json())?;
            let plan_digest = plan.digest().map_err(|e| RunError::CanonFailed {
                detail: e.to_string(),
            })?;
            artifacts.push(ArtifactInput::normative(
                OUTCOME_ARTIFACT,
                canon(&serde_json::json!({
                    "outcome": "success",
                    "plan_digest": plan_digest.as_str(),
                    "schema_version": "plan_outcome.v1",
                    "step_count": plan.steps.len(),
                }))?,
            ));
            artifacts.push(ArtifactInput::normative(PLAN_ARTIFACT, plan_bytes));
            artifacts.push(ArtifactInput::normative(
                FINAL_STATE_ARTIFACT,
                canon(&state_to_json(&plan.final_state))?,
            ));
        }
        PlanOutcomeV1::Failure { trace } => {
            artifacts.push(ArtifactInput::normative(
                OUTCOME_ARTIFACT,
                canon(&serde_json::json!({
                    "outcome": "failure",
                    "schema_version": "plan_outcome.v1",
                }))?,
            ));
            if let Some(trace) = trace {
                artifacts.push(ArtifactInput::normative(
                    FAILURE_TRACE_ARTIFACT,
                    canon(&failure_trace_json(&trace))?,
                ));
            }
        }
        // drive_to_completion only returns once the search left Paused.
        PlanOutcomeV1::Paused => {
            return Err(RunError::SliceLimit {
                slices: result.stats.slices,
            })
        }
    }

    Ok(build_bundle(world.world_id(), artifacts)?)
}

fn canon(value: &serde_json::Value) -> Result<Vec<u8>, RunError> {
    canonical_json_bytes(value).map_err(|e| RunError::CanonFailed {
        detail: e.to_string(),
    })
}

fn failure_trace_json(trace: &FailureTraceV1) -> serde_json::Value {
    let dead_ends: Vec<serde_json::Value> = trace
        .dead_ends
        .iter()
        .map(|d| {
            serde_json::json!({
                "depth": d.depth,
                "reason": d.reason.as_str(),
                "task_name": d.task_name,
            })
        })
        .collect();
    serde_json::json!({
        "dead_ends": dead_ends,
        "schema_version": "failure_trace.v1",
    })
}
