//! Search outcomes, plans, counters, and failure traces.

use hop_kernel::model::describe::{state_to_json, tasks_to_json};
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::TaskV1;
use hop_kernel::proof::canon::{canonical_json_bytes, CanonError};
use hop_kernel::proof::hash::{canonical_hash, ContentHash};
use hop_kernel::proof::hash_domain::HashDomain;

/// A found plan: the ordered primitive steps and the state they lead to.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanV1 {
    /// Primitive tasks in execution order. Empty for an empty goal list.
    pub steps: Vec<TaskV1>,
    /// State after applying every step to the initial state.
    pub final_state: WorldStateV1,
}

impl PlanV1 {
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Step names in order.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|t| t.name.as_str())
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "final_state": state_to_json(&self.final_state),
            "schema_version": "plan.v1",
            "steps": tasks_to_json(&self.steps),
        })
    }

    /// Content hash of the canonical plan JSON.
    ///
    /// # Errors
    ///
    /// Propagates [`CanonError`] from canonicalization.
    pub fn digest(&self) -> Result<ContentHash, CanonError> {
        let bytes = canonical_json_bytes(&self.to_json())?;
        Ok(canonical_hash(HashDomain::Plan, &bytes))
    }
}

/// Why a branch of the search died.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadEndReasonV1 {
    /// No operator and no method list registered under the task name.
    UnknownTask,
    /// The operator returned no successor state.
    OperatorRejected,
    /// Every method for the compound task was tried without success.
    MethodsExhausted,
    /// The step depth exceeded `PlanPolicyV1::max_depth`.
    DepthLimit,
}

impl DeadEndReasonV1 {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UnknownTask => "unknown_task",
            Self::OperatorRejected => "operator_rejected",
            Self::MethodsExhausted => "methods_exhausted",
            Self::DepthLimit => "depth_limit",
        }
    }
}

/// One dead end, in the order the search met it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadEndV1 {
    pub task_name: String,
    pub depth: u32,
    pub reason: DeadEndReasonV1,
}

/// Dead ends collected when `record_failure_trace` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureTraceV1 {
    pub dead_ends: Vec<DeadEndV1>,
}

impl FailureTraceV1 {
    /// The deepest dead end (first one wins on ties).
    #[must_use]
    pub fn deepest(&self) -> Option<&DeadEndV1> {
        self.dead_ends
            .iter()
            .fold(None, |best: Option<&DeadEndV1>, d| match best {
                Some(b) if b.depth >= d.depth => Some(b),
                _ => Some(d),
            })
    }
}

/// Search counters, accumulated across every slice of one search.
///
/// Observational: counters are deterministic for a deterministic domain,
/// except `slices` and `suspensions`, which depend on timing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStatsV1 {
    /// Loop iterations that took a task off the agenda.
    pub steps: u64,
    pub operator_applications: u64,
    pub operator_rejections: u64,
    pub method_attempts: u64,
    pub method_rejections: u64,
    /// Times the search resumed at an earlier choice point after a dead end.
    pub backtracks: u64,
    pub dead_ends: u64,
    pub suspensions: u64,
    /// `plan` / `resume` calls that ran this search.
    pub slices: u64,
    /// Deepest step depth reached.
    pub max_depth: u32,
}

impl SearchStatsV1 {
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "backtracks": self.backtracks,
            "dead_ends": self.dead_ends,
            "max_depth": self.max_depth,
            "method_attempts": self.method_attempts,
            "method_rejections": self.method_rejections,
            "operator_applications": self.operator_applications,
            "operator_rejections": self.operator_rejections,
            "schema_version": "search_stats.v1",
            "slices": self.slices,
            "steps": self.steps,
            "suspensions": self.suspensions,
        })
    }
}

/// The three-way result of one `plan` / `resume` call.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcomeV1 {
    /// A complete decomposition into primitive steps.
    Success(PlanV1),
    /// The search space was exhausted.
    Failure { trace: Option<FailureTraceV1> },
    /// The search was suspended by timeout or pause request. The engine
    /// holds the snapshot; call `resume` to continue.
    Paused,
}

impl PlanOutcomeV1 {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Failure { .. } => "failure",
            Self::Paused => "paused",
        }
    }
}

/// Outcome plus the counters accumulated so far.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanResultV1 {
    pub outcome: PlanOutcomeV1,
    pub stats: SearchStatsV1,
}

impl PlanResultV1 {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, PlanOutcomeV1::Success(_))
    }

    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, PlanOutcomeV1::Failure { .. })
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        matches!(self.outcome, PlanOutcomeV1::Paused)
    }

    /// The plan, if the search succeeded.
    #[must_use]
    pub fn plan(&self) -> Option<&PlanV1> {
        match &self.outcome {
            PlanOutcomeV1::Success(plan) => Some(plan),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_plan(self) -> Option<PlanV1> {
        match self.outcome {
            PlanOutcomeV1::Success(plan) => Some(plan),
            _ => None,
        }
    }
}
