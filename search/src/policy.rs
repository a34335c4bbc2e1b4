//! Plan policy: time budget, tracing verbosity, depth guard.

use std::time::Duration;

use hop_kernel::proof::canon::canonical_json_bytes;
use hop_kernel::proof::hash::{canonical_hash, ContentHash};
use hop_kernel::proof::hash_domain::HashDomain;

use crate::error::PlannerError;

/// How much the engine traces. Never affects outcomes.
///
/// Levels match the legacy integer verbosity 0–3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum Verbosity {
    /// Nothing.
    #[default]
    Silent,
    /// Start and outcome of each `plan` / `resume` (`info`).
    Outcome,
    /// Every step: depth, task, decision (`debug`).
    Steps,
    /// Every step plus the rendered world state (`trace`).
    States,
}

impl Verbosity {
    /// Map a legacy integer level.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::UnsupportedPolicy`] for levels above 3.
    pub fn from_level(level: u8) -> Result<Self, PlannerError> {
        match level {
            0 => Ok(Self::Silent),
            1 => Ok(Self::Outcome),
            2 => Ok(Self::Steps),
            3 => Ok(Self::States),
            _ => Err(PlannerError::UnsupportedPolicy {
                detail: format!("verbosity level {level} (expected 0..=3)"),
            }),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Silent => "silent",
            Self::Outcome => "outcome",
            Self::Steps => "steps",
            Self::States => "states",
        }
    }
}

/// Configuration for one search (stored with the snapshot across resumes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanPolicyV1 {
    /// Wall-clock budget per slice (one `plan` or `resume` call).
    ///
    /// Checked at the top of every step except the first of a slice, so each
    /// slice makes progress even with `Duration::ZERO`.
    pub timeout: Duration,
    /// Tracing verbosity.
    pub verbosity: Verbosity,
    /// Deepest step depth allowed. A step beyond it is a dead end.
    pub max_depth: Option<u32>,
    /// Collect dead ends into `PlanOutcomeV1::Failure { trace }`.
    pub record_failure_trace: bool,
}

impl Default for PlanPolicyV1 {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            verbosity: Verbosity::Silent,
            max_depth: None,
            record_failure_trace: false,
        }
    }
}

impl PlanPolicyV1 {
    /// Policy with the given timeout and defaults otherwise.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    /// Pre-flight validation.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::UnsupportedPolicy`] for `max_depth: Some(0)`,
    /// which admits no decomposition at all.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.max_depth == Some(0) {
            return Err(PlannerError::UnsupportedPolicy {
                detail: "max_depth of 0 admits no decomposition".into(),
            });
        }
        Ok(())
    }

    /// Canonical JSON form (timeout in whole microseconds, saturating).
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let micros = u64::try_from(self.timeout.as_micros()).unwrap_or(u64::MAX);
        serde_json::json!({
            "max_depth": self.max_depth,
            "record_failure_trace": self.record_failure_trace,
            "schema_version": "plan_policy.v1",
            "timeout_micros": micros,
            "verbosity": self.verbosity.as_str(),
        })
    }

    /// Content hash of the canonical JSON form.
    #[must_use]
    pub fn digest(&self) -> ContentHash {
        // to_json never produces floats, so canonicalization cannot fail.
        let bytes = canonical_json_bytes(&self.to_json()).unwrap_or_default();
        canonical_hash(HashDomain::PlanPolicy, &bytes)
    }
}
