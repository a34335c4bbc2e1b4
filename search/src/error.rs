//! Typed planner errors.
//!
//! `PlannerError` covers misuse and pre-flight failures only. An exhausted
//! search is NOT an error: it is [`crate::outcome::PlanOutcomeV1::Failure`].

/// Which host callback was executing when a panic was caught.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackStageV1 {
    /// `Operator::apply`.
    Operator,
    /// `Method::decompose`.
    Method,
}

impl CallbackStageV1 {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Method => "method",
        }
    }
}

/// Typed failure for planner entry points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannerError {
    /// `plan` or `resume` was called while a search is running on this engine.
    AlreadyRunning,
    /// `resume` was called but no suspended search is held.
    NoSuspendedPlan,
    /// The policy failed pre-flight validation.
    UnsupportedPolicy { detail: String },
    /// An operator or method panicked. The search was abandoned and the
    /// engine returned to `Idle`.
    CallbackPanicked {
        task: String,
        stage: CallbackStageV1,
    },
}

impl std::fmt::Display for PlannerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "a search is already running on this planner"),
            Self::NoSuspendedPlan => write!(f, "no suspended search to resume"),
            Self::UnsupportedPolicy { detail } => write!(f, "unsupported plan policy: {detail}"),
            Self::CallbackPanicked { task, stage } => {
                write!(f, "{} callback panicked on task '{task}'", stage.as_str())
            }
        }
    }
}

impl std::error::Error for PlannerError {}
