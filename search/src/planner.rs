//! The planner engine: registry ownership plus the search state machine.
//!
//! ```text
//!            plan                    slice ends
//!   Idle ───────────► Running ───────────────────► Completed(success|failure)
//!    ▲                 │   ▲                              │
//!    │  callback panic │   │ resume                  plan │
//!    └─────────────────┘   │                              ▼
//!                          └──────── Paused ◄──── (timeout / pause request)
//! ```
//!
//! One `Mutex` guards the phase; the `Condvar` is notified on every
//! transition out of `Running`. The search itself runs with the lock
//! released, so `pause_plan`, `status`, and registry reads never block on a
//! running search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, Instant};

use hop_kernel::domain::operator::{MethodHandle, OperatorHandle};
use hop_kernel::domain::registry::DomainRegistryV1;
use hop_kernel::model::describe::describe_tasks;
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::TaskV1;

use crate::engine::{run_slice, SliceEnd};
use crate::error::PlannerError;
use crate::outcome::{PlanOutcomeV1, PlanResultV1};
use crate::policy::{PlanPolicyV1, Verbosity};
use crate::snapshot::{SearchFrame, SuspensionSnapshotV1};

/// Observable engine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerStatusV1 {
    Idle,
    Running,
    /// A suspended search is held and can be resumed.
    Paused,
    Completed { success: bool },
}

#[derive(Debug)]
enum Phase {
    Idle,
    Running,
    Paused(Box<SuspensionSnapshotV1>),
    Completed { success: bool },
}

impl Phase {
    fn status(&self) -> PlannerStatusV1 {
        match self {
            Self::Idle => PlannerStatusV1::Idle,
            Self::Running => PlannerStatusV1::Running,
            Self::Paused(_) => PlannerStatusV1::Paused,
            Self::Completed { success } => PlannerStatusV1::Completed { success: *success },
        }
    }
}

#[derive(Debug)]
struct Control {
    phase: Mutex<Phase>,
    settled: Condvar,
    pause_requested: AtomicBool,
}

impl Control {
    // Callbacks run outside the lock and panics are caught, so poisoning
    // cannot leave the phase half-written.
    fn lock(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn request_pause(&self) -> bool {
        let phase = self.lock();
        if !matches!(*phase, Phase::Running) {
            return false;
        }
        self.pause_requested.swap(true, Ordering::AcqRel)
    }
}

/// Cloneable handle for requesting a pause from another thread or from
/// inside an operator or method.
#[derive(Debug, Clone)]
pub struct PauseHandle {
    control: Arc<Control>,
}

impl PauseHandle {
    /// Same semantics as [`Planner::pause_plan`].
    pub fn pause_plan(&self) -> bool {
        self.control.request_pause()
    }

    /// Whether the planner this handle belongs to is running a search.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(*self.control.lock(), Phase::Running)
    }
}

/// HTN planner: a domain registry plus a single-search engine.
///
/// All methods take `&self`; the planner is `Send + Sync` and may be shared
/// across threads. At most one search runs at a time.
#[derive(Debug)]
pub struct Planner {
    registry: RwLock<DomainRegistryV1>,
    control: Arc<Control>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl Planner {
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry_value(DomainRegistryV1::default())
    }

    /// Planner over an already populated registry.
    #[must_use]
    pub fn with_registry_value(registry: DomainRegistryV1) -> Self {
        Self {
            registry: RwLock::new(registry),
            control: Arc::new(Control {
                phase: Mutex::new(Phase::Idle),
                settled: Condvar::new(),
                pause_requested: AtomicBool::new(false),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Registry passthroughs
    // -----------------------------------------------------------------------

    /// First declaration wins; returns `false` if `name` already had one.
    pub fn declare_operator(&self, name: impl Into<String>, op: OperatorHandle) -> bool {
        self.write_registry().declare_operator(name, op)
    }

    /// Appends one method alternative for `name`.
    pub fn declare_method(&self, name: impl Into<String>, method: MethodHandle) {
        self.write_registry().declare_method(name, method);
    }

    /// First declaration wins; returns `false` if `name` already had methods.
    pub fn declare_methods(&self, name: impl Into<String>, methods: Vec<MethodHandle>) -> bool {
        self.write_registry().declare_methods(name, methods)
    }

    pub fn clear(&self) {
        self.write_registry().clear();
    }

    #[must_use]
    pub fn get_operator(&self, name: &str) -> Option<OperatorHandle> {
        self.read_registry().get_operator(name).cloned()
    }

    #[must_use]
    pub fn get_methods(&self, name: &str) -> Option<Vec<MethodHandle>> {
        self.read_registry().get_methods(name).map(<[MethodHandle]>::to_vec)
    }

    /// Read access to the registry.
    pub fn with_registry<R>(&self, f: impl FnOnce(&DomainRegistryV1) -> R) -> R {
        f(&self.read_registry())
    }

    fn read_registry(&self) -> std::sync::RwLockReadGuard<'_, DomainRegistryV1> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_registry(&self) -> std::sync::RwLockWriteGuard<'_, DomainRegistryV1> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }

    // -----------------------------------------------------------------------
    // Search control
    // -----------------------------------------------------------------------

    /// Start a new search for `tasks` from `state`.
    ///
    /// A held suspended search is abandoned.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::UnsupportedPolicy`] if `policy` fails validation.
    /// - [`PlannerError::AlreadyRunning`] if a search is in flight.
    /// - [`PlannerError::CallbackPanicked`] if an operator or method panicked.
    pub fn plan(
        &self,
        state: WorldStateV1,
        tasks: Vec<TaskV1>,
        policy: &PlanPolicyV1,
    ) -> Result<PlanResultV1, PlannerError> {
        policy.validate()?;
        {
            let mut phase = self.control.lock();
            if matches!(*phase, Phase::Running) {
                return Err(PlannerError::AlreadyRunning);
            }
            if matches!(*phase, Phase::Paused(_)) {
                tracing::debug!("abandoning suspended search");
            }
            *phase = Phase::Running;
            self.control.pause_requested.store(false, Ordering::Release);
        }

        if policy.verbosity >= Verbosity::Outcome {
            tracing::info!(
                state = %state.name,
                tasks = %describe_tasks(&tasks),
                timeout = ?policy.timeout,
                "plan started"
            );
        }
        let frame = SearchFrame::new(state, tasks, policy.record_failure_trace);
        self.drive(frame, policy.clone())
    }

    /// Continue the held suspended search with a fresh time budget.
    ///
    /// # Errors
    ///
    /// - [`PlannerError::AlreadyRunning`] if a search is in flight.
    /// - [`PlannerError::NoSuspendedPlan`] if nothing is suspended.
    /// - [`PlannerError::CallbackPanicked`] if an operator or method panicked.
    pub fn resume(&self) -> Result<PlanResultV1, PlannerError> {
        let snapshot = {
            let mut phase = self.control.lock();
            match std::mem::replace(&mut *phase, Phase::Running) {
                Phase::Paused(snapshot) => {
                    self.control.pause_requested.store(false, Ordering::Release);
                    snapshot
                }
                Phase::Running => return Err(PlannerError::AlreadyRunning),
                other => {
                    *phase = other;
                    return Err(PlannerError::NoSuspendedPlan);
                }
            }
        };

        let SuspensionSnapshotV1 { frame, policy } = *snapshot;
        if policy.verbosity >= Verbosity::Outcome {
            tracing::info!(
                depth = frame.depth,
                pending = frame.agenda.len(),
                slice = frame.stats.slices + 1,
                "resume started"
            );
        }
        self.drive(frame, policy)
    }

    /// Request a cooperative pause of the running search.
    ///
    /// Returns whether a pause was already pending. Does nothing and returns
    /// `false` when no search is running.
    pub fn pause_plan(&self) -> bool {
        self.control.request_pause()
    }

    #[must_use]
    pub fn pause_handle(&self) -> PauseHandle {
        PauseHandle {
            control: Arc::clone(&self.control),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(*self.control.lock(), Phase::Running)
    }

    #[must_use]
    pub fn status(&self) -> PlannerStatusV1 {
        self.control.lock().status()
    }

    /// A copy of the held suspended search, if any.
    #[must_use]
    pub fn suspended(&self) -> Option<SuspensionSnapshotV1> {
        match &*self.control.lock() {
            Phase::Paused(snapshot) => Some(snapshot.as_ref().clone()),
            _ => None,
        }
    }

    /// Block until the engine leaves `Running`, or until `timeout` elapses.
    /// `None` waits indefinitely.
    pub fn wait_while_running(&self, timeout: Option<Duration>) -> PlannerStatusV1 {
        let phase = self.control.lock();
        let running = |p: &mut Phase| matches!(p, Phase::Running);
        let phase = match timeout {
            None => self
                .control
                .settled
                .wait_while(phase, running)
                .unwrap_or_else(PoisonError::into_inner),
            Some(limit) => {
                self.control
                    .settled
                    .wait_timeout_while(phase, limit, running)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
        };
        phase.status()
    }

    // -----------------------------------------------------------------------
    // Slice execution
    // -----------------------------------------------------------------------

    fn drive(
        &self,
        mut frame: SearchFrame,
        policy: PlanPolicyV1,
    ) -> Result<PlanResultV1, PlannerError> {
        let registry = self.read_registry().clone();
        let started = Instant::now();
        frame.stats.slices += 1;

        let ended = run_slice(&registry, &mut frame, &policy, &self.control.pause_requested);

        let mut phase = self.control.lock();
        self.control.pause_requested.store(false, Ordering::Release);
        let result = match ended {
            Ok(SliceEnd::Success(plan)) => {
                *phase = Phase::Completed { success: true };
                Ok(PlanResultV1 {
                    outcome: PlanOutcomeV1::Success(plan),
                    stats: frame.stats,
                })
            }
            Ok(SliceEnd::Failure) => {
                *phase = Phase::Completed { success: false };
                let stats = frame.stats;
                Ok(PlanResultV1 {
                    outcome: PlanOutcomeV1::Failure {
                        trace: frame.take_trace(),
                    },
                    stats,
                })
            }
            Ok(SliceEnd::Suspended) => {
                let stats = frame.stats;
                *phase = Phase::Paused(Box::new(SuspensionSnapshotV1 {
                    frame,
                    policy: policy.clone(),
                }));
                Ok(PlanResultV1 {
                    outcome: PlanOutcomeV1::Paused,
                    stats,
                })
            }
            Err(err) => {
                *phase = Phase::Idle;
                Err(err)
            }
        };
        self.control.settled.notify_all();
        drop(phase);

        match &result {
            Ok(r) if policy.verbosity >= Verbosity::Outcome => tracing::info!(
                outcome = r.outcome.as_str(),
                steps = r.stats.steps,
                backtracks = r.stats.backtracks,
                elapsed = ?started.elapsed(),
                "slice finished"
            ),
            Ok(_) => {}
            Err(err) => tracing::warn!(error = %err, "search abandoned"),
        }
        result
    }
}
