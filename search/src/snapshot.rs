//! Resumable search frames.
//!
//! A [`SearchFrame`] is the whole state of one logical search: the current
//! cursor (state, agenda, depth, partial plan) plus the stack of open method
//! choices. Suspension moves the frame into a [`SuspensionSnapshotV1`]; resume
//! moves it back out. Because the choice stack travels with it, a resumed
//! search can still backtrack into choices made before the pause.

use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::TaskV1;

use crate::outcome::{DeadEndReasonV1, DeadEndV1, FailureTraceV1, SearchStatsV1};
use crate::policy::PlanPolicyV1;

/// An open method choice: where the search returns when a branch dies.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoicePointV1 {
    /// State when the compound task was reached (restored on retry).
    pub(crate) state: WorldStateV1,
    /// The compound task being decomposed.
    pub(crate) task: TaskV1,
    /// Agenda below the compound task, stored reversed.
    pub(crate) rest: Vec<TaskV1>,
    pub(crate) depth: u32,
    /// Partial plan length to truncate back to.
    pub(crate) plan_len: usize,
    /// Index of the next method to try.
    pub(crate) next_method: usize,
}

impl ChoicePointV1 {
    #[must_use]
    pub fn task(&self) -> &TaskV1 {
        &self.task
    }

    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Methods already tried at this choice point.
    #[must_use]
    pub fn methods_tried(&self) -> usize {
        self.next_method
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchFrame {
    pub(crate) state: WorldStateV1,
    /// Pending tasks, stored reversed: the next task is `last()`.
    pub(crate) agenda: Vec<TaskV1>,
    pub(crate) depth: u32,
    pub(crate) steps: Vec<TaskV1>,
    pub(crate) choices: Vec<ChoicePointV1>,
    pub(crate) stats: SearchStatsV1,
    pub(crate) dead_ends: Option<Vec<DeadEndV1>>,
}

impl SearchFrame {
    pub(crate) fn new(state: WorldStateV1, tasks: Vec<TaskV1>, record_trace: bool) -> Self {
        let mut agenda = tasks;
        agenda.reverse();
        Self {
            state,
            agenda,
            depth: 0,
            steps: Vec::new(),
            choices: Vec::new(),
            stats: SearchStatsV1::default(),
            dead_ends: record_trace.then(Vec::new),
        }
    }

    pub(crate) fn record_dead_end(&mut self, task_name: &str, depth: u32, reason: DeadEndReasonV1) {
        self.stats.dead_ends += 1;
        if let Some(dead_ends) = &mut self.dead_ends {
            dead_ends.push(DeadEndV1 {
                task_name: task_name.to_string(),
                depth,
                reason,
            });
        }
    }

    pub(crate) fn take_trace(&mut self) -> Option<FailureTraceV1> {
        self.dead_ends
            .take()
            .map(|dead_ends| FailureTraceV1 { dead_ends })
    }
}

/// A suspended search, held by the planner between `Paused` and `resume`.
///
/// Carries the policy of the search so `resume` continues under the same
/// verbosity, depth cap, and per-slice timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct SuspensionSnapshotV1 {
    pub(crate) frame: SearchFrame,
    pub(crate) policy: PlanPolicyV1,
}

impl SuspensionSnapshotV1 {
    /// World state at the suspension point.
    #[must_use]
    pub fn state(&self) -> &WorldStateV1 {
        &self.frame.state
    }

    /// Pending tasks in execution order. The first one is the task the
    /// search was about to process.
    pub fn pending_tasks(&self) -> impl Iterator<Item = &TaskV1> {
        self.frame.agenda.iter().rev()
    }

    #[must_use]
    pub fn depth(&self) -> u32 {
        self.frame.depth
    }

    /// Primitive steps accepted so far on the current branch.
    #[must_use]
    pub fn partial_plan(&self) -> &[TaskV1] {
        &self.frame.steps
    }

    /// Open method choices, outermost first.
    #[must_use]
    pub fn choice_points(&self) -> &[ChoicePointV1] {
        &self.frame.choices
    }

    #[must_use]
    pub fn stats(&self) -> &SearchStatsV1 {
        &self.frame.stats
    }

    #[must_use]
    pub fn policy(&self) -> &PlanPolicyV1 {
        &self.policy
    }
}
