//! Depth-first decomposition loop over an explicit choice stack.
//!
//! One call to [`run_slice`] advances a [`SearchFrame`] until the agenda
//! empties (success), every choice is exhausted (failure), or the suspension
//! check fires (suspended). The suspension check runs at the top of a step,
//! before the next task is touched, and nowhere else.
//!
//! Selection order is fixed: methods are tried in declaration order and the
//! agenda is processed front to back, so a deterministic domain always yields
//! the same plan regardless of how the search is sliced.

use std::mem;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use hop_kernel::domain::registry::DomainRegistryV1;
use hop_kernel::model::task::TaskV1;

use crate::error::{CallbackStageV1, PlannerError};
use crate::outcome::{DeadEndReasonV1, PlanV1};
use crate::policy::{PlanPolicyV1, Verbosity};
use crate::snapshot::{ChoicePointV1, SearchFrame};

/// How a slice ended. The frame stays with the caller in every case.
#[derive(Debug)]
pub(crate) enum SliceEnd {
    Success(PlanV1),
    Failure,
    Suspended,
}

/// Advance `frame` under `policy` until it completes or suspends.
///
/// The first step of a slice ignores the deadline, so every slice makes
/// progress. A pending pause request is honored on any step and consumed.
pub(crate) fn run_slice(
    registry: &DomainRegistryV1,
    frame: &mut SearchFrame,
    policy: &PlanPolicyV1,
    pause_requested: &AtomicBool,
) -> Result<SliceEnd, PlannerError> {
    let started = Instant::now();
    let mut first_step = true;

    loop {
        let Some(task) = frame.agenda.pop() else {
            return Ok(SliceEnd::Success(PlanV1 {
                steps: mem::take(&mut frame.steps),
                final_state: frame.state.clone(),
            }));
        };

        let pause = pause_requested.swap(false, Ordering::AcqRel);
        let expired = !first_step && started.elapsed() >= policy.timeout;
        if pause || expired {
            frame.agenda.push(task);
            frame.stats.suspensions += 1;
            if policy.verbosity >= Verbosity::Steps {
                tracing::debug!(depth = frame.depth, pause, expired, "suspending");
            }
            return Ok(SliceEnd::Suspended);
        }
        first_step = false;

        frame.stats.steps += 1;
        frame.stats.max_depth = frame.stats.max_depth.max(frame.depth);
        trace_step(policy, frame, &task);

        let depth = frame.depth;
        let reason = if policy.max_depth.is_some_and(|cap| depth > cap) {
            DeadEndReasonV1::DepthLimit
        } else if let Some(op) = registry.get_operator(&task.name) {
            frame.stats.operator_applications += 1;
            let applied = catch_unwind(AssertUnwindSafe(|| op.apply(&frame.state, &task.parameters)))
                .map_err(|_| PlannerError::CallbackPanicked {
                    task: task.name.clone(),
                    stage: CallbackStageV1::Operator,
                })?;
            if let Some(next) = applied {
                frame.state = next;
                frame.steps.push(task);
                frame.depth += 1;
                continue;
            }
            frame.stats.operator_rejections += 1;
            DeadEndReasonV1::OperatorRejected
        } else if registry.get_methods(&task.name).is_some() {
            let rest = mem::take(&mut frame.agenda);
            frame.choices.push(ChoicePointV1 {
                state: frame.state.clone(),
                task,
                rest,
                depth,
                plan_len: frame.steps.len(),
                next_method: 0,
            });
            if next_alternative(registry, frame, policy, false)? {
                continue;
            }
            return Ok(SliceEnd::Failure);
        } else {
            DeadEndReasonV1::UnknownTask
        };

        if policy.verbosity >= Verbosity::Steps {
            tracing::debug!(depth, task = %task.name, reason = reason.as_str(), "dead end");
        }
        frame.record_dead_end(&task.name, depth, reason);
        if !next_alternative(registry, frame, policy, true)? {
            return Ok(SliceEnd::Failure);
        }
    }
}

/// Move the frame onto the next untried method of the innermost open choice,
/// popping exhausted choices on the way. Returns `false` when none is left.
fn next_alternative(
    registry: &DomainRegistryV1,
    frame: &mut SearchFrame,
    policy: &PlanPolicyV1,
    after_dead_end: bool,
) -> Result<bool, PlannerError> {
    let mut backtracking = after_dead_end;

    while let Some(choice) = frame.choices.last_mut() {
        let methods = registry.get_methods(&choice.task.name).unwrap_or(&[]);

        while let Some(method) = methods.get(choice.next_method) {
            choice.next_method += 1;
            frame.stats.method_attempts += 1;

            let decomposed = catch_unwind(AssertUnwindSafe(|| {
                method.decompose(&choice.state, &choice.task.parameters)
            }))
            .map_err(|_| PlannerError::CallbackPanicked {
                task: choice.task.name.clone(),
                stage: CallbackStageV1::Method,
            })?;

            let Some(subtasks) = decomposed else {
                frame.stats.method_rejections += 1;
                continue;
            };

            if policy.verbosity >= Verbosity::Steps {
                tracing::debug!(
                    depth = choice.depth,
                    task = %choice.task.name,
                    method = method.name(),
                    subtasks = subtasks.len(),
                    "decomposed"
                );
            }
            if backtracking {
                frame.stats.backtracks += 1;
            }
            frame.state = choice.state.clone();
            frame.steps.truncate(choice.plan_len);
            frame.depth = choice.depth + 1;
            let mut agenda = choice.rest.clone();
            agenda.extend(subtasks.into_iter().rev());
            frame.agenda = agenda;
            return Ok(true);
        }

        let (name, depth) = (choice.task.name.clone(), choice.depth);
        frame.choices.pop();
        frame.record_dead_end(&name, depth, DeadEndReasonV1::MethodsExhausted);
        backtracking = true;
    }

    Ok(false)
}

fn trace_step(policy: &PlanPolicyV1, frame: &SearchFrame, task: &TaskV1) {
    match policy.verbosity {
        Verbosity::Silent | Verbosity::Outcome => {}
        Verbosity::Steps => tracing::debug!(depth = frame.depth, task = %task, "step"),
        Verbosity::States => {
            tracing::debug!(depth = frame.depth, task = %task, "step");
            tracing::trace!(state = %frame.state, "state");
        }
    }
}
