//! Shared domains for the planner benchmark suite.
//!
//! Every builder returns a ready [`Planner`] plus the goal it is meant to
//! plan, so benches time only `plan` / `resume`.

use hop_kernel::domain::operator::{MethodHandle, OperatorHandle};
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::{Params, TaskV1};
use hop_search::{PlanPolicyV1, PlanResultV1, Planner, PlannerError};

/// Counter state used by every benchmark domain.
#[must_use]
pub fn counter_state() -> WorldStateV1 {
    WorldStateV1::new("bench").with("n", 0_i64)
}

fn step_operator() -> OperatorHandle {
    OperatorHandle::new("step", |s: &WorldStateV1, _: &Params| -> Option<WorldStateV1> {
        let n = s.int("n")?;
        Some(s.clone().with("n", n + 1))
    })
}

/// `len` primitive `step` tasks.
#[must_use]
pub fn primitive_chain(len: usize) -> (Planner, Vec<TaskV1>) {
    let planner = Planner::new();
    planner.declare_operator("step", step_operator());
    (planner, vec![TaskV1::new("step"); len])
}

/// A full binary decomposition tree: `node(level)` splits into two
/// `node(level - 1)` until level 0, which is a `step`.
///
/// The plan has `2^depth` steps.
#[must_use]
pub fn binary_tree(depth: i64) -> (Planner, Vec<TaskV1>) {
    let planner = Planner::new();
    planner.declare_operator("step", step_operator());
    planner.declare_method(
        "node",
        MethodHandle::new("split", |_: &WorldStateV1, p: &Params| -> Option<Vec<TaskV1>> {
            let level = p.get("level")?.as_int()?;
            let child = if level == 0 {
                TaskV1::new("step")
            } else {
                TaskV1::new("node").with_param("level", level - 1)
            };
            Some(if level == 0 { vec![child] } else { vec![child.clone(), child] })
        }),
    );
    (planner, vec![TaskV1::new("node").with_param("level", depth)])
}

/// `alternatives` methods for `choose`; every method but the last runs
/// `depth` steps and then hits a rejecting operator.
#[must_use]
pub fn late_failures(alternatives: usize, depth: usize) -> (Planner, Vec<TaskV1>) {
    let planner = Planner::new();
    planner.declare_operator("step", step_operator());
    planner.declare_operator(
        "wall",
        OperatorHandle::new("wall", |_: &WorldStateV1, _: &Params| -> Option<WorldStateV1> {
            None
        }),
    );
    for i in 0..alternatives {
        let mut subtasks = vec![TaskV1::new("step"); depth];
        if i + 1 < alternatives {
            subtasks.push(TaskV1::new("wall"));
        }
        planner.declare_method(
            "choose",
            MethodHandle::new(format!("way-{i}"), move |_: &WorldStateV1, _: &Params| {
                Some(subtasks.clone())
            }),
        );
    }
    (planner, vec![TaskV1::new("choose")])
}

/// Plan and resume until the search leaves `Paused`.
///
/// # Errors
///
/// Propagates [`PlannerError`] from `plan` / `resume`.
pub fn plan_to_completion(
    planner: &Planner,
    tasks: Vec<TaskV1>,
    policy: &PlanPolicyV1,
) -> Result<PlanResultV1, PlannerError> {
    let mut result = planner.plan(counter_state(), tasks, policy)?;
    while result.is_paused() {
        result = planner.resume()?;
    }
    Ok(result)
}
