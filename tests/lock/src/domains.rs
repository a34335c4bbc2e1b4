//! Small planning domains for acceptance tests.
//!
//! - `append(item)`: appends `item` to the text variable `log`.
//! - `tick`: increments the integer variable `n`, optionally after a delay.
//! - `reject`: always fails.

use std::time::Duration;

use hop_kernel::domain::operator::{MethodHandle, OperatorHandle};
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::{Params, TaskV1};
use hop_search::Planner;

/// `append(item)` as a task.
#[must_use]
pub fn append(item: &str) -> TaskV1 {
    TaskV1::new("append").with_param("item", item)
}

/// Empty log, `n = 0`.
#[must_use]
pub fn blank_state() -> WorldStateV1 {
    WorldStateV1::new("blank").with("log", "").with("n", 0_i64)
}

/// The `append` operator.
#[must_use]
pub fn append_operator() -> OperatorHandle {
    OperatorHandle::new("append", |s: &WorldStateV1, p: &Params| -> Option<WorldStateV1> {
        let item = p.get("item")?.as_text()?;
        let log = format!("{}{item}", s.text("log")?);
        Some(s.clone().with("log", log))
    })
}

#[must_use]
pub fn reject_operator() -> OperatorHandle {
    OperatorHandle::new("reject", |_: &WorldStateV1, _: &Params| -> Option<WorldStateV1> {
        None
    })
}

/// `tick`, sleeping `delay` before each application.
#[must_use]
pub fn tick_operator(delay: Duration) -> OperatorHandle {
    OperatorHandle::new("tick", move |s: &WorldStateV1, _: &Params| -> Option<WorldStateV1> {
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let n = s.int("n")?;
        Some(s.clone().with("n", n + 1))
    })
}

/// A method that always decomposes into `subtasks`.
#[must_use]
pub fn fixed_method(name: &str, subtasks: Vec<TaskV1>) -> MethodHandle {
    MethodHandle::new(name, move |_: &WorldStateV1, _: &Params| Some(subtasks.clone()))
}

/// A method that never applies.
#[must_use]
pub fn inapplicable_method(name: &str) -> MethodHandle {
    MethodHandle::new(name, |_: &WorldStateV1, _: &Params| -> Option<Vec<TaskV1>> {
        None
    })
}

/// Planner with `append`, `reject`, and an instant `tick`.
#[must_use]
pub fn log_planner() -> Planner {
    let planner = Planner::new();
    planner.declare_operator("append", append_operator());
    planner.declare_operator("reject", reject_operator());
    planner.declare_operator("tick", tick_operator(Duration::ZERO));
    planner
}

/// Planner whose only operator is a `tick` that sleeps `delay`.
#[must_use]
pub fn slow_tick_planner(delay: Duration) -> Planner {
    let planner = Planner::new();
    planner.declare_operator("tick", tick_operator(delay));
    planner
}

/// `count` copies of `tick`.
#[must_use]
pub fn ticks(count: usize) -> Vec<TaskV1> {
    vec![TaskV1::new("tick"); count]
}
