//! Cooperative suspension: deadlines, external pause requests, snapshots,
//! and resuming into the same answer an uninterrupted search gives.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use hop_kernel::domain::operator::OperatorHandle;
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::{Params, TaskV1};
use hop_search::{PlanPolicyV1, PlanResultV1, Planner, PlannerError, PlannerStatusV1};
use lock_tests::domains::{
    append, blank_state, fixed_method, log_planner, slow_tick_planner, ticks,
};

fn generous() -> PlanPolicyV1 {
    PlanPolicyV1::with_timeout(Duration::from_secs(60))
}

fn finish(planner: &Planner, mut result: PlanResultV1) -> (PlanResultV1, u32) {
    let mut resumes = 0;
    while result.is_paused() {
        result = planner.resume().expect("snapshot held");
        resumes += 1;
    }
    (result, resumes)
}

// ---------------------------------------------------------------------------
// Deadline suspension
// ---------------------------------------------------------------------------

#[test]
fn zero_timeout_runs_one_step_per_slice() {
    let planner = log_planner();
    let first = planner
        .plan(blank_state(), ticks(5), &PlanPolicyV1::with_timeout(Duration::ZERO))
        .unwrap();
    assert!(first.is_paused());
    assert_eq!(first.stats.steps, 1);
    assert_eq!(planner.status(), PlannerStatusV1::Paused);

    let (done, resumes) = finish(&planner, first);
    assert_eq!(resumes, 4);
    assert_eq!(done.stats.slices, 5);
    assert_eq!(done.stats.suspensions, 4);
    assert_eq!(done.plan().unwrap().final_state.int("n"), Some(5));
    assert_eq!(planner.status(), PlannerStatusV1::Completed { success: true });
}

#[test]
fn snapshot_exposes_search_position() {
    let planner = log_planner();
    let tasks = vec![append("a"), append("b"), append("c")];
    let result = planner
        .plan(blank_state(), tasks, &PlanPolicyV1::with_timeout(Duration::ZERO))
        .unwrap();
    assert!(result.is_paused());

    let snapshot = planner.suspended().expect("paused search is held");
    assert_eq!(snapshot.state().text("log"), Some("a"));
    assert_eq!(snapshot.partial_plan(), [append("a")]);
    let pending: Vec<&TaskV1> = snapshot.pending_tasks().collect();
    assert_eq!(pending, [&append("b"), &append("c")]);
    assert_eq!(snapshot.depth(), 1);
    assert_eq!(snapshot.policy().timeout, Duration::ZERO);
}

#[test]
fn short_deadline_slices_slow_operators() {
    let planner = slow_tick_planner(Duration::from_millis(5));
    let first = planner
        .plan(blank_state(), ticks(20), &PlanPolicyV1::with_timeout(Duration::from_millis(12)))
        .unwrap();
    assert!(first.is_paused());

    let (done, resumes) = finish(&planner, first);
    assert!(resumes >= 1);
    assert_eq!(done.stats.suspensions, done.stats.slices - 1);
    assert_eq!(done.plan().unwrap().final_state.int("n"), Some(20));
}

#[test]
fn backtracking_spans_slices() {
    let build = || {
        let planner = log_planner();
        planner.declare_method(
            "pick",
            fixed_method("long-way", vec![append("x"), append("y"), TaskV1::new("reject")]),
        );
        planner.declare_method("pick", fixed_method("short-way", vec![append("z")]));
        planner
    };
    let tasks = vec![append("<"), TaskV1::new("pick"), append(">")];

    let whole = build().plan(blank_state(), tasks.clone(), &generous()).unwrap();

    let planner = build();
    let first = planner
        .plan(blank_state(), tasks, &PlanPolicyV1::with_timeout(Duration::ZERO))
        .unwrap();
    let (sliced, _) = finish(&planner, first);

    assert_eq!(sliced.outcome, whole.outcome);
    assert_eq!(sliced.plan().unwrap().final_state.text("log"), Some("<z>"));
    assert_eq!(sliced.stats.backtracks, whole.stats.backtracks);
    assert_eq!(sliced.stats.steps, whole.stats.steps);
}

// ---------------------------------------------------------------------------
// External pause requests
// ---------------------------------------------------------------------------

#[test]
fn pause_from_another_thread() {
    let planner = slow_tick_planner(Duration::from_millis(10));
    thread::scope(|s| {
        let search = s.spawn(|| planner.plan(blank_state(), ticks(200), &generous()));
        while !planner.is_running() {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(!planner.pause_plan(), "no pause was pending");
        assert_eq!(planner.wait_while_running(None), PlannerStatusV1::Paused);

        let paused = search.join().unwrap().unwrap();
        assert!(paused.is_paused());
        assert!(paused.stats.steps < 200);
    });

    let (done, _) = finish(&planner, planner.resume().unwrap());
    assert_eq!(done.plan().unwrap().final_state.int("n"), Some(200));
}

#[test]
fn repeated_pause_reports_pending_request() {
    let planner = Planner::new();
    let handle = planner.pause_handle();
    let answers = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&answers);
    planner.declare_operator(
        "halt",
        OperatorHandle::new("halt", move |s: &WorldStateV1, _: &Params| {
            let mut seen = seen.lock().unwrap();
            seen.push(handle.pause_plan());
            seen.push(handle.pause_plan());
            Some(s.clone())
        }),
    );

    let tasks = vec![TaskV1::new("halt"), TaskV1::new("halt")];
    let result = planner.plan(blank_state(), tasks, &generous()).unwrap();
    assert!(result.is_paused());
    assert_eq!(*answers.lock().unwrap(), [false, true]);
}

#[test]
fn pause_while_idle_is_ignored() {
    let planner = log_planner();
    assert!(!planner.pause_plan());
    assert!(!planner.pause_plan());
    let result = planner.plan(blank_state(), ticks(3), &generous()).unwrap();
    assert!(result.is_success());
}

#[test]
fn wait_while_idle_returns_immediately() {
    let planner = log_planner();
    assert_eq!(
        planner.wait_while_running(Some(Duration::from_millis(1))),
        PlannerStatusV1::Idle
    );
}

// ---------------------------------------------------------------------------
// Snapshot lifecycle
// ---------------------------------------------------------------------------

#[test]
fn resume_without_snapshot_is_an_error() {
    let planner = log_planner();
    assert_eq!(planner.resume().unwrap_err(), PlannerError::NoSuspendedPlan);

    planner.plan(blank_state(), ticks(1), &generous()).unwrap();
    assert_eq!(planner.resume().unwrap_err(), PlannerError::NoSuspendedPlan);
    assert_eq!(planner.status(), PlannerStatusV1::Completed { success: true });
}

#[test]
fn snapshot_is_consumed_by_resume() {
    let planner = log_planner();
    let zero = PlanPolicyV1::with_timeout(Duration::ZERO);
    planner.plan(blank_state(), ticks(2), &zero).unwrap();
    assert!(planner.suspended().is_some());

    let done = planner.resume().unwrap();
    assert!(done.is_success());
    assert!(planner.suspended().is_none());
    assert_eq!(planner.resume().unwrap_err(), PlannerError::NoSuspendedPlan);
}

#[test]
fn new_plan_abandons_suspended_search() {
    let planner = log_planner();
    let zero = PlanPolicyV1::with_timeout(Duration::ZERO);
    planner.plan(blank_state(), ticks(10), &zero).unwrap();

    let fresh = planner
        .plan(blank_state(), vec![append("new")], &generous())
        .unwrap();
    assert_eq!(fresh.plan().unwrap().final_state.text("log"), Some("new"));
    assert!(planner.suspended().is_none());
}
