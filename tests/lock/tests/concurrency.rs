//! One search per planner: overlapping `plan`/`resume` calls are rejected,
//! separate planners run independently, and a panicking callback never
//! leaves the engine stuck in `Running`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use hop_kernel::domain::operator::{MethodHandle, OperatorHandle};
use hop_kernel::model::state::WorldStateV1;
use hop_kernel::model::task::{Params, TaskV1};
use hop_search::{CallbackStageV1, PlanPolicyV1, Planner, PlannerError, PlannerStatusV1};
use lock_tests::domains::{blank_state, log_planner, slow_tick_planner, ticks};

/// Gate an operator can block on until the test opens it.
#[derive(Default)]
struct Gate {
    entered: AtomicBool,
    open: AtomicBool,
}

impl Gate {
    fn wait_entered(&self) {
        while !self.entered.load(Ordering::Acquire) {
            thread::sleep(Duration::from_millis(1));
        }
    }
}

/// Planner with a `hold` operator that blocks until `gate` opens.
fn gated_planner(gate: &Arc<Gate>) -> Planner {
    let planner = log_planner();
    let gate = Arc::clone(gate);
    planner.declare_operator(
        "hold",
        OperatorHandle::new("hold", move |s: &WorldStateV1, _: &Params| {
            gate.entered.store(true, Ordering::Release);
            while !gate.open.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(1));
            }
            Some(s.clone())
        }),
    );
    planner
}

// ---------------------------------------------------------------------------
// Single search per engine
// ---------------------------------------------------------------------------

#[test]
fn overlapping_calls_are_rejected() {
    let gate = Arc::new(Gate::default());
    let planner = gated_planner(&gate);

    thread::scope(|s| {
        let search = s.spawn(|| {
            planner.plan(
                blank_state(),
                vec![TaskV1::new("hold"), TaskV1::new("tick")],
                &PlanPolicyV1::default(),
            )
        });
        gate.wait_entered();

        assert!(planner.is_running());
        assert_eq!(planner.status(), PlannerStatusV1::Running);
        assert_eq!(
            planner
                .plan(blank_state(), ticks(1), &PlanPolicyV1::default())
                .unwrap_err(),
            PlannerError::AlreadyRunning
        );
        assert_eq!(planner.resume().unwrap_err(), PlannerError::AlreadyRunning);
        assert!(planner.suspended().is_none());

        gate.open.store(true, Ordering::Release);
        let result = search.join().unwrap().unwrap();
        assert!(result.is_success());
    });

    assert!(!planner.is_running());
    assert_eq!(planner.status(), PlannerStatusV1::Completed { success: true });
}

#[test]
fn rejected_call_leaves_running_search_intact() {
    let gate = Arc::new(Gate::default());
    let planner = gated_planner(&gate);

    thread::scope(|s| {
        let search = s.spawn(|| {
            planner.plan(blank_state(), vec![TaskV1::new("hold")], &PlanPolicyV1::default())
        });
        gate.wait_entered();
        assert!(planner
            .plan(blank_state(), ticks(5), &PlanPolicyV1::default())
            .is_err());
        gate.open.store(true, Ordering::Release);

        let plan = search.join().unwrap().unwrap().into_plan().unwrap();
        assert_eq!(plan.steps, [TaskV1::new("hold")]);
        assert_eq!(plan.final_state.int("n"), Some(0));
    });
}

#[test]
fn separate_planners_run_in_parallel() {
    let planners: Vec<Planner> = (0..4)
        .map(|_| slow_tick_planner(Duration::from_millis(2)))
        .collect();
    thread::scope(|s| {
        let runs: Vec<_> = planners
            .iter()
            .map(|p| s.spawn(|| p.plan(blank_state(), ticks(10), &PlanPolicyV1::default())))
            .collect();
        for run in runs {
            let plan = run.join().unwrap().unwrap().into_plan().unwrap();
            assert_eq!(plan.final_state.int("n"), Some(10));
        }
    });
}

#[test]
fn pause_handle_works_across_threads() {
    let planner = slow_tick_planner(Duration::from_millis(5));
    let handle = planner.pause_handle();
    assert!(!handle.is_running());

    thread::scope(|s| {
        let search = s.spawn(|| {
            planner.plan(
                blank_state(),
                ticks(500),
                &PlanPolicyV1::with_timeout(Duration::from_secs(60)),
            )
        });
        s.spawn(move || {
            while !handle.is_running() {
                thread::sleep(Duration::from_millis(1));
            }
            handle.pause_plan();
        });
        assert!(search.join().unwrap().unwrap().is_paused());
    });
    assert_eq!(planner.status(), PlannerStatusV1::Paused);
}

// ---------------------------------------------------------------------------
// Panicking callbacks
// ---------------------------------------------------------------------------

#[test]
fn operator_panic_returns_engine_to_idle() {
    let planner = log_planner();
    planner.declare_operator(
        "boom",
        OperatorHandle::new("boom", |_: &WorldStateV1, _: &Params| -> Option<WorldStateV1> {
            panic!("operator exploded")
        }),
    );

    let err = planner
        .plan(blank_state(), vec![TaskV1::new("boom")], &PlanPolicyV1::default())
        .unwrap_err();
    assert_eq!(
        err,
        PlannerError::CallbackPanicked {
            task: "boom".into(),
            stage: CallbackStageV1::Operator,
        }
    );
    assert_eq!(planner.status(), PlannerStatusV1::Idle);

    let again = planner
        .plan(blank_state(), ticks(2), &PlanPolicyV1::default())
        .unwrap();
    assert!(again.is_success());
}

#[test]
fn method_panic_after_resume_drops_snapshot() {
    let planner = log_planner();
    planner.declare_method(
        "fuse",
        MethodHandle::new("fuse", |_: &WorldStateV1, _: &Params| -> Option<Vec<TaskV1>> {
            panic!("method exploded")
        }),
    );

    let mut tasks = ticks(2);
    tasks.push(TaskV1::new("fuse"));
    let first = planner
        .plan(blank_state(), tasks, &PlanPolicyV1::with_timeout(Duration::ZERO))
        .unwrap();
    assert!(first.is_paused());

    let mut outcome = planner.resume();
    while matches!(&outcome, Ok(r) if r.is_paused()) {
        outcome = planner.resume();
    }
    assert_eq!(
        outcome.unwrap_err(),
        PlannerError::CallbackPanicked {
            task: "fuse".into(),
            stage: CallbackStageV1::Method,
        }
    );
    assert!(planner.suspended().is_none());
    assert_eq!(planner.resume().unwrap_err(), PlannerError::NoSuspendedPlan);
}
