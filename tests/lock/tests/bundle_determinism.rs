//! In-process bundle determinism: repeated runs, sliced vs. whole runs, the
//! on-disk round trip, and the plan digest binding inside a bundle.

use std::time::Duration;

use hop_harness::bundle::{
    build_bundle, verify_bundle, ArtifactInput, BundleVerifyError, PlanBundleV1,
    OUTCOME_ARTIFACT, PLAN_ARTIFACT, POLICY_ARTIFACT, STATS_ARTIFACT,
};
use hop_harness::bundle_dir::{read_bundle_dir, write_bundle_dir};
use hop_harness::contract::PlanningWorldV1;
use hop_harness::runner::run_world;
use hop_harness::worlds::courier_chain::CourierChain;
use hop_harness::worlds::simple_travel::SimpleTravel;
use hop_kernel::proof::hash::canonical_hash;
use hop_kernel::proof::hash_domain::HashDomain;
use hop_search::{PlanPolicyV1, Verbosity};
use sha2::{Digest, Sha256};

const N: usize = 10;

fn run(world: &dyn PlanningWorldV1, policy: &PlanPolicyV1) -> PlanBundleV1 {
    run_world(world, policy).expect("world runs")
}

#[test]
fn repeated_runs_are_byte_identical() {
    let world = CourierChain::default();
    let first = run(&world, &PlanPolicyV1::default());
    for i in 1..N {
        let again = run(&world, &PlanPolicyV1::default());
        assert_eq!(again.digest, first.digest, "run {i} diverged");
        assert_eq!(again.manifest, first.manifest, "run {i} manifest diverged");
        for (name, artifact) in &first.artifacts {
            if artifact.normative {
                assert_eq!(again.artifacts[name].content, artifact.content, "run {i}: {name}");
            }
        }
    }
}

#[test]
fn observational_artifacts_do_not_move_the_digest() {
    let world = SimpleTravel::default();
    let quiet = run(&world, &PlanPolicyV1::default());
    let noisy = run(
        &world,
        &PlanPolicyV1 {
            timeout: Duration::ZERO,
            verbosity: Verbosity::States,
            ..PlanPolicyV1::default()
        },
    );
    assert_eq!(quiet.digest, noisy.digest);
    assert_ne!(
        quiet.artifacts[POLICY_ARTIFACT].content,
        noisy.artifacts[POLICY_ARTIFACT].content
    );
    assert_ne!(
        quiet.artifacts[STATS_ARTIFACT].content,
        noisy.artifacts[STATS_ARTIFACT].content
    );
}

#[test]
fn directory_round_trip_preserves_digest() {
    let bundle = run(&CourierChain::default(), &PlanPolicyV1::with_timeout(Duration::ZERO));
    let dir = tempfile::tempdir().unwrap();
    write_bundle_dir(&bundle, dir.path()).unwrap();
    let loaded = read_bundle_dir(dir.path()).unwrap();
    assert_eq!(loaded.digest, bundle.digest);
    verify_bundle(&loaded).unwrap();
}

#[test]
fn outcome_binds_plan_digest() {
    let bundle = run(&SimpleTravel::with_cash(1_000), &PlanPolicyV1::default());
    let outcome = bundle.artifact_json(OUTCOME_ARTIFACT).unwrap();
    let plan_bytes = &bundle.artifacts[PLAN_ARTIFACT].content;

    // Independent recomputation: SHA-256 over domain prefix then bytes.
    let mut hasher = Sha256::new();
    hasher.update(HashDomain::Plan.as_bytes());
    hasher.update(plan_bytes);
    let expected = format!("sha256:{}", hex::encode(hasher.finalize()));
    assert_eq!(outcome["plan_digest"], expected.as_str());
    assert_eq!(canonical_hash(HashDomain::Plan, plan_bytes).as_str(), expected);
}

#[test]
fn rebuilt_bundle_with_foreign_plan_is_caught() {
    let taxi = run(&SimpleTravel::with_cash(1_000), &PlanPolicyV1::default());
    let walking = run(&SimpleTravel::default(), &PlanPolicyV1::default());

    // Rebuild so hashes, manifest and digest are all self-consistent; only
    // the outcome binding can notice the swap.
    let inputs: Vec<ArtifactInput> = taxi
        .artifacts
        .values()
        .map(|a| {
            let source = if a.name == PLAN_ARTIFACT { &walking } else { &taxi };
            ArtifactInput {
                name: a.name.clone(),
                content: source.artifacts[&a.name].content.clone(),
                normative: a.normative,
            }
        })
        .collect();
    let forged = build_bundle(&taxi.world_id, inputs).unwrap();

    let err = verify_bundle(&forged).unwrap_err();
    assert!(matches!(err, BundleVerifyError::PlanDigestMismatch { .. }), "got {err}");
}
