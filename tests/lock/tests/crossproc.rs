//! Cross-process determinism: the `plan_fixture` binary must print the same
//! lines regardless of working directory, locale, or unrelated environment.
//!
//! Also checks, within one process, that a zero-timeout (one step per slice)
//! run of every world lands on the same bundle digest as an unsliced run.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

fn workspace_root() -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("tests/ exists")
        .parent()
        .expect("workspace root exists")
        .to_string_lossy()
        .to_string()
}

fn run_variant(work_dir: &str, env_overrides: &[(&str, &str)]) -> String {
    let bin = env!("CARGO_BIN_EXE_plan_fixture");
    let mut command = Command::new(bin);
    command
        .current_dir(work_dir)
        .env_remove("LC_ALL")
        .env_remove("LC_COLLATE")
        .env_remove("LANG")
        .env_remove("LANGUAGE")
        .env_remove("RUST_LOG");
    for &(key, val) in env_overrides {
        command.env(key, val);
    }

    let output = command.output().unwrap_or_else(|e| {
        panic!("failed to spawn {bin} (work_dir={work_dir}, overrides={env_overrides:?}): {e}")
    });
    assert!(
        output.status.success(),
        "plan_fixture exited with {}: stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is valid UTF-8")
}

/// Parse one output line into its `key=value` fields.
fn fields(line: &str) -> BTreeMap<&str, &str> {
    line.split(' ')
        .filter_map(|pair| pair.split_once('='))
        .collect()
}

// ---------------------------------------------------------------------------
// Cross-process determinism
// ---------------------------------------------------------------------------

#[test]
fn crossproc_determinism_four_env_variants() {
    let root = workspace_root();
    let baseline = run_variant(&root, &[]);
    assert_eq!(baseline.lines().count(), 10, "5 worlds x 2 slicings:\n{baseline}");

    let temp = std::env::temp_dir();
    let variants: [(&str, Vec<(&str, &str)>); 3] = [
        (temp.to_str().expect("temp dir is UTF-8"), vec![]),
        (root.as_str(), vec![("LC_ALL", "C"), ("LANG", "tr_TR.UTF-8")]),
        (
            root.as_str(),
            vec![("HOP_NOISE", "1"), ("TZ", "Pacific/Chatham"), ("RUST_LOG", "trace")],
        ),
    ];
    for (dir, env) in &variants {
        let output = run_variant(dir, env);
        assert_eq!(output, baseline, "variant dir={dir} env={env:?} diverged");
    }
}

#[test]
fn slicing_never_changes_bundle_digest() {
    let output = run_variant(&workspace_root(), &[]);
    let lines: Vec<BTreeMap<&str, &str>> = output.lines().map(fields).collect();
    // Each world prints its whole run, then its zero-timeout run.
    for pair in lines.chunks(2) {
        assert_eq!(pair[0]["slicing"], "whole");
        assert_eq!(pair[1]["slicing"], "zero");
        assert_eq!(
            pair[0]["bundle_digest"], pair[1]["bundle_digest"],
            "{}: sliced and whole runs disagree",
            pair[0]["world"]
        );
    }
}

#[test]
fn fixture_reports_expected_outcomes() {
    let output = run_variant(&workspace_root(), &[]);
    let whole: Vec<BTreeMap<&str, &str>> = output
        .lines()
        .map(fields)
        .filter(|f| f["slicing"] == "whole")
        .collect();
    let summary: Vec<(&str, &str, &str)> = whole
        .iter()
        .map(|f| (f["world"], f["outcome"], f["steps"]))
        .collect();
    assert_eq!(
        summary,
        [
            ("blocks_pickup", "success", "1"),
            ("blocks_pickup", "failure", "0"),
            ("simple_travel", "success", "1"),
            ("simple_travel", "success", "3"),
            ("courier_chain", "success", "16"),
        ]
    );
    for f in &whole {
        if f["outcome"] == "success" {
            assert!(f["plan_digest"].starts_with("sha256:"), "{f:?}");
        } else {
            assert_eq!(f["plan_digest"], "none");
        }
    }
}
