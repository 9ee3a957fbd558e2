use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;

fn scoby_cmd() -> Command {
    Command::cargo_bin("scoby").expect("binary scoby is built")
}

fn base_args<'a>(state: &'a str) -> Vec<&'a str> {
    vec![
        "--state-dir",
        state,
        "--today",
        "2026-01-31",
        "--now",
        "2026-01-31T12:00:00Z",
    ]
}

fn read_json(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("valid json")
}

#[test]
fn exit_codes_match_the_failure_kind() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();

    // Validation: empty name.
    let mut args = base_args(state);
    args.extend(["batch", "add", "   "]);
    scoby_cmd().args(&args).assert().failure().code(2);

    // Validation: target days out of range.
    let mut args = base_args(state);
    args.extend(["batch", "add", "Too Long", "--target-days", "31"]);
    scoby_cmd().args(&args).assert().failure().code(2);

    // Not found.
    let mut args = base_args(state);
    args.extend(["batch", "show", "b9999"]);
    scoby_cmd()
        .args(&args)
        .assert()
        .failure()
        .code(3)
        .stderr(predicate::str::contains("not found"));

    // Invalid transition.
    let mut args = base_args(state);
    args.extend(["batch", "add", "Jumper"]);
    scoby_cmd().args(&args).assert().success();
    let mut args = base_args(state);
    args.extend(["batch", "set-status", "b0001", "f2_ready"]);
    scoby_cmd()
        .args(&args)
        .assert()
        .failure()
        .code(4)
        .stderr(predicate::str::contains("Invalid transition"));

    // Completing a locked quest is a transition error too.
    let mut args = base_args(state);
    args.extend(["quest", "complete", "taste-test"]);
    scoby_cmd().args(&args).assert().failure().code(4);
}

#[test]
fn destructive_commands_require_confirmation() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();

    let mut args = base_args(state);
    args.extend(["batch", "add", "Fragile"]);
    scoby_cmd().args(&args).assert().success();

    let mut args = base_args(state);
    args.extend(["batch", "delete", "b0001"]);
    scoby_cmd()
        .args(&args)
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("--yes"));

    let mut args = base_args(state);
    args.extend(["batch", "delete", "b0001", "--yes"]);
    scoby_cmd().args(&args).assert().success();

    let mut args = base_args(state);
    args.extend(["health", "reset"]);
    scoby_cmd().args(&args).assert().failure().code(2);
}

#[test]
fn corrupt_slice_degrades_to_defaults_with_warning() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();

    let mut args = base_args(state);
    args.extend(["batch", "add", "Survivor"]);
    scoby_cmd().args(&args).assert().success();

    fs::write(dir.path().join("batches.json"), "{ not json").unwrap();

    // The command still succeeds; the broken slice restarts from defaults.
    let mut args = base_args(state);
    args.extend(["--format", "json", "batch", "list"]);
    let out = scoby_cmd()
        .args(&args)
        .assert()
        .success()
        .stderr(predicate::str::contains("corrupt"))
        .get_output()
        .stdout
        .clone();
    let v = read_json(&out);
    assert!(v["batches"].as_array().unwrap().is_empty());

    // The other slices are untouched by the batch corruption.
    let mut args = base_args(state);
    args.extend(["--format", "json", "quest", "list"]);
    let out = scoby_cmd()
        .args(&args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = read_json(&out);
    assert_eq!(v["quests"].as_array().unwrap().len(), 10);
}

#[test]
fn unchanged_state_is_not_rewritten() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();

    let mut args = base_args(state);
    args.extend(["batch", "add", "Steady"]);
    scoby_cmd().args(&args).assert().success();

    // Settle into steady state for the pinned clock.
    let mut args = base_args(state);
    args.extend(["status"]);
    scoby_cmd().args(&args).assert().success();

    let mtime_before = fs::metadata(dir.path().join("batches.json"))
        .unwrap()
        .modified()
        .unwrap();
    let health_before = fs::read_to_string(dir.path().join("health.json")).unwrap();

    // Same logical day, same clock: nothing should be written.
    let mut args = base_args(state);
    args.extend(["status"]);
    scoby_cmd().args(&args).assert().success();

    let mtime_after = fs::metadata(dir.path().join("batches.json"))
        .unwrap()
        .modified()
        .unwrap();
    let health_after = fs::read_to_string(dir.path().join("health.json")).unwrap();
    assert_eq!(mtime_before, mtime_after);
    assert_eq!(health_before, health_after);
}

#[test]
fn export_import_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();

    let mut args = base_args(state);
    args.extend(["batch", "add", "Traveler", "--notes", "goes places"]);
    scoby_cmd().args(&args).assert().success();
    let mut args = base_args(state);
    args.extend(["quest", "complete", "meet-scoby"]);
    scoby_cmd().args(&args).assert().success();

    let bundle = dir.path().join("bundle.json");
    let mut args = base_args(state);
    args.extend(["export", "--out", bundle.to_str().unwrap()]);
    scoby_cmd().args(&args).assert().success();

    // Import into a fresh state directory.
    let other = tempfile::tempdir().unwrap();
    let other_state = other.path().to_str().unwrap();
    let mut args = base_args(other_state);
    args.extend(["import", bundle.to_str().unwrap()]);
    scoby_cmd().args(&args).assert().success();

    let mut args = base_args(other_state);
    args.extend(["--format", "json", "batch", "show", "b0001"]);
    let out = scoby_cmd()
        .args(&args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = read_json(&out);
    assert_eq!(v["batch"]["name"], "Traveler");
    assert_eq!(v["batch"]["notes"], "goes places");

    let mut args = base_args(other_state);
    args.extend(["--format", "json", "avatar", "show"]);
    let out = scoby_cmd()
        .args(&args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let v = read_json(&out);
    assert_eq!(v["avatar"]["xp"], 50);
}

#[test]
fn malformed_import_changes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();

    let mut args = base_args(state);
    args.extend(["batch", "add", "Keeper"]);
    scoby_cmd().args(&args).assert().success();

    let bad = dir.path().join("bad.json");
    fs::write(&bad, "{\"version\": 1, \"batches\": []}").unwrap();

    let mut args = base_args(state);
    args.extend(["import", bad.to_str().unwrap()]);
    scoby_cmd().args(&args).assert().failure().code(2);

    // The existing state survived the rejected import.
    let mut args = base_args(state);
    args.extend(["--format", "json", "batch", "show", "b0001"]);
    let out = scoby_cmd()
        .args(&args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(read_json(&out)["batch"]["name"], "Keeper");
}

#[test]
fn watch_once_runs_a_single_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();

    let mut args = base_args(state);
    args.extend(["batch", "add", "Watched"]);
    scoby_cmd().args(&args).assert().success();

    let mut args = base_args(state);
    args.extend(["watch", "--once"]);
    scoby_cmd()
        .args(&args)
        .assert()
        .success()
        .stdout(predicate::str::contains("refreshed 1 batch(es)"));
}
