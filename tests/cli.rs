use assert_cmd::Command;
use serde_json::Value;

fn scoby_cmd() -> Command {
    Command::cargo_bin("scoby").expect("binary scoby is built")
}

fn read_json(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("valid json")
}

fn run_json(state_dir: &str, today: &str, now: &str, args: &[&str]) -> Value {
    let mut full = vec![
        "--state-dir",
        state_dir,
        "--today",
        today,
        "--now",
        now,
        "--format",
        "json",
    ];
    full.extend_from_slice(args);
    let out = scoby_cmd()
        .args(&full)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    read_json(&out)
}

#[test]
fn add_list_show_flow() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();
    let today = "2026-01-31";
    let now = "2026-01-31T12:00:00Z";

    let v = run_json(
        state,
        today,
        now,
        &["batch", "add", "Summer Black", "--target-days", "7"],
    );
    assert_eq!(v["batch"]["id"], "b0001");
    assert_eq!(v["batch"]["status"], "brewing");
    assert_eq!(v["batch"]["current_day"], 1);
    assert_eq!(v["batch"]["tea_type"], "Black Tea");

    let v = run_json(
        state,
        today,
        now,
        &["batch", "add", "Green Ginger", "--tea-type", "Green Tea"],
    );
    assert_eq!(v["batch"]["id"], "b0002");

    let v = run_json(state, today, now, &["batch", "list"]);
    let ids: Vec<&str> = v["batches"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["b0001", "b0002"]);

    let v = run_json(state, today, now, &["batch", "show", "b0002"]);
    assert_eq!(v["batch"]["name"], "Green Ginger");
    assert_eq!(v["batch"]["tea_type"], "Green Tea");
}

#[test]
fn day_counters_follow_the_calendar() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();

    run_json(
        state,
        "2026-01-01",
        "2026-01-01T23:50:00Z",
        &["batch", "add", "Night Brew"],
    );

    // One "minute" after midnight the batch reads day 2, not day 1.
    let v = run_json(
        state,
        "2026-01-02",
        "2026-01-02T00:01:00Z",
        &["batch", "show", "b0001"],
    );
    assert_eq!(v["batch"]["current_day"], 2);

    let v = run_json(
        state,
        "2026-01-08",
        "2026-01-08T12:00:00Z",
        &["batch", "show", "b0001"],
    );
    assert_eq!(v["batch"]["current_day"], 8);
}

#[test]
fn lifecycle_and_archive_restore() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();
    let today = "2026-01-31";
    let now = "2026-01-31T12:00:00Z";

    run_json(state, today, now, &["batch", "add", "Cycle"]);

    // brewing -> bottled skips a step.
    scoby_cmd()
        .args([
            "--state-dir",
            state,
            "--today",
            today,
            "--now",
            now,
            "batch",
            "set-status",
            "b0001",
            "bottled",
        ])
        .assert()
        .failure()
        .code(4);

    let v = run_json(state, today, now, &["batch", "set-status", "b0001", "ready"]);
    assert_eq!(v["batch"]["status"], "ready");

    let v = run_json(state, today, now, &["batch", "archive", "b0001"]);
    assert_eq!(v["batch"]["status"], "archived");
    assert_eq!(v["batch"]["previous_status"], "ready");
    assert_eq!(v["batch"]["is_active"], false);

    // Archived batches drop out of the default list.
    let v = run_json(state, today, now, &["batch", "list"]);
    assert!(v["batches"].as_array().unwrap().is_empty());
    let v = run_json(state, today, now, &["batch", "list", "--all"]);
    assert_eq!(v["batches"].as_array().unwrap().len(), 1);

    let v = run_json(state, today, now, &["batch", "unarchive", "b0001"]);
    assert_eq!(v["batch"]["status"], "ready");
    assert_eq!(v["batch"]["is_active"], true);
}

#[test]
fn f2_flow_records_flavorings() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();
    let today = "2026-01-31";
    let now = "2026-01-31T12:00:00Z";

    run_json(state, today, now, &["batch", "add", "Fizzy"]);
    run_json(state, today, now, &["batch", "set-status", "b0001", "ready"]);

    let v = run_json(
        state,
        today,
        now,
        &[
            "batch",
            "start-f2",
            "b0001",
            "--days",
            "3",
            "--flavoring",
            "Ginger:spice:20g",
            "--flavoring",
            "Lemon:fruit:1 sliced",
        ],
    );
    assert_eq!(v["batch"]["status"], "f2_brewing");
    assert_eq!(v["batch"]["f2_current_day"], 1);
    let flavorings = v["batch"]["f2_flavorings"].as_array().unwrap();
    assert_eq!(flavorings.len(), 2);
    assert_eq!(flavorings[0]["name"], "Ginger");
    assert_eq!(flavorings[0]["kind"], "spice");

    let v = run_json(
        state,
        today,
        now,
        &["batch", "set-status", "b0001", "f2_ready"],
    );
    assert_eq!(v["batch"]["status"], "f2_ready");
}

#[test]
fn health_reacts_to_care_overdue_and_decay() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();

    // Day 1: creating a brewing batch earns the daily care point.
    run_json(
        state,
        "2026-01-01",
        "2026-01-01T12:00:00Z",
        &["batch", "add", "Neglected"],
    );
    let v = run_json(
        state,
        "2026-01-01",
        "2026-01-01T12:00:00Z",
        &["health", "show"],
    );
    assert_eq!(v["current_health"], 86);

    // Nine days later: care +1, overdue -5 (day 10 > 7+2), decay 9 * -2.
    let v = run_json(
        state,
        "2026-01-10",
        "2026-01-10T12:00:00Z",
        &["health", "sync"],
    );
    assert_eq!(v["delta"], -22);
    assert_eq!(v["current_health"], 64);

    // Re-running the sync on the same day changes nothing.
    let v = run_json(
        state,
        "2026-01-10",
        "2026-01-10T12:00:00Z",
        &["health", "sync"],
    );
    assert_eq!(v["delta"], 0);
    assert_eq!(v["current_health"], 64);
}

#[test]
fn quest_completion_awards_xp_and_health() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();
    let today = "2026-01-31";
    let now = "2026-01-31T12:00:00Z";

    // Tutorial chain starts with only the first quest unlocked.
    let v = run_json(state, today, now, &["quest", "list"]);
    let quests = v["quests"].as_array().unwrap();
    let first = quests.iter().find(|q| q["id"] == "first-batch").unwrap();
    assert_eq!(first["is_unlocked"], false);

    let v = run_json(state, today, now, &["quest", "complete", "meet-scoby"]);
    assert_eq!(v["completion"]["xp_awarded"], 50);
    assert_eq!(v["completion"]["unlocked_next"], "first-batch");
    assert_eq!(v["health_delta"], 3);

    run_json(state, today, now, &["batch", "add", "Quest Brew"]);

    // 50 + 100 XP crosses the level-1 threshold of 100.
    let v = run_json(state, today, now, &["quest", "complete", "first-batch"]);
    assert_eq!(v["completion"]["level"], 2);
    assert_eq!(v["completion"]["xp"], 50);
    assert_eq!(v["completion"]["xp_to_next_level"], 120);

    let v = run_json(state, today, now, &["avatar", "show"]);
    assert_eq!(v["avatar"]["level"], 2);
    assert_eq!(v["avatar"]["evolution_stage"], "baby");

    // Completing again is a reported no-op.
    let v = run_json(state, today, now, &["quest", "complete", "first-batch"]);
    assert_eq!(v["completion"]["already_completed"], true);
    assert_eq!(v["health_delta"], 0);
}

#[test]
fn settings_defaults_feed_batch_creation() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();
    let today = "2026-01-31";
    let now = "2026-01-31T12:00:00Z";

    scoby_cmd()
        .args([
            "--state-dir",
            state,
            "settings",
            "set",
            "brewing.default_target_days",
            "10",
        ])
        .assert()
        .success();
    scoby_cmd()
        .args([
            "--state-dir",
            state,
            "settings",
            "set",
            "brewing.default_tea_type",
            "Oolong Tea",
        ])
        .assert()
        .success();

    let v = run_json(state, today, now, &["batch", "add", "Configured"]);
    assert_eq!(v["batch"]["target_days"], 10);
    assert_eq!(v["batch"]["tea_type"], "Oolong Tea");
}

#[test]
fn status_dashboard_surfaces_suggestions() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().to_str().unwrap();

    run_json(
        state,
        "2026-01-01",
        "2026-01-01T12:00:00Z",
        &["batch", "add", "Due Soon"],
    );

    // Day 7 of 7: ready to bottle.
    let v = run_json(state, "2026-01-07", "2026-01-07T12:00:00Z", &["status"]);
    let suggestions = v["suggestions"].as_array().unwrap();
    assert_eq!(suggestions.len(), 1);
    assert_eq!(suggestions[0]["kind"], "ready_to_bottle");

    // Day 10: overdue takes over.
    let v = run_json(state, "2026-01-10", "2026-01-10T12:00:00Z", &["status"]);
    assert_eq!(v["suggestions"][0]["kind"], "overdue");
}
