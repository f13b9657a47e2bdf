#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

const LEAD_FIXTURE: &str = r#"
stage:
  id: stage-42
  entity_type: leads
  entity_id: lead-42
  current_stage: agent_initial
actions: []
action_types:
  - action_code: elevate_to_lawyer
    action_name: Elevate to lawyer
    required_role: agent
    applicable_stages: [agent_initial]
  - action_code: request_documents
    action_name: Request documents
    required_role: agent
    default_due_days: 5
  - action_code: review_case
    action_name: Review case
    required_role: lawyer
users:
  - id: u-lawyer
    name: Laura
    role: lawyer
acting_user:
  id: u-agent
  name: Andres
  role: agent
"#;

fn pipeline() -> Command {
    let mut cmd = Command::cargo_bin("pipeline").unwrap();
    cmd.env_remove("PIPELINE_CONFIG").arg("--today").arg("2025-04-14");
    cmd
}

fn write_fixture(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("lead.yaml");
    std::fs::write(&path, LEAD_FIXTURE).unwrap();
    path
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let output = pipeline().arg("--json").args(args).output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

// ---------------------------------------------------------------------------
// pipeline eligible
// ---------------------------------------------------------------------------

#[test]
fn eligible_lists_partitions() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    pipeline()
        .args(["eligible", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("required"))
        .stdout(predicate::str::contains("elevate_to_lawyer"))
        .stdout(predicate::str::contains("foreign"));
}

#[test]
fn eligible_json_for_other_role() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    let value = run_json(&[
        "eligible",
        "--fixture",
        fixture.to_str().unwrap(),
        "--role",
        "lawyer",
    ]);
    assert_eq!(value["role"], "lawyer");
    assert_eq!(value["required"].as_array().unwrap().len(), 0);
    assert_eq!(value["optional"][0]["action_code"], "review_case");
    assert_eq!(value["foreign"].as_array().unwrap().len(), 2);
}

#[test]
fn eligible_missing_fixture_fails() {
    let dir = TempDir::new().unwrap();
    pipeline()
        .args(["eligible", "--fixture"])
        .arg(dir.path().join("nope.yaml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load fixture"));
}

// ---------------------------------------------------------------------------
// pipeline run
// ---------------------------------------------------------------------------

#[test]
fn run_commits_required_action_with_defaults() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    let value = run_json(&["run", "--fixture", fixture.to_str().unwrap()]);

    assert_eq!(value["outcome"], "committed");
    let created = value["report"]["succeeded"].as_array().unwrap();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0]["action_type"], "elevate_to_lawyer");
    assert_eq!(created[0]["action_data"]["due_date"], "2025-04-15");
    assert_eq!(created[0]["action_data"]["priority"], "medium");
    assert_eq!(created[0]["status"], "pending_validation");
}

#[test]
fn run_applies_edits_and_writes_back() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    pipeline()
        .args(["run", "--fixture"])
        .arg(&fixture)
        .args(["--select", "request_documents"])
        .args(["--set", "request_documents:responsible=u-lawyer"])
        .args(["--set", "request_documents:priority=high"])
        .arg("--write")
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-04-19"))
        .stdout(predicate::str::contains("Committed: 2 created, 0 failed"));

    let saved = std::fs::read_to_string(&fixture).unwrap();
    assert!(saved.contains("request_documents"));
    assert!(saved.contains("u-lawyer"));

    // With history present the first action is no longer required.
    let value = run_json(&["eligible", "--fixture", fixture.to_str().unwrap()]);
    assert_eq!(value["required"].as_array().unwrap().len(), 0);
}

#[test]
fn run_reports_partial_failure() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    let value = run_json(&[
        "run",
        "--fixture",
        fixture.to_str().unwrap(),
        "--select",
        "request_documents",
        "--fail",
        "request_documents",
    ]);
    assert_eq!(value["outcome"], "committed");
    assert_eq!(value["report"]["succeeded"].as_array().unwrap().len(), 1);
    assert_eq!(
        value["report"]["failed"][0]["draft"]["action_type_code"],
        "request_documents"
    );
}

#[test]
fn run_cancel_leaves_fixture_untouched() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    pipeline()
        .args(["run", "--fixture"])
        .arg(&fixture)
        .args(["--cancel", "--write"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));
    assert_eq!(std::fs::read_to_string(&fixture).unwrap(), LEAD_FIXTURE);
}

#[test]
fn run_rejects_past_due_date() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    pipeline()
        .args(["run", "--fixture"])
        .arg(&fixture)
        .args(["--set", "elevate_to_lawyer:due=2025-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("elevate_to_lawyer"))
        .stderr(predicate::str::contains("before today"));
}

#[test]
fn run_rejects_unknown_responsible() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    pipeline()
        .args(["run", "--fixture"])
        .arg(&fixture)
        .args(["--set", "elevate_to_lawyer:responsible=u-ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("u-ghost"));
}

#[test]
fn run_rejects_malformed_set() {
    let dir = TempDir::new().unwrap();
    let fixture = write_fixture(&dir);
    pipeline()
        .args(["run", "--fixture"])
        .arg(&fixture)
        .args(["--set", "elevate_to_lawyer"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CODE:KEY=VALUE"));
}

#[test]
fn run_with_nothing_selectable_commits_nothing() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("admin.yaml");
    std::fs::write(
        &fixture,
        LEAD_FIXTURE.replace("  id: u-agent\n  name: Andres\n  role: agent", "  id: u-admin\n  name: Ada\n  role: admin"),
    )
    .unwrap();
    pipeline()
        .args(["run", "--fixture"])
        .arg(&fixture)
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to commit"));
}

// ---------------------------------------------------------------------------
// pipeline config
// ---------------------------------------------------------------------------

#[test]
fn config_show_prints_defaults() {
    pipeline()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("commit_concurrency: 4"));
}

#[test]
fn config_validate_flags_empty_roles() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("pipeline.yaml");
    std::fs::write(&path, "assignable_roles: []\ncommit_concurrency: 0\n").unwrap();
    pipeline()
        .arg("--config")
        .arg(&path)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[warning]"))
        .stdout(predicate::str::contains("[error]"))
        .stderr(predicate::str::contains("config validation found errors"));
}
