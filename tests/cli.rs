// ABOUTME: End-to-end CLI tests driving the compiled binary.
// ABOUTME: Exercises argument parsing and workspace discovery failures.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

/// Test: --help lists the top-level command groups.
#[test]
fn help_lists_command_groups() {
    Command::cargo_bin("caravel")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pipeline"))
        .stdout(predicate::str::contains("app"));
}

/// Test: Subcommand help documents the deploy flags.
#[test]
fn pipeline_deploy_help_lists_flags() {
    Command::cargo_bin("caravel")
        .unwrap()
        .args(["pipeline", "deploy", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--app"))
        .stdout(predicate::str::contains("--name"))
        .stdout(predicate::str::contains("--yes"));
}

/// Test: Running outside a workspace fails with the discovery message.
#[test]
fn commands_fail_outside_a_workspace() {
    let dir = tempdir().unwrap();
    Command::cargo_bin("caravel")
        .unwrap()
        .current_dir(dir.path())
        .args(["app", "delete", "--name", "badgoose", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "couldn't find a directory called caravel",
        ));
}

/// Test: A workspace without a summary cannot delete by summary lookup.
#[test]
fn app_delete_requires_a_name_or_summary() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("caravel")).unwrap();
    Command::cargo_bin("caravel")
        .unwrap()
        .current_dir(dir.path())
        .args(["app", "delete", "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "couldn't find an application associated with this workspace",
        ));
}

/// Test: Deleting an unknown pipeline in an empty workspace is a no-op.
#[test]
fn pipeline_delete_without_a_manifest_succeeds() {
    let dir = tempdir().unwrap();
    let ws = dir.path().join("caravel");
    fs::create_dir_all(&ws).unwrap();
    fs::write(ws.join(".workspace"), "application: badgoose\n").unwrap();
    fs::write(
        ws.join(".local-state.json"),
        r#"{"default_region":"local-1","applications":{"badgoose":{"account_id":"1234"}},"secrets":[]}"#,
    )
    .unwrap();
    Command::cargo_bin("caravel")
        .unwrap()
        .current_dir(dir.path())
        .args(["pipeline", "delete", "--yes"])
        .assert()
        .success();
}
