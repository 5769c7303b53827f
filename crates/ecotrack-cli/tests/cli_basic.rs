//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against an isolated home
//! directory, so nothing touches the developer's real data. No backend is
//! configured, so every command runs in local-only mode.

use std::path::Path;
use std::process::Command;

/// Run a CLI command with HOME pointed at `home` and return output.
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "ecotrack-cli", "--"])
        .args(args)
        .env("HOME", home)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_status() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["status"]);
    assert_eq!(code, 0, "status failed");
    assert!(stdout.contains("points: 0"));
}

#[test]
fn test_goal_list_json() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["goal", "list", "--json"]);
    assert_eq!(code, 0, "goal list failed");

    let goals: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(goals.as_array().unwrap().len(), 16);
}

#[test]
fn test_goal_toggle_awards_points() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &["goal", "toggle", "waste", "Kompost yapmak"],
    );
    assert_eq!(code, 0, "goal toggle failed");
    assert!(stdout.contains("points: 20"));

    // State survives across invocations.
    let (stdout, _, code) = run_cli(home.path(), &["status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("points: 20"));
}

#[test]
fn test_goal_toggle_twice_reverts() {
    let home = tempfile::tempdir().unwrap();
    run_cli(home.path(), &["goal", "toggle", "waste", "Kompost yapmak"]);
    let (stdout, _, code) = run_cli(
        home.path(),
        &["goal", "toggle", "waste", "Kompost yapmak"],
    );
    assert_eq!(code, 0);
    assert!(stdout.contains("reopened"));
    assert!(stdout.contains("points: 0"));
}

#[test]
fn test_goal_toggle_unknown_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["goal", "toggle", "waste", "Uydurma hedef"],
    );
    assert_ne!(code, 0, "unknown goal should fail");
    assert!(stderr.contains("unknown goal"));
}

#[test]
fn test_task_list_and_complete() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["task", "list", "--json"]);
    assert_eq!(code, 0, "task list failed");

    let tasks: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let tasks = tasks.as_array().unwrap();
    assert_eq!(tasks.len(), 3);

    let id = tasks[0]["id"].as_str().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["task", "complete", id]);
    assert_eq!(code, 0, "task complete failed");
    assert!(stdout.contains("completed"));
}

#[test]
fn test_task_refresh_is_informational() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["task", "refresh"]);
    assert_eq!(code, 0, "task refresh failed");
    assert!(stdout.contains("rotate automatically"));
}

#[test]
fn test_auth_status_anonymous() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["auth", "status"]);
    assert_eq!(code, 0, "auth status failed");
    assert!(stdout.contains("not signed in"));
}

#[test]
fn test_login_without_backend_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(
        home.path(),
        &["auth", "login", "eco@example.com", "pw"],
    );
    assert_ne!(code, 0, "login without backend should fail");
    assert!(stderr.contains("no backend configured"));
}

#[test]
fn test_merge_status_empty() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["merge", "status"]);
    assert_eq!(code, 0, "merge status failed");
    assert!(stdout.contains("no merge pending"));
}

#[test]
fn test_config_show_and_set_retention() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["config", "show"]);
    assert_eq!(code, 0, "config show failed");
    assert!(stdout.contains("completion_retention_days = 7"));

    let (_, _, code) = run_cli(home.path(), &["config", "set-retention", "14"]);
    assert_eq!(code, 0, "config set-retention failed");

    let (stdout, _, code) = run_cli(home.path(), &["config", "show"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("completion_retention_days = 14"));
}
