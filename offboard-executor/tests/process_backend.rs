//! Integration tests: run real child processes through `ProcessBackend`.
//!
//! Each test writes a small POSIX shell script to a temporary directory and
//! runs it with `sh` as the interpreter.

#![cfg(unix)]

use std::path::PathBuf;
use std::time::{Duration, Instant};

use offboard_executor::{ProcessBackend, ScriptBackend, ScriptCommand, ScriptConfig};
use tempfile::TempDir;

fn write_script(dir: &TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("offboard.sh");
    if let Err(e) = std::fs::write(&path, format!("#!/bin/sh\n{body}\n")) {
        panic!("failed to write script: {e}");
    }
    path
}

fn backend(dir: &TempDir, body: &str) -> ProcessBackend {
    let script = write_script(dir, body);
    ProcessBackend::new(
        ScriptConfig::direct(script)
            .with_interpreter("sh", &[])
            .with_kill_grace(Duration::from_millis(500)),
    )
}

fn temp_dir() -> TempDir {
    match tempfile::tempdir() {
        Ok(d) => d,
        Err(e) => panic!("failed to create temp dir: {e}"),
    }
}

#[tokio::test]
async fn exit_code_stdout_and_stderr_are_captured() {
    let dir = temp_dir();
    let backend = backend(&dir, r#"echo '{"message":"Employee already disabled"}'; echo 'note' >&2; exit 11"#);

    let outcome = backend.run(&["terminate".to_owned()], Duration::from_secs(10)).await;

    assert_eq!(outcome.exit_code(), Some(11));
    assert!(outcome.signal().is_none());
    assert_eq!(outcome.stderr_message(), Some("note"));
    assert_eq!(
        outcome.stdout_json().get("message"),
        Some(&serde_json::json!("Employee already disabled"))
    );
}

#[tokio::test]
async fn arguments_reach_the_script_verbatim() {
    let dir = temp_dir();
    let marker = dir.path().join("pwned");
    let backend = backend(&dir, r#"for a in "$@"; do printf '%s\n' "$a"; done"#);

    let hostile = format!("x; touch {} && echo $(id) `id` | cat", marker.display());
    let argv = vec!["validate".to_owned(), "--employee-upn".to_owned(), hostile.clone()];
    let outcome = backend.run(&argv, Duration::from_secs(10)).await;

    assert_eq!(outcome.exit_code(), Some(0));
    let lines: Vec<&str> = outcome.stdout.lines().collect();
    assert_eq!(lines, vec!["validate", "--employee-upn", hostile.as_str()]);
    assert!(!marker.exists(), "argument must never be interpreted by a shell");
}

#[tokio::test]
async fn command_argv_is_passed_after_the_script_path() {
    let dir = temp_dir();
    let backend = backend(&dir, r#"printf '%s|' "$@""#);
    let command = ScriptCommand::Validate { employee_upn: "test@ii-us.com".to_owned() };

    let outcome = backend.run(&command.argv(), Duration::from_secs(10)).await;

    assert_eq!(outcome.stdout, "validate|--employee-upn|test@ii-us.com|");
}

#[tokio::test]
async fn timeout_terminates_the_child_with_sigterm() {
    let dir = temp_dir();
    let backend = backend(&dir, "sleep 30");

    let start = Instant::now();
    let outcome = backend.run(&["terminate".to_owned()], Duration::from_secs(1)).await;
    let elapsed = start.elapsed();

    assert!(outcome.exit_code().is_none(), "timed-out run has no exit code");
    assert_eq!(outcome.signal(), Some("SIGTERM"));
    assert!(elapsed < Duration::from_secs(10), "run must not hang, took {elapsed:?}");
    assert!(outcome.elapsed >= Duration::from_secs(1));
}

#[tokio::test]
async fn script_ignoring_sigterm_is_killed_after_grace() {
    let dir = temp_dir();
    let backend = backend(&dir, "trap '' TERM\nwhile :; do sleep 1; done");

    let start = Instant::now();
    let outcome = backend.run(&["terminate".to_owned()], Duration::from_millis(300)).await;

    assert_eq!(outcome.signal(), Some("SIGTERM"));
    assert!(start.elapsed() < Duration::from_secs(10), "forced kill must bound the wait");
}

#[tokio::test]
async fn non_json_stdout_is_tolerated() {
    let dir = temp_dir();
    let backend = backend(&dir, "echo 'WARNING: module loaded'; exit 0");

    let outcome = backend.run(&["validate".to_owned()], Duration::from_secs(10)).await;

    assert_eq!(outcome.exit_code(), Some(0));
    assert!(outcome.stdout_json().is_empty());
}

#[tokio::test]
async fn non_executable_script_run_directly_is_a_spawn_failure() {
    let dir = temp_dir();
    let script = write_script(&dir, "exit 0");
    let backend = ProcessBackend::new(ScriptConfig::direct(script));

    let outcome = backend.run(&["validate".to_owned()], Duration::from_secs(10)).await;

    assert!(outcome.spawn_error().is_some(), "permission denied must surface as spawn error");
}

#[tokio::test]
async fn health_check_passes_for_present_script_and_interpreter() {
    let dir = temp_dir();
    let backend = backend(&dir, "exit 0");
    assert!(backend.health_check().await.is_ok());
}

#[tokio::test]
async fn output_read_before_a_lingering_grandchild_is_kept() {
    let dir = temp_dir();
    let backend = backend(&dir, "echo partial\nsleep 5 &\nexit 0");

    let start = Instant::now();
    let outcome = backend.run(&["validate".to_owned()], Duration::from_secs(10)).await;

    assert_eq!(outcome.exit_code(), Some(0));
    assert_eq!(outcome.stdout.trim(), "partial", "output read before the drain bound is returned");
    assert!(start.elapsed() < Duration::from_secs(5), "drain must be bounded");
}
