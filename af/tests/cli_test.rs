//! CLI tests for the `af` binary
//!
//! None of these reach an LLM provider: they cover argument handling and the
//! failures that happen before any request is sent.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `af` isolated from the user's config, logs and .env
fn af(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("af").expect("binary builds");
    cmd.current_dir(dir.path())
        .env("XDG_DATA_HOME", dir.path().join("data"))
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .env_remove("RUST_LOG");
    cmd
}

fn config_without_key(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("agentflow.yml");
    std::fs::write(
        &path,
        "llm:\n  provider: openai\n  api-key-env: AGENTFLOW_CLI_TEST_UNSET_KEY\n",
    )
    .unwrap();
    path
}

#[test]
fn test_stages_lists_pipeline() {
    let dir = TempDir::new().unwrap();
    af(&dir)
        .arg("stages")
        .assert()
        .success()
        .stdout(predicate::str::contains("Research Agent"))
        .stdout(predicate::str::contains("Planning Agent"))
        .stdout(predicate::str::contains("Execution Agent"))
        .stdout(predicate::str::contains("temperature: 0.3"))
        .stdout(predicate::str::contains("task_analysis"));
}

#[test]
fn test_run_rejects_empty_task() {
    let dir = TempDir::new().unwrap();
    af(&dir)
        .args(["run", "   "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task objective must not be empty"));
}

#[test]
fn test_run_without_api_key_fails() {
    let dir = TempDir::new().unwrap();
    let config = config_without_key(&dir);
    af(&dir)
        .env_remove("AGENTFLOW_CLI_TEST_UNSET_KEY")
        .arg("-c")
        .arg(&config)
        .args(["run", "Create a web app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("AGENTFLOW_CLI_TEST_UNSET_KEY"));
}

#[test]
fn test_validate_rejects_unknown_stage() {
    let dir = TempDir::new().unwrap();
    af(&dir).args(["validate", "review"]).assert().failure();
}

#[test]
fn test_help_lists_api_keys() {
    let dir = TempDir::new().unwrap();
    af(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("API Keys:"))
        .stdout(predicate::str::contains("Logs are written to:"));
}
