//! CLI integration tests
//!
//! End-to-end tests for CLI commands using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get the faqsync binary with credentials cleared from the environment
fn faqsync_cmd() -> Command {
    let mut cmd = Command::cargo_bin("faqsync").unwrap();
    cmd.env_remove("FAQSYNC_CONFIG")
        .env_remove("FAQSYNC_KV_ACCOUNT_ID")
        .env_remove("FAQSYNC_KV_NAMESPACE_ID")
        .env_remove("FAQSYNC_KV_API_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_version_output() {
    faqsync_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("faqsync"));
}

#[test]
fn test_help_shows_all_commands() {
    faqsync_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("probe-all"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("models"))
        .stdout(predicate::str::contains("rate-limits"))
        .stdout(predicate::str::contains("settings"))
        .stdout(predicate::str::contains("kv"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_config_init_writes_example() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("faqsync.toml");

    faqsync_cmd()
        .args(["config", "init", "-o", output.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    let content = std::fs::read_to_string(&output).unwrap();
    assert!(content.contains("[kv]"));

    faqsync_cmd()
        .args(["config", "init", "-o", output.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_models_show_uses_defaults_without_credentials() {
    let temp_dir = TempDir::new().unwrap();

    faqsync_cmd()
        .current_dir(temp_dir.path())
        .args(["models", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("defaults_only"))
        .stdout(predicate::str::contains("@cf/meta/llama-3.1-8b-instruct"));
}

#[test]
fn test_models_set_without_credentials_fails() {
    let temp_dir = TempDir::new().unwrap();

    faqsync_cmd()
        .current_dir(temp_dir.path())
        .args(["models", "set", "seo_analyzer=@cf/google/gemma-3-12b-it"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_missing_explicit_config_fails() {
    faqsync_cmd()
        .args(["-c", "/nonexistent/faqsync.toml", "probe-all"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[tokio::test]
async fn test_probe_url_against_mock_worker() {
    let worker = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "healthy",
            "model": {"name": "@cf/meta/llama-3.1-8b-instruct", "display_name": "Llama 3.1 8B"}
        })))
        .mount(&worker)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let uri = worker.uri();
    let output = tokio::task::spawn_blocking(move || {
        faqsync_cmd()
            .current_dir(temp_dir.path())
            .args(["probe", "answer_generator", "--url", &uri, "--json"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["result"]["status"], "healthy");
    assert_eq!(parsed["model"]["display_name"], "Llama 3.1 8B");
}

#[test]
fn test_completions_bash() {
    faqsync_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("faqsync"));
}
