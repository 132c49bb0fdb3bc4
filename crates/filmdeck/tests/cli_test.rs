//! Integration tests for the `filmdeck` CLI binary.
//!
//! Argument parsing, help output, config handling, and a few commands
//! against a wiremock scanner backend.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `filmdeck` binary with env isolation.
///
/// Clears all `FILMDECK_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn filmdeck_in(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("filmdeck");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("FILMDECK_PROFILE")
        .env_remove("FILMDECK_DEVICE")
        .env_remove("FILMDECK_PREFIX")
        .env_remove("FILMDECK_OUTPUT")
        .env_remove("FILMDECK_CONNECT_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn filmdeck() -> assert_cmd::Command {
    filmdeck_in(Path::new("/tmp/filmdeck-cli-test-nonexistent"))
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

async fn mount_scanner(server: &MockServer, enabled: bool) {
    for resource in ["light", "advance", "fastforward", "focuszoom"] {
        Mock::given(method("GET"))
            .and(path(format!("/backend/{resource}")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "is_active": false, "is_enabled": enabled })),
            )
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/backend/scan"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "is_scanning": false,
            "output_directory": "/mnt/scans/roll-03",
            "n_frames": 24,
            "current_frame_index": 24,
            "last_scan_end_info": "success",
            "time_remaining": "-"
        })))
        .mount(server)
        .await;
}

/// Run the binary off the async runtime so the mock server keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = filmdeck().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    filmdeck().arg("--help").assert().success().stdout(
        predicate::str::contains("film scanner")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("watch"))
            .and(predicate::str::contains("poweroff")),
    );
}

#[test]
fn test_version_flag() {
    filmdeck()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("filmdeck"));
}

#[test]
fn test_scan_subcommands_exist() {
    filmdeck()
        .args(["scan", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start").and(predicate::str::contains("stop")));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    filmdeck()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    filmdeck()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = filmdeck().arg("rewind").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("rewind"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_status_without_scanner() {
    let output = filmdeck().arg("status").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(
        text.contains("No scanner configured") || text.contains("config init"),
        "Expected a missing-config error:\n{text}"
    );
}

#[test]
fn test_invalid_device_url() {
    filmdeck()
        .args(["--device", "ftp://scanner.local", "status"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("scheme"));
}

#[test]
fn test_zero_frames_rejected_before_sending() {
    // Nothing listens on the discard port; validation must fail first.
    filmdeck()
        .args(["--device", "http://127.0.0.1:9", "scan", "start", "/mnt/scans/x", "-n", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("target_frame_count"));
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_init_then_show() {
    let home = tempfile::tempdir().unwrap();

    filmdeck_in(home.path())
        .args(["config", "init", "--url", "http://10.0.0.7:5000", "--name", "lab"])
        .assert()
        .success();

    let output = filmdeck_in(home.path())
        .args(["config", "show", "-o", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let cfg: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(cfg["default_profile"], "lab");
    assert_eq!(cfg["profiles"]["lab"]["url"], "http://10.0.0.7:5000");
    assert_eq!(cfg["profiles"]["lab"]["prefix"], "backend");

    filmdeck_in(home.path())
        .args(["config", "profiles", "-o", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lab"));
}

#[test]
fn test_config_init_refuses_overwrite() {
    let home = tempfile::tempdir().unwrap();
    let init = ["config", "init", "--url", "http://10.0.0.7:5000"];

    filmdeck_in(home.path()).args(init).assert().success();
    filmdeck_in(home.path()).args(init).assert().code(2);
    filmdeck_in(home.path())
        .args(init)
        .arg("--force")
        .assert()
        .success();
}

#[test]
fn test_config_use_unknown_profile() {
    let home = tempfile::tempdir().unwrap();
    filmdeck_in(home.path())
        .args(["config", "use", "attic"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("attic"));
}

// ── Against a scanner ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_status_json() {
    let server = MockServer::start().await;
    mount_scanner(&server, true).await;

    let mut cmd = filmdeck();
    cmd.args(["--device", &server.uri(), "-o", "json", "status"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));

    let status: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["light"]["enabled"], true);
    assert_eq!(status["scan"]["output_directory"], "/mnt/scans/roll-03");
    assert_eq!(status["phase"], "completed");
    assert_eq!(status["outcome"], "success");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_advance_disabled_is_conflict() {
    let server = MockServer::start().await;
    mount_scanner(&server, false).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = filmdeck();
    cmd.args(["--device", &server.uri(), "advance"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(6), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_light_toggle_is_sent() {
    let server = MockServer::start().await;
    mount_scanner(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/backend/light"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = filmdeck();
    cmd.args(["--device", &server.uri(), "light"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_poweroff_requires_yes() {
    let server = MockServer::start().await;
    mount_scanner(&server, true).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let mut cmd = filmdeck();
    cmd.args(["--device", &server.uri(), "poweroff"]);
    let output = run(cmd).await;
    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    assert!(combined_output(&output).contains("--yes"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_poweroff_with_yes() {
    let server = MockServer::start().await;
    mount_scanner(&server, true).await;
    Mock::given(method("POST"))
        .and(path("/backend/poweroff"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut cmd = filmdeck();
    cmd.args(["--device", &server.uri(), "--yes", "poweroff"]);
    let output = run(cmd).await;
    assert!(output.status.success(), "{}", combined_output(&output));
}
