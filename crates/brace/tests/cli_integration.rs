//! CLI integration tests for the `brace-session` command-line interface.
//!
//! These tests verify:
//! - Help text and argument parsing
//! - Config discovery, init and display
//! - Key generation and file purging
//!
//! Every test points the config directory and working directory at a temp
//! dir so nothing touches the real user config.

use std::path::Path;

use assert_cmd::Command;
use base64::{Engine, engine::general_purpose::STANDARD};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

/// Get a command for the brace-session binary, isolated in `home`.
fn brace(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("brace-session").unwrap();
    cmd.env("BRACE_SESSION_CONFIG_DIR", home)
        .env_remove("BRACE_SESSION_CONFIG")
        .env_remove("BRACE_SESSION_KEY")
        .current_dir(home);
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    let home = TempDir::new().unwrap();
    brace(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("cookie-keyed HTTP sessions"));
}

#[test]
fn test_version_displays() {
    let home = TempDir::new().unwrap();
    brace(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("brace-session"));
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    brace(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("purge"))
        .stdout(predicate::str::contains("keygen"));
}

#[test]
fn test_serve_help_shows_overrides() {
    let home = TempDir::new().unwrap();
    brace(home.path())
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--storage-dir"));
}

#[test]
fn test_unknown_subcommand_fails() {
    let home = TempDir::new().unwrap();
    brace(home.path())
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_invalid_port_rejected() {
    let home = TempDir::new().unwrap();
    brace(home.path())
        .args(["serve", "--port", "not-a-port"])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Keygen
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_keygen_prints_64_byte_key() {
    let home = TempDir::new().unwrap();
    let output = brace(home.path()).arg("keygen").output().unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let key = STANDARD.decode(stdout.trim()).unwrap();
    assert_eq!(key.len(), 64);
}

#[test]
fn test_keygen_json() {
    let home = TempDir::new().unwrap();
    let output = brace(home.path()).args(["--json", "keygen"]).output().unwrap();

    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(value["key"].as_str().is_some());
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_defaults_json() {
    let home = TempDir::new().unwrap();
    let output = brace(home.path())
        .args(["--json", "config", "show"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["server"]["port"], 8080);
    assert_eq!(value["session"]["cookie_name"], "SESSID");
    assert_eq!(value["session"]["ttl_secs"], 3600);
    assert_eq!(value["storage"]["backend"], "file");
}

#[test]
fn test_config_show_explicit_file_redacts_key() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("custom.toml");
    std::fs::write(
        &path,
        "[server]\nport = 9123\n\n[storage]\nbackend = \"cookie\"\nkey = \"c2VjcmV0\"\n",
    )
    .unwrap();

    brace(home.path())
        .args(["--json", "config", "show", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("9123"))
        .stdout(predicate::str::contains("<redacted>"))
        .stdout(predicate::str::contains("c2VjcmV0").not());
}

#[test]
fn test_config_init_then_which() {
    let home = TempDir::new().unwrap();

    brace(home.path())
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created config file"));
    assert!(home.path().join("config.toml").is_file());

    brace(home.path())
        .args(["config", "which"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ loaded [user]"))
        .stdout(predicate::str::contains("· not found [project]"))
        .stdout(predicate::str::contains("1 config file(s) loaded."));
}

#[test]
fn test_config_show_reports_unusable_lifetime() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("brace-session.toml"),
        "[session]\nttl_secs = 9223372036854775807\nexpires_secs = 9223372036854775807\n",
    )
    .unwrap();

    brace(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warnings:"))
        .stdout(predicate::str::contains("session.ttl_secs"));
}

#[test]
fn test_serve_refuses_unusable_lifetime() {
    let home = TempDir::new().unwrap();
    let path = home.path().join("custom.toml");
    std::fs::write(&path, "[session]\nexpires_secs = 9223372036854775807\n").unwrap();

    brace(home.path())
        .arg("--config")
        .arg(&path)
        .arg("serve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("session.expires_secs"));
}

#[test]
fn test_config_init_local_does_not_overwrite() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("brace-session.toml"), "[server]\nport = 1\n").unwrap();

    brace(home.path())
        .args(["config", "init", "--local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    let contents = std::fs::read_to_string(home.path().join("brace-session.toml")).unwrap();
    assert_eq!(contents, "[server]\nport = 1\n");
}

#[test]
fn test_config_path_uses_override_dir() {
    let home = TempDir::new().unwrap();
    brace(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Purge
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_purge_removes_only_expired_files() {
    let home = TempDir::new().unwrap();
    let sessions = home.path().join("sessions");
    std::fs::create_dir_all(&sessions).unwrap();
    std::fs::write(
        sessions.join("stale.json"),
        r#"{"sessionId":"x","__ttl":1,"__expires":1}"#,
    )
    .unwrap();
    std::fs::write(
        sessions.join("live.json"),
        r#"{"sessionId":"y","__ttl":99999999999,"__expires":99999999999}"#,
    )
    .unwrap();

    let output = brace(home.path())
        .args(["--json", "purge", "--storage-dir"])
        .arg(&sessions)
        .output()
        .unwrap();

    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["removed"], 1);
    assert!(!sessions.join("stale.json").exists());
    assert!(sessions.join("live.json").exists());
}

#[test]
fn test_purge_rejects_cookie_backend() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("brace-session.toml"),
        "[storage]\nbackend = \"cookie\"\n",
    )
    .unwrap();

    brace(home.path())
        .arg("purge")
        .assert()
        .failure()
        .stderr(predicate::str::contains("file backend"));
}
