//! CLI smoke tests for juce-dist.
//!
//! These tests verify that every command parses its arguments and fails or
//! succeeds with an appropriate exit code, without touching the network.

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the juce-dist binary.
fn dist_cmd() -> Command {
  let mut cmd = cargo_bin_cmd!("juce-dist");
  cmd.env_remove("SPACES_KEY").env_remove("SPACES_SECRET");
  cmd
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  dist_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  dist_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("juce-dist"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["build-and-package", "archive-and-upload", "info"] {
    dist_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

#[test]
fn unknown_subcommand_fails() {
  dist_cmd().arg("deploy").assert().failure();
}

// =============================================================================
// Info
// =============================================================================

#[test]
fn info_with_overrides_shows_archive_name() {
  let temp = TempDir::new().unwrap();

  dist_cmd()
    .arg("info")
    .arg("--project-dir")
    .arg(temp.path())
    .args(["--release-version", "v1.2.3", "--branch", "main", "--build-number", "9"])
    .assert()
    .success()
    .stdout(predicate::str::contains("indiekey_juce-v1.2.3-9-dist.zip"));
}

#[test]
fn info_json_output_is_valid() {
  let temp = TempDir::new().unwrap();

  let output = dist_cmd()
    .arg("info")
    .arg("--project-dir")
    .arg(temp.path())
    .args(["--release-version", "v2.0.0", "--branch", "HEAD", "-o", "json"])
    .output()
    .unwrap();

  assert!(output.status.success());
  let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
  assert_eq!(report["module"], "indiekey_juce");
  assert_eq!(report["archive"], "indiekey_juce-v2.0.0-dist.zip");
}

#[test]
fn info_outside_repository_reports_unknown_version() {
  let temp = TempDir::new().unwrap();

  dist_cmd()
    .arg("info")
    .arg("--project-dir")
    .arg(temp.path())
    .assert()
    .success()
    .stdout(predicate::str::contains("unknown"));
}

#[test]
fn missing_project_dir_fails() {
  let temp = TempDir::new().unwrap();

  dist_cmd()
    .arg("info")
    .arg("--project-dir")
    .arg(temp.path().join("missing"))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Project directory not found"));
}

// =============================================================================
// Credentials
// =============================================================================

#[test]
fn upload_without_key_fails_before_work() {
  let temp = TempDir::new().unwrap();

  dist_cmd()
    .current_dir(temp.path())
    .args(["archive-and-upload", "--upload"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("need spaces key"));

  assert!(!temp.path().join("build-dist").exists());
}

#[test]
fn publish_without_secret_fails() {
  let temp = TempDir::new().unwrap();

  dist_cmd()
    .current_dir(temp.path())
    .args(["archive-and-upload", "--publish", "--spaces-key", "key"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("need spaces secret"));
}
