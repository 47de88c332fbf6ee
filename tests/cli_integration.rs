//! CLI integration tests for Stevedore.
//!
//! These tests stay away from the backend tools themselves (a test host
//! rarely has installp or emgr, and a host that does must not be mutated);
//! they exercise argument handling, manifest parsing, and reporting.

use std::fs;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the stevedore binary command.
fn stevedore() -> Command {
    Command::cargo_bin("stevedore").unwrap()
}

/// Create a temporary directory for test files.
fn temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

// ============================================================================
// basics
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    stevedore()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("install"))
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_version() {
    stevedore()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("stevedore"));
}

#[test]
fn test_missing_subcommand_fails() {
    stevedore().assert().failure();
}

#[test]
fn test_unknown_backend_is_rejected() {
    stevedore()
        .args(["install", "util", "--backend", "yum"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown backend"));
}

// ============================================================================
// stevedore doctor
// ============================================================================

#[test]
fn test_doctor_reports_all_tools() {
    stevedore()
        .arg("doctor")
        .assert()
        .success()
        .stdout(predicate::str::contains("/usr/sbin/installp"))
        .stdout(predicate::str::contains("/usr/bin/lslpp"))
        .stdout(predicate::str::contains("/usr/sbin/emgr"))
        .stdout(predicate::str::contains("/usr/bin/rpm"))
        .stdout(predicate::str::contains("/usr/sbin/nimclient"));
}

// ============================================================================
// stevedore apply
// ============================================================================

#[test]
fn test_apply_missing_manifest_fails() {
    stevedore()
        .args(["apply", "/no/such/manifest.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read manifest"));
}

#[test]
fn test_apply_malformed_manifest_fails() {
    let tmp = temp_dir();
    let manifest = tmp.path().join("packages.toml");
    fs::write(&manifest, "[[package]]\nname = \"util\"\nverison = \"1.0\"\n").unwrap();

    stevedore()
        .arg("apply")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse package manifest"));
}

#[test]
fn test_apply_empty_manifest_is_ok() {
    let tmp = temp_dir();
    let manifest = tmp.path().join("packages.toml");
    fs::write(&manifest, "").unwrap();

    stevedore()
        .arg("apply")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("declares no packages"));
}

// ============================================================================
// stevedore completions
// ============================================================================

#[test]
fn test_completions_bash() {
    stevedore()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stevedore"));
}
