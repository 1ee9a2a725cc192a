//! CLI surface tests: argument handling, help and exit codes.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::{goldt_bin, Project};

#[test]
fn test_missing_step_prints_usage_and_fails() {
    let mut cmd = Command::new(goldt_bin());

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains(
            "[ERROR] Please provide at least one subcommand!",
        ))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_unknown_step_fails() {
    let mut cmd = Command::new(goldt_bin());
    cmd.arg("deploy");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::starts_with("[ERROR]").and(predicate::str::contains("deploy")));
}

#[test]
fn test_unknown_flag_fails() {
    let mut cmd = Command::new(goldt_bin());
    cmd.arg("-x").arg("run");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::starts_with("[ERROR]"));
}

#[test]
fn test_help_flag() {
    let mut cmd = Command::new(goldt_bin());
    cmd.arg("-h");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Usage").and(predicate::str::contains("record")));
}

#[test]
fn test_help_step_needs_no_test_directory() {
    let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let mut cmd = Command::new(goldt_bin());
    cmd.current_dir(temp_dir.path()).arg("help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("Builds all the tests"));
}

#[test]
fn test_version_flag() {
    let mut cmd = Command::new(goldt_bin());
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_missing_test_directory_fails() {
    let project = Project::new();
    std::fs::remove_dir(project.tests_dir()).expect("Failed to remove tests directory");

    project
        .goldt()
        .arg("run")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("[ERROR] Failed to read test directory"));
}

#[test]
fn test_missing_config_file_fails() {
    let project = Project::new();
    let mut cmd = Command::new(goldt_bin());
    cmd.current_dir(project.root())
        .env_remove("GOLDT_CONFIG")
        .arg("--config")
        .arg(project.root().join("missing.toml"))
        .arg("build");

    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_empty_test_directory_is_all_green() {
    let project = Project::new();

    project
        .goldt()
        .arg("build")
        .arg("run")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("ALL TESTS BUILD").and(predicate::str::contains("ALL TESTS PASS")),
        );
}

#[test]
fn test_dir_flag_overrides_config() {
    let project = Project::new();
    let other = project.root().join("other");
    std::fs::create_dir(&other).expect("Failed to create directory");
    std::fs::write(other.join("only_here.c"), "#!/bin/sh\necho hi\n").expect("Failed to write");

    project
        .goldt()
        .arg("--dir")
        .arg(&other)
        .arg("build")
        .assert()
        .success()
        .stdout(predicate::str::contains("+ Building only_here [1/1]..."));

    assert!(other.join("only_here").exists());
}
