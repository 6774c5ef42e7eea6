//! Binary-level checks for commands that need no network.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn questboard() -> Command {
    let mut cmd = Command::cargo_bin("questboard").unwrap();
    cmd.env_remove("QUESTBOARD_API_TOKEN").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_subcommands() {
    questboard()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("quests"))
        .stdout(predicate::str::contains("unlocks"))
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn validate_accepts_a_good_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[store]\nbase_url = \"https://tracker.example.com\"\n\n[tracker]\ngroup_by = \"trader\"\n",
    )
    .unwrap();

    questboard()
        .args(["config", "validate", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Config file is valid"));
}

#[test]
fn validate_rejects_invalid_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[retry]\ninitial_delay_ms = 500\nmax_delay_ms = 100\n").unwrap();

    questboard()
        .args(["config", "validate", "-c"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_delay_ms"));
}

#[test]
fn validate_points_at_syntax_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[store\nbase_url = 1\n").unwrap();

    questboard()
        .args(["--color", "never", "config", "validate", "-c"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("questboard::config"));
}

#[test]
fn init_writes_once_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    questboard()
        .args(["config", "init", "-c"])
        .arg(&path)
        .assert()
        .success();
    assert!(fs::read_to_string(&path).unwrap().contains("[store]"));

    questboard()
        .args(["config", "init", "-c"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    questboard()
        .args(["config", "init", "--force", "-c"])
        .arg(&path)
        .assert()
        .success();
}

#[test]
fn json_show_reports_defaults_for_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    questboard()
        .args(["--json", "config", "show", "-c"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"exists\":false"))
        .stdout(predicate::str::contains("\"token_loaded\":false"));
}
