//! CLI help and version output.

use crate::prelude::*;

#[test]
fn no_subcommand_with_help_flag_shows_usage() {
    let output = jelly_j().arg("--help").output().expect("run jelly-j --help");
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Usage:"));
}

#[test]
fn help_lists_daemon_and_ui_subcommands() {
    let output = jelly_j().arg("--help").output().expect("run jelly-j --help");
    let stdout = stdout_of(&output);
    assert!(stdout.contains("daemon"));
    assert!(stdout.contains("ui"));
}

#[test]
fn daemon_help_shows_usage() {
    let output = jelly_j()
        .args(["daemon", "--help"])
        .output()
        .expect("run jelly-j daemon --help");
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Usage:"));
}

#[test]
fn ui_help_shows_usage() {
    let output = jelly_j()
        .args(["ui", "--help"])
        .output()
        .expect("run jelly-j ui --help");
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("Usage:"));
}

#[test]
fn version_flag_shows_a_version_number() {
    let output = jelly_j().arg("--version").output().expect("run jelly-j --version");
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("0.1"));
}
