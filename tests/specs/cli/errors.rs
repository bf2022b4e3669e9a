//! CLI argument-parsing errors.

use crate::prelude::*;

#[test]
fn unknown_subcommand_fails_with_nonzero_exit() {
    let output = jelly_j().arg("bogus").output().expect("run jelly-j bogus");
    assert!(!output.status.success());
    let stderr = stderr_of(&output);
    assert!(stderr.contains("bogus"), "stderr: {stderr}");
}

#[test]
fn daemon_subcommand_rejects_unknown_flags() {
    let output = jelly_j()
        .args(["daemon", "--not-a-real-flag"])
        .output()
        .expect("run jelly-j daemon --not-a-real-flag");
    assert!(!output.status.success());
}
