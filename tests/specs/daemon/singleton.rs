//! At most one daemon holds a given state directory's identity at a time.
//! A second `jelly-j daemon` against an already-owned directory exits
//! cleanly rather than racing the first for the socket. A lock left behind
//! by a dead owner is reclaimable.

use crate::prelude::*;

#[tokio::test]
async fn a_second_daemon_against_the_same_state_dir_exits_cleanly_reporting_the_first_pid() {
    let daemon = TestDaemon::spawn().await;

    let output = jelly_j()
        .arg("daemon")
        .env("JELLY_J_STATE_DIR", daemon.state_dir())
        .env("JELLY_J_MODEL_RUNTIME_BIN", "/bin/true")
        .output()
        .expect("run second jelly-j daemon");

    assert!(output.status.success(), "a losing daemon should exit 0");
    let stderr = stderr_of(&output);
    assert!(
        stderr.contains("already running") && stderr.contains(&daemon.pid().to_string()),
        "stderr: {stderr}"
    );
}

#[tokio::test]
async fn a_lock_left_by_a_dead_owner_is_reclaimable() {
    let state_dir = tempfile::tempdir().expect("state dir");
    let runtime_bin = std::path::PathBuf::from("/bin/true");

    let mut first = spawn_daemon_at(state_dir.path(), &runtime_bin);
    let paths = jj_daemon::Paths::under(state_dir.path().to_path_buf());
    assert!(
        wait_for_async(READY_TIMEOUT_MS, || paths.lock_path.exists()).await,
        "first daemon never wrote its lock file"
    );

    // Kill without giving it a chance to release the lock, leaving a stale
    // record naming a now-dead pid.
    first.kill().expect("kill first daemon");
    first.wait().expect("reap first daemon");

    let mut reclaimed = spawn_daemon_at(state_dir.path(), &runtime_bin);
    assert!(
        wait_for_async(READY_TIMEOUT_MS, || paths.socket_path.exists()).await,
        "a reclaiming daemon should eventually bind the socket"
    );
    let _ = reclaimed.kill();
    let _ = reclaimed.wait();
}
