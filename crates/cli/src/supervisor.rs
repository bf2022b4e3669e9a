// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup Supervisor: makes the no-subcommand invocation
//! self-healing. Probes for a live, responsive daemon; if none answers,
//! clears out a stale lock owner, spawns a fresh daemon detached from the
//! terminal, waits for it to come up, then hands off to the UI Client
//! Session.

use std::fs::OpenOptions;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use jj_core::{ClientId, IdGen, LockRecord, RequestId, UuidIdGen};
use jj_daemon::codec::{ClientFrame, ServerFrame};
use jj_daemon::Paths;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use thiserror::Error;
use tracing::warn;

use crate::poll::{Poller, Tick};
use crate::protocol::Connection;

/// Marker the supervisor sets on the child it spawns; the `daemon`
/// subcommand checks it defensively but does not require it, since it can
/// also be invoked directly by an operator.
pub const DAEMON_MODE_ENV: &str = "JELLY_J_DAEMON_MODE";

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("failed to resolve the state directory: {0}")]
    Paths(#[from] jj_daemon::PathsError),
    #[error("failed to create the state directory: {0}")]
    StateDir(#[source] std::io::Error),
    #[error("failed to locate the jelly-j binary: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("failed to open the daemon log at {path}: {source}")]
    LogFile {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to spawn the daemon process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("daemon did not become healthy within the startup timeout")]
    Timeout,
    #[error("startup was interrupted")]
    Interrupted,
}

/// Ensure a healthy daemon is reachable at `paths.socket_path`, starting one
/// if needed. Returns once the daemon has answered a probe.
pub async fn ensure_daemon_running(
    paths: &Paths,
    session_tag: Option<String>,
) -> Result<(), SupervisorError> {
    paths.create_state_dir().map_err(SupervisorError::StateDir)?;

    if probe(&paths.socket_path).await {
        return Ok(());
    }

    clear_stale_owner(&paths.lock_path).await;
    spawn_daemon(paths, session_tag)?;
    wait_until_healthy(&paths.socket_path).await
}

/// A `register_client` + `ping` round trip within [`crate::env::probe_timeout`].
/// Any error — connection refused, timeout, malformed response — means
/// "not healthy".
async fn probe(socket_path: &Path) -> bool {
    tokio::time::timeout(crate::env::probe_timeout(), probe_inner(socket_path))
        .await
        .unwrap_or(false)
}

async fn probe_inner(socket_path: &Path) -> bool {
    let Ok(mut conn) = Connection::connect(socket_path).await else {
        return false;
    };
    let id_gen = UuidIdGen;
    let client_id = ClientId::new(id_gen.next());
    if conn
        .send(&ClientFrame::RegisterClient {
            client_id: client_id.clone(),
            zellij_session: None,
            zellij_env: None,
            cwd: None,
            hostname: None,
            pid: None,
        })
        .await
        .is_err()
    {
        return false;
    }
    if !matches!(conn.recv().await, Ok(Some(ServerFrame::Registered { .. }))) {
        return false;
    }
    if !matches!(conn.recv().await, Ok(Some(ServerFrame::HistorySnapshot { .. }))) {
        return false;
    }
    let request_id = RequestId::new(id_gen.next());
    if conn
        .send(&ClientFrame::Ping {
            request_id: request_id.clone(),
            client_id,
        })
        .await
        .is_err()
    {
        return false;
    }
    matches!(conn.recv().await, Ok(Some(ServerFrame::Pong { .. })))
}

/// If the lock names a process that is still alive, signal it to exit:
/// SIGTERM, then escalate to SIGKILL if it outlives the grace period.
/// Best-effort — an unreadable or corrupt lock file is treated as nothing
/// to clear.
async fn clear_stale_owner(lock_path: &Path) {
    let Ok(contents) = std::fs::read_to_string(lock_path) else {
        return;
    };
    let Ok(record) = serde_json::from_str::<LockRecord>(&contents) else {
        return;
    };
    let pid = Pid::from_raw(record.pid as i32);
    if !process_is_alive(pid) {
        return;
    }

    if kill(pid, Signal::SIGTERM).is_err() {
        return;
    }
    let deadline = tokio::time::Instant::now() + crate::env::supervisor_sigterm_grace();
    while tokio::time::Instant::now() < deadline {
        if !process_is_alive(pid) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    if process_is_alive(pid) {
        warn!(pid = record.pid, "stale daemon ignored SIGTERM; sending SIGKILL");
        let _ = kill(pid, Signal::SIGKILL);
    }
}

fn process_is_alive(pid: Pid) -> bool {
    match kill(pid, None) {
        Ok(()) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(_) => true,
    }
}

/// Spawn `jelly-j daemon` detached from this terminal: no inherited stdio,
/// output redirected to `<state_dir>/daemon.log`.
fn spawn_daemon(paths: &Paths, session_tag: Option<String>) -> Result<(), SupervisorError> {
    let binary = match crate::env::daemon_binary_override() {
        Some(path) => std::path::PathBuf::from(path),
        None => std::env::current_exe().map_err(SupervisorError::CurrentExe)?,
    };

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)
        .map_err(|source| SupervisorError::LogFile {
            path: paths.log_path.clone(),
            source,
        })?;
    let log_file_err = log_file
        .try_clone()
        .map_err(|source| SupervisorError::LogFile {
            path: paths.log_path.clone(),
            source,
        })?;

    let mut cmd = std::process::Command::new(binary);
    cmd.arg("daemon");
    if let Some(tag) = session_tag {
        cmd.arg("--session-tag").arg(tag);
    }
    cmd.env(DAEMON_MODE_ENV, "1")
        .stdin(Stdio::null())
        .stdout(log_file)
        .stderr(log_file_err);

    cmd.spawn().map_err(SupervisorError::Spawn)?;
    Ok(())
}

/// Poll until the daemon answers a probe or the startup deadline passes.
async fn wait_until_healthy(socket_path: &Path) -> Result<(), SupervisorError> {
    let mut poller = Poller::new(
        crate::env::supervisor_poll_interval(),
        Some(crate::env::supervisor_startup_timeout()),
    );
    loop {
        if probe(socket_path).await {
            return Ok(());
        }
        match poller.tick().await {
            Tick::Ready => continue,
            Tick::Timeout => return Err(SupervisorError::Timeout),
            Tick::Interrupted => return Err(SupervisorError::Interrupted),
        }
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
