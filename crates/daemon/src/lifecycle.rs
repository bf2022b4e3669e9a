// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and shutdown: lock before socket, socket
//! before the accept loop, accept loop before any history writes — and the
//! mirror order on the way down: stop accepting, close connections, flush,
//! remove the socket, release the lock.

use std::path::PathBuf;
use std::sync::Arc;

use jj_adapters::{
    ClaudeModelRuntimeAdapter, ConfigRoots, ModelRuntimeAdapter, MultiplexerAdapter,
    PermissionPolicy, ZellijMultiplexerAdapter,
};
use jj_core::{ErrorKind, HasErrorKind, SystemClock};
use jj_engine::{Executor, ExecutorCommand, HeartbeatProbe};
use jj_storage::{HistoryError, HistoryStore, StateStoreError};
use thiserror::Error;
use tokio::net::UnixListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::connection::{handle_connection, ConnectionCtx};
use crate::lock::{acquire_lock, LockError, LockGuard};
use crate::paths::{Paths, PathsError};
use crate::registry::Registry;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Paths(#[from] PathsError),
    /// A live daemon already owns the lock. Distinct from [`LifecycleError::Lock`]
    /// so the caller can treat it as success rather than an initialization
    /// failure — the supervisor treats an already-running daemon as success.
    #[error("daemon is already running (pid {pid})")]
    AlreadyRunning { pid: u32 },
    #[error("failed to acquire the singleton lock: {0}")]
    Lock(#[source] LockError),
    #[error("failed to create the state directory: {0}")]
    StateDir(#[source] std::io::Error),
    #[error("failed to load conversation state: {0}")]
    State(#[source] StateStoreError),
    #[error("failed to open the history journal: {0}")]
    History(#[source] HistoryError),
    #[error("failed to bind the daemon socket at {path}: {source}")]
    Bind {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HasErrorKind for LifecycleError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Fatal
    }
}

/// A started daemon: the accept loop plus every long-lived task it owns.
/// `start` performs the full startup sequence; `serve` runs the accept loop;
/// `shutdown` tears everything down in the reverse order.
pub struct Daemon {
    paths: Paths,
    listener: UnixListener,
    lock: Option<LockGuard>,
    executor_task: tokio::task::JoinHandle<()>,
    heartbeat_task: tokio::task::JoinHandle<()>,
    connections: JoinSet<()>,
    ctx: Arc<ConnectionCtx>,
}

impl Daemon {
    /// Acquire the lock, load persisted state, construct every collaborator,
    /// and bind the socket last, after every fallible step has succeeded.
    pub async fn start(paths: Paths, session_tag: Option<String>) -> Result<Self, LifecycleError> {
        paths.create_state_dir().map_err(LifecycleError::StateDir)?;

        let lock = acquire_lock(session_tag, &paths.lock_path).map_err(|err| match err {
            LockError::Held { pid, .. } => LifecycleError::AlreadyRunning { pid },
            other => LifecycleError::Lock(other),
        })?;

        let conversation = jj_storage::load_state(&paths.state_path).map_err(LifecycleError::State)?;
        let history = Arc::new(
            HistoryStore::open(&paths.history_path).map_err(LifecycleError::History)?,
        );

        let registry = Registry::new();
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let policy = PermissionPolicy::new(ConfigRoots::discover(&cwd));
        let model_adapter: Arc<dyn ModelRuntimeAdapter> =
            Arc::new(ClaudeModelRuntimeAdapter::new(policy));
        let multiplexer_adapter: Arc<dyn MultiplexerAdapter> =
            Arc::new(ZellijMultiplexerAdapter::new());
        let clock = Arc::new(SystemClock);

        let (executor_tx, executor_rx) = mpsc::unbounded_channel();
        let executor = Executor::new(
            conversation,
            paths.state_path.clone(),
            history.clone(),
            model_adapter.clone(),
            clock.clone(),
            registry.clone(),
            executor_tx.clone(),
        );
        let executor_task = tokio::spawn(executor.run(executor_rx));

        let heartbeat = Arc::new(HeartbeatProbe::new(
            multiplexer_adapter,
            model_adapter,
            clock,
            registry.clone(),
            executor_tx.clone(),
        ));
        let heartbeat_task = tokio::spawn(heartbeat.clone().run());

        // A socket left behind by an unclean prior exit: the lock above
        // already proved no live process owns this state directory.
        let _ = std::fs::remove_file(&paths.socket_path);
        let listener = UnixListener::bind(&paths.socket_path).map_err(|source| LifecycleError::Bind {
            path: paths.socket_path.clone(),
            source,
        })?;

        let ctx = Arc::new(ConnectionCtx {
            registry,
            history,
            heartbeat,
            executor_tx,
            daemon_pid: std::process::id(),
            max_frame_bytes: crate::env::max_frame_bytes(),
            client_queue_capacity: crate::env::client_queue_capacity(),
        });

        Ok(Self {
            paths,
            listener,
            lock: Some(lock),
            executor_task,
            heartbeat_task,
            connections: JoinSet::new(),
            ctx,
        })
    }

    pub fn socket_path(&self) -> &std::path::Path {
        &self.paths.socket_path
    }

    /// Accept connections, spawning one task per client, until `shutdown`
    /// resolves.
    pub async fn serve(&mut self, mut shutdown: oneshot::Receiver<()>) {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, _addr)) => {
                            let ctx = self.ctx.clone();
                            self.connections.spawn(handle_connection(stream, ctx));
                        }
                        Err(err) => warn!(error = %err, "failed to accept connection"),
                    }
                }
                _ = &mut shutdown => {
                    info!("shutdown requested; no longer accepting connections");
                    break;
                }
            }
        }
    }

    /// Tear down in the mirror order of startup: close
    /// existing connections, stop the background tasks (history/state
    /// writes they make are synchronous and already durable by the time
    /// they run), remove the socket, release the lock.
    pub async fn shutdown(mut self) {
        self.connections.abort_all();
        while self.connections.join_next().await.is_some() {}

        self.executor_task.abort();
        self.heartbeat_task.abort();

        if let Err(err) = std::fs::remove_file(&self.paths.socket_path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(error = %err, "failed to remove daemon socket on shutdown");
            }
        }
        if let Some(lock) = self.lock.take() {
            lock.release();
        }
    }
}

/// Run the daemon to completion: start, install logging, serve until a
/// shutdown signal, then tear down. The return value distinguishes a lock
/// held by a live process from every other startup failure so the caller
/// (the Startup Supervisor or the `daemon` subcommand) can choose the right
/// exit code.
pub async fn run(session_tag: Option<String>) -> Result<(), LifecycleError> {
    let paths = Paths::resolve()?;
    paths.create_state_dir().map_err(LifecycleError::StateDir)?;
    let _log_guard = crate::logging::init(&paths);

    let mut daemon = Daemon::start(paths, session_tag).await?;
    info!(
        pid = std::process::id(),
        socket = %daemon.socket_path().display(),
        "daemon started"
    );

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        let _ = shutdown_tx.send(());
    });

    daemon.serve(shutdown_rx).await;
    daemon.shutdown().await;
    info!("daemon stopped cleanly");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = sigterm.recv() => {}
                _ = tokio::signal::ctrl_c() => {}
            }
        }
        Err(err) => {
            warn!(error = %err, "failed to install SIGTERM handler; watching SIGINT only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
