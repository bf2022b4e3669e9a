// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon-local logging: a rolling-free log file under the
//! state directory, level controlled by `RUST_LOG` or falling back to
//! `JELLY_J_DAEMON_TRACE`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::paths::Paths;

/// Install the process-wide tracing subscriber. The returned guard must be
/// held for the process's lifetime: dropping it stops the non-blocking
/// writer thread, silently losing any buffered lines.
pub fn init(paths: &Paths) -> WorkerGuard {
    let file_name = paths
        .log_path
        .file_name()
        .map(|n| n.to_owned())
        .unwrap_or_else(|| "daemon.log".into());
    let appender = tracing_appender::rolling::never(&paths.state_dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if crate::env::daemon_trace_enabled() {
            EnvFilter::new("trace")
        } else {
            EnvFilter::new("info")
        }
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();

    guard
}
