// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// State directory root, overridable by `JELLY_J_STATE_DIR` so tests can
/// relocate the lock file, socket, and history journal to an isolated
/// directory.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("JELLY_J_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    dirs::home_dir().map(|home| home.join(".jelly-j"))
}

/// `JELLY_J_DAEMON_TRACE=1` enables a trace log next to the state directory.
pub fn daemon_trace_enabled() -> bool {
    std::env::var("JELLY_J_DAEMON_TRACE").as_deref() == Ok("1")
}

/// Maximum frame size accepted by the wire codec, overridable by
/// `JELLY_J_MAX_FRAME_BYTES`.
pub fn max_frame_bytes() -> usize {
    std::env::var("JELLY_J_MAX_FRAME_BYTES")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1024 * 1024)
}

/// Per-client outbound queue capacity, overridable by `JELLY_J_CLIENT_QUEUE`.
pub fn client_queue_capacity() -> usize {
    std::env::var("JELLY_J_CLIENT_QUEUE")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256)
}
