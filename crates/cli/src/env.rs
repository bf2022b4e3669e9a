// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate. State
//! directory resolution itself is owned by [`jj_daemon::Paths`]; this module
//! covers the handful of timeouts and overrides specific to the Startup
//! Supervisor and UI Client Session.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// How long the supervisor waits for a `register_client`/`ping` round trip
/// before concluding the daemon is unhealthy.
pub fn probe_timeout() -> Duration {
    parse_duration_ms("JELLY_J_PROBE_TIMEOUT_MS").unwrap_or(Duration::from_millis(300))
}

/// Interval between readiness polls after spawning the daemon.
pub fn supervisor_poll_interval() -> Duration {
    parse_duration_ms("JELLY_J_SUPERVISOR_POLL_MS").unwrap_or(Duration::from_millis(100))
}

/// Overall deadline for the daemon to become healthy after being spawned.
pub fn supervisor_startup_timeout() -> Duration {
    parse_duration_ms("JELLY_J_SUPERVISOR_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// How long a stale lock owner is given to exit after SIGTERM before the
/// supervisor escalates to SIGKILL.
pub fn supervisor_sigterm_grace() -> Duration {
    parse_duration_ms("JELLY_J_SUPERVISOR_SIGTERM_GRACE_MS").unwrap_or(Duration::from_secs(2))
}

/// Deadline for the UI Client Session's initial `registered` +
/// `history_snapshot` handshake.
pub fn handshake_timeout() -> Duration {
    parse_duration_ms("JELLY_J_HANDSHAKE_TIMEOUT_MS").unwrap_or(Duration::from_millis(2500))
}

/// Override for the `jelly-j` binary the supervisor spawns as the daemon;
/// defaults to `std::env::current_exe()`.
pub fn daemon_binary_override() -> Option<String> {
    std::env::var("JELLY_J_DAEMON_BINARY").ok()
}
