// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use std::time::Duration;

/// Heartbeat cadence: default 5 minutes, overridable for tests.
pub fn heartbeat_interval() -> Duration {
    env_secs("JELLY_J_HEARTBEAT_INTERVAL_SECS", 300)
}

/// Heartbeat initial warm-up delay: default 2 minutes.
pub fn heartbeat_initial_delay() -> Duration {
    env_secs("JELLY_J_HEARTBEAT_DELAY_SECS", 120)
}

fn env_secs(var: &str, default: u64) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default))
}
