// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The on-disk Lock Record establishing daemon singleton identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Contents of `agent.lock.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockRecord {
    pub pid: u32,
    pub started_at: DateTime<Utc>,
    pub hostname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zellij_session: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

impl LockRecord {
    pub fn for_self(zellij_session: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            pid: std::process::id(),
            started_at: now,
            hostname: hostname(),
            zellij_session,
            cwd: std::env::current_dir()
                .ok()
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }
}

fn hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|s| s.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
#[path = "lock_record_tests.rs"]
mod tests;
