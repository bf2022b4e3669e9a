// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! History Entry: one immutable line of the conversation journal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The role that produced a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryRole {
    User,
    Assistant,
    Note,
    Error,
}

/// One line of `history.jsonl`. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub role: HistoryRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
    pub text: String,
}

impl HistoryEntry {
    pub fn new(role: HistoryRole, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            role,
            session: None,
            text: text.into(),
        }
    }

    pub fn with_session(mut self, session: Option<String>) -> Self {
        self.session = session;
        self
    }
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
