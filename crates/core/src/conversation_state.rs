// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conversation State: the process-wide record persisted as `state.json`.

use crate::ModelAlias;
use serde::{Deserialize, Serialize};

/// Contents of `state.json`, persisted by atomic write-then-rename after
/// every turn.
///
/// `model` is carried here, alongside the resume token and last-seen
/// session, so a changed model alias survives a daemon restart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Resume token produced by the Model Runtime. Absent for a fresh
    /// conversation.
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub resume_token: Option<String>,
    /// Last observed multiplexer session tag.
    #[serde(rename = "zellijSession", skip_serializing_if = "Option::is_none")]
    pub last_session: Option<String>,
    /// Current model alias. Defaults to [`ModelAlias::DEFAULT`] when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelAlias>,
}

impl ConversationState {
    pub fn model(&self) -> ModelAlias {
        self.model.unwrap_or(ModelAlias::DEFAULT)
    }

    /// Clear the resume token, as on `new_session` or unrecoverable
    /// stale-resume failure. Model and last-seen session survive.
    pub fn clear_resume_token(&mut self) {
        self.resume_token = None;
    }
}

#[cfg(test)]
#[path = "conversation_state_tests.rs"]
mod tests;
