// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A Turn Request: one item admitted into the Turn Queue.

use jj_core::{ClientId, EnvironmentContext, RequestId};

/// One user turn, captured at admission time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub request_id: RequestId,
    pub client_id: ClientId,
    pub user_text: String,
    pub session_tag: Option<String>,
    pub env_context: EnvironmentContext,
    /// How many turns were already running or queued ahead of this one at
    /// the moment it was admitted. The Executor overwrites whatever value
    /// is set here when the request is pushed onto the queue; a caller
    /// constructing a `TurnRequest` to send to the Executor may leave it at
    /// `0`.
    pub queued_ahead: usize,
}

#[cfg(test)]
#[path = "turn_request_tests.rs"]
mod tests;
