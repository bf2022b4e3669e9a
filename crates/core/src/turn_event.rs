// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The neutral event vocabulary the Turn Queue & Executor (`jj-engine`)
//! emits. `jj-daemon`'s Router maps each variant onto a wire frame and a
//! delivery rule (point-to-point by client id, or broadcast); keeping the
//! enum here (rather than in `jj-engine` or `jj-daemon`) lets both crates
//! depend on it without a cycle.

use crate::{ClientId, ModelAlias, RequestId};

/// One event produced while a turn is in flight, or a broadcast/point-to-point
/// notification outside any turn.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    /// First event for a request; strictly precedes every other event
    /// carrying the same `request_id`.
    ChatStart {
        request_id: RequestId,
        model: ModelAlias,
        queued_ahead: usize,
    },
    /// A fragment of assistant text. Concatenation across all deltas for a
    /// request yields the full turn.
    ChatDelta { request_id: RequestId, text: String },
    /// The model invoked a named tool.
    ToolUse { request_id: RequestId, name: String },
    /// A structured error from the Model Runtime for this turn.
    ResultError {
        request_id: RequestId,
        subtype: String,
        errors: Vec<String>,
    },
    /// Terminal event for a request; exactly one per started request.
    ChatEnd {
        request_id: RequestId,
        ok: bool,
        model: ModelAlias,
    },
    /// Informational, untied to a request unless explicitly scoped to one
    /// (e.g. the session-switch note precedes a specific `ChatStart`).
    StatusNote {
        request_id: Option<RequestId>,
        message: String,
    },
    /// Broadcast to every connected client on a successful model change.
    ModelUpdated {
        request_id: RequestId,
        alias: ModelAlias,
    },
    /// Protocol-level or unexpected error, addressed to one client.
    Error {
        request_id: Option<RequestId>,
        message: String,
    },
}

impl TurnEvent {
    /// The request id this event is scoped to, when it has one.
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            TurnEvent::ChatStart { request_id, .. }
            | TurnEvent::ChatDelta { request_id, .. }
            | TurnEvent::ToolUse { request_id, .. }
            | TurnEvent::ResultError { request_id, .. }
            | TurnEvent::ChatEnd { request_id, .. }
            | TurnEvent::ModelUpdated { request_id, .. } => Some(request_id),
            TurnEvent::StatusNote { request_id, .. } => request_id.as_ref(),
            TurnEvent::Error { request_id, .. } => request_id.as_ref(),
        }
    }

    /// Whether this event is delivered to every connected client rather
    /// than routed to a single originating client.
    pub fn is_broadcast(&self) -> bool {
        matches!(self, TurnEvent::ModelUpdated { .. })
    }
}

/// Where a [`TurnEvent`] should be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    Client(ClientId),
    Broadcast,
}

#[cfg(test)]
#[path = "turn_event_tests.rs"]
mod tests;
