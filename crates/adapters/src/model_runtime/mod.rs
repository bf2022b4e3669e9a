// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Model Runtime Adapter: presents the external model runtime behind
//! a narrow streaming contract.

mod claude;
mod permission;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use claude::ClaudeModelRuntimeAdapter;
pub use permission::{PermissionDecision, PermissionPolicy};

use async_trait::async_trait;
use jj_core::{ErrorKind, HasErrorKind, ModelAlias};
use thiserror::Error;

/// One turn's input: the user's text, an optional resume token from a prior
/// turn, the model alias to use, and an optional context prefix composed by
/// the Executor (wall-clock/timezone, session-switch note).
#[derive(Debug, Clone)]
pub struct ChatTurnInput {
    pub user_text: String,
    pub resume_token: Option<String>,
    pub model: ModelAlias,
    pub context_prefix: Option<String>,
}

/// What a completed (or exited) turn hands back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTurnOutput {
    pub resume_token: Option<String>,
}

/// Sink for the four underlying-model events the adapter recognizes.
/// Invoked exactly once per underlying model event.
#[async_trait]
pub trait ModelTurnEvents: Send + Sync {
    async fn on_text(&self, fragment: &str);
    async fn on_tool_use(&self, name: &str);
    async fn on_result_error(&self, subtype: &str, errors: &[String]);
    async fn on_permission_request(&self, tool_name: &str, reason: &str);
}

/// Errors the adapter raises for genuinely fatal conditions only: the
/// subprocess could not be started, or its output was unreadable. Soft
/// errors go through [`ModelTurnEvents::on_result_error`] instead.
#[derive(Debug, Error)]
pub enum ModelRuntimeError {
    #[error("failed to start model runtime subprocess: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("model runtime exited with status {status} and produced no result event")]
    ProcessFailed { status: String },
    #[error("i/o error reading model runtime output: {0}")]
    Io(#[source] std::io::Error),
}

impl HasErrorKind for ModelRuntimeError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Fatal
    }
}

/// Narrow interface over the external Model Runtime.
#[async_trait]
pub trait ModelRuntimeAdapter: Send + Sync {
    async fn chat(
        &self,
        input: ChatTurnInput,
        events: &(dyn ModelTurnEvents + Send + Sync),
    ) -> Result<ChatTurnOutput, ModelRuntimeError>;
}
