// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A scriptable [`ModelRuntimeAdapter`] double for engine/daemon tests,
//! following the crate's usual `test-support` fake-adapter convention.

use super::{
    ChatTurnInput, ChatTurnOutput, ModelRuntimeAdapter, ModelRuntimeError, ModelTurnEvents,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// One scripted outcome for a single `chat()` call.
#[derive(Debug, Clone)]
pub enum ScriptedTurn {
    /// Emit each fragment via `onText`, then return the given resume token.
    Text {
        fragments: Vec<String>,
        resume_token: Option<String>,
    },
    /// Emit a tool-use event, then succeed with the given resume token.
    ToolUse {
        name: String,
        resume_token: Option<String>,
    },
    /// Emit a structured result error (before any text), matching the
    /// stale-resume pattern when `stale` is set.
    ResultError {
        subtype: String,
        errors: Vec<String>,
    },
    /// Raise a fatal adapter error (subprocess could not be started, etc).
    Fatal,
}

/// Records every `chat()` invocation for assertions, and plays back a
/// pre-programmed queue of [`ScriptedTurn`]s, one per call.
#[derive(Default)]
pub struct FakeModelRuntimeAdapter {
    script: Mutex<VecDeque<ScriptedTurn>>,
    calls: Mutex<Vec<ChatTurnInput>>,
}

impl FakeModelRuntimeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a turn outcome to be returned on the next `chat()` call.
    pub fn push(&self, turn: ScriptedTurn) {
        self.script.lock().push_back(turn);
    }

    /// Inputs passed to every `chat()` call so far, in order.
    pub fn calls(&self) -> Vec<ChatTurnInput> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ModelRuntimeAdapter for FakeModelRuntimeAdapter {
    async fn chat(
        &self,
        input: ChatTurnInput,
        events: &(dyn ModelTurnEvents + Send + Sync),
    ) -> Result<ChatTurnOutput, ModelRuntimeError> {
        self.calls.lock().push(input.clone());
        let turn = self
            .script
            .lock()
            .pop_front()
            .unwrap_or(ScriptedTurn::Text {
                fragments: vec!["ok".to_string()],
                resume_token: Some("fake-session".to_string()),
            });

        match turn {
            ScriptedTurn::Text {
                fragments,
                resume_token,
            } => {
                for fragment in &fragments {
                    events.on_text(fragment).await;
                }
                Ok(ChatTurnOutput { resume_token })
            }
            ScriptedTurn::ToolUse { name, resume_token } => {
                events.on_tool_use(&name).await;
                Ok(ChatTurnOutput { resume_token })
            }
            ScriptedTurn::ResultError { subtype, errors } => {
                events.on_result_error(&subtype, &errors).await;
                Ok(ChatTurnOutput {
                    resume_token: input.resume_token,
                })
            }
            ScriptedTurn::Fatal => Err(ModelRuntimeError::ProcessFailed {
                status: "exit status: 1".to_string(),
            }),
        }
    }
}
