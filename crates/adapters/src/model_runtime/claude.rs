// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real [`ModelRuntimeAdapter`] implementation: spawns the configured model
//! runtime binary as a subprocess and parses its `stream-json` stdout.

use super::{
    ChatTurnInput, ChatTurnOutput, ModelRuntimeAdapter, ModelRuntimeError, ModelTurnEvents,
    PermissionDecision, PermissionPolicy,
};
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};

/// Spawns the binary named by `JELLY_J_MODEL_RUNTIME_BIN` (default `claude`)
/// for every turn and streams its stdout,
pub struct ClaudeModelRuntimeAdapter {
    bin: String,
    policy: PermissionPolicy,
}

impl ClaudeModelRuntimeAdapter {
    pub fn new(policy: PermissionPolicy) -> Self {
        Self {
            bin: crate::env::model_runtime_bin(),
            policy,
        }
    }

    /// Construct with an explicit binary path, bypassing the environment
    /// lookup. Used by tests to point at a `FakeModelRuntime` script.
    pub fn with_bin(bin: impl Into<String>, policy: PermissionPolicy) -> Self {
        Self {
            bin: bin.into(),
            policy,
        }
    }

    async fn handle_permission_request(
        &self,
        request: &Value,
        stdin: Option<&mut ChildStdin>,
        events: &(dyn ModelTurnEvents + Send + Sync),
    ) -> Result<(), ModelRuntimeError> {
        let request_id = request
            .get("request_id")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let tool_name = request
            .get("tool_name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let target_path = request
            .get("input")
            .and_then(|input| input.get("file_path"))
            .and_then(Value::as_str)
            .map(PathBuf::from);
        let reason = format!("{} requested by the model runtime", tool_name);

        events.on_permission_request(tool_name, &reason).await;

        let decision = self.policy.decide(tool_name, target_path.as_deref());
        let response = match decision {
            PermissionDecision::Allow => serde_json::json!({
                "type": "control_response",
                "response": {
                    "subtype": "success",
                    "request_id": request_id,
                    "response": { "behavior": "allow" },
                },
            }),
            PermissionDecision::Prompt => serde_json::json!({
                "type": "control_response",
                "response": {
                    "subtype": "success",
                    "request_id": request_id,
                    "response": {
                        "behavior": "deny",
                        "message": "interactive confirmation is unavailable in this session",
                    },
                },
            }),
        };

        if let Some(stdin) = stdin {
            let mut line = response.to_string();
            line.push('\n');
            stdin
                .write_all(line.as_bytes())
                .await
                .map_err(ModelRuntimeError::Io)?;
        }
        Ok(())
    }
}

fn compose_prompt(input: &ChatTurnInput) -> String {
    match &input.context_prefix {
        Some(prefix) => format!("{prefix}\n\n{}", input.user_text),
        None => input.user_text.clone(),
    }
}

fn assistant_content_blocks(event: &Value) -> Vec<&Value> {
    event
        .get("message")
        .and_then(|m| m.get("content"))
        .or_else(|| event.get("content"))
        .and_then(Value::as_array)
        .map(|blocks| blocks.iter().collect())
        .unwrap_or_default()
}

fn result_errors(event: &Value) -> Vec<String> {
    event
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| {
            errors
                .iter()
                .map(|e| e.as_str().map(str::to_string).unwrap_or_else(|| e.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ModelRuntimeAdapter for ClaudeModelRuntimeAdapter {
    async fn chat(
        &self,
        input: ChatTurnInput,
        events: &(dyn ModelTurnEvents + Send + Sync),
    ) -> Result<ChatTurnOutput, ModelRuntimeError> {
        let mut cmd = Command::new(&self.bin);
        cmd.arg(compose_prompt(&input));
        cmd.arg("--output-format").arg("stream-json");
        cmd.arg("--model").arg(input.model.runtime_id());
        if let Some(token) = &input.resume_token {
            cmd.arg("--resume").arg(token);
        }
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());

        tracing::info!(bin = %self.bin, model = input.model.as_str(), "spawning model runtime turn");
        let mut child = cmd.spawn().map_err(ModelRuntimeError::Spawn)?;
        let mut stdin = child.stdin.take();
        let Some(stdout) = child.stdout.take() else {
            return Err(ModelRuntimeError::ProcessFailed {
                status: "stdout was not piped".to_string(),
            });
        };
        let mut lines = BufReader::new(stdout).lines();

        let mut resume_token = input.resume_token.clone();
        let mut result_seen = false;

        while let Some(line) = lines.next_line().await.map_err(ModelRuntimeError::Io)? {
            if line.trim().is_empty() {
                continue;
            }
            let Ok(value) = serde_json::from_str::<Value>(&line) else {
                tracing::debug!(line = %line, "skipping unparsable model runtime line");
                continue;
            };

            match value.get("type").and_then(Value::as_str) {
                Some("system") => {
                    if value.get("subtype").and_then(Value::as_str) == Some("init") {
                        if let Some(id) = value.get("session_id").and_then(Value::as_str) {
                            resume_token = Some(id.to_string());
                        }
                    }
                }
                Some("assistant") => {
                    for block in assistant_content_blocks(&value) {
                        match block.get("type").and_then(Value::as_str) {
                            Some("text") => {
                                if let Some(text) = block.get("text").and_then(Value::as_str) {
                                    events.on_text(text).await;
                                }
                            }
                            Some("tool_use") => {
                                if let Some(name) = block.get("name").and_then(Value::as_str) {
                                    events.on_tool_use(name).await;
                                }
                            }
                            _ => {}
                        }
                    }
                }
                Some("result") => {
                    result_seen = true;
                    let subtype = value
                        .get("subtype")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown");
                    if subtype != "success" {
                        events.on_result_error(subtype, &result_errors(&value)).await;
                    }
                }
                Some("control_request") => {
                    if value.get("subtype").and_then(Value::as_str) == Some("can_use_tool") {
                        self.handle_permission_request(&value, stdin.as_mut(), events)
                            .await?;
                    }
                }
                _ => {}
            }
        }

        drop(stdin);
        let status = child.wait().await.map_err(ModelRuntimeError::Io)?;
        if !status.success() && !result_seen {
            return Err(ModelRuntimeError::ProcessFailed {
                status: status.to_string(),
            });
        }

        Ok(ChatTurnOutput { resume_token })
    }
}

#[cfg(test)]
#[path = "claude_tests.rs"]
mod tests;
