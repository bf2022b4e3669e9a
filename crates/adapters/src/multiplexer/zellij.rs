// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real [`MultiplexerAdapter`]: shells out to the multiplexer binary's
//! `pipe` subcommand, carrying the request as a single JSON argument and
//! reading the response from stdout.

use super::{MultiplexerAdapter, MultiplexerError, PipeOp, PipeResponse};
use crate::subprocess::{run_with_timeout, PIPE_RPC_OP_TIMEOUT, PIPE_RPC_TOGGLE_TIMEOUT};
use async_trait::async_trait;
use jj_core::EnvironmentContext;
use tokio::process::Command;

/// Invokes `<binary> --session <name> pipe --plugin jelly-j --payload
/// <json>` for every RPC, per the Environment Context captured on the
/// originating request rather than this process's own environment.
pub struct ZellijMultiplexerAdapter {
    default_bin: String,
}

impl ZellijMultiplexerAdapter {
    pub fn new() -> Self {
        Self {
            default_bin: crate::env::multiplexer_bin(),
        }
    }
}

impl Default for ZellijMultiplexerAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MultiplexerAdapter for ZellijMultiplexerAdapter {
    async fn call(
        &self,
        env: &EnvironmentContext,
        op: PipeOp,
    ) -> Result<PipeResponse, MultiplexerError> {
        let bin = env.binary_path().unwrap_or(&self.default_bin);
        let mut cmd = Command::new(bin);
        if let Some(session) = env.session_name() {
            cmd.arg("--session").arg(session);
        }
        if let Some(ipc_path) = env.ipc_path() {
            cmd.env("ZELLIJ_SESSION_PIPE", ipc_path);
        }
        let payload = serde_json::to_string(&op).unwrap_or_default();
        cmd.arg("pipe").arg("--plugin").arg("jelly-j").arg("--payload").arg(&payload);

        let timeout = if op.is_toggle() {
            PIPE_RPC_TOGGLE_TIMEOUT
        } else {
            PIPE_RPC_OP_TIMEOUT
        };
        let output = run_with_timeout(cmd, timeout, "multiplexer pipe RPC")
            .await
            .map_err(|message| {
                if message.contains("timed out") {
                    MultiplexerError::Timeout(message)
                } else {
                    MultiplexerError::Spawn(message)
                }
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let value: serde_json::Value = serde_json::from_str(stdout.trim())
            .map_err(MultiplexerError::Decode)?;
        PipeResponse::parse(&value)
    }
}

#[cfg(test)]
#[path = "zellij_tests.rs"]
mod tests;
