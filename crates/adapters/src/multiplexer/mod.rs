// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Multiplexer Adapter: pipe-RPC to the in-multiplexer butler plugin,
//! plus the CLI subprocess invocations the Heartbeat Probe's tab/pane
//! actions drive.

mod zellij;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use zellij::ZellijMultiplexerAdapter;

use async_trait::async_trait;
use jj_core::{EnvironmentContext, ErrorKind, HasErrorKind};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A request to the butler plugin's pipe RPC, keyed by its `op` discriminant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PipeOp {
    Ping,
    GetState,
    GetTrace,
    ClearTrace,
    RenameTab { position: usize, name: String },
    RenamePane { pane_id: u32, name: String },
    HidePane { pane_id: u32 },
    ShowPane {
        pane_id: u32,
        #[serde(skip_serializing_if = "Option::is_none")]
        should_float_if_hidden: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        should_focus_pane: Option<bool>,
    },
}

impl PipeOp {
    /// `true` for ops the Heartbeat Probe and Executor treat as a quick
    /// toggle (3s timeout) rather than a full op round-trip (8s).
    pub fn is_toggle(&self) -> bool {
        matches!(self, PipeOp::HidePane { .. } | PipeOp::ShowPane { .. })
    }
}

/// The plugin's pipe RPC response shape: `{ok:true, result}` or
/// `{ok:false, code, error}`. Parsed from a raw [`serde_json::Value`] rather
/// than derived, since the two shapes share no common required field serde
/// can dispatch on cleanly.
#[derive(Debug, Clone, PartialEq)]
pub enum PipeResponse {
    Ok { result: serde_json::Value },
    Err { code: String, error: String },
}

impl PipeResponse {
    /// Reserved code meaning "plugin loaded but caches not primed; retry".
    pub const NOT_READY: &'static str = "not_ready";

    pub fn parse(value: &serde_json::Value) -> Result<Self, MultiplexerError> {
        let ok = value
            .get("ok")
            .and_then(serde_json::Value::as_bool)
            .ok_or_else(|| MultiplexerError::Decode(serde_json::Error::custom("missing `ok` field")))?;
        if ok {
            Ok(PipeResponse::Ok {
                result: value.get("result").cloned().unwrap_or(serde_json::Value::Null),
            })
        } else {
            Ok(PipeResponse::Err {
                code: value
                    .get("code")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                error: value
                    .get("error")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("")
                    .to_string(),
            })
        }
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, PipeResponse::Err { code, .. } if code == Self::NOT_READY)
    }

    pub fn result(self) -> Result<serde_json::Value, MultiplexerError> {
        match self {
            PipeResponse::Ok { result } => Ok(result),
            PipeResponse::Err { code, error } if code == Self::NOT_READY => {
                Err(MultiplexerError::NotReady(error))
            }
            PipeResponse::Err { code, error } => Err(MultiplexerError::Rpc { code, error }),
        }
    }
}

#[derive(Debug, Error)]
pub enum MultiplexerError {
    #[error("failed to invoke multiplexer CLI: {0}")]
    Spawn(String),
    #[error("multiplexer CLI call timed out: {0}")]
    Timeout(String),
    #[error("malformed pipe RPC response: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("plugin loaded but caches not primed: {0}")]
    NotReady(String),
    #[error("pipe RPC returned {code}: {error}")]
    Rpc { code: String, error: String },
}

impl HasErrorKind for MultiplexerError {
    fn kind(&self) -> ErrorKind {
        match self {
            MultiplexerError::Timeout(_) => ErrorKind::Timeout,
            MultiplexerError::NotReady(_) => ErrorKind::Timeout,
            _ => ErrorKind::Io,
        }
    }
}

/// Narrow interface over the terminal multiplexer: pipe RPC to the butler
/// plugin, scoped to a given client's [`EnvironmentContext`] so the CLI
/// invocation targets that client's session rather than the daemon's own
/// process environment.
#[async_trait]
pub trait MultiplexerAdapter: Send + Sync {
    async fn call(&self, env: &EnvironmentContext, op: PipeOp)
        -> Result<PipeResponse, MultiplexerError>;
}
