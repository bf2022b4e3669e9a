// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire Protocol & Codec: newline-delimited JSON frames over
//! the daemon's local stream socket. One JSON object per line, terminated by
//! `\n`; `read_frame`/`write_frame` are free functions rather than a
//! stateful codec type since each side only ever needs one direction.

use jj_core::{ClientId, EnvironmentContext, HistoryEntry, ModelAlias, MultiplexerEnv, RequestId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

use jj_core::{ErrorKind, HasErrorKind};

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("i/o error on client connection: {0}")]
    Io(#[source] std::io::Error),
    #[error("malformed frame: {0}")]
    Json(#[source] serde_json::Error),
    #[error("frame of {size} bytes exceeds the {limit} byte maximum")]
    FrameTooLarge { size: usize, limit: usize },
    #[error("connection closed")]
    ConnectionClosed,
}

impl HasErrorKind for ProtocolError {
    fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::Io(_) => ErrorKind::Io,
            ProtocolError::Json(_) | ProtocolError::FrameTooLarge { .. } => ErrorKind::Protocol,
            ProtocolError::ConnectionClosed => ErrorKind::Io,
        }
    }
}

/// Client→daemon message kinds. `Serialize` is derived so
/// `jj-cli` can write these frames over the same socket it reads
/// [`ServerFrame`]s from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    RegisterClient {
        #[serde(rename = "clientId")]
        client_id: ClientId,
        #[serde(rename = "zellijSession", default)]
        zellij_session: Option<String>,
        #[serde(rename = "zellijEnv", default)]
        zellij_env: Option<MultiplexerEnv>,
        #[serde(default)]
        cwd: Option<String>,
        #[serde(default)]
        hostname: Option<String>,
        #[serde(default)]
        pid: Option<u32>,
    },
    ChatRequest {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        #[serde(rename = "clientId")]
        client_id: ClientId,
        text: String,
        #[serde(rename = "zellijSession", default)]
        zellij_session: Option<String>,
        #[serde(rename = "zellijEnv", default)]
        zellij_env: Option<MultiplexerEnv>,
    },
    SetModel {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        #[serde(rename = "clientId")]
        client_id: ClientId,
        alias: ModelAlias,
    },
    NewSession {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        #[serde(rename = "clientId")]
        client_id: ClientId,
        #[serde(rename = "zellijSession", default)]
        zellij_session: Option<String>,
    },
    Ping {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        #[serde(rename = "clientId")]
        client_id: ClientId,
    },
}

impl ClientFrame {
    pub fn client_id(&self) -> &ClientId {
        match self {
            ClientFrame::RegisterClient { client_id, .. }
            | ClientFrame::ChatRequest { client_id, .. }
            | ClientFrame::SetModel { client_id, .. }
            | ClientFrame::NewSession { client_id, .. }
            | ClientFrame::Ping { client_id, .. } => client_id,
        }
    }

    /// Build the Environment Context carried by frame kinds that accept
    /// per-request multiplexer identity.
    pub fn env_context(&self) -> EnvironmentContext {
        match self {
            ClientFrame::RegisterClient {
                zellij_session,
                zellij_env,
                ..
            }
            | ClientFrame::ChatRequest {
                zellij_session,
                zellij_env,
                ..
            } => EnvironmentContext {
                session_name: zellij_session.clone(),
                multiplexer_env: zellij_env.clone(),
            },
            ClientFrame::NewSession { zellij_session, .. } => EnvironmentContext {
                session_name: zellij_session.clone(),
                multiplexer_env: None,
            },
            ClientFrame::SetModel { .. } | ClientFrame::Ping { .. } => EnvironmentContext::default(),
        }
    }
}

/// Daemon→client message kinds. `Deserialize` is derived so
/// `jj-cli` can read these frames back with the same [`read_frame`] helper
/// the daemon uses for [`ClientFrame`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Registered {
        #[serde(rename = "clientId")]
        client_id: ClientId,
        #[serde(rename = "daemonPid")]
        daemon_pid: u32,
        model: ModelAlias,
        busy: bool,
    },
    HistorySnapshot { entries: Vec<HistoryEntry> },
    StatusNote { message: String },
    ChatStart {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        model: ModelAlias,
        #[serde(rename = "queuedAhead")]
        queued_ahead: usize,
    },
    ChatDelta {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        text: String,
    },
    ToolUse {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        name: String,
    },
    ResultError {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        subtype: String,
        errors: Vec<String>,
    },
    ChatEnd {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        ok: bool,
        model: ModelAlias,
    },
    ModelUpdated {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        alias: ModelAlias,
    },
    Pong {
        #[serde(rename = "requestId")]
        request_id: RequestId,
        #[serde(rename = "daemonPid")]
        daemon_pid: u32,
    },
    Error {
        #[serde(rename = "requestId", skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
        message: String,
    },
}

/// Read one newline-delimited JSON frame from `reader`, enforcing
/// `max_bytes` as the line grows rather than after buffering the whole
/// thing — a peer that never sends a newline can't force unbounded memory
/// growth. Returns `Ok(None)` on clean EOF.
///
/// Generic over the frame type so both sides of the socket share one
/// implementation: the daemon reads [`ClientFrame`]s, `jj-cli` reads
/// [`ServerFrame`]s.
pub async fn read_frame<R, F>(reader: &mut R, max_bytes: usize) -> Result<Option<F>, ProtocolError>
where
    R: AsyncBufReadExt + Unpin,
    F: for<'de> Deserialize<'de>,
{
    let mut line = Vec::new();
    let mut total = 0usize;
    let mut too_large = false;
    loop {
        let available = reader.fill_buf().await.map_err(ProtocolError::Io)?;
        if available.is_empty() {
            if total == 0 {
                return Ok(None);
            }
            break;
        }
        let newline_at = available.iter().position(|&b| b == b'\n');
        let take = newline_at.map_or(available.len(), |pos| pos + 1);
        total += take;
        if too_large {
            // Already over budget: keep draining to the next newline so the
            // stream is left at a clean frame boundary, but stop retaining bytes.
        } else if total > max_bytes {
            too_large = true;
        } else {
            line.extend_from_slice(&available[..take]);
        }
        reader.consume(take);
        if newline_at.is_some() {
            break;
        }
    }
    if too_large {
        return Err(ProtocolError::FrameTooLarge {
            size: total,
            limit: max_bytes,
        });
    }
    while line.last() == Some(&b'\n') || line.last() == Some(&b'\r') {
        line.pop();
    }
    serde_json::from_slice(&line)
        .map(Some)
        .map_err(ProtocolError::Json)
}

/// Write one frame as a single JSON line. Generic for the same reason as
/// [`read_frame`]: the daemon writes [`ServerFrame`]s, `jj-cli` writes
/// [`ClientFrame`]s.
pub async fn write_frame<W, F>(writer: &mut W, frame: &F) -> Result<(), ProtocolError>
where
    W: tokio::io::AsyncWrite + Unpin,
    F: Serialize,
{
    let mut line = serde_json::to_string(frame).map_err(ProtocolError::Json)?;
    line.push('\n');
    writer
        .write_all(line.as_bytes())
        .await
        .map_err(ProtocolError::Io)?;
    writer.flush().await.map_err(ProtocolError::Io)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
