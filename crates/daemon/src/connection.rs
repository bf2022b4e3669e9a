// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection handling: one task per accepted
//! socket. A transport must send `register_client` before anything else is
//! honored; every other frame from an unregistered transport gets an `error`
//! frame and the connection stays open.

use std::sync::Arc;

use jj_core::{ClientId, EnvironmentContext};
use jj_engine::{query_snapshot, ExecutorCommand, ExecutorSnapshot, HeartbeatProbe, TurnRequest};
use jj_storage::HistoryStore;
use tokio::io::{AsyncBufReadExt, AsyncWrite, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tracing::debug;

use crate::codec::{self, ClientFrame, ProtocolError, ServerFrame};
use crate::registry::{self, Registry};

/// State shared by every accepted connection. Nothing here is mutated
/// through this struct directly: Executor state goes through
/// `executor_tx`, client routing goes through `registry`'s own locking.
pub struct ConnectionCtx {
    pub registry: Arc<Registry>,
    pub history: Arc<HistoryStore>,
    pub heartbeat: Arc<HeartbeatProbe>,
    pub executor_tx: mpsc::UnboundedSender<ExecutorCommand>,
    pub daemon_pid: u32,
    pub max_frame_bytes: usize,
    pub client_queue_capacity: usize,
}

/// Drive one accepted connection until it disconnects or a fatal I/O error
/// occurs. Never panics: every decode/write failure ends the connection
/// rather than the daemon.
pub async fn handle_connection(stream: UnixStream, ctx: Arc<ConnectionCtx>) {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let Some((client_id, env_context)) =
        await_registration(&mut reader, &mut writer, ctx.max_frame_bytes).await
    else {
        return;
    };

    ctx.heartbeat.observe_session(env_context.clone());
    let ExecutorSnapshot { model, busy, .. } = query_snapshot(&ctx.executor_tx).await;
    let registered = registry::registered_frame(client_id.clone(), ctx.daemon_pid, model, busy);
    if codec::write_frame(&mut writer, &registered).await.is_err() {
        return;
    }
    let snapshot = ServerFrame::HistorySnapshot {
        entries: ctx.history.read_snapshot(jj_storage::DEFAULT_SNAPSHOT_LIMIT),
    };
    if codec::write_frame(&mut writer, &snapshot).await.is_err() {
        return;
    }

    let (tx, mut rx) = mpsc::channel(ctx.client_queue_capacity);
    ctx.registry.register(client_id.clone(), env_context, tx);

    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if codec::write_frame(&mut writer, &frame).await.is_err() {
                break;
            }
        }
    });

    loop {
        match codec::read_frame(&mut reader, ctx.max_frame_bytes).await {
            Ok(Some(frame)) => dispatch(frame, &client_id, &ctx).await,
            Ok(None) => break,
            Err(ProtocolError::Io(_)) => break,
            Err(err) => ctx.registry.send_frame(
                &client_id,
                ServerFrame::Error {
                    request_id: None,
                    message: err.to_string(),
                },
            ),
        }
    }

    debug!(client_id = %client_id, "client disconnected");
    ctx.registry.unregister(&client_id);
}

/// Read frames until one is `register_client`, answering any other frame
/// with an `error` frame and looping. Returns `None` on EOF
/// or a connection-level I/O error.
async fn await_registration<R, W>(
    reader: &mut R,
    writer: &mut W,
    max_bytes: usize,
) -> Option<(ClientId, EnvironmentContext)>
where
    R: AsyncBufReadExt + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        match codec::read_frame(reader, max_bytes).await {
            Ok(Some(frame @ ClientFrame::RegisterClient { .. })) => {
                let client_id = frame.client_id().clone();
                let env_context = frame.env_context();
                return Some((client_id, env_context));
            }
            Ok(Some(_other)) => {
                let error = ServerFrame::Error {
                    request_id: None,
                    message: "register_client must be the first frame on a connection".to_string(),
                };
                codec::write_frame(writer, &error).await.ok()?;
            }
            Ok(None) => return None,
            Err(ProtocolError::Io(_)) => return None,
            Err(err) => {
                let error = ServerFrame::Error {
                    request_id: None,
                    message: err.to_string(),
                };
                codec::write_frame(writer, &error).await.ok()?;
            }
        }
    }
}

async fn dispatch(frame: ClientFrame, client_id: &ClientId, ctx: &ConnectionCtx) {
    match frame {
        ClientFrame::RegisterClient { .. } => {
            ctx.registry.send_frame(
                client_id,
                ServerFrame::Error {
                    request_id: None,
                    message: "client is already registered on this connection".to_string(),
                },
            );
        }
        ClientFrame::ChatRequest {
            request_id,
            client_id: frame_client_id,
            text,
            zellij_session,
            zellij_env,
        } => {
            let env_context = EnvironmentContext {
                session_name: zellij_session,
                multiplexer_env: zellij_env,
            }
            .or(ctx.registry.env_for(client_id));
            ctx.registry.update_env(client_id, env_context.clone());
            ctx.heartbeat.observe_session(env_context.clone());
            let request = TurnRequest {
                request_id,
                client_id: frame_client_id,
                user_text: text,
                session_tag: env_context.session_name().map(str::to_string),
                env_context,
                queued_ahead: 0,
            };
            let _ = ctx.executor_tx.send(ExecutorCommand::ChatRequest { request });
        }
        ClientFrame::SetModel {
            request_id, alias, ..
        } => {
            let _ = ctx
                .executor_tx
                .send(ExecutorCommand::SetModel { request_id, alias });
        }
        ClientFrame::NewSession {
            request_id,
            client_id: frame_client_id,
            zellij_session,
        } => {
            if let Some(session) = zellij_session {
                let mut env_context = ctx.registry.env_for(client_id);
                env_context.session_name = Some(session);
                ctx.registry.update_env(client_id, env_context.clone());
                ctx.heartbeat.observe_session(env_context);
            }
            let _ = ctx.executor_tx.send(ExecutorCommand::NewSession {
                request_id,
                client_id: frame_client_id,
            });
        }
        ClientFrame::Ping { request_id, .. } => {
            ctx.registry.send_frame(
                client_id,
                ServerFrame::Pong {
                    request_id,
                    daemon_pid: ctx.daemon_pid,
                },
            );
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
