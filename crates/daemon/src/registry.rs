// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client Registry & Router: tracks connected clients,
//! routes per-request events to the originating client, and broadcasts
//! state changes. Implements [`jj_engine::TurnEventSink`] so the Executor
//! and Heartbeat Probe never see a wire frame directly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jj_core::{ClientId, EnvironmentContext, ModelAlias, TurnEvent};
use jj_engine::TurnEventSink;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::codec::ServerFrame;

struct ClientHandle {
    env: EnvironmentContext,
    tx: mpsc::Sender<ServerFrame>,
}

/// Two maps collapsed into one: every live client is keyed by its
/// client-chosen [`ClientId`]; the transport-handle side of a
/// transport-handle-to-registration map is the writer task itself, which
/// exits once its `Sender` clone is dropped from here.
#[derive(Default)]
pub struct Registry {
    clients: Mutex<HashMap<ClientId, ClientHandle>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn register(&self, client_id: ClientId, env: EnvironmentContext, tx: mpsc::Sender<ServerFrame>) {
        self.clients.lock().insert(client_id, ClientHandle { env, tx });
    }

    /// Refresh a client's last-seen Environment Context, e.g. after a
    /// `chat_request` that carries a different session tag, so a later
    /// request with no tag of its own can fall back to it.
    pub fn update_env(&self, client_id: &ClientId, env: EnvironmentContext) {
        if let Some(handle) = self.clients.lock().get_mut(client_id) {
            handle.env = env;
        }
    }

    pub fn env_for(&self, client_id: &ClientId) -> EnvironmentContext {
        self.clients
            .lock()
            .get(client_id)
            .map(|h| h.env.clone())
            .unwrap_or_default()
    }

    pub fn is_registered(&self, client_id: &ClientId) -> bool {
        self.clients.lock().contains_key(client_id)
    }

    /// Remove a client's registration. Safe to call twice (e.g. once from
    /// an overflow and once from the reader task's own disconnect
    /// handling); the second call is a no-op.
    pub fn unregister(&self, client_id: &ClientId) {
        self.clients.lock().remove(client_id);
    }

    pub fn connected_count(&self) -> usize {
        self.clients.lock().len()
    }

    /// Queue an arbitrary frame for one client, bypassing the [`TurnEvent`]
    /// vocabulary. Used for frames the Executor never originates: `pong`
    /// replies and register-time protocol errors.
    pub fn send_frame(&self, client_id: &ClientId, frame: ServerFrame) {
        self.route(client_id, frame);
    }

    fn route(&self, client_id: &ClientId, frame: ServerFrame) {
        let tx = self.clients.lock().get(client_id).map(|h| h.tx.clone());
        let Some(tx) = tx else {
            // Disconnected clients simply drop their events.
            return;
        };
        if tx.try_send(frame).is_err() {
            // Bounded queue overflow: best-effort final error frame, then
            // drop the client.
            let _ = tx.try_send(ServerFrame::Error {
                request_id: None,
                message: "client outbound queue overflowed; disconnecting".to_string(),
            });
            debug!(client_id = %client_id, "client outbound queue overflowed, disconnecting");
            self.unregister(client_id);
        }
    }
}

#[async_trait]
impl TurnEventSink for Registry {
    async fn send(&self, client_id: &ClientId, event: TurnEvent) {
        self.route(client_id, to_frame(event));
    }

    async fn broadcast(&self, event: TurnEvent) {
        let frame = to_frame(event);
        let targets: Vec<ClientId> = self.clients.lock().keys().cloned().collect();
        for client_id in targets {
            self.route(&client_id, frame.clone());
        }
    }
}

/// Map the neutral [`TurnEvent`] vocabulary onto its wire frame. A 1:1
/// mapping by construction: every variant here has exactly one matching
/// `ServerFrame` shape.
fn to_frame(event: TurnEvent) -> ServerFrame {
    match event {
        TurnEvent::ChatStart {
            request_id,
            model,
            queued_ahead,
        } => ServerFrame::ChatStart {
            request_id,
            model,
            queued_ahead,
        },
        TurnEvent::ChatDelta { request_id, text } => ServerFrame::ChatDelta { request_id, text },
        TurnEvent::ToolUse { request_id, name } => ServerFrame::ToolUse { request_id, name },
        TurnEvent::ResultError {
            request_id,
            subtype,
            errors,
        } => ServerFrame::ResultError {
            request_id,
            subtype,
            errors,
        },
        TurnEvent::ChatEnd {
            request_id,
            ok,
            model,
        } => ServerFrame::ChatEnd {
            request_id,
            ok,
            model,
        },
        TurnEvent::StatusNote { message, .. } => ServerFrame::StatusNote { message },
        TurnEvent::ModelUpdated { request_id, alias } => {
            ServerFrame::ModelUpdated { request_id, alias }
        }
        TurnEvent::Error { request_id, message } => ServerFrame::Error { request_id, message },
    }
}

/// Build the `registered` acknowledgement frame.
pub fn registered_frame(client_id: ClientId, daemon_pid: u32, model: ModelAlias, busy: bool) -> ServerFrame {
    ServerFrame::Registered {
        client_id,
        daemon_pid,
        model,
        busy,
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
