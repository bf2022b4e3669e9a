// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Heartbeat Probe: periodically polls every known
//! multiplexer session for a workspace snapshot, and — when the snapshot
//! "warrants a suggestion" — asks a cheap model for a short tab rename or a
//! crowded-tab note.
//!
//! Liveness, not correctness, is this component's job: a probe failure never
//! blocks or fails a `chat_request` turn. A session's `consecutive_failures`
//! counter only gates how loudly a persistent outage is reported.

use crate::env;
use crate::executor::{query_snapshot, TurnEventSink};
use crate::ExecutorCommand;
use jj_adapters::{
    ChatTurnInput, ChatTurnOutput, ModelRuntimeAdapter, ModelRuntimeError, ModelTurnEvents,
    MultiplexerAdapter, PipeOp,
};
use async_trait::async_trait;
use jj_core::{is_default_tab_name, Clock, EnvironmentContext, ModelAlias, TurnEvent, WorkspaceSnapshot};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Consecutive probe failures for one session before the probe reports the
/// session unreachable, rather than staying silent.
pub const HEARTBEAT_FAILURE_THRESHOLD: u32 = 3;

struct SessionState {
    env: EnvironmentContext,
    consecutive_failures: u32,
}

/// The probe's registry of multiplexer sessions it has seen via a client
/// connection or request, and their rolling health.
pub struct HeartbeatProbe {
    sessions: Mutex<HashMap<String, SessionState>>,
    multiplexer: Arc<dyn MultiplexerAdapter>,
    model: Arc<dyn ModelRuntimeAdapter>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn TurnEventSink>,
    executor_tx: mpsc::UnboundedSender<ExecutorCommand>,
}

impl HeartbeatProbe {
    pub fn new(
        multiplexer: Arc<dyn MultiplexerAdapter>,
        model: Arc<dyn ModelRuntimeAdapter>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn TurnEventSink>,
        executor_tx: mpsc::UnboundedSender<ExecutorCommand>,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            multiplexer,
            model,
            clock,
            sink,
            executor_tx,
        }
    }

    /// Register (or refresh) a session's Environment Context. Called by the
    /// daemon on every client registration and request that carries one.
    /// Sessions with no name can't be addressed by the probe and are ignored.
    pub fn observe_session(&self, env: EnvironmentContext) {
        let Some(name) = env.session_name().map(str::to_string) else {
            return;
        };
        let mut sessions = self.sessions.lock();
        sessions
            .entry(name)
            .and_modify(|s| s.env = env.clone())
            .or_insert(SessionState {
                env,
                consecutive_failures: 0,
            });
    }

    /// Drive the probe forever: an initial warm-up delay, then a tick every
    /// [`env::heartbeat_interval`].
    pub async fn run(self: Arc<Self>) {
        tokio::time::sleep(env::heartbeat_initial_delay()).await;
        let mut interval = tokio::time::interval(env::heartbeat_interval());
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }

    /// Run one round over every known session. Exposed directly for tests
    /// that don't want to wait on the real interval. Skips the entire round
    /// if the Executor is busy with an in-flight turn (spec.md §4.7 step 1).
    pub async fn tick(&self) {
        if query_snapshot(&self.executor_tx).await.busy {
            debug!("skipping heartbeat tick: executor is busy");
            return;
        }

        let known: Vec<(String, EnvironmentContext)> = self
            .sessions
            .lock()
            .iter()
            .map(|(name, state)| (name.clone(), state.env.clone()))
            .collect();

        for (name, env) in known {
            self.probe_session(&name, &env).await;
        }
    }

    async fn probe_session(&self, name: &str, env: &EnvironmentContext) {
        match self.multiplexer.call(env, PipeOp::GetState).await {
            Ok(response) => {
                self.record_success(name);
                match response.result() {
                    Ok(value) => match serde_json::from_value::<WorkspaceSnapshot>(value) {
                        Ok(snapshot) => self.consider_snapshot(env, &snapshot).await,
                        Err(err) => warn!(session = name, error = %err, "malformed workspace snapshot"),
                    },
                    Err(err) => debug!(session = name, error = %err, "get_state not ready"),
                }
            }
            Err(err) => self.record_failure(name, &err.to_string()).await,
        }
    }

    fn record_success(&self, name: &str) {
        let mut sessions = self.sessions.lock();
        if let Some(state) = sessions.get_mut(name) {
            state.consecutive_failures = 0;
        }
    }

    async fn record_failure(&self, name: &str, message: &str) {
        let should_report = {
            let mut sessions = self.sessions.lock();
            let Some(state) = sessions.get_mut(name) else {
                return;
            };
            state.consecutive_failures += 1;
            let crossed = state.consecutive_failures >= HEARTBEAT_FAILURE_THRESHOLD;
            if crossed {
                // Dropped rather than merely flagged: a session that has gone
                // quiet for this long is assumed closed, and re-appears in
                // known-sessions the next time a client registers against it.
                sessions.remove(name);
            }
            crossed
        };
        if should_report {
            let at = self.clock.now().format("%Y-%m-%d %H:%M:%S UTC");
            warn!(session = name, error = message, "multiplexer session unreachable");
            self.sink
                .broadcast(TurnEvent::StatusNote {
                    request_id: None,
                    message: format!(
                        "multiplexer session \"{name}\" has not responded in \
                         {HEARTBEAT_FAILURE_THRESHOLD} consecutive heartbeats and is no longer \
                         tracked (as of {at})"
                    ),
                })
                .await;
        }
    }

    async fn consider_snapshot(&self, env: &EnvironmentContext, snapshot: &WorkspaceSnapshot) {
        if !snapshot.warrants_suggestion() {
            return;
        }

        if snapshot.has_crowded_tab() {
            self.sink
                .broadcast(TurnEvent::StatusNote {
                    request_id: None,
                    message: "one of your tabs has several panes open; consider splitting it up"
                        .to_string(),
                })
                .await;
        }

        let Some(tab) = snapshot.tabs.iter().find(|t| is_default_tab_name(&t.name)) else {
            return;
        };

        let suggestion = self.suggest_tab_name(snapshot, tab.position).await;
        let Some(suggested_name) = suggestion else {
            return;
        };

        // Re-fetch before acting: the user may have renamed the tab during
        // the model round trip.
        let still_default = match self.multiplexer.call(env, PipeOp::GetState).await {
            Ok(response) => response
                .result()
                .ok()
                .and_then(|v| serde_json::from_value::<WorkspaceSnapshot>(v).ok())
                .map(|s| {
                    s.tabs
                        .iter()
                        .any(|t| t.position == tab.position && is_default_tab_name(&t.name))
                })
                .unwrap_or(false),
            Err(_) => false,
        };
        if !still_default {
            return;
        }

        let rename = PipeOp::RenameTab {
            position: tab.position,
            name: suggested_name,
        };
        if let Err(err) = self.multiplexer.call(env, rename).await {
            warn!(error = %err, "failed to rename tab after heartbeat suggestion");
        }
    }

    async fn suggest_tab_name(&self, snapshot: &WorkspaceSnapshot, position: usize) -> Option<String> {
        let commands: Vec<&str> = snapshot
            .panes
            .iter()
            .filter(|p| p.tab_index == position && !p.is_plugin)
            .filter_map(|p| p.command.as_deref())
            .collect();
        if commands.is_empty() {
            return None;
        }
        let prompt = format!(
            "Suggest a short (1-3 word) tab name summarizing these running commands: {}. \
             Reply with only the name, no punctuation.",
            commands.join(", ")
        );
        let input = ChatTurnInput {
            user_text: prompt,
            resume_token: None,
            model: ModelAlias::cheap(),
            context_prefix: None,
        };
        let collector = TextCollector::default();
        match self.model.chat(input, &collector).await {
            Ok(ChatTurnOutput { .. }) => {
                let text = collector.into_text();
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Err(ModelRuntimeError::Spawn(_))
            | Err(ModelRuntimeError::ProcessFailed { .. })
            | Err(ModelRuntimeError::Io(_)) => None,
        }
    }
}

/// Collects `on_text` fragments from the cheap-model round trip; tool use
/// and errors during a heartbeat suggestion are ignored, not surfaced.
#[derive(Default)]
struct TextCollector {
    text: Mutex<String>,
}

impl TextCollector {
    fn into_text(self) -> String {
        self.text.into_inner()
    }
}

#[async_trait]
impl ModelTurnEvents for TextCollector {
    async fn on_text(&self, fragment: &str) {
        self.text.lock().push_str(fragment);
    }
    async fn on_tool_use(&self, _name: &str) {}
    async fn on_result_error(&self, _subtype: &str, _errors: &[String]) {}
    async fn on_permission_request(&self, _tool_name: &str, _reason: &str) {}
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
