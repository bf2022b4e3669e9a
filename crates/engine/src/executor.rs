// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Turn Queue & Executor: serializes model turns
//! globally, owns the Conversation State, and handles stale-resume
//! recovery.
//!
//! Modeled as an actor: [`Executor`] is never `Clone` and never wrapped in a
//! `Mutex`/`Arc`. One task owns it and drives [`Executor::run`]; turn
//! processing itself is off-loaded to a spawned task so that `set_model`,
//! `new_session`, and further `chat_request`s are still accepted (and
//! queued) while a turn runs — the spawned task reports back over the same
//! command channel, which is what makes the actor single-threaded from the
//! point of view of state mutation.

use crate::context_prefix;
use crate::error::EngineError;
use crate::stale_resume::is_stale_resume_error;
use async_trait::async_trait;
use jj_adapters::{ChatTurnInput, ModelRuntimeAdapter, ModelTurnEvents};
use jj_core::{
    Clock, ClientId, ConversationState, HistoryEntry, HistoryRole, ModelAlias, RequestId,
    TurnEvent,
};
use jj_storage::HistoryStore;
use parking_lot::Mutex as SyncMutex;
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// Sink the Executor emits [`TurnEvent`]s through. Implemented by
/// `jj-daemon`'s Client Registry & Router, which maps each event onto a
/// wire frame and a delivery rule.
#[async_trait]
pub trait TurnEventSink: Send + Sync {
    async fn send(&self, client_id: &ClientId, event: TurnEvent);
    async fn broadcast(&self, event: TurnEvent);
}

/// Commands the Executor actor accepts. `chat_request`/`set_model`/
/// `new_session` originate from the daemon's listener tasks; `TurnCompleted`
/// is fed back by the spawned turn-processing task.
pub enum ExecutorCommand {
    ChatRequest {
        request: TurnRequest,
    },
    SetModel {
        request_id: RequestId,
        alias: ModelAlias,
    },
    NewSession {
        request_id: RequestId,
        client_id: ClientId,
    },
    TurnCompleted(TurnOutcome),
    /// Snapshot query for the daemon's `registered`/`ping` frames, which
    /// need the current model and busy flag but must not reach into the
    /// actor's state directly — only the task running [`Executor::run`]
    /// ever mutates it.
    Query { reply: oneshot::Sender<ExecutorSnapshot> },
}

pub use crate::turn_request::TurnRequest;

/// A point-in-time read of Executor state, for callers outside the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorSnapshot {
    pub model: ModelAlias,
    pub busy: bool,
    pub queue_depth: usize,
}

impl Default for ExecutorSnapshot {
    fn default() -> Self {
        Self {
            model: ModelAlias::default(),
            busy: false,
            queue_depth: 0,
        }
    }
}

/// Round-trip the Executor actor for a point-in-time snapshot of its state.
/// Shared by the daemon's connection handling (`registered`/`ping` replies)
/// and the Heartbeat Probe (skipping a tick while a turn is in flight,
/// per spec.md §4.7 step 1). The channel only closes once the daemon is
/// tearing down, in which case a default snapshot is close enough.
pub async fn query_snapshot(tx: &mpsc::UnboundedSender<ExecutorCommand>) -> ExecutorSnapshot {
    let (reply, rx) = oneshot::channel();
    if tx.send(ExecutorCommand::Query { reply }).is_err() {
        return ExecutorSnapshot::default();
    }
    rx.await.unwrap_or_default()
}

/// What a completed turn hands back to the Executor loop so it can mutate
/// Conversation State and history.
pub struct TurnOutcome {
    request: TurnRequest,
    assistant_text: String,
    resume_token: Option<String>,
    ok: bool,
    model: ModelAlias,
}

/// The Executor actor. Owns the Turn Queue, Conversation State, and the
/// history/state-file handles needed to persist after every turn.
pub struct Executor {
    queue: VecDeque<TurnRequest>,
    in_flight: HashSet<RequestId>,
    busy: bool,
    conversation: ConversationState,
    state_path: PathBuf,
    history: Arc<HistoryStore>,
    adapter: Arc<dyn ModelRuntimeAdapter>,
    clock: Arc<dyn Clock>,
    sink: Arc<dyn TurnEventSink>,
    tx: mpsc::UnboundedSender<ExecutorCommand>,
}

impl Executor {
    pub fn new(
        conversation: ConversationState,
        state_path: PathBuf,
        history: Arc<HistoryStore>,
        adapter: Arc<dyn ModelRuntimeAdapter>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn TurnEventSink>,
        tx: mpsc::UnboundedSender<ExecutorCommand>,
    ) -> Self {
        Self {
            queue: VecDeque::new(),
            in_flight: HashSet::new(),
            busy: false,
            conversation,
            state_path,
            history,
            adapter,
            clock,
            sink,
            tx,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn current_model(&self) -> ModelAlias {
        self.conversation.model()
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Drive the actor: receive commands until the channel closes
    /// (daemon shutdown drops every sender).
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ExecutorCommand>) {
        while let Some(cmd) = rx.recv().await {
            self.handle(cmd).await;
        }
    }

    async fn handle(&mut self, cmd: ExecutorCommand) {
        match cmd {
            ExecutorCommand::ChatRequest { request } => self.handle_chat_request(request).await,
            ExecutorCommand::SetModel { request_id, alias } => {
                self.handle_set_model(request_id, alias).await
            }
            ExecutorCommand::NewSession {
                request_id,
                client_id,
            } => self.handle_new_session(request_id, client_id).await,
            ExecutorCommand::TurnCompleted(outcome) => self.handle_turn_completed(outcome).await,
            ExecutorCommand::Query { reply } => {
                let _ = reply.send(ExecutorSnapshot {
                    model: self.current_model(),
                    busy: self.busy,
                    queue_depth: self.queue.len(),
                });
            }
        }
    }

    async fn handle_chat_request(&mut self, mut request: TurnRequest) {
        if self.in_flight.contains(&request.request_id) {
            self.sink
                .send(
                    &request.client_id,
                    TurnEvent::Error {
                        request_id: Some(request.request_id.clone()),
                        message: format!(
                            "duplicate request id {}: a turn with this id is already in flight",
                            request.request_id
                        ),
                    },
                )
                .await;
            return;
        }
        self.in_flight.insert(request.request_id.clone());
        request.queued_ahead = self.queue.len() + if self.busy { 1 } else { 0 };
        self.queue.push_back(request);
        self.start_next_if_idle().await;
    }

    async fn handle_set_model(&mut self, request_id: RequestId, alias: ModelAlias) {
        self.conversation.model = Some(alias);
        self.persist_state();
        self.sink
            .broadcast(TurnEvent::ModelUpdated { request_id, alias })
            .await;
    }

    async fn handle_new_session(&mut self, request_id: RequestId, client_id: ClientId) {
        if self.busy {
            self.sink
                .send(
                    &client_id,
                    TurnEvent::Error {
                        request_id: Some(request_id),
                        message: EngineError::NewSessionWhileBusy.to_string(),
                    },
                )
                .await;
            return;
        }
        self.conversation.clear_resume_token();
        self.persist_state();
        self.sink
            .send(
                &client_id,
                TurnEvent::StatusNote {
                    request_id: Some(request_id),
                    message: "starting a fresh conversation".to_string(),
                },
            )
            .await;
    }

    async fn handle_turn_completed(&mut self, outcome: TurnOutcome) {
        self.busy = false;
        self.in_flight.remove(&outcome.request.request_id);

        if outcome.ok {
            self.conversation.resume_token = outcome.resume_token.clone();
        }
        self.conversation.last_session = outcome
            .request
            .session_tag
            .clone()
            .or_else(|| self.conversation.last_session.clone());
        self.persist_state();

        let role = if outcome.ok {
            HistoryRole::Assistant
        } else {
            HistoryRole::Error
        };
        let entry = HistoryEntry::new(role, outcome.assistant_text.clone(), self.clock.now())
            .with_session(outcome.request.session_tag.clone());
        if let Err(err) = self.history.append(&entry) {
            warn!(error = %err, "failed to append assistant/error history entry");
        }

        self.sink
            .send(
                &outcome.request.client_id,
                TurnEvent::ChatEnd {
                    request_id: outcome.request.request_id,
                    ok: outcome.ok,
                    model: outcome.model,
                },
            )
            .await;

        self.start_next_if_idle().await;
    }

    async fn start_next_if_idle(&mut self) {
        if self.busy {
            return;
        }
        let Some(request) = self.queue.pop_front() else {
            return;
        };
        self.busy = true;

        let user_entry = HistoryEntry::new(HistoryRole::User, request.user_text.clone(), self.clock.now())
            .with_session(request.session_tag.clone());
        if let Err(err) = self.history.append(&user_entry) {
            warn!(error = %err, "failed to append user history entry");
        }

        let queued_ahead = request.queued_ahead;
        let model = self.conversation.model();
        let resume_token = self.conversation.resume_token.clone();
        let last_session = self.conversation.last_session.clone();

        info!(
            request_id = %request.request_id,
            queued_ahead,
            model = model.as_str(),
            "dequeued turn for execution"
        );

        let adapter = self.adapter.clone();
        let sink = self.sink.clone();
        let clock = self.clock.clone();
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let outcome = run_turn(
                request,
                queued_ahead,
                model,
                resume_token,
                last_session,
                adapter,
                sink,
                clock,
            )
            .await;
            let _ = tx.send(ExecutorCommand::TurnCompleted(outcome));
        });
    }

    fn persist_state(&self) {
        if let Err(err) = jj_storage::save_state(&self.state_path, &self.conversation) {
            warn!(error = %err, "failed to persist conversation state");
        }
    }
}

/// Per-attempt event collector: forwards text/tool-use immediately,
/// buffers a structured error that looks stale until the caller decides
/// whether to retry.
struct TurnRun {
    sink: Arc<dyn TurnEventSink>,
    client_id: ClientId,
    request_id: RequestId,
    retryable: bool,
    state: SyncMutex<TurnRunState>,
}

#[derive(Default)]
struct TurnRunState {
    assistant_text: String,
    any_text_emitted: bool,
    had_hard_error: bool,
    stale_buffered: Option<(String, Vec<String>)>,
}

impl TurnRun {
    fn new(sink: Arc<dyn TurnEventSink>, client_id: ClientId, request_id: RequestId, retryable: bool) -> Self {
        Self {
            sink,
            client_id,
            request_id,
            retryable,
            state: SyncMutex::new(TurnRunState::default()),
        }
    }

    fn take_stale_buffered(&self) -> Option<(String, Vec<String>)> {
        self.state.lock().stale_buffered.take()
    }

    fn had_hard_error(&self) -> bool {
        self.state.lock().had_hard_error
    }

    fn assistant_text(&self) -> String {
        self.state.lock().assistant_text.clone()
    }
}

#[async_trait]
impl ModelTurnEvents for TurnRun {
    async fn on_text(&self, fragment: &str) {
        {
            let mut state = self.state.lock();
            state.assistant_text.push_str(fragment);
            state.any_text_emitted = true;
        }
        self.sink
            .send(
                &self.client_id,
                TurnEvent::ChatDelta {
                    request_id: self.request_id.clone(),
                    text: fragment.to_string(),
                },
            )
            .await;
    }

    async fn on_tool_use(&self, name: &str) {
        self.sink
            .send(
                &self.client_id,
                TurnEvent::ToolUse {
                    request_id: self.request_id.clone(),
                    name: name.to_string(),
                },
            )
            .await;
    }

    async fn on_result_error(&self, subtype: &str, errors: &[String]) {
        let any_text_emitted = self.state.lock().any_text_emitted;
        if self.retryable && !any_text_emitted && is_stale_resume_error(errors) {
            self.state.lock().stale_buffered = Some((subtype.to_string(), errors.to_vec()));
            return;
        }
        self.state.lock().had_hard_error = true;
        self.sink
            .send(
                &self.client_id,
                TurnEvent::ResultError {
                    request_id: self.request_id.clone(),
                    subtype: subtype.to_string(),
                    errors: errors.to_vec(),
                },
            )
            .await;
    }

    async fn on_permission_request(&self, tool_name: &str, reason: &str) {
        self.sink
            .send(
                &self.client_id,
                TurnEvent::StatusNote {
                    request_id: Some(self.request_id.clone()),
                    message: format!("permission requested for {tool_name}: {reason}"),
                },
            )
            .await;
    }
}

async fn run_turn(
    request: TurnRequest,
    queued_ahead: usize,
    model: ModelAlias,
    resume_token: Option<String>,
    last_session: Option<String>,
    adapter: Arc<dyn ModelRuntimeAdapter>,
    sink: Arc<dyn TurnEventSink>,
    clock: Arc<dyn Clock>,
) -> TurnOutcome {
    let now = clock.now();
    let (prefix, switch_note) = context_prefix::compose(
        now,
        last_session.as_deref(),
        request.session_tag.as_deref(),
    );
    if let Some(message) = switch_note {
        sink.send(
            &request.client_id,
            TurnEvent::StatusNote {
                request_id: None,
                message,
            },
        )
        .await;
    }
    sink.send(
        &request.client_id,
        TurnEvent::ChatStart {
            request_id: request.request_id.clone(),
            model,
            queued_ahead,
        },
    )
    .await;

    let had_resume_token = resume_token.is_some();
    let first_run = Arc::new(TurnRun::new(
        sink.clone(),
        request.client_id.clone(),
        request.request_id.clone(),
        had_resume_token,
    ));
    let first_input = ChatTurnInput {
        user_text: request.user_text.clone(),
        resume_token: resume_token.clone(),
        model,
        context_prefix: Some(prefix.clone()),
    };
    let first_result = adapter.chat(first_input, first_run.as_ref()).await;

    let stale = first_result.is_ok().then(|| first_run.take_stale_buffered()).flatten();

    let (final_result, final_run, used_resume_token) = if let Some(_stale_error) = stale {
        sink.send(
            &request.client_id,
            TurnEvent::StatusNote {
                request_id: None,
                message: "the previous conversation could not be resumed; starting a fresh one"
                    .to_string(),
            },
        )
        .await;
        let retry_run = Arc::new(TurnRun::new(
            sink.clone(),
            request.client_id.clone(),
            request.request_id.clone(),
            false,
        ));
        let retry_input = ChatTurnInput {
            user_text: request.user_text.clone(),
            resume_token: None,
            model,
            context_prefix: Some(prefix),
        };
        let retry_result = adapter.chat(retry_input, retry_run.as_ref()).await;
        (retry_result, retry_run, None)
    } else {
        (first_result, first_run, resume_token)
    };

    let ok = final_result.is_ok() && !final_run.had_hard_error();
    let resume_token = match &final_result {
        Ok(output) => output.resume_token.clone().or(used_resume_token),
        Err(_) => used_resume_token,
    };
    let assistant_text = match &final_result {
        Ok(_) => final_run.assistant_text(),
        Err(err) => err.to_string(),
    };

    TurnOutcome {
        request,
        assistant_text,
        resume_token,
        ok,
        model,
    }
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
