// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::ExecutorSnapshot;
use jj_adapters::{FakeModelRuntimeAdapter, FakeMultiplexerAdapter, ScriptedTurn};
use jj_adapters::multiplexer::fake::MultiplexerErrorKind;
use jj_core::{FakeClock, PaneSnapshot, TabSnapshot};
use serde_json::json;

#[derive(Default)]
struct RecordingSink {
    events: parking_lot::Mutex<Vec<TurnEvent>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<TurnEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl TurnEventSink for RecordingSink {
    async fn send(&self, _client_id: &jj_core::ClientId, event: TurnEvent) {
        self.events.lock().push(event);
    }
    async fn broadcast(&self, event: TurnEvent) {
        self.events.lock().push(event);
    }
}

fn probe(
    multiplexer: Arc<FakeMultiplexerAdapter>,
    model: Arc<FakeModelRuntimeAdapter>,
    sink: Arc<RecordingSink>,
) -> HeartbeatProbe {
    probe_with_executor(multiplexer, model, sink, executor_tx(false))
}

fn probe_with_executor(
    multiplexer: Arc<FakeMultiplexerAdapter>,
    model: Arc<FakeModelRuntimeAdapter>,
    sink: Arc<RecordingSink>,
    executor_tx: mpsc::UnboundedSender<ExecutorCommand>,
) -> HeartbeatProbe {
    HeartbeatProbe::new(
        multiplexer,
        model,
        Arc::new(FakeClock::default()),
        sink,
        executor_tx,
    )
}

/// An executor command channel with nobody driving turns, answering every
/// `Query` with a fixed busy flag.
fn executor_tx(busy: bool) -> mpsc::UnboundedSender<ExecutorCommand> {
    let (tx, mut rx) = mpsc::unbounded_channel::<ExecutorCommand>();
    tokio::spawn(async move {
        while let Some(cmd) = rx.recv().await {
            if let ExecutorCommand::Query { reply } = cmd {
                let _ = reply.send(ExecutorSnapshot {
                    busy,
                    ..ExecutorSnapshot::default()
                });
            }
        }
    });
    tx
}

fn env(session: &str) -> EnvironmentContext {
    EnvironmentContext {
        session_name: Some(session.to_string()),
        multiplexer_env: None,
    }
}

#[tokio::test]
async fn unknown_sessions_are_never_probed() {
    let multiplexer = Arc::new(FakeMultiplexerAdapter::new());
    let model = Arc::new(FakeModelRuntimeAdapter::new());
    let sink = Arc::new(RecordingSink::default());
    let probe = probe(multiplexer.clone(), model, sink);

    probe.tick().await;
    assert!(multiplexer.calls().is_empty());
}

#[tokio::test]
async fn a_busy_executor_skips_the_entire_round() {
    let multiplexer = Arc::new(FakeMultiplexerAdapter::new());
    let model = Arc::new(FakeModelRuntimeAdapter::new());
    let sink = Arc::new(RecordingSink::default());
    let probe = probe_with_executor(multiplexer.clone(), model, sink, executor_tx(true));
    probe.observe_session(env("main"));
    multiplexer.push_ok(json!({"tabs": [], "panes": []}));

    probe.tick().await;

    assert!(multiplexer.calls().is_empty());
}

#[tokio::test]
async fn repeated_failures_cross_the_threshold_exactly_once() {
    let multiplexer = Arc::new(FakeMultiplexerAdapter::new());
    let model = Arc::new(FakeModelRuntimeAdapter::new());
    let sink = Arc::new(RecordingSink::default());
    let probe = probe(multiplexer.clone(), model, sink.clone());
    probe.observe_session(env("main"));

    for _ in 0..HEARTBEAT_FAILURE_THRESHOLD {
        multiplexer.push_error(MultiplexerErrorKind::Timeout);
        probe.tick().await;
    }

    let unreachable_notes: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, TurnEvent::StatusNote { message, .. } if message.contains("unreachable") || message.contains("has not responded")))
        .collect();
    assert_eq!(unreachable_notes.len(), 1);
}

#[tokio::test]
async fn a_success_resets_the_failure_counter() {
    let multiplexer = Arc::new(FakeMultiplexerAdapter::new());
    let model = Arc::new(FakeModelRuntimeAdapter::new());
    let sink = Arc::new(RecordingSink::default());
    let probe = probe(multiplexer.clone(), model, sink.clone());
    probe.observe_session(env("main"));

    multiplexer.push_error(MultiplexerErrorKind::Timeout);
    probe.tick().await;
    multiplexer.push_ok(json!({"tabs": [], "panes": []}));
    probe.tick().await;

    for _ in 0..HEARTBEAT_FAILURE_THRESHOLD - 1 {
        multiplexer.push_error(MultiplexerErrorKind::Timeout);
        probe.tick().await;
    }

    let unreachable_notes = sink
        .events()
        .into_iter()
        .filter(|e| matches!(e, TurnEvent::StatusNote { message, .. } if message.contains("has not responded")))
        .count();
    assert_eq!(unreachable_notes, 0);
}

#[tokio::test]
async fn a_default_named_tab_triggers_a_rename_suggestion() {
    let multiplexer = Arc::new(FakeMultiplexerAdapter::new());
    let model = Arc::new(FakeModelRuntimeAdapter::new());
    let sink = Arc::new(RecordingSink::default());
    let probe = probe(multiplexer.clone(), model.clone(), sink);
    probe.observe_session(env("main"));

    let snapshot = json!({
        "tabs": [{"position": 0, "name": "Tab #1", "is_active": true, "selectable_pane_count": 1}],
        "panes": [{"id": 1, "tab_index": 0, "title": "shell", "command": "vim", "is_plugin": false, "is_floating": false, "is_suppressed": false, "exited": false}],
    });
    multiplexer.push_ok(snapshot.clone());
    model.push(ScriptedTurn::Text {
        fragments: vec!["editing".to_string()],
        resume_token: None,
    });
    multiplexer.push_ok(snapshot);

    probe.tick().await;

    let calls = multiplexer.calls();
    assert!(calls.iter().any(|op| matches!(
        op,
        jj_adapters::PipeOp::RenameTab { name, .. } if name == "editing"
    )));
}

#[tokio::test]
async fn a_tab_renamed_during_the_round_trip_is_left_alone() {
    let multiplexer = Arc::new(FakeMultiplexerAdapter::new());
    let model = Arc::new(FakeModelRuntimeAdapter::new());
    let sink = Arc::new(RecordingSink::default());
    let probe = probe(multiplexer.clone(), model.clone(), sink);
    probe.observe_session(env("main"));

    let default_tab = TabSnapshot {
        position: 0,
        name: "Tab #1".to_string(),
        is_active: true,
        selectable_pane_count: 1,
    };
    let pane = PaneSnapshot {
        id: 1,
        tab_index: 0,
        title: "shell".to_string(),
        command: Some("vim".to_string()),
        is_plugin: false,
        is_floating: false,
        is_suppressed: false,
        exited: false,
    };
    let first = WorkspaceSnapshot {
        tabs: vec![default_tab],
        panes: vec![pane],
    };
    let renamed = WorkspaceSnapshot {
        tabs: vec![TabSnapshot {
            position: 0,
            name: "editor".to_string(),
            is_active: true,
            selectable_pane_count: 1,
        }],
        panes: vec![],
    };
    multiplexer.push_ok(serde_json::to_value(&first).unwrap());
    model.push(ScriptedTurn::Text {
        fragments: vec!["editing".to_string()],
        resume_token: None,
    });
    multiplexer.push_ok(serde_json::to_value(&renamed).unwrap());

    probe.tick().await;

    let calls = multiplexer.calls();
    assert!(!calls
        .iter()
        .any(|op| matches!(op, jj_adapters::PipeOp::RenameTab { .. })));
}
