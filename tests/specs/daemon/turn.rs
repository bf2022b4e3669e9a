//! Scenario: happy-path turn. `c1` registers, sends one `chat_request`, and
//! observes `chat_start` -> >=1 `chat_delta` -> `chat_end`. The history
//! journal gains one `user` entry and one `assistant` entry in that order.

use crate::prelude::*;
use jj_core::HistoryRole;
use jj_daemon::codec::ServerFrame;

#[tokio::test]
async fn happy_path_turn_streams_start_delta_end_and_persists_history() {
    let daemon = TestDaemon::spawn().await;
    let mut client = daemon.connect("c1").await;

    client.chat("r1", "c1", "hi").await;
    let frames = client.drain_turn("r1").await;

    let ServerFrame::ChatStart { request_id, model, queued_ahead } = &frames[0] else {
        panic!("expected chat_start first, got {:?}", frames[0]);
    };
    assert_eq!(request_id.as_str(), "r1");
    assert_eq!(model.as_str(), "opus");
    assert_eq!(*queued_ahead, 0);

    let delta_count = frames
        .iter()
        .filter(|f| matches!(f, ServerFrame::ChatDelta { request_id, .. } if request_id.as_str() == "r1"))
        .count();
    assert!(delta_count >= 1, "expected at least one chat_delta, got frames: {frames:?}");

    let ServerFrame::ChatEnd { request_id, ok, model } = frames.last().expect("at least one frame") else {
        panic!("expected chat_end last, got {:?}", frames.last());
    };
    assert_eq!(request_id.as_str(), "r1");
    assert!(*ok);
    assert_eq!(model.as_str(), "opus");

    assert!(
        wait_for_async(500, || daemon.history_path().exists()).await,
        "history file never appeared"
    );
    let entries = read_history_lines(daemon.history_path());
    assert_eq!(entries.len(), 2, "expected a user entry and an assistant entry: {entries:?}");
    assert_eq!(entries[0].role, HistoryRole::User);
    assert_eq!(entries[0].text, "hi");
    assert_eq!(entries[1].role, HistoryRole::Assistant);
}

#[tokio::test]
async fn a_turn_with_no_prior_resume_token_starts_without_one() {
    let daemon = TestDaemon::spawn().await;
    let mut client = daemon.connect("c1").await;

    client.chat("r1", "c1", "hi").await;
    let frames = client.drain_turn("r1").await;
    let ServerFrame::ChatEnd { ok, .. } = frames.last().expect("frames") else {
        panic!("expected chat_end");
    };
    assert!(*ok);

    let state = std::fs::read_to_string(daemon.state_path()).expect("state.json exists");
    let state: jj_core::ConversationState = serde_json::from_str(&state).expect("valid state.json");
    assert!(state.resume_token.is_some(), "a successful turn should persist a resume token");
}
