//! A resume token the runtime no longer recognizes is retried exactly once
//! with no resume token, transparently to the user: a `status_note` reports
//! the fresh start, no `result_error` frame appears, and the turn still
//! ends `ok`. The new resume token it lands on is persisted and differs
//! from the stale one.

use crate::prelude::*;
use jj_core::ConversationState;
use jj_daemon::codec::ServerFrame;

#[tokio::test]
async fn a_stale_resume_token_is_retried_once_and_the_turn_still_succeeds() {
    let seed = ConversationState {
        resume_token: Some(STALE_RESUME_TOKEN.to_string()),
        ..Default::default()
    };
    let daemon = TestDaemon::spawn_with_seed_state(Some(&seed)).await;
    let mut client = daemon.connect("c1").await;

    client.chat("r1", "c1", "reply with exactly: ok").await;
    let frames = client.drain_turn("r1").await;

    let mut saw_status_note = false;
    for frame in &frames {
        match frame {
            ServerFrame::StatusNote { message } => {
                assert!(
                    message.contains("could not be resumed"),
                    "unexpected status_note: {message}"
                );
                saw_status_note = true;
            }
            ServerFrame::ResultError { .. } => {
                panic!("a stale resume retry must not surface a result_error to the user");
            }
            _ => {}
        }
    }
    assert!(saw_status_note, "expected a status_note about the fresh retry: {frames:?}");

    let ServerFrame::ChatEnd { ok, .. } = frames.last().expect("frames") else {
        panic!("expected chat_end");
    };
    assert!(*ok);

    let contents = std::fs::read_to_string(daemon.state_path()).expect("state.json exists");
    let state: ConversationState = serde_json::from_str(&contents).expect("valid state.json");
    let new_token = state.resume_token.expect("a new resume token should be persisted");
    assert_ne!(new_token, STALE_RESUME_TOKEN);
    assert!(!new_token.is_empty());
}
