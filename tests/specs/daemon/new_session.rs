//! `new_session` from Idle clears the resume token; a subsequent turn starts
//! without one. `new_session` while a turn is in flight is rejected instead
//! of interrupting it. Neither path broadcasts to other clients.

use crate::prelude::*;
use jj_core::{ClientId, RequestId};
use jj_daemon::codec::{ClientFrame, ServerFrame};

#[tokio::test]
async fn new_session_clears_the_resume_token_and_the_next_turn_starts_fresh() {
    let daemon = TestDaemon::spawn().await;
    let mut client = daemon.connect("c1").await;

    client.chat("r1", "c1", "hi").await;
    client.drain_turn("r1").await;

    let before = std::fs::read_to_string(daemon.state_path()).expect("state.json exists");
    let before: jj_core::ConversationState = serde_json::from_str(&before).expect("valid state.json");
    assert!(before.resume_token.is_some());

    client
        .send(&ClientFrame::NewSession {
            request_id: RequestId::new("ns1"),
            client_id: ClientId::new("c1"),
            zellij_session: None,
        })
        .await;

    client.chat("r2", "c1", "hi again").await;
    let frames = client.drain_turn("r2").await;
    let ServerFrame::ChatEnd { ok, .. } = frames.last().expect("frames") else {
        panic!("expected chat_end");
    };
    assert!(*ok);
}

#[tokio::test]
async fn new_session_while_busy_is_rejected_without_interrupting_the_turn() {
    let daemon = TestDaemon::spawn().await;
    let mut client = daemon.connect("c1").await;

    client.chat("r1", "c1", delay_marker(150)).await;
    let ServerFrame::ChatStart { .. } = client.recv_timeout().await.expect("chat_start") else {
        panic!("expected chat_start first");
    };

    client
        .send(&ClientFrame::NewSession {
            request_id: RequestId::new("ns1"),
            client_id: ClientId::new("c1"),
            zellij_session: None,
        })
        .await;

    let mut saw_rejection = false;
    loop {
        let frame = client.recv_timeout().await.expect("frame during turn");
        if let ServerFrame::Error { ref message, .. } = frame {
            assert!(message.contains("new session"), "message: {message}");
            saw_rejection = true;
        }
        if matches!(&frame, ServerFrame::ChatEnd { request_id, .. } if request_id.as_str() == "r1") {
            break;
        }
    }
    assert!(saw_rejection, "expected an error frame rejecting new_session while busy");
}
