//! Scenario: two clients, two requests. `c2`'s `chat_start` reports one
//! request queued ahead of it and arrives only after `c1`'s `chat_end`.
//! Deltas for one request are never observed on the other client's
//! connection, because each client only ever reads its own socket.

use crate::prelude::*;
use jj_daemon::codec::ServerFrame;

#[tokio::test]
async fn second_requests_chat_start_reports_one_queued_ahead_after_the_first_completes() {
    let daemon = TestDaemon::spawn().await;
    let mut c1 = daemon.connect("c1").await;
    let mut c2 = daemon.connect("c2").await;

    c1.chat("r1", "c1", delay_marker(150)).await;
    c2.chat("r2", "c2", "hi").await;

    let c2_frames = c2.drain_turn("r2").await;
    let ServerFrame::ChatStart { queued_ahead, .. } = &c2_frames[0] else {
        panic!("expected chat_start first on c2, got {:?}", c2_frames[0]);
    };
    assert_eq!(*queued_ahead, 1);

    let c1_frames = c1.drain_turn("r1").await;
    let ServerFrame::ChatEnd { ok: c1_ok, .. } = c1_frames.last().expect("c1 frames") else {
        panic!("expected c1 chat_end");
    };
    assert!(*c1_ok);

    for frame in &c2_frames {
        if let ServerFrame::ChatDelta { request_id, .. } = frame {
            assert_eq!(request_id.as_str(), "r2", "c2 must never see r1's deltas");
        }
    }
}
