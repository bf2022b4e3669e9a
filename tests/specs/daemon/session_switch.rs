//! Switching the multiplexer session tag between one turn and the next
//! emits a `status_note` naming the old and new session before the next
//! turn's `chat_start`.

use crate::prelude::*;
use jj_daemon::codec::ServerFrame;

#[tokio::test]
async fn switching_session_between_turns_emits_a_status_note_naming_both() {
    let daemon = TestDaemon::spawn().await;
    let mut client = daemon.connect("c1").await;

    client.chat_in_session("r1", "c1", "hi", "A").await;
    client.drain_turn("r1").await;

    client.chat_in_session("r2", "c1", "hi again", "B").await;

    let frame = client.recv_timeout().await.expect("frame after session switch");
    let ServerFrame::StatusNote { message } = frame else {
        panic!("expected status_note before chat_start, got {frame:?}");
    };
    assert_eq!(message, "session switched: A -> B");

    let frames = client.drain_turn("r2").await;
    assert!(matches!(frames[0], ServerFrame::ChatStart { .. }));
}
