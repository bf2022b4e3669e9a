//! Boundary behaviors around the history journal: corrupt trailing lines
//! don't abort a snapshot read, and a disconnected client's registration
//! doesn't linger to block a fresh connection under the same client id.

use crate::prelude::*;
use jj_daemon::codec::ServerFrame;

#[tokio::test]
async fn a_corrupt_trailing_line_does_not_abort_the_history_snapshot() {
    let daemon = TestDaemon::spawn().await;

    // Appear, then disappear: establish a real entry before corrupting the
    // file, so the snapshot has something valid to find around the garbage.
    let mut seed = daemon.connect("seed").await;
    seed.chat("r1", "seed", "hi").await;
    seed.drain_turn("r1").await;
    assert!(
        wait_for_async(500, || daemon.history_path().exists()).await,
        "history file never appeared"
    );

    let mut contents = std::fs::read_to_string(daemon.history_path()).expect("read history.jsonl");
    contents.push_str("not json at all\n");
    std::fs::write(daemon.history_path(), contents).expect("append garbage line");

    let mut client = daemon.connect_raw().await;
    let (_, snapshot) = client.register("c2").await;
    let ServerFrame::HistorySnapshot { entries } = snapshot else {
        panic!("expected history_snapshot");
    };
    assert!(
        entries.iter().any(|e| e.text == "hi"),
        "valid entries should survive a corrupt trailing line: {entries:?}"
    );
}

#[tokio::test]
async fn reconnecting_under_the_same_client_id_after_a_disconnect_registers_cleanly() {
    let daemon = TestDaemon::spawn().await;

    {
        let mut first = daemon.connect("c1").await;
        first.chat("r1", "c1", "hi").await;
        first.drain_turn("r1").await;
    } // dropped: socket closes, the daemon should unregister this client

    let mut second = daemon.connect("c1").await;
    second.chat("r2", "c1", "hi again").await;
    let frames = second.drain_turn("r2").await;
    let ServerFrame::ChatEnd { ok, .. } = frames.last().expect("frames") else {
        panic!("expected chat_end");
    };
    assert!(*ok, "a fresh connection under a reused client id should work normally");
}
