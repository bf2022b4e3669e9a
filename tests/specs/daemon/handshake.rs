//! For every `register_client` a well-formed client receives, exactly one
//! `registered` and exactly one `history_snapshot` precede any other frame
//! targeted to that client.

use crate::prelude::*;
use jj_daemon::codec::ServerFrame;

#[tokio::test]
async fn register_client_yields_registered_then_history_snapshot() {
    let daemon = TestDaemon::spawn().await;

    let mut client = daemon.connect_raw().await;
    let (registered, snapshot) = client.register("c1").await;

    match &registered {
        ServerFrame::Registered { client_id, busy, model, .. } => {
            assert_eq!(client_id.as_str(), "c1");
            assert!(!busy);
            assert_eq!(model.as_str(), "opus");
        }
        other => panic!("expected registered, got {other:?}"),
    }
    assert!(matches!(snapshot, ServerFrame::HistorySnapshot { ref entries } if entries.is_empty()));
}

#[tokio::test]
async fn a_fresh_conversation_has_an_empty_history_snapshot() {
    let daemon = TestDaemon::spawn().await;
    let mut client = daemon.connect_raw().await;
    let (_, snapshot) = client.register("c1").await;
    let ServerFrame::HistorySnapshot { entries } = snapshot else {
        panic!("expected history_snapshot");
    };
    assert!(entries.is_empty());
}
