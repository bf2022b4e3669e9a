//! A frame other than `register_client` sent before registration yields
//! exactly one `error` frame and the connection stays open for a correct
//! registration to follow.

use crate::prelude::*;
use jj_core::{ClientId, RequestId};
use jj_daemon::codec::{ClientFrame, ServerFrame};

#[tokio::test]
async fn chat_request_before_registration_yields_one_error_frame_and_the_connection_survives() {
    let daemon = TestDaemon::spawn().await;
    let mut client = daemon.connect_raw().await;

    client.chat("r1", "c1", "hi").await;

    let frame = client.recv_timeout().await.expect("error frame");
    let ServerFrame::Error { message, .. } = frame else {
        panic!("expected error, got {frame:?}");
    };
    assert!(message.contains("register_client"), "message: {message}");

    let (registered, snapshot) = client.register("c1").await;
    assert!(matches!(registered, ServerFrame::Registered { .. }));
    assert!(matches!(snapshot, ServerFrame::HistorySnapshot { .. }));
}

#[tokio::test]
async fn ping_before_registration_also_yields_one_error_frame() {
    let daemon = TestDaemon::spawn().await;
    let mut client = daemon.connect_raw().await;

    client
        .send(&ClientFrame::Ping {
            request_id: RequestId::new("p1"),
            client_id: ClientId::new("c1"),
        })
        .await;

    let frame = client.recv_timeout().await.expect("error frame");
    assert!(matches!(frame, ServerFrame::Error { .. }));
}
