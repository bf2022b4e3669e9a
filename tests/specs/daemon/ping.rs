//! A `ping` with request id X always yields exactly one `pong` with
//! request id X and the current daemon pid.

use crate::prelude::*;
use jj_core::{ClientId, RequestId};
use jj_daemon::codec::{ClientFrame, ServerFrame};

#[tokio::test]
async fn ping_yields_one_pong_with_the_same_request_id_and_the_daemon_pid() {
    let daemon = TestDaemon::spawn().await;
    let mut client = daemon.connect("c1").await;

    client
        .send(&ClientFrame::Ping {
            request_id: RequestId::new("p1"),
            client_id: ClientId::new("c1"),
        })
        .await;

    let frame = client.recv_timeout().await.expect("pong frame");
    let ServerFrame::Pong { request_id, daemon_pid } = frame else {
        panic!("expected pong, got {frame:?}");
    };
    assert_eq!(request_id.as_str(), "p1");
    assert_eq!(daemon_pid, daemon.pid());
}
