//! `set_model alias=A` followed by `set_model alias=A` yields two
//! `model_updated` broadcasts with alias A and is idempotent with respect
//! to state.

use crate::prelude::*;
use jj_core::{ClientId, ModelAlias, RequestId};
use jj_daemon::codec::{ClientFrame, ServerFrame};

#[tokio::test]
async fn repeated_set_model_broadcasts_twice_and_settles_on_the_same_alias() {
    let daemon = TestDaemon::spawn().await;
    let mut client = daemon.connect("c1").await;

    for request_id in ["m1", "m2"] {
        client
            .send(&ClientFrame::SetModel {
                request_id: RequestId::new(request_id),
                client_id: ClientId::new("c1"),
                alias: ModelAlias::Haiku,
            })
            .await;
        let frame = client.recv_timeout().await.expect("model_updated frame");
        let ServerFrame::ModelUpdated { request_id: got_id, alias } = frame else {
            panic!("expected model_updated, got {frame:?}");
        };
        assert_eq!(got_id.as_str(), request_id);
        assert_eq!(alias.as_str(), "haiku");
    }

    assert!(
        wait_for_async(500, || daemon.state_path().exists()).await,
        "state.json never appeared"
    );
    let contents = std::fs::read_to_string(daemon.state_path()).expect("read state.json");
    let state: jj_core::ConversationState = serde_json::from_str(&contents).expect("valid state.json");
    assert_eq!(state.model(), ModelAlias::Haiku);
}
