use std::sync::Arc;
use std::time::Duration;

use hangout_client::{ClientConfig, SampleDevices, Session, SessionEvent, TransportRole};
use hangout_core::{ClientMessage, JoinRequest, PlayerId, Position, ServerMessage};

use crate::integration::{WAIT_TIMEOUT_MS, init_tracing, player};
use crate::utils::{MockTransportFactory, ServerFrame, TestSignalingServer};

#[tokio::test]
async fn test_session_over_websocket() {
    init_tracing();

    let mut server = TestSignalingServer::start(true)
        .await
        .expect("Failed to start server");
    let factory = MockTransportFactory::new();
    let config = ClientConfig::new(server.endpoint(), JoinRequest::new("tester", "testing"));

    let (handle, mut view, mut events) = Session::connect(
        config,
        Arc::new(factory.clone()),
        Arc::new(SampleDevices::all()),
    )
    .await
    .expect("Failed to connect");

    let room_state = ServerMessage::RoomState {
        your_player_id: PlayerId::from("A"),
        players: vec![
            player("A", "Al", Position::ORIGIN),
            player("B", "Bo", Position::new(4.0, 0.0, 0.0)),
        ],
        room_theme: "music-lounge".to_owned(),
        ice_servers: vec![],
    };
    while !server.push(ServerFrame::Json(room_state.clone())).await {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let init = server
        .next_received(WAIT_TIMEOUT_MS)
        .await
        .expect("Server got nothing");
    assert_eq!(init, ClientMessage::SubscriberInit);

    let snapshot = tokio::time::timeout(Duration::from_millis(WAIT_TIMEOUT_MS), async {
        loop {
            let snapshot = view.snapshot();
            if snapshot.local_player_id.is_some() || !view.changed().await {
                return snapshot;
            }
        }
    })
    .await
    .expect("Room never populated");
    assert!(factory.latest(TransportRole::Subscriber).await.is_some());
    assert_eq!(snapshot.local_player_id, Some(PlayerId::from("A")));
    assert_eq!(snapshot.remote_players().count(), 1);

    handle.leave().await.expect("Leave failed");
    let disconnected = tokio::time::timeout(Duration::from_millis(WAIT_TIMEOUT_MS), async {
        while let Some(event) = events.recv().await {
            if let SessionEvent::Disconnected(reason) = event {
                return Some(reason);
            }
        }
        None
    })
    .await
    .expect("No Disconnected event");
    assert_eq!(
        disconnected,
        Some(hangout_client::DisconnectReason::ClosedLocally)
    );
}
