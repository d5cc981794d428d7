use hangout_client::SessionEvent;
use hangout_core::{PlayerId, Position};

use crate::integration::{TestSession, init_tracing, player};

#[tokio::test]
async fn test_room_state_identity() {
    init_tracing();

    let mut session = TestSession::start();
    session
        .join(
            "A",
            vec![
                player("B", "Bo", Position::new(2.0, 0.0, 0.0)),
                player("A", "Al", Position::ORIGIN),
            ],
        )
        .await
        .expect("Join failed");

    let joined = session
        .expect_event(|e| matches!(e, SessionEvent::RoomJoined { .. }))
        .await
        .expect("No RoomJoined event");
    match joined {
        SessionEvent::RoomJoined {
            local_player_id,
            room_theme,
        } => {
            assert_eq!(local_player_id, PlayerId::from("A"));
            assert_eq!(room_theme, "music-lounge");
        }
        other => panic!("unexpected {other:?}"),
    }

    let snapshot = session.view.snapshot();
    let local = snapshot.local().expect("No local player");
    assert_eq!(local.id, PlayerId::from("A"));
    assert_eq!(snapshot.players.iter().filter(|p| p.is_local).count(), 1);

    let remotes: Vec<&PlayerId> = snapshot.remote_players().map(|p| &p.id).collect();
    assert_eq!(remotes, vec![&PlayerId::from("B")]);
    assert!(snapshot.connected);
}

#[tokio::test]
async fn test_room_state_ice_servers_reach_transports() {
    init_tracing();

    let mut session = TestSession::start();
    session
        .deliver(hangout_core::ServerMessage::RoomState {
            your_player_id: PlayerId::from("A"),
            players: vec![player("A", "Al", Position::ORIGIN)],
            room_theme: "cinema".to_owned(),
            ice_servers: vec![hangout_core::IceServerConfig {
                urls: vec!["turn:relay.example.org:3478".to_owned()],
                username: Some("user".to_owned()),
                credential: Some("secret".to_owned()),
            }],
        })
        .await;

    let subscriber = session
        .wait_for_transport(hangout_client::TransportRole::Subscriber, 1)
        .await
        .expect("Subscriber not created");
    let state = subscriber.state().await;
    assert_eq!(state.ice_servers.len(), 1);
    assert_eq!(state.ice_servers[0].username.as_deref(), Some("user"));
}
