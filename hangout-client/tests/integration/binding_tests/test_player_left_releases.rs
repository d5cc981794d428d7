use hangout_client::{RoomChange, SessionEvent};
use hangout_core::{
    ClientMessage, MediaKind, PlayerId, Position, PublisherId, ServerMessage, SubscriberId,
};

use crate::integration::{TestSession, init_tracing, player};

#[tokio::test]
async fn test_player_left_releases() {
    init_tracing();

    let mut session = TestSession::start();
    let subscriber = session
        .join(
            "A",
            vec![
                player("A", "Al", Position::ORIGIN),
                player("B", "Bo", Position::new(1.0, 0.0, 0.0)),
            ],
        )
        .await
        .expect("Join failed");

    session
        .deliver(ServerMessage::Published {
            publisher_ids: vec![PublisherId::from("b-audio"), PublisherId::from("b-video")],
            player_id: PlayerId::from("B"),
        })
        .await;
    subscriber.track_ready("b-audio", MediaKind::Audio).await;
    subscriber.track_ready("b-video", MediaKind::Video).await;
    session
        .expect_snapshot(|s| s.bindings.len() == 2)
        .await
        .expect("Tracks not bound");

    // B vanishes without unpublishing first.
    session
        .deliver(ServerMessage::PlayerLeft {
            player_id: PlayerId::from("B"),
        })
        .await;

    session
        .expect_event(|e| matches!(e, SessionEvent::Room(RoomChange::Removed(id)) if id.as_str() == "B"))
        .await
        .expect("No Removed event");
    let mut released = Vec::new();
    for _ in 0..2 {
        let event = session
            .expect_event(|e| matches!(e, SessionEvent::TrackReleased(_)))
            .await
            .expect("Missing TrackReleased");
        if let SessionEvent::TrackReleased(r) = event {
            assert_eq!(r.owner_player_id, Some(PlayerId::from("B")));
            released.push(r.publisher_id);
        }
    }
    released.sort();
    assert_eq!(
        released,
        vec![PublisherId::from("b-audio"), PublisherId::from("b-video")]
    );

    let snapshot = session
        .expect_snapshot(|s| s.bindings.is_empty())
        .await
        .expect("Bindings not cleared");
    assert!(snapshot.player(&PlayerId::from("B")).is_none());
}

#[tokio::test]
async fn test_player_left_stops_subscription() {
    init_tracing();

    let mut session = TestSession::start();
    let subscriber = session
        .join(
            "A",
            vec![
                player("A", "Al", Position::ORIGIN),
                player("B", "Bo", Position::ORIGIN),
            ],
        )
        .await
        .expect("Join failed");

    session
        .deliver(ServerMessage::Published {
            publisher_ids: vec![PublisherId::from("b-audio")],
            player_id: PlayerId::from("B"),
        })
        .await;
    session
        .expect_sent(|m| matches!(m, ClientMessage::Subscribe { .. }))
        .await
        .expect("No Subscribe sent");
    session
        .deliver(ServerMessage::Subscribed {
            subscriber_id: SubscriberId::from("sub-1"),
        })
        .await;
    subscriber.track_ready("b-audio", MediaKind::Audio).await;
    session
        .expect_event(|e| matches!(e, SessionEvent::TrackBound(_)))
        .await
        .expect("No TrackBound");

    // The server announces the departure first and unpublishes later.
    session
        .deliver(ServerMessage::PlayerLeft {
            player_id: PlayerId::from("B"),
        })
        .await;
    let stop = session
        .expect_sent(|m| matches!(m, ClientMessage::StopSubscribe { .. }))
        .await
        .expect("No StopSubscribe after PlayerLeft");
    assert_eq!(
        stop,
        ClientMessage::StopSubscribe {
            subscriber_id: SubscriberId::from("sub-1")
        }
    );

    session
        .deliver(ServerMessage::Unpublished {
            publisher_id: PublisherId::from("b-audio"),
        })
        .await;
    session
        .deliver(ServerMessage::ChatMessage {
            sender: "C".to_owned(),
            message: "sync".to_owned(),
        })
        .await;
    session
        .expect_event(|e| matches!(e, SessionEvent::Chat { .. }))
        .await
        .expect("No chat event");

    assert_eq!(
        session
            .signaling
            .count(|m| matches!(m, ClientMessage::StopSubscribe { .. }))
            .await,
        1
    );
}
