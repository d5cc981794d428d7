use hangout_client::SessionEvent;
use hangout_core::{
    ClientMessage, MediaKind, PlayerId, Position, PublisherId, ServerMessage, SubscriberId,
};

use crate::integration::{TestSession, init_tracing, player};

#[tokio::test]
async fn test_unpublished_stops_subscription() {
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

    session
        .deliver(ServerMessage::Unpublished {
            publisher_id: PublisherId::from("b-audio"),
        })
        .await;

    let stop = session
        .expect_sent(|m| matches!(m, ClientMessage::StopSubscribe { .. }))
        .await
        .expect("No StopSubscribe sent");
    assert_eq!(
        stop,
        ClientMessage::StopSubscribe {
            subscriber_id: SubscriberId::from("sub-1")
        }
    );
    let released = session
        .expect_event(|e| matches!(e, SessionEvent::TrackReleased(_)))
        .await
        .expect("No TrackReleased");
    let SessionEvent::TrackReleased(released) = released else {
        unreachable!()
    };
    assert_eq!(released.publisher_id, PublisherId::from("b-audio"));
    assert!(session.view.snapshot().bindings.is_empty());
}

#[tokio::test]
async fn test_subscribe_failure_is_reported() {
    init_tracing();

    let mut session = TestSession::start();
    session
        .join("A", vec![player("A", "Al", Position::ORIGIN)])
        .await
        .expect("Join failed");

    session
        .deliver(ServerMessage::Published {
            publisher_ids: vec![PublisherId::from("gone")],
            player_id: PlayerId::from("B"),
        })
        .await;
    session
        .deliver(ServerMessage::SubscribeFailed {
            publisher_id: PublisherId::from("gone"),
            error: "publisher not found".to_owned(),
        })
        .await;

    let failed = session
        .expect_event(|e| matches!(e, SessionEvent::SubscribeFailed { .. }))
        .await
        .expect("No SubscribeFailed event");
    match failed {
        SessionEvent::SubscribeFailed {
            publisher_id,
            reason,
        } => {
            assert_eq!(publisher_id, PublisherId::from("gone"));
            assert_eq!(reason, "publisher not found");
        }
        other => panic!("unexpected {other:?}"),
    }
}
