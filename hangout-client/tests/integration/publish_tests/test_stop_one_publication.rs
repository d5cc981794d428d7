use hangout_client::{LocalTrack, PublisherHandle, SessionEvent, TransportRole};
use hangout_core::{
    ClientMessage, MediaKind, PlayerId, Position, ServerMessage, SessionDescription,
};

use crate::integration::{TestSession, init_tracing, player};

async fn publish_live(session: &mut TestSession, kind: MediaKind) -> PublisherHandle {
    let handle = session.handle.clone();
    let track = LocalTrack::new(kind);
    let publish = tokio::spawn(async move { handle.publish(track).await });

    session
        .expect_sent(|m| matches!(m, ClientMessage::Offer { .. }))
        .await
        .expect("No Offer");
    session
        .deliver(ServerMessage::Answer {
            sdp: SessionDescription::answer("sfu-answer"),
        })
        .await;
    publish
        .await
        .expect("Publish task panicked")
        .expect("Publish failed")
}

#[tokio::test]
async fn test_stop_one_publication() {
    init_tracing();

    let mut session = TestSession::start();
    session
        .join("A", vec![player("A", "Al", Position::ORIGIN)])
        .await
        .expect("Join failed");

    let mic = publish_live(&mut session, MediaKind::Audio).await;
    let camera = publish_live(&mut session, MediaKind::Video).await;

    session.handle.stop(&mic).await.expect("Stop failed");
    let stop = session
        .expect_sent(|m| matches!(m, ClientMessage::StopPublish { .. }))
        .await
        .expect("No StopPublish");
    assert_eq!(
        stop,
        ClientMessage::StopPublish {
            publisher_id: mic.publisher_id.clone()
        }
    );

    // Stopping again changes nothing.
    session.handle.stop(&mic).await.expect("Second stop failed");
    session.handle.chat("sync").await.expect("Chat failed");
    session
        .expect_sent(|m| matches!(m, ClientMessage::ChatMessage { .. }))
        .await
        .expect("No chat");

    assert_eq!(
        session
            .signaling
            .count(|m| matches!(m, ClientMessage::StopPublish { .. }))
            .await,
        1
    );

    let publisher = session
        .factory
        .latest(TransportRole::Publisher)
        .await
        .expect("No publisher transport");
    let state = publisher.state().await;
    assert_eq!(state.removed, vec![mic.publisher_id.clone()]);
    assert!(!state.removed.contains(&camera.publisher_id));
    assert!(!state.closed);
}

#[tokio::test]
async fn test_late_echo_of_stopped_publication() {
    init_tracing();

    let mut session = TestSession::start();
    session
        .join("A", vec![player("A", "Al", Position::ORIGIN)])
        .await
        .expect("Join failed");

    let mic = publish_live(&mut session, MediaKind::Audio).await;
    session.handle.stop(&mic).await.expect("Stop failed");
    session
        .expect_sent(|m| matches!(m, ClientMessage::StopPublish { .. }))
        .await
        .expect("No StopPublish");

    // The announcement of the stopped publication arrives after the stop.
    session
        .deliver(ServerMessage::Published {
            publisher_ids: vec![mic.publisher_id.clone()],
            player_id: PlayerId::from("A"),
        })
        .await;
    session
        .deliver(ServerMessage::ChatMessage {
            sender: "A".to_owned(),
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
            .count(|m| matches!(m, ClientMessage::Subscribe { .. }))
            .await,
        0
    );
}

#[tokio::test]
async fn test_stop_before_answer() {
    init_tracing();

    let mut session = TestSession::start();
    let handle = session.handle.clone();
    let track = LocalTrack::new(MediaKind::Audio);
    let publisher_id = track.id().clone();
    let publish = tokio::spawn(async move { handle.publish(track).await });

    session
        .expect_sent(|m| matches!(m, ClientMessage::Offer { .. }))
        .await
        .expect("No Offer");

    let pending = PublisherHandle {
        publisher_id,
        kind: MediaKind::Audio,
    };
    session.handle.stop(&pending).await.expect("Stop failed");

    let result = publish.await.expect("Publish task panicked");
    assert!(result.is_err());
    // Never announced, so nothing to withdraw.
    assert_eq!(
        session
            .signaling
            .count(|m| matches!(m, ClientMessage::StopPublish { .. }))
            .await,
        0
    );
}
