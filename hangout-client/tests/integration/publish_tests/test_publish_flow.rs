use hangout_client::{LocalTrack, SessionEvent, TransportRole};
use hangout_core::{ClientMessage, MediaKind, Position, ServerMessage, SessionDescription};

use crate::integration::{TestSession, init_tracing, player};

#[tokio::test]
async fn test_publish_flow() {
    init_tracing();

    let mut session = TestSession::start();
    session
        .join("A", vec![player("A", "Al", Position::ORIGIN)])
        .await
        .expect("Join failed");

    let track = LocalTrack::new(MediaKind::Audio);
    let publisher_id = track.id().clone();
    let handle = session.handle.clone();
    let publish = tokio::spawn(async move { handle.publish(track).await });

    let relevant = |m: &ClientMessage| {
        matches!(
            m,
            ClientMessage::PublisherInit | ClientMessage::Offer { .. } | ClientMessage::Publish { .. }
        )
    };
    let first = session.expect_sent(relevant).await.expect("Nothing sent");
    assert_eq!(first, ClientMessage::PublisherInit);
    let second = session.expect_sent(relevant).await.expect("No Offer");
    assert!(matches!(second, ClientMessage::Offer { .. }));

    // Not announced before the answer arrives.
    assert_eq!(
        session
            .signaling
            .count(|m| matches!(m, ClientMessage::Publish { .. }))
            .await,
        0
    );

    session
        .deliver(ServerMessage::Answer {
            sdp: SessionDescription::answer("sfu-answer"),
        })
        .await;
    let third = session.expect_sent(relevant).await.expect("No Publish");
    assert_eq!(
        third,
        ClientMessage::Publish {
            publisher_id: publisher_id.clone()
        }
    );

    let published = publish
        .await
        .expect("Publish task panicked")
        .expect("Publish failed");
    assert_eq!(published.publisher_id, publisher_id);
    assert_eq!(published.kind, MediaKind::Audio);

    session
        .expect_event(|e| matches!(e, SessionEvent::PublicationLive(h) if h.publisher_id == publisher_id))
        .await
        .expect("No PublicationLive");

    let publisher = session
        .factory
        .latest(TransportRole::Publisher)
        .await
        .expect("No publisher transport");
    let state = publisher.state().await;
    assert_eq!(state.added, vec![publisher_id]);
    assert_eq!(state.answers_applied.len(), 1);

    let snapshot = session.view.snapshot();
    assert_eq!(snapshot.audio, hangout_client::AudioContextState::Running);
}

#[tokio::test]
async fn test_duplicate_publish_rejected() {
    init_tracing();

    let mut session = TestSession::start();
    let track = LocalTrack::new(MediaKind::Video);

    let handle = session.handle.clone();
    let first = track.clone();
    let publish = tokio::spawn(async move { handle.publish(first).await });
    session
        .expect_sent(|m| matches!(m, ClientMessage::Offer { .. }))
        .await
        .expect("No Offer");

    let again = session.handle.publish(track).await;
    assert!(again.is_err());

    session
        .deliver(ServerMessage::Answer {
            sdp: SessionDescription::answer("sfu-answer"),
        })
        .await;
    publish
        .await
        .expect("Publish task panicked")
        .expect("First publish failed");
}
