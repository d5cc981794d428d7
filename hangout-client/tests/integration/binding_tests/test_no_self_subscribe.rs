use hangout_client::LocalTrack;
use hangout_core::{ClientMessage, MediaKind, PlayerId, Position, PublisherId, ServerMessage, SessionDescription};

use crate::integration::{TestSession, init_tracing, player};

#[tokio::test]
async fn test_no_self_subscribe() {
    init_tracing();

    let mut session = TestSession::start();
    session
        .join("A", vec![player("A", "Al", Position::ORIGIN)])
        .await
        .expect("Join failed");

    let track = LocalTrack::new(MediaKind::Audio);
    let own_id = track.id().clone();
    let handle = session.handle.clone();
    let publish = tokio::spawn(async move { handle.publish(track).await });

    session
        .expect_sent(|m| matches!(m, ClientMessage::Offer { .. }))
        .await
        .expect("No Offer sent");
    session
        .deliver(ServerMessage::Answer {
            sdp: SessionDescription::answer("sfu-answer"),
        })
        .await;
    publish
        .await
        .expect("Publish task panicked")
        .expect("Publish failed");

    // The server echoes our own publication back along with a peer's.
    session
        .deliver(ServerMessage::Published {
            publisher_ids: vec![own_id.clone()],
            player_id: PlayerId::from("A"),
        })
        .await;
    session
        .deliver(ServerMessage::Published {
            publisher_ids: vec![PublisherId::from("pub-b")],
            player_id: PlayerId::from("B"),
        })
        .await;

    let subscribe = session
        .expect_sent(|m| matches!(m, ClientMessage::Subscribe { .. }))
        .await
        .expect("No Subscribe sent");
    assert_eq!(
        subscribe,
        ClientMessage::Subscribe {
            publisher_id: PublisherId::from("pub-b")
        }
    );
    assert_eq!(
        session
            .signaling
            .count(|m| matches!(m, ClientMessage::Subscribe { publisher_id } if *publisher_id == own_id))
            .await,
        0
    );
}
