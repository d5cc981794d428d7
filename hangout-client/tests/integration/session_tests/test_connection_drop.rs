use std::time::Duration;

use hangout_client::{DisconnectReason, Error, LocalTrack, SessionEvent, TransportRole};
use hangout_core::{ClientMessage, MediaKind, Position};

use crate::integration::{TestSession, WAIT_TIMEOUT_MS, init_tracing, player};

#[tokio::test]
async fn test_connection_drop() {
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

    let handle = session.handle.clone();
    let publish = tokio::spawn(async move { handle.publish(LocalTrack::new(MediaKind::Audio)).await });
    session
        .expect_sent(|m| matches!(m, ClientMessage::Offer { .. }))
        .await
        .expect("No Offer");

    session.drop_connection(DisconnectReason::ClosedByServer).await;

    let event = session
        .expect_event(|e| matches!(e, SessionEvent::Disconnected(_)))
        .await
        .expect("No Disconnected event");
    assert!(matches!(
        event,
        SessionEvent::Disconnected(DisconnectReason::ClosedByServer)
    ));

    // The in-flight publish gets an answer instead of hanging.
    let result = publish.await.expect("Publish task panicked");
    assert!(matches!(result, Err(Error::SessionEnded)));

    let snapshot = session
        .expect_snapshot(|s| !s.connected)
        .await
        .expect("Snapshot still connected");
    assert!(snapshot.players.is_empty());
    assert!(snapshot.local_player_id.is_none());
    assert!(snapshot.bindings.is_empty());

    assert!(subscriber.state().await.closed);
    let publisher = session
        .factory
        .latest(TransportRole::Publisher)
        .await
        .expect("No publisher transport");
    assert!(publisher.state().await.closed);

    tokio::time::timeout(Duration::from_millis(WAIT_TIMEOUT_MS), async {
        while !session.handle.is_closed() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("Session loop still running");
    assert!(matches!(
        session.handle.chat("anyone?").await,
        Err(Error::SessionEnded)
    ));
}
