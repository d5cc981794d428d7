use hangout_client::SessionEvent;
use hangout_core::{ClientMessage, IceCandidate, Position, ServerMessage, SessionDescription};

use crate::integration::{TestSession, init_tracing, player};

fn candidate(text: &str) -> IceCandidate {
    IceCandidate {
        candidate: text.to_owned(),
        sdp_mid: Some("0".to_owned()),
        sdp_mline_index: Some(0),
        username_fragment: None,
    }
}

#[tokio::test]
async fn test_candidate_buffering() {
    init_tracing();

    let mut session = TestSession::start();
    let subscriber = session
        .join("A", vec![player("A", "Al", Position::ORIGIN)])
        .await
        .expect("Join failed");

    session
        .deliver(ServerMessage::SubscriberIce {
            candidate: candidate("candidate:1 1 udp 2122260223 10.0.0.2 50000 typ host"),
        })
        .await;
    session
        .deliver(ServerMessage::ChatMessage {
            sender: "server".to_owned(),
            message: "sync".to_owned(),
        })
        .await;
    session
        .expect_event(|e| matches!(e, SessionEvent::Chat { .. }))
        .await
        .expect("No chat event");
    assert!(subscriber.state().await.candidates.is_empty());

    session
        .deliver(ServerMessage::Offer {
            sdp: SessionDescription::offer("sfu-offer"),
        })
        .await;
    let answer = session
        .expect_sent(|m| matches!(m, ClientMessage::Answer { .. }))
        .await
        .expect("No Answer sent");
    assert_eq!(
        answer,
        ClientMessage::Answer {
            sdp: SessionDescription::answer("answer-1")
        }
    );

    let state = subscriber.state().await;
    assert_eq!(state.offers_accepted.len(), 1);
    assert_eq!(state.candidates.len(), 1);

    // Once the remote description is in, candidates go straight through.
    session
        .deliver(ServerMessage::SubscriberIce {
            candidate: candidate("candidate:2 1 udp 1686052607 203.0.113.7 50001 typ srflx"),
        })
        .await;
    session
        .deliver(ServerMessage::ChatMessage {
            sender: "server".to_owned(),
            message: "sync".to_owned(),
        })
        .await;
    session
        .expect_event(|e| matches!(e, SessionEvent::Chat { .. }))
        .await
        .expect("No chat event");
    assert_eq!(subscriber.state().await.candidates.len(), 2);
}

#[tokio::test]
async fn test_local_candidates_forwarded() {
    init_tracing();

    let mut session = TestSession::start();
    let subscriber = session
        .join("A", vec![player("A", "Al", Position::ORIGIN)])
        .await
        .expect("Join failed");

    subscriber
        .local_candidate("candidate:3 1 udp 2122260223 192.168.1.4 40000 typ host")
        .await;
    let sent = session
        .expect_sent(|m| matches!(m, ClientMessage::SubscriberIce { .. }))
        .await
        .expect("No SubscriberIce");
    let ClientMessage::SubscriberIce { candidate } = sent else {
        unreachable!()
    };
    assert!(candidate.candidate.contains("192.168.1.4"));
}
