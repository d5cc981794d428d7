use hangout_client::{DeviceAccessError, Error, SampleDevices};
use hangout_core::{ClientMessage, MediaKind};

use crate::integration::{TestSession, init_tracing, test_config};

#[tokio::test]
async fn test_device_denied() {
    init_tracing();

    let session = TestSession::start_with(test_config(), SampleDevices::new([MediaKind::Audio]));

    let result = session.handle.publish_device(MediaKind::Video).await;
    assert!(matches!(
        result,
        Err(Error::DeviceAccess(DeviceAccessError::PermissionDenied(
            MediaKind::Video
        )))
    ));

    // The session is untouched and no publisher was started.
    assert!(!session.handle.is_closed());
    assert_eq!(
        session
            .signaling
            .count(|m| matches!(m, ClientMessage::PublisherInit))
            .await,
        0
    );
}
