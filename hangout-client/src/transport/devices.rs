use std::collections::HashSet;

use async_trait::async_trait;
use hangout_core::MediaKind;
use tracing::debug;

use crate::error::DeviceAccessError;
use crate::transport::LocalTrack;

/// Source of local capture tracks.
#[async_trait]
pub trait MediaDevices: Send + Sync {
    async fn open(&self, kind: MediaKind) -> Result<LocalTrack, DeviceAccessError>;
}

/// Devices that hand out sample-fed tracks. The caller writes encoded
/// frames with [`LocalTrack::write_sample`]. Kinds outside the granted set
/// are refused as if the user declined the permission prompt.
#[derive(Debug, Clone)]
pub struct SampleDevices {
    granted: HashSet<MediaKind>,
}

impl SampleDevices {
    pub fn new(granted: impl IntoIterator<Item = MediaKind>) -> Self {
        Self {
            granted: granted.into_iter().collect(),
        }
    }

    pub fn all() -> Self {
        Self::new([MediaKind::Audio, MediaKind::Video])
    }

    pub fn none() -> Self {
        Self::new([])
    }
}

impl Default for SampleDevices {
    fn default() -> Self {
        Self::all()
    }
}

#[async_trait]
impl MediaDevices for SampleDevices {
    async fn open(&self, kind: MediaKind) -> Result<LocalTrack, DeviceAccessError> {
        if !self.granted.contains(&kind) {
            return Err(DeviceAccessError::PermissionDenied(kind));
        }
        let track = LocalTrack::new(kind);
        debug!("Opened local {} track {}", kind, track.id());
        Ok(track)
    }
}
