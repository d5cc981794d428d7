use std::sync::Arc;

use hangout_core::{Animation, MediaKind, Position};
use tokio::sync::{mpsc, oneshot};

use crate::error::{Error, Result};
use crate::publish::PublisherHandle;
use crate::session::SessionCommand;
use crate::transport::{LocalTrack, MediaDevices};

/// Cloneable control surface of a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    devices: Arc<dyn MediaDevices>,
}

impl SessionHandle {
    pub(crate) fn new(tx: mpsc::Sender<SessionCommand>, devices: Arc<dyn MediaDevices>) -> Self {
        Self { tx, devices }
    }

    async fn send(&self, command: SessionCommand) -> Result<()> {
        self.tx.send(command).await.map_err(|_| Error::SessionEnded)
    }

    /// Publishes a local track. Resolves once the SFU answered and the
    /// publication was announced, or with the reason it could not be.
    pub async fn publish(&self, track: LocalTrack) -> Result<PublisherHandle> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Publish { track, reply }).await?;
        rx.await.map_err(|_| Error::SessionEnded)?
    }

    /// Opens a capture device of `kind` and publishes it. Waiting for the
    /// device happens here, outside the session loop.
    pub async fn publish_device(&self, kind: MediaKind) -> Result<PublisherHandle> {
        let track = self.devices.open(kind).await?;
        self.publish(track).await
    }

    /// Stops one publication. Stopping twice is harmless.
    pub async fn stop(&self, handle: &PublisherHandle) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.send(SessionCommand::Stop {
            handle: handle.clone(),
            reply,
        })
        .await?;
        rx.await.map_err(|_| Error::SessionEnded)
    }

    pub async fn chat(&self, message: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::Chat {
            message: message.into(),
        })
        .await
    }

    pub async fn move_to(&self, position: Position, rotation: f32, is_moving: bool) -> Result<()> {
        self.send(SessionCommand::Move {
            position,
            rotation,
            is_moving,
        })
        .await
    }

    pub async fn play_animation(&self, animation: Animation) -> Result<()> {
        self.send(SessionCommand::PlayAnimation { animation }).await
    }

    /// Leaves the room and tears the session down. Calling it on a session
    /// that already ended is a no-op.
    pub async fn leave(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        if self.send(SessionCommand::Leave { reply }).await.is_err() {
            return Ok(());
        }
        let _ = rx.await;
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
