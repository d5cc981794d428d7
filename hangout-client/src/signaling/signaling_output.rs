use async_trait::async_trait;
use hangout_core::ClientMessage;

use crate::error::ChannelClosed;

/// Outbound half of the signaling connection as seen by the orchestrator.
#[async_trait]
pub trait SignalingOutput: Send + Sync {
    /// Queue one message for delivery. Order is preserved.
    async fn send(&self, message: ClientMessage) -> Result<(), ChannelClosed>;

    /// Start a graceful close. Idempotent.
    async fn close(&self);
}
