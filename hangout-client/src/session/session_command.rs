use hangout_core::{Animation, Position};
use tokio::sync::oneshot;

use crate::error::Result;
use crate::publish::PublisherHandle;
use crate::transport::LocalTrack;

/// Requests from a [`SessionHandle`](crate::session::SessionHandle) to the
/// session loop.
#[derive(Debug)]
pub enum SessionCommand {
    /// Answered once the publication is live or has failed.
    Publish {
        track: LocalTrack,
        reply: oneshot::Sender<Result<PublisherHandle>>,
    },

    Stop {
        handle: PublisherHandle,
        reply: oneshot::Sender<()>,
    },

    Chat { message: String },

    Move {
        position: Position,
        rotation: f32,
        is_moving: bool,
    },

    PlayAnimation { animation: Animation },

    Leave { reply: oneshot::Sender<()> },
}
