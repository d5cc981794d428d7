pub mod audio;
pub mod binding;
pub mod config;
pub mod error;
pub mod publish;
pub mod room;
pub mod session;
pub mod signaling;
pub mod transport;

pub use audio::{AudioContext, AudioContextState, SpatialAudioMixer, TalkingDetector, gain_for_distance};
pub use binding::{ReleasedBinding, TrackBinder, TrackBinding};
pub use config::{ClientConfig, MixerConfig, TransportConfig};
pub use error::{ChannelClosed, ConnectError, DeviceAccessError, Error, NegotiationError, Result};
pub use publish::{PublisherHandle, PublisherRegistry};
pub use room::{PlayerRecord, PositionSmoother, RoomChange, RoomSnapshot, RoomState, RoomView};
pub use session::{Session, SessionEvent, SessionHandle};
pub use signaling::{ChannelHandle, DisconnectReason, SignalingChannel, SignalingEvent, SignalingOutput};
pub use transport::{
    LocalTrack, MediaDevices, MediaTransport, RemoteTrack, RtcTransportFactory, SampleDevices,
    TransportEvent, TransportFactory, TransportRole, TransportTag,
};
