mod connection_wrapper;
mod devices;
mod media_transport;
mod transport_event;
mod transport_pair;
mod transport_state;

pub use connection_wrapper::*;
pub use devices::*;
pub use media_transport::*;
pub use transport_event::*;
pub use transport_pair::*;
pub use transport_state::*;
