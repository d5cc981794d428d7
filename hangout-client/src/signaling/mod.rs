mod channel;
mod signaling_event;
mod signaling_output;

pub use channel::*;
pub use signaling_event::*;
pub use signaling_output::*;
