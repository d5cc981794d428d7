mod interpolation;
mod room_change;
mod room_state;
mod room_view;

pub use interpolation::*;
pub use room_change::*;
pub use room_state::*;
pub use room_view::*;
