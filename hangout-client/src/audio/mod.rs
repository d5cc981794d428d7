mod audio_context;
mod spatial_mixer;
mod talking;

pub use audio_context::*;
pub use spatial_mixer::*;
pub use talking::*;
