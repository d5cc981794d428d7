mod track_binder;

pub use track_binder::*;
