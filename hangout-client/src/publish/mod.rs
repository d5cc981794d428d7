mod publisher_registry;

pub use publisher_registry::*;
