pub mod events;
pub mod listeners;

pub use events::{MapEvent, SyncEvent};
pub use listeners::{ListenerId, ListenerKind, ListenerRegistry};
