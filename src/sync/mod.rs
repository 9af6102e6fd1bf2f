//! Viewport-driven synchronization between the map view and the store.

pub mod debounce;
pub mod detail_cache;
pub mod popup;
pub mod registry;
pub mod viewport_sync;

pub use debounce::DebounceScheduler;
pub use detail_cache::IncidentDetailCache;
pub use popup::PopupTracker;
pub use registry::MarkerRegistry;
pub use viewport_sync::{CreateForm, DetailTrigger, SyncPhase, ViewportSync};
