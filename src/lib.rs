//! # incident-map
//!
//! Viewport-driven incident marker synchronization for interactive report maps.
//!
//! The crate keeps a headless model of a map view (camera, marker layer,
//! popup) in sync with a remote incident store: panning or zooming fetches
//! the incidents inside the visible bounds (debounced), new incidents become
//! de-duplicated markers, and hovering or clicking a marker loads its details
//! for the popup while stale responses are discarded.

pub mod core;
pub mod geocode;
pub mod incidents;
pub mod input;
pub mod layers;
pub mod prelude;
pub mod runtime;
pub mod spatial;
pub mod store;
pub mod sync;
pub mod traits;
pub mod ui;
pub use crate::core::constants;

// Re-export public API
pub use core::{
    config::{SyncOptions, SyncProfile},
    geo::{GeoBounds, LatLng, Point},
    viewport::Viewport,
};

pub use incidents::{Address, Incident, IncidentId, IncidentStatus, IncidentSummary, NewIncident};

pub use input::events::{MapEvent, SyncEvent};

pub use layers::{
    icon::{marker_icon, Color, MarkerIcon},
    marker::{Marker, MarkerLayer},
};

pub use store::{memory::InMemoryIncidentStore, IncidentStore};

#[cfg(feature = "rest")]
pub use store::rest::{RestIncidentStore, StoreConfig};

pub use sync::{
    debounce::DebounceScheduler, detail_cache::IncidentDetailCache, registry::MarkerRegistry,
    viewport_sync::{CreateForm, DetailTrigger, SyncPhase, ViewportSync},
};

pub use geocode::{CachingGeocoder, GeocodeCache, ReverseGeocoder};

#[cfg(feature = "rest")]
pub use geocode::NominatimGeocoder;

pub use ui::popup::IncidentPopup;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, IncidentMapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum IncidentMapError {
    /// The backend could not be reached or answered with a failure status.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Incident {0} not found")]
    NotFound(IncidentId),

    #[error("Invalid incident: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Geocoding error: {0}")]
    Geocode(String),
}

#[cfg(feature = "rest")]
impl From<reqwest::Error> for IncidentMapError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Transport(format!("malformed response: {err}"))
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl IncidentMapError {
    /// Whether a later attempt might succeed (network hiccups, 5xx, ...).
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

/// Error type alias for convenience
pub type Error = IncidentMapError;

/// Installs `env_logger` with `RUST_LOG`, defaulting to debug output for this crate.
#[cfg(feature = "debug")]
pub fn init_debug_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("incident_map=debug"),
    )
    .try_init();
}
