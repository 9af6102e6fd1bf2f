//! Prelude module for common incident-map types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use incident_map::prelude::*;`

pub use crate::core::{
    config::{CameraConfig, DetailCacheConfig, FetchConfig, SyncOptions, SyncProfile},
    geo::{GeoBounds, LatLng, Point},
    viewport::Viewport,
};

pub use crate::incidents::{
    validate_new_incident, Address, Incident, IncidentId, IncidentStatus, IncidentSummary,
    NewIncident,
};

pub use crate::input::{
    events::{MapEvent, SyncEvent},
    listeners::{ListenerId, ListenerKind, ListenerRegistry},
};

pub use crate::layers::{
    icon::{marker_icon, Color, MarkerIcon},
    marker::{Marker, MarkerLayer},
};

pub use crate::spatial::{
    clustering::{Cluster, Clustering, ClusteringConfig},
    index::{SpatialIndex, SpatialItem},
};

pub use crate::store::{memory::InMemoryIncidentStore, IncidentStore};

#[cfg(feature = "rest")]
pub use crate::store::rest::{RestIncidentStore, StoreConfig};

pub use crate::geocode::{CachingGeocoder, GeocodeCache, ReverseGeocoder};

#[cfg(feature = "rest")]
pub use crate::geocode::NominatimGeocoder;

pub use crate::sync::{
    debounce::DebounceScheduler,
    detail_cache::IncidentDetailCache,
    popup::PopupTracker,
    registry::MarkerRegistry,
    viewport_sync::{CreateForm, DetailTrigger, SyncPhase, ViewportSync},
};

pub use crate::runtime::{async_delay, runtime, spawn, AsyncHandle, AsyncSpawner};

pub use crate::traits::{CacheStats, Cacheable, ViewportAware};

pub use crate::ui::popup::IncidentPopup;

pub use crate::{Error as IncidentMapError, Result};

pub use std::{
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

pub use fxhash::{FxHashMap as HashMap, FxHashSet as HashSet, FxHasher};
