//! Configuration for viewport synchronization
//!
//! Options are grouped the same way the sync engine uses them (fetch timing,
//! camera, clustering, caching) and can be obtained from a named profile or
//! assembled by hand.

use crate::{
    core::{
        constants::{DEFAULT_CENTER, DEFAULT_DEBOUNCE_MS, DEFAULT_ZOOM, FOLLOW_ZOOM},
        geo::LatLng,
    },
    spatial::clustering::ClusteringConfig,
    IncidentMapError, Result,
};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncProfile {
    Balanced,
    /// Shorter quiet period, more fetches while panning.
    Responsive,
    /// Longer quiet period and earlier clustering for slow links.
    LowBandwidth,
    Custom(SyncOptions),
}

impl SyncProfile {
    pub fn resolve(&self) -> SyncOptions {
        match self {
            Self::Balanced => SyncOptions::default(),
            Self::Responsive => SyncOptions {
                fetch: FetchConfig {
                    debounce_ms: 150,
                    fetch_on_start: true,
                },
                ..SyncOptions::default()
            },
            Self::LowBandwidth => SyncOptions {
                fetch: FetchConfig {
                    debounce_ms: 600,
                    fetch_on_start: true,
                },
                clustering: ClusteringConfig {
                    disable_clustering_at_zoom: 17.0,
                    ..ClusteringConfig::default()
                },
                ..SyncOptions::default()
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

impl Default for SyncProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOptions {
    pub fetch: FetchConfig,
    pub camera: CameraConfig,
    pub clustering: ClusteringConfig,
    pub cache: DetailCacheConfig,
}

impl SyncOptions {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.fetch.debounce_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch.debounce_ms == 0 {
            return Err(IncidentMapError::Config(
                "debounce_ms must be greater than zero".to_string(),
            ));
        }
        if !self.camera.initial_center.is_valid() {
            return Err(IncidentMapError::Config(format!(
                "initial center {:?} is outside valid coordinates",
                self.camera.initial_center
            )));
        }
        if self.clustering.grid_size <= 0.0 {
            return Err(IncidentMapError::Config(
                "clustering grid_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            camera: CameraConfig::default(),
            clustering: ClusteringConfig::default(),
            cache: DetailCacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchConfig {
    pub debounce_ms: u64,
    /// Issue the first viewport fetch from `start()`.
    pub fetch_on_start: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            fetch_on_start: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    pub initial_center: LatLng,
    pub initial_zoom: f64,
    /// Zoom applied when following a newly created incident.
    pub follow_zoom: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            initial_center: LatLng::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1),
            initial_zoom: DEFAULT_ZOOM,
            follow_zoom: FOLLOW_ZOOM,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct DetailCacheConfig {
    /// Pre-sized capacity; the cache itself never evicts.
    pub initial_capacity: usize,
}
