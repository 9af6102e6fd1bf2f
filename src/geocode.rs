//! Reverse geocoding of map locations into postal addresses.
//!
//! Lookups are best-effort: a failed lookup is logged and yields `None`, and
//! the create form simply falls back to raw coordinates.

use crate::{
    core::geo::LatLng,
    incidents::Address,
    prelude::{Arc, Mutex},
    traits::{CacheStats, Cacheable},
};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;

const DEFAULT_CAPACITY: usize = 256;
/// Five decimal places, roughly one metre.
const KEY_SCALE: f64 = 1e5;

#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, location: LatLng) -> Option<Address>;
}

/// Cache key for a location rounded to about a metre
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeocodeKey(i64, i64);

impl From<LatLng> for GeocodeKey {
    fn from(location: LatLng) -> Self {
        Self(
            (location.lat * KEY_SCALE).round() as i64,
            (location.lng * KEY_SCALE).round() as i64,
        )
    }
}

/// LRU cache of resolved addresses. Misses are not cached.
#[derive(Debug)]
pub struct GeocodeCache {
    entries: LruCache<GeocodeKey, Address>,
    stats: CacheStats,
}

impl GeocodeCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            stats: CacheStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}

impl Default for GeocodeCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Cacheable for GeocodeCache {
    type Key = GeocodeKey;
    type Value = Address;

    fn get_cached(&mut self, key: &GeocodeKey) -> Option<Address> {
        let hit = self.entries.get(key).cloned();
        self.stats.record(hit.is_some());
        hit
    }

    fn cache(&mut self, key: GeocodeKey, value: Address) {
        self.entries.put(key, value);
        self.stats.size = self.entries.len();
    }

    fn clear_cache(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::default();
    }

    fn cache_stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            ..self.stats.clone()
        }
    }
}

/// Wraps a geocoder with a shared [`GeocodeCache`]
pub struct CachingGeocoder<G> {
    inner: G,
    cache: Arc<Mutex<GeocodeCache>>,
}

impl<G: ReverseGeocoder> CachingGeocoder<G> {
    pub fn new(inner: G, capacity: usize) -> Self {
        Self {
            inner,
            cache: Arc::new(Mutex::new(GeocodeCache::new(capacity))),
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.cache
            .lock()
            .map(|cache| cache.cache_stats())
            .unwrap_or_default()
    }
}

#[async_trait]
impl<G: ReverseGeocoder> ReverseGeocoder for CachingGeocoder<G> {
    async fn reverse(&self, location: LatLng) -> Option<Address> {
        let key = GeocodeKey::from(location);
        let cached = self
            .cache
            .lock()
            .ok()
            .and_then(|mut cache| cache.get_cached(&key));
        if cached.is_some() {
            return cached;
        }

        let address = self.inner.reverse(location).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.cache(key, address.clone());
        }
        Some(address)
    }
}

#[cfg(feature = "rest")]
pub use nominatim::NominatimGeocoder;

#[cfg(feature = "rest")]
mod nominatim {
    use super::*;
    use serde::Deserialize;

    const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

    #[derive(Debug, Deserialize)]
    struct ReverseResponse {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        display_name: Option<String>,
        #[serde(default)]
        error: Option<String>,
    }

    impl ReverseResponse {
        fn into_address(self) -> Option<Address> {
            if let Some(error) = self.error {
                log::warn!("reverse geocoding returned an error: {error}");
                return None;
            }
            let name = self.name.filter(|name| !name.trim().is_empty());
            match (name, self.display_name) {
                (None, None) => None,
                (name, display) => Some(Address {
                    name,
                    display_line: display.unwrap_or_default(),
                }),
            }
        }
    }

    /// OpenStreetMap Nominatim reverse geocoder
    pub struct NominatimGeocoder {
        endpoint: String,
    }

    impl NominatimGeocoder {
        pub fn new() -> Self {
            Self::with_endpoint(NOMINATIM_REVERSE_URL)
        }

        pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
            Self {
                endpoint: endpoint.into(),
            }
        }

        async fn lookup(&self, location: LatLng) -> crate::Result<Option<Address>> {
            let response = crate::store::rest::HTTP_CLIENT
                .get(&self.endpoint)
                .query(&[
                    ("lat", location.lat.to_string()),
                    ("lon", location.lng.to_string()),
                    ("format", "json".to_string()),
                ])
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(crate::IncidentMapError::Geocode(format!(
                    "reverse geocoding failed: {}",
                    response.status()
                )));
            }
            let body = response.bytes().await?;
            let parsed: ReverseResponse = serde_json::from_slice(&body)?;
            Ok(parsed.into_address())
        }
    }

    impl Default for NominatimGeocoder {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ReverseGeocoder for NominatimGeocoder {
        async fn reverse(&self, location: LatLng) -> Option<Address> {
            match self.lookup(location).await {
                Ok(address) => address,
                Err(err) => {
                    log::error!("reverse geocoding error at {location:?}: {err}");
                    None
                }
            }
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReverseGeocoder for CountingGeocoder {
        async fn reverse(&self, location: LatLng) -> Option<Address> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (location.lat > 0.0).then(|| Address {
                name: Some("Joe's Pizza".to_string()),
                display_line: "7 Carmine St".to_string(),
            })
        }
    }

    #[test]
    fn test_cache_eviction_and_stats() {
        let mut cache = GeocodeCache::new(1);
        let a = GeocodeKey::from(LatLng::new(40.0, -74.0));
        let b = GeocodeKey::from(LatLng::new(41.0, -74.0));
        let address = Address {
            name: None,
            display_line: "Somewhere".to_string(),
        };

        cache.cache(a, address.clone());
        assert_eq!(cache.get_cached(&a), Some(address.clone()));
        cache.cache(b, address);
        assert_eq!(cache.get_cached(&a), None);

        let stats = cache.cache_stats();
        assert_eq!((stats.hits, stats.misses, stats.size), (1, 1, 1));
    }

    #[test]
    fn test_keys_round_to_about_a_metre() {
        assert_eq!(
            GeocodeKey::from(LatLng::new(40.712_801, -74.006_001)),
            GeocodeKey::from(LatLng::new(40.712_804, -74.005_998))
        );
        assert_ne!(
            GeocodeKey::from(LatLng::new(40.7128, -74.006)),
            GeocodeKey::from(LatLng::new(40.7129, -74.006))
        );
    }

    #[tokio::test]
    async fn test_caching_geocoder_skips_repeat_lookups() {
        let geocoder = CachingGeocoder::new(
            CountingGeocoder {
                calls: AtomicUsize::new(0),
            },
            8,
        );
        let here = LatLng::new(40.73, -74.0);

        assert!(geocoder.reverse(here).await.is_some());
        assert!(geocoder.reverse(here).await.is_some());
        assert_eq!(geocoder.inner.calls.load(Ordering::SeqCst), 1);

        // misses are retried
        let nowhere = LatLng::new(-10.0, 0.0);
        assert!(geocoder.reverse(nowhere).await.is_none());
        assert!(geocoder.reverse(nowhere).await.is_none());
        assert_eq!(geocoder.inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(geocoder.stats().hits, 1);
    }
}
