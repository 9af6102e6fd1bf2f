//! Shared trait abstractions for common patterns
//!
//! Caches and viewport-dependent components implement these so the sync
//! engine can treat them uniformly.

use crate::{core::viewport::Viewport, Result};

/// Trait for viewport-aware components
/// Standardizes camera change handling
pub trait ViewportAware {
    /// Handle viewport changes
    fn on_viewport_changed(&mut self, viewport: &Viewport) -> Result<()>;

    /// Check if component currently needs viewport updates
    fn requires_viewport_updates(&self) -> bool {
        true
    }
}

/// Trait for cacheable operations
/// Standardizes caching patterns used across the codebase
pub trait Cacheable {
    type Key: Clone + Eq + std::hash::Hash;
    type Value: Clone;

    /// Get cached value
    fn get_cached(&mut self, key: &Self::Key) -> Option<Self::Value>;

    /// Cache a value
    fn cache(&mut self, key: Self::Key, value: Self::Value);

    /// Clear entire cache
    fn clear_cache(&mut self);

    /// Get cache statistics
    fn cache_stats(&self) -> CacheStats {
        CacheStats::default()
    }
}

/// Cache statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
}

impl CacheStats {
    pub fn record(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}
