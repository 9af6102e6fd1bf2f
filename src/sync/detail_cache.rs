use crate::{
    core::config::DetailCacheConfig,
    incidents::{Incident, IncidentId},
    prelude::HashMap,
    traits::{CacheStats, Cacheable},
};

/// Full incidents already fetched this session.
///
/// Append-only: entries never expire and are only dropped on teardown.
#[derive(Debug, Default)]
pub struct IncidentDetailCache {
    entries: HashMap<IncidentId, Incident>,
    stats: CacheStats,
}

impl IncidentDetailCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &DetailCacheConfig) -> Self {
        let mut entries = HashMap::default();
        entries.reserve(config.initial_capacity);
        Self {
            entries,
            stats: CacheStats::default(),
        }
    }

    pub fn get(&mut self, id: IncidentId) -> Option<Incident> {
        self.get_cached(&id)
    }

    pub fn put(&mut self, id: IncidentId, incident: Incident) {
        self.cache(id, incident);
    }

    pub fn contains(&self, id: IncidentId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Cacheable for IncidentDetailCache {
    type Key = IncidentId;
    type Value = Incident;

    fn get_cached(&mut self, key: &IncidentId) -> Option<Incident> {
        let hit = self.entries.get(key).cloned();
        self.stats.record(hit.is_some());
        hit
    }

    fn cache(&mut self, key: IncidentId, value: Incident) {
        self.entries.insert(key, value);
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
