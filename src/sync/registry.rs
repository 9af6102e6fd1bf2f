use crate::{incidents::IncidentId, prelude::HashSet};

/// Ids of incidents currently rendered as markers.
///
/// The only place marker de-duplication is decided: an id is added at most
/// once until the registry is cleared.
#[derive(Debug, Default, Clone)]
pub struct MarkerRegistry {
    ids: HashSet<IncidentId>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, id: IncidentId) -> bool {
        self.ids.contains(&id)
    }

    /// Returns true when `id` was not yet registered
    pub fn add(&mut self, id: IncidentId) -> bool {
        self.ids.insert(id)
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = IncidentId> + '_ {
        self.ids.iter().copied()
    }
}
