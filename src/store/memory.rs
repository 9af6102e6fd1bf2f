use crate::{
    core::geo::GeoBounds,
    incidents::{Incident, IncidentId, IncidentStatus, IncidentSummary, NewIncident},
    prelude::Mutex,
    spatial::index::{SpatialIndex, SpatialItem},
    store::IncidentStore,
    IncidentMapError, Result,
};
use async_trait::async_trait;
use chrono::Utc;

struct Inner {
    next_id: IncidentId,
    incidents: SpatialIndex<Incident>,
}

/// Process-local incident store backed by an R-tree.
///
/// Used by the demo app and as the reference fake in tests.
pub struct InMemoryIncidentStore {
    inner: Mutex<Inner>,
}

impl InMemoryIncidentStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_id: 1,
                incidents: SpatialIndex::new(),
            }),
        }
    }

    /// Seeds existing incidents, keeping their ids
    pub fn with_incidents(incidents: impl IntoIterator<Item = Incident>) -> Self {
        let store = Self::new();
        for incident in incidents {
            store.insert(incident);
        }
        store
    }

    /// Inserts or replaces an incident as-is
    pub fn insert(&self, incident: Incident) {
        let mut inner = self.lock();
        inner.next_id = inner.next_id.max(incident.id + 1);
        inner
            .incidents
            .insert(SpatialItem::new(incident.id, incident.position(), incident));
    }

    /// Moves an incident to a new status; returns false when it does not exist
    pub fn set_status(&self, id: IncidentId, status: IncidentStatus) -> bool {
        let mut inner = self.lock();
        let Some(mut incident) = inner.incidents.get(id).map(|item| item.data.clone()) else {
            return false;
        };
        incident.status = status;
        inner
            .incidents
            .insert(SpatialItem::new(id, incident.position(), incident));
        true
    }

    pub fn len(&self) -> usize {
        self.lock().incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        // A panic while holding the lock cannot leave the index half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryIncidentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IncidentStore for InMemoryIncidentStore {
    async fn list_incidents_in_bounds(&self, bounds: GeoBounds) -> Result<Vec<IncidentSummary>> {
        let inner = self.lock();
        let mut summaries: Vec<_> = inner
            .incidents
            .query(&bounds)
            .into_iter()
            .map(|item| item.data.summary())
            .collect();
        summaries.sort_by_key(|summary| summary.id);
        Ok(summaries)
    }

    async fn get_incident_by_id(&self, id: IncidentId) -> Result<Incident> {
        self.lock()
            .incidents
            .get(id)
            .map(|item| item.data.clone())
            .ok_or(IncidentMapError::NotFound(id))
    }

    async fn create_incident(&self, new_incident: NewIncident) -> Result<Incident> {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;

        let incident = Incident {
            id,
            owner_id: new_incident.owner_id,
            lat: new_incident.lat,
            lng: new_incident.lng,
            status: IncidentStatus::default(),
            title: new_incident.title,
            content: new_incident.content,
            created_at: Utc::now(),
            address: new_incident.address,
        };
        inner
            .incidents
            .insert(SpatialItem::new(id, incident.position(), incident.clone()));

        log::debug!("created incident {id} at ({}, {})", incident.lat, incident.lng);
        Ok(incident)
    }
}
