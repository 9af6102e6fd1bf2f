//! The incident backend as seen by the sync engine.

pub mod memory;
#[cfg(feature = "rest")]
pub mod rest;

use crate::{
    core::geo::GeoBounds,
    incidents::{Incident, IncidentId, IncidentSummary, NewIncident},
    Result,
};
use async_trait::async_trait;

/// Async CRUD contract for the incident backend.
///
/// Implementations report [`IncidentMapError::Transport`](crate::IncidentMapError::Transport)
/// for backend failures and [`IncidentMapError::NotFound`](crate::IncidentMapError::NotFound)
/// for missing incidents.
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Every incident whose point falls within the inclusive rectangle. No pagination.
    async fn list_incidents_in_bounds(&self, bounds: GeoBounds) -> Result<Vec<IncidentSummary>>;

    async fn get_incident_by_id(&self, id: IncidentId) -> Result<Incident>;

    /// Persists a report; the server assigns `id` and `created_at`.
    async fn create_incident(&self, incident: NewIncident) -> Result<Incident>;
}
