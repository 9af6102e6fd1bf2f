//! Incident data model shared by the store, the sync engine and the popup.

use crate::core::geo::LatLng;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Server-assigned incident identifier.
pub type IncidentId = i64;

/// Lifecycle of a reported incident.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IncidentStatus {
    Active,
    InProgress,
    Resolved,
}

impl Default for IncidentStatus {
    /// New reports start out active.
    fn default() -> Self {
        Self::Active
    }
}

/// Minimal projection used for bulk map rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentSummary {
    pub id: IncidentId,
    pub owner_id: String,
    pub lat: f64,
    pub lng: f64,
    pub status: IncidentStatus,
}

impl IncidentSummary {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

/// Reverse-geocoded place attached to an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Short place name ("Joe's Pizza"), absent for plain street addresses.
    pub name: Option<String>,
    /// Full one-line address as returned by the geocoder.
    pub display_line: String,
}

impl Address {
    /// The most specific non-empty label: the name, else the display line.
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.display_line,
        }
    }
}

/// A fully loaded incident, fetched on hover/click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    pub id: IncidentId,
    pub owner_id: String,
    pub lat: f64,
    pub lng: f64,
    pub status: IncidentStatus,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub address: Option<Address>,
}

impl Incident {
    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn summary(&self) -> IncidentSummary {
        IncidentSummary {
            id: self.id,
            owner_id: self.owner_id.clone(),
            lat: self.lat,
            lng: self.lng,
            status: self.status,
        }
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

/// Fields submitted when reporting a new incident; the server assigns the
/// id, the creation time and the initial status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIncident {
    pub title: String,
    pub content: String,
    pub lat: f64,
    pub lng: f64,
    pub owner_id: String,
    pub address: Option<Address>,
}

impl NewIncident {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        lat: f64,
        lng: f64,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            lat,
            lng,
            owner_id: owner_id.into(),
            address: None,
        }
    }

    pub fn with_address(mut self, address: Option<Address>) -> Self {
        self.address = address;
        self
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}
