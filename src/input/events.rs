use crate::{
    core::geo::{LatLng, Point},
    incidents::{Address, Incident, IncidentId, IncidentSummary},
};
use serde::{Deserialize, Serialize};

/// Events the map view feeds into the sync engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapEvent {
    /// Pan ended; carries the settled camera
    MoveEnd { center: LatLng, zoom: f64 },
    /// Zoom ended; carries the settled camera
    ZoomEnd { center: LatLng, zoom: f64 },
    /// Container resized
    Resize { size: Point },
    /// Click on the map background
    Click { lat_lng: LatLng },
    /// Pointer entered a marker
    MarkerHover { id: IncidentId },
    /// Pointer left a marker
    MarkerOut { id: IncidentId },
    /// Click on a marker
    MarkerClick { id: IncidentId },
    /// Explicit close button on the detail popup
    PopupClose,
}

impl MapEvent {
    /// Whether this event changes the camera
    pub fn is_camera_change(&self) -> bool {
        matches!(
            self,
            MapEvent::MoveEnd { .. } | MapEvent::ZoomEnd { .. } | MapEvent::Resize { .. }
        )
    }

    /// The marker this event targets, if any
    pub fn marker_id(&self) -> Option<IncidentId> {
        match self {
            MapEvent::MarkerHover { id }
            | MapEvent::MarkerOut { id }
            | MapEvent::MarkerClick { id } => Some(*id),
            _ => None,
        }
    }
}

/// Notifications the sync engine emits for the surrounding UI
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A marker was attached; `follow` asks the camera to fly to it
    MarkerAdded {
        summary: IncidentSummary,
        follow: bool,
    },
    /// The popup's incident changed; `None` closes the popup
    ActiveIncidentChanged { incident: Option<Incident> },
    /// A detail fetch started for the active marker
    DetailLoading { id: IncidentId },
    /// The popup anchor moved on screen; `None` when nothing is active
    PopupMoved { position: Option<Point> },
    CreateFormOpened { location: LatLng },
    /// Reverse geocoding finished for the open create form
    CreateFormAddressResolved { location: LatLng, address: Address },
    CreateFormClosed,
    /// A viewport fetch failed; the next pan retries
    FetchFailed { message: String },
}
