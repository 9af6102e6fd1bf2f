use crate::{
    core::{
        geo::{GeoBounds, LatLng},
        viewport::Viewport,
    },
    incidents::{IncidentId, IncidentStatus, IncidentSummary},
    layers::icon::{marker_icon, MarkerIcon},
    spatial::{
        clustering::{Cluster, Clustering, ClusteringConfig},
        index::SpatialItem,
    },
};

/// One rendered incident marker
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    incident: IncidentSummary,
    icon: MarkerIcon,
}

impl Marker {
    /// Builds the marker for a summary, styled by its status
    pub fn for_incident(incident: IncidentSummary) -> Self {
        let icon = marker_icon(incident.status);
        Self { incident, icon }
    }

    pub fn id(&self) -> IncidentId {
        self.incident.id
    }

    pub fn position(&self) -> LatLng {
        self.incident.position()
    }

    pub fn status(&self) -> IncidentStatus {
        self.incident.status
    }

    pub fn icon(&self) -> &MarkerIcon {
        &self.icon
    }

    pub fn incident(&self) -> &IncidentSummary {
        &self.incident
    }
}

/// The render layer markers are attached to; groups them into clusters
/// below the configured zoom.
pub struct MarkerLayer {
    markers: Clustering<Marker>,
}

impl MarkerLayer {
    pub fn new(config: ClusteringConfig) -> Self {
        Self {
            markers: Clustering::new(config),
        }
    }

    pub fn add_marker(&mut self, marker: Marker) {
        log::trace!("attach marker {} at {:?}", marker.id(), marker.position());
        self.markers
            .add_item(SpatialItem::new(marker.id(), marker.position(), marker));
    }

    pub fn get(&self, id: IncidentId) -> Option<&Marker> {
        self.markers.get(id).map(|item| &item.data)
    }

    pub fn contains(&self, id: IncidentId) -> bool {
        self.markers.get(id).is_some()
    }

    pub fn remove_marker(&mut self, id: IncidentId) -> Option<Marker> {
        self.markers.remove_item(id).map(|item| item.data)
    }

    /// Markers whose position falls inside `bounds`
    pub fn markers_in(&self, bounds: &GeoBounds) -> Vec<&Marker> {
        let mut markers: Vec<_> = self
            .markers
            .get_all_items()
            .into_iter()
            .filter(|item| bounds.contains(&item.position))
            .map(|item| &item.data)
            .collect();
        markers.sort_by_key(|marker| marker.id());
        markers
    }

    pub fn clusters(&mut self, viewport: &Viewport) -> Vec<Cluster<Marker>> {
        self.markers.get_clusters(viewport)
    }

    /// Removes every marker (`clearLayers`)
    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl Default for MarkerLayer {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}
