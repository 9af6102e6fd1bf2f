use crate::{
    core::geo::{GeoBounds, LatLng},
    incidents::IncidentId,
};

use rstar::{PointDistance, RTree, RTreeObject, AABB};

/// A point item that can be indexed via an R-tree, keyed by incident id.
///
/// Coordinates are stored as `[lng, lat]` so the tree's x axis is longitude.
#[derive(Debug, Clone)]
pub struct SpatialItem<T> {
    pub id: IncidentId,
    pub position: LatLng,
    pub data: T,
}

impl<T> SpatialItem<T> {
    pub fn new(id: IncidentId, position: LatLng, data: T) -> Self {
        Self { id, position, data }
    }

    fn coords(&self) -> [f64; 2] {
        [self.position.lng, self.position.lat]
    }
}

impl<T> PartialEq for SpatialItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for SpatialItem<T> {}

// --- rstar integration -------------------------------------------------------------------------

impl<T> RTreeObject for SpatialItem<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.coords())
    }
}

impl<T> PointDistance for SpatialItem<T> {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let [x, y] = self.coords();
        let dx = x - point[0];
        let dy = y - point[1];
        dx * dx + dy * dy
    }
}

fn envelope_of(bounds: &GeoBounds) -> AABB<[f64; 2]> {
    AABB::from_corners([bounds.west, bounds.south], [bounds.east, bounds.north])
}

/// R-tree based spatial index over incident positions
pub struct SpatialIndex<T> {
    rtree: RTree<SpatialItem<T>>,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self {
            rtree: RTree::new(),
        }
    }

    /// Inserts an item, replacing any existing item with the same id.
    pub fn insert(&mut self, item: SpatialItem<T>) {
        self.remove(item.id);
        self.rtree.insert(item);
    }

    /// Items whose position falls inside `bounds`, edges included.
    pub fn query(&self, bounds: &GeoBounds) -> Vec<&SpatialItem<T>> {
        self.rtree
            .locate_in_envelope(&envelope_of(bounds))
            .collect()
    }

    /// Items within `radius` degrees of `center` (planar, lng/lat space)
    pub fn query_radius(&self, center: &LatLng, radius: f64) -> Vec<&SpatialItem<T>> {
        self.rtree
            .locate_within_distance([center.lng, center.lat], radius * radius)
            .collect()
    }

    pub fn remove(&mut self, id: IncidentId) -> Option<SpatialItem<T>> {
        let position = self.get(id)?.position;
        self.rtree
            .remove_with_selection_function(ItemAt { id, position })
    }

    pub fn get(&self, id: IncidentId) -> Option<&SpatialItem<T>> {
        self.rtree.iter().find(|item| item.id == id)
    }

    pub fn all_items(&self) -> Vec<&SpatialItem<T>> {
        self.rtree.iter().collect()
    }

    /// Smallest box containing every item
    pub fn bounds(&self) -> Option<GeoBounds> {
        if self.is_empty() {
            return None;
        }
        let envelope = self.rtree.root().envelope();
        Some(GeoBounds::from_edges(
            envelope.lower()[1],
            envelope.lower()[0],
            envelope.upper()[1],
            envelope.upper()[0],
        ))
    }

    pub fn is_empty(&self) -> bool {
        self.rtree.size() == 0
    }

    pub fn len(&self) -> usize {
        self.rtree.size()
    }

    pub fn clear(&mut self) {
        self.rtree = RTree::new();
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Selects the single item with a given id at a known position.
struct ItemAt {
    id: IncidentId,
    position: LatLng,
}

impl<T> rstar::SelectionFunction<SpatialItem<T>> for ItemAt {
    fn should_unpack_parent(&self, envelope: &AABB<[f64; 2]>) -> bool {
        use rstar::Envelope;
        envelope.contains_point(&[self.position.lng, self.position.lat])
    }

    fn should_unpack_leaf(&self, leaf: &SpatialItem<T>) -> bool {
        leaf.id == self.id
    }
}
