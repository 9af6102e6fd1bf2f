use crate::prelude::HashMap;
use crate::{
    core::{
        geo::{GeoBounds, LatLng},
        viewport::Viewport,
    },
    incidents::IncidentId,
    spatial::index::{SpatialIndex, SpatialItem},
};

/// Represents a cluster of markers
#[derive(Debug, Clone)]
pub struct Cluster<T> {
    /// Identifier derived from the grid cell
    pub id: String,
    /// Mean position of the clustered items
    pub center: LatLng,
    /// Geographic bounds of the cluster
    pub bounds: GeoBounds,
    /// Items in this cluster
    pub items: Vec<SpatialItem<T>>,
    /// Zoom level at which this cluster was created
    pub zoom_level: f64,
}

impl<T> Cluster<T> {
    pub fn new(id: String, items: Vec<SpatialItem<T>>, zoom_level: f64) -> Self {
        let (bounds, center) = Self::calculate_extent(&items);
        Self {
            id,
            center,
            bounds,
            items,
            zoom_level,
        }
    }

    fn cell_id(grid_x: i64, grid_y: i64, chunk_index: Option<usize>) -> String {
        match chunk_index {
            Some(chunk) => format!("cluster_{grid_x}_{grid_y}__{chunk}"),
            None => format!("cluster_{grid_x}_{grid_y}"),
        }
    }

    fn calculate_extent(items: &[SpatialItem<T>]) -> (GeoBounds, LatLng) {
        let Some(first) = items.first() else {
            return (
                GeoBounds::from_corners(LatLng::default(), LatLng::default()),
                LatLng::default(),
            );
        };

        let mut bounds = GeoBounds::from_corners(first.position, first.position);
        let (mut lat_sum, mut lng_sum) = (0.0, 0.0);
        for item in items {
            bounds.extend(&item.position);
            lat_sum += item.position.lat;
            lng_sum += item.position.lng;
        }
        let n = items.len() as f64;

        (bounds, LatLng::new(lat_sum / n, lng_sum / n))
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_single(&self) -> bool {
        self.items.len() == 1
    }

    pub fn ids(&self) -> impl Iterator<Item = IncidentId> + '_ {
        self.items.iter().map(|item| item.id)
    }
}

/// Configuration for clustering
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringConfig {
    /// Zoom level from which every marker is shown on its own
    pub disable_clustering_at_zoom: f64,
    /// Maximum number of items in a single cluster
    pub max_cluster_size: usize,
    /// Grid cell edge in screen pixels
    pub grid_size: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            disable_clustering_at_zoom: 15.0,
            max_cluster_size: 100,
            grid_size: 60.0,
        }
    }
}

/// Grid-based marker clustering in projected pixel space
pub struct Clustering<T> {
    config: ClusteringConfig,
    spatial_index: SpatialIndex<T>,
    /// Clusters from the last query, keyed by the bounds and zoom they were built for
    cached: Option<(GeoBounds, f64, Vec<Cluster<T>>)>,
}

impl<T: Clone> Clustering<T> {
    pub fn new(config: ClusteringConfig) -> Self {
        Self {
            config,
            spatial_index: SpatialIndex::new(),
            cached: None,
        }
    }

    pub fn add_item(&mut self, item: SpatialItem<T>) {
        self.spatial_index.insert(item);
        self.invalidate_cache();
    }

    pub fn remove_item(&mut self, id: IncidentId) -> Option<SpatialItem<T>> {
        let removed = self.spatial_index.remove(id);
        if removed.is_some() {
            self.invalidate_cache();
        }
        removed
    }

    pub fn clear(&mut self) {
        self.spatial_index.clear();
        self.invalidate_cache();
    }

    fn invalidate_cache(&mut self) {
        self.cached = None;
    }

    /// Clusters of the items visible in `viewport`
    pub fn get_clusters(&mut self, viewport: &Viewport) -> Vec<Cluster<T>> {
        let bounds = viewport.bounds();
        let zoom = viewport.zoom;

        if let Some((cached_bounds, cached_zoom, clusters)) = &self.cached {
            if *cached_bounds == bounds && (cached_zoom - zoom).abs() < 0.01 {
                return clusters.clone();
            }
        }

        let items: Vec<_> = self
            .spatial_index
            .query(&bounds)
            .into_iter()
            .cloned()
            .collect();

        let clusters = if zoom >= self.config.disable_clustering_at_zoom {
            items
                .into_iter()
                .map(|item| Cluster::new(format!("single_{}", item.id), vec![item], zoom))
                .collect()
        } else {
            self.grid_cluster(items, viewport)
        };

        self.cached = Some((bounds, zoom, clusters.clone()));
        clusters
    }

    fn grid_cluster(&self, items: Vec<SpatialItem<T>>, viewport: &Viewport) -> Vec<Cluster<T>> {
        let grid_size = self.config.grid_size;
        let mut grid: HashMap<(i64, i64), Vec<SpatialItem<T>>> = HashMap::default();

        for item in items {
            let pixel = viewport.project(&item.position, None);
            let cell = (
                (pixel.x / grid_size).floor() as i64,
                (pixel.y / grid_size).floor() as i64,
            );
            grid.entry(cell).or_default().push(item);
        }

        let mut clusters = Vec::with_capacity(grid.len());
        for ((grid_x, grid_y), mut cell_items) in grid {
            cell_items.sort_by_key(|item| item.id);

            if cell_items.len() <= self.config.max_cluster_size {
                let id = Cluster::<T>::cell_id(grid_x, grid_y, None);
                clusters.push(Cluster::new(id, cell_items, viewport.zoom));
            } else {
                for (i, chunk) in cell_items.chunks(self.config.max_cluster_size).enumerate() {
                    let id = Cluster::<T>::cell_id(grid_x, grid_y, Some(i));
                    clusters.push(Cluster::new(id, chunk.to_vec(), viewport.zoom));
                }
            }
        }

        clusters.sort_by(|a, b| a.id.cmp(&b.id));
        clusters
    }

    pub fn get(&self, id: IncidentId) -> Option<&SpatialItem<T>> {
        self.spatial_index.get(id)
    }

    pub fn get_all_items(&self) -> Vec<&SpatialItem<T>> {
        self.spatial_index.all_items()
    }

    pub fn len(&self) -> usize {
        self.spatial_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spatial_index.is_empty()
    }

    pub fn set_config(&mut self, config: ClusteringConfig) {
        self.config = config;
        self.invalidate_cache();
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }
}

impl<T: Clone> Default for Clustering<T> {
    fn default() -> Self {
        Self::new(ClusteringConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geo::Point;

    fn clustering_with(points: &[(IncidentId, f64, f64)]) -> Clustering<()> {
        let mut clustering = Clustering::default();
        for &(id, lat, lng) in points {
            clustering.add_item(SpatialItem::new(id, LatLng::new(lat, lng), ()));
        }
        clustering
    }

    #[test]
    fn test_nearby_markers_merge_below_clustering_zoom() {
        // ~10 m apart: same 60 px cell at zoom 10
        let mut clustering = clustering_with(&[(1, 40.7128, -74.0060), (2, 40.7129, -74.0061)]);
        let viewport = Viewport::new(LatLng::new(40.7128, -74.0060), 10.0, Point::new(800.0, 600.0));

        let clusters = clustering.get_clusters(&viewport);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].count(), 2);
        assert!(clusters[0].bounds.contains(&clusters[0].center));
    }

    #[test]
    fn test_clustering_disabled_at_high_zoom() {
        let mut clustering = clustering_with(&[(1, 40.7128, -74.0060), (2, 40.7129, -74.0061)]);
        let viewport = Viewport::new(LatLng::new(40.7128, -74.0060), 16.0, Point::new(800.0, 600.0));

        let clusters = clustering.get_clusters(&viewport);
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().all(Cluster::is_single));
    }

    #[test]
    fn test_items_outside_viewport_are_skipped() {
        let mut clustering = clustering_with(&[(1, 40.7128, -74.0060), (2, 51.5, -0.12)]);
        let viewport = Viewport::new(LatLng::new(40.7128, -74.0060), 12.0, Point::new(800.0, 600.0));

        let clusters = clustering.get_clusters(&viewport);
        let ids: Vec<_> = clusters.iter().flat_map(|c| c.ids()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_oversized_cells_are_split() {
        let mut clustering = clustering_with(&[
            (1, 40.7128, -74.0060),
            (2, 40.7128, -74.0061),
            (3, 40.7129, -74.0060),
        ]);
        clustering.set_config(ClusteringConfig {
            max_cluster_size: 2,
            ..ClusteringConfig::default()
        });
        let viewport = Viewport::new(LatLng::new(40.7128, -74.0060), 8.0, Point::new(800.0, 600.0));

        let clusters = clustering.get_clusters(&viewport);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters.iter().map(Cluster::count).sum::<usize>(), 3);
    }

    #[test]
    fn test_cache_invalidated_by_new_items() {
        let mut clustering = clustering_with(&[(1, 40.7128, -74.0060)]);
        let viewport = Viewport::new(LatLng::new(40.7128, -74.0060), 16.0, Point::new(800.0, 600.0));
        assert_eq!(clustering.get_clusters(&viewport).len(), 1);

        clustering.add_item(SpatialItem::new(2, LatLng::new(40.713, -74.006), ()));
        assert_eq!(clustering.get_clusters(&viewport).len(), 2);
    }
}
