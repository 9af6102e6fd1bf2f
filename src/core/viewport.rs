use crate::core::{
    constants::{MAX_ZOOM, MIN_ZOOM, TILE_SIZE},
    geo::{GeoBounds, LatLng, Point, EARTH_RADIUS, MAX_LATITUDE},
};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Manages the current view of the map: center, zoom, and screen dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// The center of the map view in geographical coordinates
    pub center: LatLng,
    /// The current zoom level
    pub zoom: f64,
    /// The size of the viewport in pixels
    pub size: Point,
    /// The minimum allowed zoom level
    pub min_zoom: f64,
    /// The maximum allowed zoom level
    pub max_zoom: f64,
    /// Pixel origin for coordinate transformations (to avoid precision issues)
    pixel_origin: Option<Point>,
}

impl Viewport {
    /// Creates a new viewport
    pub fn new(center: LatLng, zoom: f64, size: Point) -> Self {
        let mut viewport = Self {
            center: Self::clamp_center(center),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            size,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            pixel_origin: None,
        };
        viewport.update_pixel_origin();
        viewport
    }

    /// Sets the center of the viewport
    pub fn set_center(&mut self, center: LatLng) {
        self.center = Self::clamp_center(center);
        self.update_pixel_origin();
    }

    /// Sets the zoom level, clamping to valid range
    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.update_pixel_origin();
    }

    /// Centers on `center` at `zoom` in one step (Leaflet's `setView`)
    pub fn set_view(&mut self, center: LatLng, zoom: f64) {
        self.center = Self::clamp_center(center);
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.update_pixel_origin();
    }

    /// Sets the viewport size
    pub fn set_size(&mut self, size: Point) {
        self.size = size;
        self.update_pixel_origin();
    }

    /// Sets the zoom limits
    pub fn set_zoom_limits(&mut self, min_zoom: f64, max_zoom: f64) {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
        self.update_pixel_origin();
    }

    /// Projects a LatLng to world pixel coordinates at the given zoom level (EPSG:3857)
    pub fn project(&self, lat_lng: &LatLng, zoom: Option<f64>) -> Point {
        let scale = TILE_SIZE as f64 * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let mercator = lat_lng.to_mercator();
        let world = 2.0 * PI * EARTH_RADIUS;

        Point::new(
            (mercator.x + PI * EARTH_RADIUS) / world * scale,
            (-mercator.y + PI * EARTH_RADIUS) / world * scale,
        )
    }

    /// Unprojects world pixel coordinates back to LatLng at the given zoom level
    pub fn unproject(&self, pixel: &Point, zoom: Option<f64>) -> LatLng {
        let scale = TILE_SIZE as f64 * 2_f64.powf(zoom.unwrap_or(self.zoom));
        let world = 2.0 * PI * EARTH_RADIUS;

        let x = (pixel.x / scale) * world - PI * EARTH_RADIUS;
        let y = PI * EARTH_RADIUS - (pixel.y / scale) * world;

        LatLng::from_mercator(Point::new(x, y))
    }

    /// Gets or calculates the pixel origin for this viewport
    pub fn get_pixel_origin(&self) -> Point {
        self.pixel_origin
            .unwrap_or_else(|| self.project(&self.center, None).floor())
    }

    fn update_pixel_origin(&mut self) {
        self.pixel_origin = Some(self.project(&self.center, None).floor());
    }

    /// Converts a geographical coordinate to container pixel coordinates
    /// (Leaflet's `latLngToContainerPoint`)
    pub fn lat_lng_to_pixel(&self, lat_lng: &LatLng) -> Point {
        let layer_point = self
            .project(lat_lng, None)
            .subtract(&self.get_pixel_origin());
        Point::new(
            layer_point.x + self.size.x / 2.0,
            layer_point.y + self.size.y / 2.0,
        )
    }

    /// Converts container pixel coordinates back to geographical coordinates
    pub fn pixel_to_lat_lng(&self, pixel: &Point) -> LatLng {
        let layer_point = Point::new(pixel.x - self.size.x / 2.0, pixel.y - self.size.y / 2.0);
        self.unproject(&layer_point.add(&self.get_pixel_origin()), None)
    }

    /// Whether a container point lies inside the visible rectangle
    pub fn contains_pixel(&self, pixel: &Point) -> bool {
        pixel.x >= 0.0 && pixel.y >= 0.0 && pixel.x <= self.size.x && pixel.y <= self.size.y
    }

    /// Pans the viewport by the given pixel offset
    pub fn pan(&mut self, delta: Point) {
        let center_point = self.project(&self.center, None);
        let new_center = self.unproject(&center_point.add(&delta), None);
        self.set_center(new_center);
    }

    /// Zooms to a level, keeping `focus_point` (container pixels) stationary when given
    pub fn zoom_to(&mut self, zoom: f64, focus_point: Option<Point>) {
        let new_zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        if (new_zoom - self.zoom).abs() < 0.001 {
            return;
        }

        match focus_point {
            Some(focus_screen) => {
                let focus_lat_lng = self.pixel_to_lat_lng(&focus_screen);
                self.zoom = new_zoom;
                self.update_pixel_origin();

                let offset = self.lat_lng_to_pixel(&focus_lat_lng).subtract(&focus_screen);
                self.pan(offset);
            }
            None => {
                self.zoom = new_zoom;
                self.update_pixel_origin();
            }
        }
    }

    /// Gets the current viewport bounds in geographical coordinates
    pub fn bounds(&self) -> GeoBounds {
        let nw = self.pixel_to_lat_lng(&Point::new(0.0, 0.0));
        let se = self.pixel_to_lat_lng(&Point::new(self.size.x, self.size.y));

        let mut bounds = GeoBounds::from_corners(nw, se);
        bounds.west = bounds.west.max(-180.0);
        bounds.east = bounds.east.min(180.0);
        bounds
    }

    /// Gets the resolution in meters per pixel at the current zoom level
    pub fn resolution(&self) -> f64 {
        let earth_circumference = 40_075_016.0;
        earth_circumference / (TILE_SIZE as f64 * 2_f64.powf(self.zoom))
    }

    fn clamp_center(center: LatLng) -> LatLng {
        LatLng::new(
            center.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE),
            center.lng.clamp(-180.0, 180.0),
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(LatLng::new(0.0, 0.0), 0.0, Point::new(800.0, 600.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewport_creation() {
        let viewport = Viewport::new(
            LatLng::new(40.7128, -74.0060),
            10.0,
            Point::new(800.0, 600.0),
        );

        assert_eq!(viewport.zoom, 10.0);
        assert_eq!(viewport.center.lat, 40.7128);
        assert_eq!(viewport.size.x, 800.0);
    }

    #[test]
    fn test_coordinate_conversion() {
        let viewport = Viewport::new(LatLng::new(0.0, 0.0), 1.0, Point::new(512.0, 512.0));

        let center_lat_lng = viewport.pixel_to_lat_lng(&Point::new(256.0, 256.0));
        assert!(center_lat_lng.lat.abs() < 0.01);
        assert!(center_lat_lng.lng.abs() < 0.01);
    }

    #[test]
    fn test_center_projects_to_middle_of_container() {
        let viewport = Viewport::new(LatLng::new(40.7128, -74.0060), 13.0, Point::new(800.0, 600.0));
        let pixel = viewport.lat_lng_to_pixel(&viewport.center);
        assert!((pixel.x - 400.0).abs() < 1.0);
        assert!((pixel.y - 300.0).abs() < 1.0);
    }

    #[test]
    fn test_zoom_limits() {
        let mut viewport = Viewport::default();
        viewport.set_zoom_limits(2.0, 15.0);

        viewport.set_zoom(1.0);
        assert_eq!(viewport.zoom, 2.0);

        viewport.set_zoom(20.0);
        assert_eq!(viewport.zoom, 15.0);
    }

    #[test]
    fn test_pan_moves_center_east() {
        let mut viewport = Viewport::new(LatLng::new(0.0, 0.0), 4.0, Point::new(512.0, 512.0));
        viewport.pan(Point::new(100.0, 0.0));
        assert!(viewport.center.lng > 0.0);
        assert!(viewport.center.lat.abs() < 1e-6);
    }

    #[test]
    fn test_zoom_to_keeps_focus_point_fixed() {
        let mut viewport = Viewport::new(LatLng::new(40.0, -74.0), 10.0, Point::new(800.0, 600.0));
        let focus = Point::new(600.0, 150.0);
        let before = viewport.pixel_to_lat_lng(&focus);

        viewport.zoom_to(12.0, Some(focus));

        let after = viewport.lat_lng_to_pixel(&before);
        assert_eq!(viewport.zoom, 12.0);
        assert!((after.x - focus.x).abs() < 2.0);
        assert!((after.y - focus.y).abs() < 2.0);
    }

    #[test]
    fn test_bounds_are_ordered_and_contain_center() {
        let samples = [
            (LatLng::new(40.7128, -74.0060), 13.0),
            (LatLng::new(-33.86, 151.2), 5.0),
            (LatLng::new(84.0, 179.0), 2.0),
            (LatLng::new(0.0, 0.0), 0.0),
        ];

        for (center, zoom) in samples {
            let viewport = Viewport::new(center, zoom, Point::new(1024.0, 768.0));
            let bounds = viewport.bounds();
            assert!(bounds.south <= bounds.north, "{bounds:?}");
            assert!(bounds.west <= bounds.east, "{bounds:?}");
            assert!(bounds.contains(&viewport.center), "{bounds:?}");
        }
    }
}
