//! Core constants derived from Leaflet defaults and the report map's observed behavior.
//! Keeping them in a single place makes it easier to tweak crate-wide magic numbers.

/// Square tile size in pixels; the projection's world width at zoom 0.
pub const TILE_SIZE: u32 = 256;

pub const MIN_ZOOM: f64 = 0.0;

/// OpenStreetMap tiles stop at 19.
pub const MAX_ZOOM: f64 = 19.0;

/// Quiet period before a pan/zoom triggers a viewport fetch.
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Initial camera: lower Manhattan.
pub const DEFAULT_CENTER: (f64, f64) = (40.7128, -74.006);

pub const DEFAULT_ZOOM: f64 = 13.0;

/// Zoom used when the camera follows a freshly created incident.
pub const FOLLOW_ZOOM: f64 = 18.0;

/// Marker icon edge length in pixels (square SVG).
pub const MARKER_ICON_SIZE: u32 = 36;

/// Radii of the marker's outer halo and inner dot.
pub const MARKER_OUTER_RADIUS: u32 = 16;
pub const MARKER_INNER_RADIUS: u32 = 5;

/// Vertical gap between the marker anchor and the popup's bottom edge.
pub const POPUP_OFFSET_Y: f64 = 25.0;

/// Minimum trimmed title length accepted for a new incident.
pub const MIN_TITLE_LEN: usize = 10;
