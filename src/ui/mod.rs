//! Presentation helpers for the detail popup.

pub mod format;
pub mod popup;

pub use format::{format_coordinates, format_time, time_ago};
pub use popup::IncidentPopup;
