//! Status-colored marker icons: a translucent halo with a solid center dot.

use crate::{
    core::constants::{MARKER_ICON_SIZE, MARKER_INNER_RADIUS, MARKER_OUTER_RADIUS},
    incidents::IncidentStatus,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// RGBA color, written as `#RRGGBB` or `#RRGGBBAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn is_opaque(&self) -> bool {
        self.a == 0xFF
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

/// Visual descriptor for one incident marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerIcon {
    pub inner: Color,
    pub outer: Color,
    /// Edge length of the square icon in pixels
    pub size: u32,
}

impl MarkerIcon {
    /// Anchor at the icon center, in icon pixels
    pub fn anchor(&self) -> (u32, u32) {
        (self.size / 2, self.size / 2)
    }

    /// Popup anchor relative to the icon anchor
    pub fn popup_anchor(&self) -> (i32, i32) {
        (0, -((self.size / 2) as i32))
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Inline SVG markup for HTML overlays
    pub fn to_svg(&self) -> String {
        let center = self.size / 2;
        format!(
            r#"<svg width="{size}" height="{size}"><circle cx="{center}" cy="{center}" r="{outer_r}" fill="{outer}" /><circle cx="{center}" cy="{center}" r="{inner_r}" fill="{inner}" /></svg>"#,
            size = self.size,
            outer_r = MARKER_OUTER_RADIUS,
            inner_r = MARKER_INNER_RADIUS,
            outer = self.outer,
            inner = self.inner,
        )
    }
}

/// Maps a status to its marker icon. Total over [`IncidentStatus`].
pub fn marker_icon(status: IncidentStatus) -> MarkerIcon {
    let (inner, outer) = match status {
        IncidentStatus::Active => (Color::rgb(0xFF, 0x00, 0x00), Color::rgb(0xF7, 0x8D, 0x8D)),
        IncidentStatus::InProgress => (
            Color::rgb(0xFF, 0x95, 0x00),
            Color::rgba(0xFF, 0xD8, 0xA8, 0x93),
        ),
        IncidentStatus::Resolved => (
            Color::rgb(0x34, 0xC7, 0x59),
            Color::rgba(0xB8, 0xF1, 0xC4, 0xA6),
        ),
    };

    MarkerIcon {
        inner,
        outer,
        size: MARKER_ICON_SIZE,
    }
}
