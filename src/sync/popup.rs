//! Tracks which marker owns the detail popup and where it sits on screen.

use crate::{
    core::{
        geo::{LatLng, Point},
        viewport::Viewport,
    },
    incidents::IncidentId,
    input::listeners::ListenerId,
    traits::ViewportAware,
    Result,
};

#[derive(Debug, Clone, PartialEq)]
struct ActiveMarker {
    id: IncidentId,
    anchor: LatLng,
    /// Opened by a click; hover-out leaves pinned popups alone
    pinned: bool,
    listener: ListenerId,
    position: Point,
}

#[derive(Debug, Default)]
pub struct PopupTracker {
    active: Option<ActiveMarker>,
}

impl PopupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `id` the active marker, projecting it through `viewport`.
    ///
    /// Returns the projection listener of the previously active marker when
    /// it differs from `listener` and should be released.
    pub fn activate(
        &mut self,
        id: IncidentId,
        anchor: LatLng,
        pinned: bool,
        listener: ListenerId,
        viewport: &Viewport,
    ) -> Option<ListenerId> {
        let position = viewport.lat_lng_to_pixel(&anchor);
        let replaced = self.active.replace(ActiveMarker {
            id,
            anchor,
            pinned,
            listener,
            position,
        });
        replaced
            .map(|previous| previous.listener)
            .filter(|previous| *previous != listener)
    }

    /// Clears the active marker, returning its projection listener
    pub fn deactivate(&mut self) -> Option<ListenerId> {
        self.active.take().map(|active| active.listener)
    }

    pub fn pin(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.pinned = true;
        }
    }

    pub fn active_id(&self) -> Option<IncidentId> {
        self.active.as_ref().map(|active| active.id)
    }

    pub fn listener(&self) -> Option<ListenerId> {
        self.active.as_ref().map(|active| active.listener)
    }

    pub fn is_active(&self, id: IncidentId) -> bool {
        self.active_id() == Some(id)
    }

    pub fn is_pinned(&self) -> bool {
        self.active.as_ref().map(|active| active.pinned).unwrap_or(false)
    }

    pub fn anchor(&self) -> Option<LatLng> {
        self.active.as_ref().map(|active| active.anchor)
    }

    /// Container position of the active marker
    pub fn position(&self) -> Option<Point> {
        self.active.as_ref().map(|active| active.position)
    }
}

impl ViewportAware for PopupTracker {
    fn on_viewport_changed(&mut self, viewport: &Viewport) -> Result<()> {
        if let Some(active) = self.active.as_mut() {
            active.position = viewport.lat_lng_to_pixel(&active.anchor);
        }
        Ok(())
    }

    fn requires_viewport_updates(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::listeners::{ListenerKind, ListenerRegistry};

    fn viewport() -> Viewport {
        Viewport::new(LatLng::new(40.7128, -74.006), 13.0, Point::new(800.0, 600.0))
    }

    #[test]
    fn test_active_marker_sits_at_container_center() {
        let mut listeners = ListenerRegistry::new();
        let mut tracker = PopupTracker::new();
        assert!(!tracker.requires_viewport_updates());

        let listener = listeners.register(ListenerKind::PopupProjection);
        let released = tracker.activate(
            5,
            LatLng::new(40.7128, -74.006),
            false,
            listener,
            &viewport(),
        );
        assert!(released.is_none());

        let position = tracker.position().unwrap();
        // the pixel origin is floored, so allow sub-pixel drift
        assert!((position.x - 400.0).abs() < 1.0);
        assert!((position.y - 300.0).abs() < 1.0);
        assert!(tracker.requires_viewport_updates());
        assert!(!tracker.is_pinned());
    }

    #[test]
    fn test_position_follows_camera() {
        let mut listeners = ListenerRegistry::new();
        let mut tracker = PopupTracker::new();
        let listener = listeners.register(ListenerKind::PopupProjection);
        let mut view = viewport();
        tracker.activate(5, view.center, true, listener, &view);

        view.pan(Point::new(100.0, 0.0));
        tracker.on_viewport_changed(&view).unwrap();

        let position = tracker.position().unwrap();
        assert!((position.x - 300.0).abs() < 1.5);
        assert_eq!(tracker.deactivate(), Some(listener));
        assert_eq!(tracker.position(), None);
    }

    #[test]
    fn test_switching_markers_releases_previous_listener() {
        let mut listeners = ListenerRegistry::new();
        let mut tracker = PopupTracker::new();
        let first = listeners.register(ListenerKind::PopupProjection);
        let second = listeners.register(ListenerKind::PopupProjection);

        tracker.activate(1, LatLng::new(40.7, -74.0), false, first, &viewport());
        assert_eq!(
            tracker.activate(2, LatLng::new(40.71, -74.0), false, first, &viewport()),
            None
        );
        assert_eq!(
            tracker.activate(3, LatLng::new(40.72, -74.0), false, second, &viewport()),
            Some(first)
        );
        assert!(tracker.is_active(3));
    }
}
