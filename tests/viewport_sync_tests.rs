mod common;

use common::{advance, drain, incident, sync_for, ScriptedStore};
use incident_map::prelude::*;

/// Viewport flow: debounced fetches, de-duplication, failures and teardown
#[cfg(test)]
mod viewport_flow {
    use super::*;

    fn pan_to(lat: f64, lng: f64) -> MapEvent {
        MapEvent::MoveEnd {
            center: LatLng::new(lat, lng),
            zoom: 13.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_fetches_initial_viewport() {
        let store = ScriptedStore::new([incident(1, 40.71, -74.0), incident(2, 40.72, -74.01)]);
        let sync = sync_for(store.clone());
        assert_eq!(sync.phase(), SyncPhase::Initializing);

        sync.start().await;

        assert_eq!(sync.phase(), SyncPhase::Idle);
        assert_eq!(store.lists(), 1);
        assert_eq!(sync.marker_count(), 2);
        assert!(sync.has_marker(1) && sync.has_marker(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_result_twice_yields_one_marker() {
        let store = ScriptedStore::new([incident(1, 40.71, -74.0)]);
        let sync = sync_for(store.clone());
        let events = sync.subscribe();

        assert_eq!(sync.fetch_viewport().await.unwrap(), 1);
        assert_eq!(sync.fetch_viewport().await.unwrap(), 0);

        assert_eq!(sync.marker_count(), 1);
        let added = drain(&events)
            .into_iter()
            .filter(|event| matches!(event, SyncEvent::MarkerAdded { .. }))
            .count();
        assert_eq!(added, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_fetches_add_each_id_once() {
        let store = ScriptedStore::new([
            incident(1, 40.71, -74.0),
            incident(2, 40.712, -74.003),
            incident(3, 40.715, -74.01),
        ]);
        store.delay_list(Duration::from_millis(200));
        let sync = sync_for(store.clone());

        let (first, second) = tokio::join!(sync.fetch_viewport(), sync.fetch_viewport());

        assert_eq!(first.unwrap() + second.unwrap(), 3);
        assert_eq!(sync.marker_count(), 3);
        assert_eq!(store.lists(), 2);
        assert_eq!(sync.phase(), SyncPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_phase_reports_fetch_in_progress() {
        let store = ScriptedStore::new([incident(1, 40.71, -74.0)]);
        store.delay_list(Duration::from_millis(200));
        let sync = sync_for(store.clone());

        let background = sync.clone();
        let fetch = tokio::spawn(async move { background.fetch_viewport().await });
        advance(50).await;
        assert_eq!(sync.phase(), SyncPhase::FetchingViewport);

        fetch.await.unwrap().unwrap();
        assert_eq!(sync.phase(), SyncPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_camera_changes_fetches_once() {
        let store = ScriptedStore::new([incident(1, 40.71, -74.0)]);
        let sync = sync_for(store.clone());

        for step in 0..5 {
            sync.handle_event(pan_to(40.70 + step as f64 * 0.001, -74.0));
            advance(100).await;
        }
        assert_eq!(store.lists(), 0);
        assert!(sync.is_fetch_pending());

        advance(250).await;
        assert_eq!(store.lists(), 1);
        assert!(!sync.is_fetch_pending());
        assert!((sync.viewport().center.lat - 40.704).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_and_zoom_end_also_trigger_fetch() {
        let store = ScriptedStore::new([incident(1, 40.71, -74.0)]);
        let sync = sync_for(store.clone());

        sync.handle_event(MapEvent::Resize {
            size: Point::new(1024.0, 768.0),
        });
        advance(400).await;
        assert_eq!(store.lists(), 1);

        sync.handle_event(MapEvent::ZoomEnd {
            center: LatLng::new(40.71, -74.0),
            zoom: 15.0,
        });
        advance(400).await;
        assert_eq!(store.lists(), 2);
        assert_eq!(sync.viewport().zoom, 15.0);
        assert_eq!(sync.viewport().size, Point::new(1024.0, 768.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_leaves_markers_untouched() {
        let store = ScriptedStore::new([incident(1, 40.71, -74.0)]);
        let sync = sync_for(store.clone());
        sync.start().await;
        let events = sync.subscribe();

        store.fail_lists(true);
        let result = sync.fetch_viewport().await;

        assert!(matches!(result, Err(IncidentMapError::Transport(_))));
        assert_eq!(sync.marker_count(), 1);
        assert_eq!(sync.phase(), SyncPhase::Idle);
        assert!(drain(&events)
            .iter()
            .any(|event| matches!(event, SyncEvent::FetchFailed { .. })));

        // the next pan retries
        store.fail_lists(false);
        sync.handle_event(pan_to(40.71, -74.0));
        advance(400).await;
        assert_eq!(store.lists(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_teardown_cancels_timer_and_releases_listeners() {
        let store = ScriptedStore::new([incident(1, 40.71, -74.0)]);
        let sync = sync_for(store.clone());
        sync.start().await;

        sync.handle_event(MapEvent::MarkerClick { id: 1 });
        advance(10).await;
        assert_eq!(sync.listener_count(), 6);

        sync.handle_event(pan_to(40.72, -74.0));
        assert!(sync.is_fetch_pending());

        sync.teardown();
        assert_eq!(sync.phase(), SyncPhase::TornDown);
        assert_eq!(sync.listener_count(), 0);
        assert!(!sync.is_fetch_pending());
        assert_eq!(sync.marker_count(), 0);
        assert!(sync.active_incident().is_none());

        advance(1_000).await;
        assert_eq!(store.lists(), 1);

        // events after teardown are ignored
        sync.handle_event(pan_to(40.73, -74.0));
        advance(1_000).await;
        assert_eq!(store.lists(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_results_after_teardown_are_discarded() {
        let store = ScriptedStore::new([incident(1, 40.71, -74.0)]);
        store.delay_list(Duration::from_millis(500));
        let sync = sync_for(store.clone());

        let background = sync.clone();
        let fetch = tokio::spawn(async move { background.fetch_viewport().await });
        advance(100).await;
        sync.teardown();

        assert_eq!(fetch.await.unwrap().unwrap(), 0);
        assert_eq!(sync.marker_count(), 0);
        assert_eq!(sync.phase(), SyncPhase::TornDown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clusters_collapse_nearby_markers_when_zoomed_out() {
        let store = ScriptedStore::new([
            incident(1, 40.7100, -74.0000),
            incident(2, 40.7101, -74.0001),
            incident(3, 40.7102, -74.0002),
        ]);
        let sync = sync_for(store.clone());
        sync.start().await;

        let clustered = sync.clusters();
        assert_eq!(clustered.len(), 1);
        assert_eq!(clustered[0].count(), 3);

        sync.handle_event(MapEvent::ZoomEnd {
            center: LatLng::new(40.71, -74.0),
            zoom: 18.0,
        });
        let singles = sync.clusters();
        assert_eq!(singles.len(), 3);
        assert!(singles.iter().all(|cluster| cluster.is_single()));
    }
}
