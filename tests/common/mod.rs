//! Shared fixtures: a scriptable incident store with per-request delays.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use incident_map::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

/// Store whose latency and failures are set per test. Delays run on the
/// tokio clock, so paused-time tests stay deterministic.
#[derive(Default)]
pub struct ScriptedStore {
    incidents: Mutex<HashMap<IncidentId, Incident>>,
    detail_delays: Mutex<HashMap<IncidentId, Duration>>,
    list_delay: Mutex<Duration>,
    fail_list: AtomicBool,
    next_id: AtomicI64,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(incidents: impl IntoIterator<Item = Incident>) -> Arc<Self> {
        let store = Self {
            next_id: AtomicI64::new(100),
            ..Self::default()
        };
        {
            let mut map = store.incidents.lock().unwrap();
            for incident in incidents {
                map.insert(incident.id, incident);
            }
        }
        Arc::new(store)
    }

    pub fn delay_detail(&self, id: IncidentId, delay: Duration) {
        self.detail_delays.lock().unwrap().insert(id, delay);
    }

    pub fn delay_list(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = delay;
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_list.store(fail, Ordering::SeqCst);
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn details(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IncidentStore for ScriptedStore {
    /// Ignores the bounds: every known incident is "visible".
    async fn list_incidents_in_bounds(&self, _bounds: GeoBounds) -> Result<Vec<IncidentSummary>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.list_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(IncidentMapError::Transport("connection reset".to_string()));
        }
        let mut summaries: Vec<_> = self
            .incidents
            .lock()
            .unwrap()
            .values()
            .map(Incident::summary)
            .collect();
        summaries.sort_by_key(|summary| summary.id);
        Ok(summaries)
    }

    async fn get_incident_by_id(&self, id: IncidentId) -> Result<Incident> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.detail_delays.lock().unwrap().get(&id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.incidents
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(IncidentMapError::NotFound(id))
    }

    async fn create_incident(&self, new: NewIncident) -> Result<Incident> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let incident = Incident {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            owner_id: new.owner_id,
            lat: new.lat,
            lng: new.lng,
            status: IncidentStatus::Active,
            title: new.title,
            content: new.content,
            created_at: Utc::now(),
            address: new.address,
        };
        self.incidents
            .lock()
            .unwrap()
            .insert(incident.id, incident.clone());
        Ok(incident)
    }
}

pub fn incident(id: IncidentId, lat: f64, lng: f64) -> Incident {
    Incident {
        id,
        owner_id: "user-1".to_string(),
        lat,
        lng,
        status: IncidentStatus::Active,
        title: format!("Incident number {id}"),
        content: String::new(),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 15, 4, 0).unwrap(),
        address: None,
    }
}

/// A view over lower Manhattan with a 300ms debounce.
pub fn sync_for(store: Arc<ScriptedStore>) -> ViewportSync {
    ViewportSync::with_profile(store, Point::new(800.0, 600.0), &SyncProfile::Balanced).unwrap()
}

pub fn drain(events: &crossbeam_channel::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    events.try_iter().collect()
}

pub async fn advance(millis: u64) {
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
