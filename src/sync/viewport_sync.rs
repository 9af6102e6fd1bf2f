//! Keeps a map view's markers and popup in sync with the incident store.
//!
//! [`ViewportSync`] owns the headless view state: camera, marker layer,
//! de-duplication registry, detail cache, popup placement and the create
//! form. Two flows run against the store independently:
//!
//! * the viewport flow, triggered by camera changes and coalesced by a
//!   [`DebounceScheduler`], lists the incidents inside the visible bounds and
//!   turns unseen ones into markers;
//! * the detail flow, triggered by marker hover or click, loads a full
//!   incident for the popup. Every request takes a fresh token and only the
//!   response carrying the current token is shown.
//!
//! State lives behind a `std::sync::Mutex` that is never held across an
//! `.await`, so a slow request in one flow never blocks the other.

use crate::{
    core::{
        config::{SyncOptions, SyncProfile},
        geo::{GeoBounds, LatLng, Point},
        viewport::Viewport,
    },
    geocode::ReverseGeocoder,
    incidents::{validate_new_incident, Address, Incident, IncidentId, IncidentSummary, NewIncident},
    input::{
        events::{MapEvent, SyncEvent},
        listeners::{ListenerKind, ListenerRegistry},
    },
    layers::marker::{Marker, MarkerLayer},
    prelude::{Arc, Mutex},
    runtime::spawn,
    spatial::clustering::Cluster,
    store::IncidentStore,
    sync::{
        debounce::DebounceScheduler, detail_cache::IncidentDetailCache, popup::PopupTracker,
        registry::MarkerRegistry,
    },
    traits::{CacheStats, Cacheable, ViewportAware},
    ui::popup::IncidentPopup,
    Result,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::{MutexGuard, PoisonError};
use strum::{AsRefStr, Display};

/// Lifecycle of a map view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum SyncPhase {
    /// Created, listeners bound, nothing fetched yet
    Initializing,
    Idle,
    /// At least one viewport fetch is outstanding
    FetchingViewport,
    TornDown,
}

/// How a marker asked for its details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum DetailTrigger {
    /// Unpinned: the popup closes again on mouse-out
    Hover,
    /// Pinned until closed explicitly or toggled
    Click,
}

/// The open "report an incident" form
#[derive(Debug, Clone, PartialEq)]
pub struct CreateForm {
    pub location: LatLng,
    /// Filled in once reverse geocoding completes
    pub address: Option<Address>,
}

enum DetailStart {
    Cached(Incident),
    Fetch(u64),
}

struct SyncState {
    phase: SyncPhase,
    viewport: Viewport,
    registry: MarkerRegistry,
    markers: MarkerLayer,
    details: IncidentDetailCache,
    popup: PopupTracker,
    active_incident: Option<Incident>,
    detail_loading: bool,
    /// Token of the only detail response allowed to reach the popup
    detail_token: u64,
    fetches_in_flight: usize,
    create_form: Option<CreateForm>,
    form_token: u64,
    debounce: DebounceScheduler,
    listeners: ListenerRegistry,
    subscribers: Vec<Sender<SyncEvent>>,
}

impl SyncState {
    fn is_torn_down(&self) -> bool {
        self.phase == SyncPhase::TornDown
    }

    fn emit(&mut self, event: SyncEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn add_marker(&mut self, summary: IncidentSummary, follow: bool) -> bool {
        if !self.registry.add(summary.id) {
            return false;
        }
        self.markers.add_marker(Marker::for_incident(summary.clone()));
        self.emit(SyncEvent::MarkerAdded { summary, follow });
        true
    }

    fn reproject_popup(&mut self) {
        if !self.popup.requires_viewport_updates() {
            return;
        }
        if let Err(err) = self.popup.on_viewport_changed(&self.viewport) {
            log::warn!("failed to reproject popup: {err}");
        }
        let position = self.popup.position();
        self.emit(SyncEvent::PopupMoved { position });
    }

    fn begin_detail(&mut self, id: IncidentId, anchor: LatLng, pinned: bool) -> DetailStart {
        self.close_create_form();
        self.detail_token += 1;

        let listener = match self.popup.listener() {
            Some(listener) => listener,
            None => self.listeners.register(ListenerKind::PopupProjection),
        };
        if let Some(released) = self.popup.activate(id, anchor, pinned, listener, &self.viewport) {
            self.listeners.unregister(released);
        }
        let position = self.popup.position();
        self.emit(SyncEvent::PopupMoved { position });

        match self.details.get(id) {
            Some(incident) => {
                self.detail_loading = false;
                self.active_incident = Some(incident.clone());
                self.emit(SyncEvent::ActiveIncidentChanged {
                    incident: Some(incident.clone()),
                });
                DetailStart::Cached(incident)
            }
            None => {
                self.detail_loading = true;
                self.active_incident = None;
                self.emit(SyncEvent::DetailLoading { id });
                DetailStart::Fetch(self.detail_token)
            }
        }
    }

    fn finish_detail(
        &mut self,
        id: IncidentId,
        token: u64,
        result: Result<Incident>,
    ) -> Option<Incident> {
        if self.is_torn_down() {
            log::debug!("discarding detail for incident {id} after teardown");
            return None;
        }

        match result {
            Ok(incident) => {
                self.details.put(id, incident.clone());
                if token != self.detail_token {
                    log::debug!("discarding stale detail for incident {id}");
                    return None;
                }
                self.detail_loading = false;
                self.active_incident = Some(incident.clone());
                self.emit(SyncEvent::ActiveIncidentChanged {
                    incident: Some(incident.clone()),
                });
                Some(incident)
            }
            Err(err) => {
                log::warn!("failed to load incident {id}: {err}");
                if token == self.detail_token {
                    self.close_popup();
                }
                None
            }
        }
    }

    fn close_popup(&mut self) {
        // In-flight detail responses become stale.
        self.detail_token += 1;
        let was_open = self.popup.active_id().is_some() || self.active_incident.is_some();
        if let Some(listener) = self.popup.deactivate() {
            self.listeners.unregister(listener);
        }
        self.active_incident = None;
        self.detail_loading = false;
        if was_open {
            self.emit(SyncEvent::ActiveIncidentChanged { incident: None });
            self.emit(SyncEvent::PopupMoved { position: None });
        }
    }

    fn close_create_form(&mut self) -> bool {
        if self.create_form.take().is_none() {
            return false;
        }
        self.form_token += 1;
        self.emit(SyncEvent::CreateFormClosed);
        true
    }

    fn resolve_form_address(&mut self, token: u64, address: Address) {
        if token != self.form_token {
            return;
        }
        let Some(form) = self.create_form.as_mut() else {
            return;
        };
        form.address = Some(address.clone());
        let location = form.location;
        self.emit(SyncEvent::CreateFormAddressResolved { location, address });
    }
}

/// Headless sync engine for one map view.
///
/// Cloning is cheap and yields another handle to the same view; spawned
/// fetches hold such a handle.
#[derive(Clone)]
pub struct ViewportSync {
    store: Arc<dyn IncidentStore>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    options: SyncOptions,
    state: Arc<Mutex<SyncState>>,
}

impl ViewportSync {
    /// Creates the view and binds its map listeners. Nothing is fetched
    /// until [`start`](Self::start).
    pub fn new(
        store: Arc<dyn IncidentStore>,
        viewport: Viewport,
        options: SyncOptions,
    ) -> Result<Self> {
        options.validate()?;

        let mut listeners = ListenerRegistry::new();
        for kind in [
            ListenerKind::MoveEnd,
            ListenerKind::ZoomEnd,
            ListenerKind::Resize,
            ListenerKind::MapClick,
            ListenerKind::MarkerInteraction,
        ] {
            listeners.register(kind);
        }

        let state = SyncState {
            phase: SyncPhase::Initializing,
            viewport,
            registry: MarkerRegistry::new(),
            markers: MarkerLayer::new(options.clustering.clone()),
            details: IncidentDetailCache::with_config(&options.cache),
            popup: PopupTracker::new(),
            active_incident: None,
            detail_loading: false,
            detail_token: 0,
            fetches_in_flight: 0,
            create_form: None,
            form_token: 0,
            debounce: DebounceScheduler::new(options.debounce()),
            listeners,
            subscribers: Vec::new(),
        };

        Ok(Self {
            store,
            geocoder: None,
            options,
            state: Arc::new(Mutex::new(state)),
        })
    }

    /// Creates a view of `size` pixels at the profile's initial camera
    pub fn with_profile(
        store: Arc<dyn IncidentStore>,
        size: Point,
        profile: &SyncProfile,
    ) -> Result<Self> {
        let options = profile.resolve();
        let viewport = Viewport::new(
            options.camera.initial_center,
            options.camera.initial_zoom,
            size,
        );
        Self::new(store, viewport, options)
    }

    /// Resolves an address whenever the create form opens
    pub fn with_geocoder(mut self, geocoder: Arc<dyn ReverseGeocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Leaves `Initializing` and issues the first viewport fetch
    pub async fn start(&self) {
        {
            let mut state = self.lock();
            if state.phase != SyncPhase::Initializing {
                log::warn!("start() called in phase {}", state.phase);
                return;
            }
            state.phase = SyncPhase::Idle;
        }
        log::debug!("viewport sync started");

        if self.options.fetch.fetch_on_start {
            // Failures are logged and reported as FetchFailed.
            let _ = self.fetch_viewport().await;
        }
    }

    /// Feeds one map event into the engine. Store requests are spawned in
    /// the background; events after teardown are ignored.
    pub fn handle_event(&self, event: MapEvent) {
        let mut guard = self.lock();
        let state = &mut *guard;
        if state.is_torn_down() {
            log::trace!("ignoring {event:?} after teardown");
            return;
        }

        match event {
            MapEvent::MoveEnd { center, zoom } | MapEvent::ZoomEnd { center, zoom } => {
                state.viewport.set_view(center, zoom);
                self.on_camera_changed(state);
            }
            MapEvent::Resize { size } => {
                state.viewport.set_size(size);
                self.on_camera_changed(state);
            }
            MapEvent::Click { lat_lng } => {
                drop(guard);
                self.open_create_form(lat_lng);
            }
            MapEvent::MarkerHover { id } => {
                if state.popup.is_active(id) {
                    return;
                }
                if let Some(anchor) = state.markers.get(id).map(Marker::position) {
                    if let DetailStart::Fetch(token) = state.begin_detail(id, anchor, false) {
                        drop(guard);
                        self.spawn_detail(id, token);
                    }
                }
            }
            MapEvent::MarkerOut { id } => {
                if state.popup.is_active(id) && !state.popup.is_pinned() {
                    state.close_popup();
                }
            }
            MapEvent::MarkerClick { id } => {
                if state.popup.is_active(id) {
                    if state.popup.is_pinned() {
                        state.close_popup();
                    } else {
                        state.popup.pin();
                    }
                    return;
                }
                if let Some(anchor) = state.markers.get(id).map(Marker::position) {
                    if let DetailStart::Fetch(token) = state.begin_detail(id, anchor, true) {
                        drop(guard);
                        self.spawn_detail(id, token);
                    }
                }
            }
            MapEvent::PopupClose => state.close_popup(),
        }
    }

    fn on_camera_changed(&self, state: &mut SyncState) {
        state.reproject_popup();
        let sync = self.clone();
        state.debounce.schedule(move || async move {
            let _ = sync.fetch_viewport().await;
        });
    }

    /// The popup is already active for `id` under `token`; only the store
    /// request runs in the background.
    fn spawn_detail(&self, id: IncidentId, token: u64) {
        let sync = self.clone();
        drop(spawn(async move {
            sync.load_detail(id, token).await;
        }));
    }

    async fn load_detail(&self, id: IncidentId, token: u64) -> Option<Incident> {
        let result = self.store.get_incident_by_id(id).await;
        self.lock().finish_detail(id, token, result)
    }

    /// Lists the incidents inside the current bounds and adds markers for
    /// unseen ids. Returns how many markers were added.
    ///
    /// A failure is logged, reported as [`SyncEvent::FetchFailed`] and
    /// leaves existing markers untouched.
    pub async fn fetch_viewport(&self) -> Result<usize> {
        let bounds = {
            let mut state = self.lock();
            if state.is_torn_down() {
                return Ok(0);
            }
            state.fetches_in_flight += 1;
            state.phase = SyncPhase::FetchingViewport;
            state.viewport.bounds()
        };
        log::debug!("fetching incidents in {bounds:?}");

        let result = self.store.list_incidents_in_bounds(bounds).await;

        let mut state = self.lock();
        if state.is_torn_down() {
            log::debug!("discarding viewport results after teardown");
            return Ok(0);
        }
        state.fetches_in_flight = state.fetches_in_flight.saturating_sub(1);
        if state.fetches_in_flight == 0 {
            state.phase = SyncPhase::Idle;
        }

        match result {
            Ok(summaries) => {
                let fetched = summaries.len();
                let added = summaries
                    .into_iter()
                    .map(|summary| state.add_marker(summary, false))
                    .filter(|added| *added)
                    .count();
                log::debug!("viewport fetch returned {fetched} incidents, {added} new");
                Ok(added)
            }
            Err(err) => {
                log::warn!("viewport fetch failed: {err}");
                state.emit(SyncEvent::FetchFailed {
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Activates the marker at `anchor` and loads its incident, from the
    /// detail cache when possible.
    ///
    /// Returns the incident if it ended up in the popup; a response
    /// overtaken by a newer request returns `None`.
    pub async fn show_detail(
        &self,
        id: IncidentId,
        anchor: LatLng,
        trigger: DetailTrigger,
    ) -> Option<Incident> {
        let token = {
            let mut state = self.lock();
            if state.is_torn_down() {
                return None;
            }
            match state.begin_detail(id, anchor, trigger == DetailTrigger::Click) {
                DetailStart::Cached(incident) => return Some(incident),
                DetailStart::Fetch(token) => token,
            }
        };

        self.load_detail(id, token).await
    }

    /// Closes the detail popup and invalidates any in-flight detail request
    pub fn close_popup(&self) {
        let mut state = self.lock();
        if !state.is_torn_down() {
            state.close_popup();
        }
    }

    /// Opens the create form at `location`, closing the detail popup
    pub fn open_create_form(&self, location: LatLng) {
        let token = {
            let mut state = self.lock();
            if state.is_torn_down() {
                return;
            }
            state.close_popup();
            state.form_token += 1;
            state.create_form = Some(CreateForm {
                location,
                address: None,
            });
            state.emit(SyncEvent::CreateFormOpened { location });
            state.form_token
        };

        if let Some(geocoder) = self.geocoder.clone() {
            let sync = self.clone();
            drop(spawn(async move {
                if let Some(address) = geocoder.reverse(location).await {
                    sync.lock().resolve_form_address(token, address);
                }
            }));
        }
    }

    pub fn close_create_form(&self) {
        self.lock().close_create_form();
    }

    /// Validates and persists a new incident, then shows it right away:
    /// the marker is added without a re-fetch, the camera follows it at the
    /// follow zoom and the create form closes.
    pub async fn create_incident(&self, mut incident: NewIncident) -> Result<Incident> {
        validate_new_incident(&incident)?;

        if incident.address.is_none() {
            incident.address = self
                .lock()
                .create_form
                .as_ref()
                .filter(|form| form.location == incident.position())
                .and_then(|form| form.address.clone());
        }

        let created = self.store.create_incident(incident).await?;
        log::info!("created incident {} \"{}\"", created.id, created.title);

        let mut guard = self.lock();
        let state = &mut *guard;
        if state.is_torn_down() {
            return Ok(created);
        }
        state.details.put(created.id, created.clone());
        state.add_marker(created.summary(), true);
        state
            .viewport
            .set_view(created.position(), self.options.camera.follow_zoom);
        state.close_create_form();
        self.on_camera_changed(state);

        Ok(created)
    }

    /// Adds a marker unless its id is already registered
    pub fn add_marker(&self, summary: IncidentSummary, follow: bool) -> bool {
        let mut state = self.lock();
        !state.is_torn_down() && state.add_marker(summary, follow)
    }

    /// Releases every listener, marker and pending timer. Responses that
    /// arrive afterwards are dropped.
    pub fn teardown(&self) {
        let mut state = self.lock();
        if state.is_torn_down() {
            return;
        }
        state.phase = SyncPhase::TornDown;
        state.debounce.cancel();

        state.popup.deactivate();
        let released = state.listeners.clear();
        state.registry.clear();
        state.markers.clear();
        state.details.clear_cache();
        state.active_incident = None;
        state.detail_loading = false;
        state.detail_token += 1;
        state.create_form = None;
        state.form_token += 1;
        state.fetches_in_flight = 0;
        state.subscribers.clear();

        log::debug!("viewport sync torn down, released {released} listeners");
    }

    // --- accessors -----------------------------------------------------------------------------

    pub fn phase(&self) -> SyncPhase {
        self.lock().phase
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn viewport(&self) -> Viewport {
        self.lock().viewport.clone()
    }

    pub fn bounds(&self) -> GeoBounds {
        self.lock().viewport.bounds()
    }

    pub fn marker_count(&self) -> usize {
        self.lock().markers.len()
    }

    pub fn has_marker(&self, id: IncidentId) -> bool {
        self.lock().registry.has(id)
    }

    pub fn marker(&self, id: IncidentId) -> Option<Marker> {
        self.lock().markers.get(id).cloned()
    }

    /// Markers inside the current bounds, by id
    pub fn visible_markers(&self) -> Vec<Marker> {
        let state = self.lock();
        let bounds = state.viewport.bounds();
        state
            .markers
            .markers_in(&bounds)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn active_incident(&self) -> Option<Incident> {
        self.lock().active_incident.clone()
    }

    pub fn active_marker(&self) -> Option<IncidentId> {
        self.lock().popup.active_id()
    }

    pub fn popup(&self) -> IncidentPopup {
        let state = self.lock();
        IncidentPopup {
            incident: state.active_incident.clone(),
            loading: state.detail_loading,
            position: state.popup.position(),
        }
    }

    pub fn create_form(&self) -> Option<CreateForm> {
        self.lock().create_form.clone()
    }

    /// Markers grouped for rendering at the current zoom
    pub fn clusters(&self) -> Vec<Cluster<Marker>> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.markers.clusters(&state.viewport)
    }

    pub fn listener_count(&self) -> usize {
        self.lock().listeners.count()
    }

    pub fn is_fetch_pending(&self) -> bool {
        self.lock().debounce.is_pending()
    }

    pub fn detail_cache_stats(&self) -> CacheStats {
        self.lock().details.cache_stats()
    }

    /// A new receiver for every [`SyncEvent`] emitted from now on. The
    /// channel disconnects on teardown.
    pub fn subscribe(&self) -> Receiver<SyncEvent> {
        let (sender, receiver) = unbounded();
        let mut state = self.lock();
        if !state.is_torn_down() {
            state.subscribers.push(sender);
        }
        receiver
    }
}
