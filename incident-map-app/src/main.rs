use anyhow::{bail, Context};
use incident_map::prelude::*;

const VIEW_SIZE: (f64, f64) = (1200.0, 800.0);

/// Replays a short map session: pan, hover a marker, report an incident.
///
/// Talks to a PostgREST backend when `INCIDENT_MAP_URL` is set, otherwise
/// runs against seeded in-memory data.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    incident_map::init_debug_logging();

    let profile = match std::env::args().nth(1) {
        Some(name) => parse_profile(&name)?,
        None => SyncProfile::Balanced,
    };

    let (store, geocoder): (Arc<dyn IncidentStore>, Option<Arc<dyn ReverseGeocoder>>) =
        match RestIncidentStore::from_env() {
            Ok(store) => {
                log::info!("using incident backend at {}", store.config().base_url);
                let geocoder: Arc<dyn ReverseGeocoder> =
                    Arc::new(CachingGeocoder::new(NominatimGeocoder::new(), 128));
                (Arc::new(store) as Arc<dyn IncidentStore>, Some(geocoder))
            }
            Err(err) => {
                log::info!("{err}; replaying against demo data");
                (Arc::new(demo_store()) as Arc<dyn IncidentStore>, None)
            }
        };

    let mut sync = ViewportSync::with_profile(
        store,
        Point::new(VIEW_SIZE.0, VIEW_SIZE.1),
        &profile,
    )
    .context("invalid sync configuration")?;
    if let Some(geocoder) = geocoder {
        sync = sync.with_geocoder(geocoder);
    }

    let events = sync.subscribe();
    let printer = std::thread::spawn(move || {
        for event in events.iter() {
            print_event(&event);
        }
    });

    run_session(&sync).await?;

    sync.teardown();
    println!("teardown: {} listeners left", sync.listener_count());
    if printer.join().is_err() {
        bail!("event printer panicked");
    }
    Ok(())
}

async fn run_session(sync: &ViewportSync) -> anyhow::Result<()> {
    let settle = sync.options().debounce() + Duration::from_millis(200);

    sync.start().await;
    println!("started with {} markers in view", sync.marker_count());

    // A quick burst of pans collapses into a single fetch.
    for step in 1..=3 {
        let viewport = sync.viewport();
        sync.handle_event(MapEvent::MoveEnd {
            center: LatLng::new(viewport.center.lat, viewport.center.lng + 0.004 * step as f64),
            zoom: viewport.zoom,
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tokio::time::sleep(settle).await;
    println!("after panning: {} markers", sync.marker_count());

    if let Some(marker) = sync.visible_markers().first() {
        sync.handle_event(MapEvent::MarkerHover { id: marker.id() });
        tokio::time::sleep(Duration::from_millis(300)).await;
        print_popup(&sync.popup());
        sync.handle_event(MapEvent::MarkerOut { id: marker.id() });
    }

    let here = sync.viewport().center;
    sync.handle_event(MapEvent::Click { lat_lng: here });
    tokio::time::sleep(Duration::from_millis(500)).await;

    let report = NewIncident::new(
        "Fire on 5th Avenue",
        "Smoke visible from the corner",
        here.lat,
        here.lng,
        "demo-user",
    );
    let created = sync
        .create_incident(report)
        .await
        .context("failed to report incident")?;
    println!(
        "reported #{} at zoom {}; {} markers",
        created.id,
        sync.viewport().zoom,
        sync.marker_count()
    );

    for cluster in sync.clusters() {
        println!("  cluster {} with {} markers", cluster.id, cluster.count());
    }
    tokio::time::sleep(settle).await;
    Ok(())
}

fn parse_profile(name: &str) -> anyhow::Result<SyncProfile> {
    Ok(match name {
        "balanced" => SyncProfile::Balanced,
        "responsive" => SyncProfile::Responsive,
        "low-bandwidth" => SyncProfile::LowBandwidth,
        other => bail!("unknown profile {other:?} (balanced, responsive, low-bandwidth)"),
    })
}

fn demo_store() -> InMemoryIncidentStore {
    let now = chrono::Utc::now();
    let seed = [
        (1, 40.7138, -74.0021, IncidentStatus::Active, "Water main break on Church St", 12),
        (2, 40.7101, -74.0090, IncidentStatus::InProgress, "Power outage in the Financial District", 95),
        (3, 40.7162, -73.9985, IncidentStatus::Resolved, "Fallen tree blocking Canal St", 60 * 26),
        (4, 40.7170, -74.0120, IncidentStatus::Active, "Broken traffic light at Chambers St", 3),
    ];
    InMemoryIncidentStore::with_incidents(seed.into_iter().map(
        |(id, lat, lng, status, title, minutes_ago)| Incident {
            id,
            owner_id: "seed".to_string(),
            lat,
            lng,
            status,
            title: title.to_string(),
            content: String::new(),
            created_at: now - chrono::Duration::minutes(minutes_ago),
            address: None,
        },
    ))
}

fn print_popup(popup: &IncidentPopup) {
    let now = chrono::Utc::now();
    match (popup.title(), popup.anchor()) {
        (Some(title), Some(anchor)) => {
            println!("popup at ({:.0}, {:.0}): {title}", anchor.x, anchor.y);
            if let Some(line) = popup.location_line() {
                println!("  {line}");
            }
            if let Some(line) = popup.time_line(now) {
                println!("  {line}");
            }
        }
        _ if popup.loading => println!("popup still loading"),
        _ => println!("no popup"),
    }
}

fn print_event(event: &SyncEvent) {
    match event {
        SyncEvent::MarkerAdded { summary, follow } => println!(
            "+ marker #{} ({}){}",
            summary.id,
            summary.status,
            if *follow { ", following" } else { "" }
        ),
        SyncEvent::ActiveIncidentChanged { incident: Some(incident) } => {
            println!("> showing #{}", incident.id)
        }
        SyncEvent::ActiveIncidentChanged { incident: None } => println!("> popup closed"),
        SyncEvent::CreateFormOpened { location } => {
            println!("> create form at {:.4}, {:.4}", location.lat, location.lng)
        }
        SyncEvent::CreateFormAddressResolved { address, .. } => {
            println!("> create form address: {}", address.label())
        }
        SyncEvent::FetchFailed { message } => println!("! fetch failed: {message}"),
        other => log::debug!("{other:?}"),
    }
}
