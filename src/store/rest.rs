//! PostgREST-backed incident store.

use crate::{
    core::geo::GeoBounds,
    incidents::{Address, Incident, IncidentId, IncidentStatus, IncidentSummary, NewIncident},
    prelude::Duration,
    store::IncidentStore,
    IncidentMapError, Result,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use reqwest::{RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};

const TABLE_PATH: &str = "rest/v1/incidents";
const SUMMARY_COLUMNS: &str = "id,user_id,lat,lng,status";
const OBJECT_MEDIA_TYPE: &str = "application/vnd.pgrst.object+json";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const URL_ENV: &str = "INCIDENT_MAP_URL";
pub const KEY_ENV: &str = "INCIDENT_MAP_KEY";
pub const TIMEOUT_ENV: &str = "INCIDENT_MAP_TIMEOUT_MS";

/// Shared async HTTP client; per-request timeouts come from [`StoreConfig`]
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!("incident-map/", env!("CARGO_PKG_VERSION")))
        .tcp_keepalive(Duration::from_secs(30))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .unwrap_or_else(|err| {
            log::error!("failed to build tuned HTTP client, using defaults: {err}");
            reqwest::Client::new()
        })
});

/// Connection settings for [`RestIncidentStore`]
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `INCIDENT_MAP_URL`, `INCIDENT_MAP_KEY` and `INCIDENT_MAP_TIMEOUT_MS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| IncidentMapError::Config(format!("{URL_ENV} is not set")))?;

        let mut config = Self::new(base_url);
        if let Some(key) = lookup(KEY_ENV).filter(|key| !key.is_empty()) {
            config = config.with_api_key(key);
        }
        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| {
                IncidentMapError::Config(format!("{TIMEOUT_ENV} must be milliseconds, got {raw:?}"))
            })?;
            config = config.with_timeout(Duration::from_millis(millis));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(IncidentMapError::Config(format!(
                "base url must be http(s), got {:?}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(IncidentMapError::Config("timeout must be non-zero".to_string()));
        }
        Ok(())
    }

    fn table_url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), TABLE_PATH)
    }
}

/// Query pairs selecting summaries inside `bounds`, edges inclusive
pub(crate) fn bounds_query(bounds: &GeoBounds) -> Vec<(&'static str, String)> {
    vec![
        ("select", SUMMARY_COLUMNS.to_string()),
        ("lat", format!("gte.{}", bounds.south)),
        ("lat", format!("lte.{}", bounds.north)),
        ("lng", format!("gte.{}", bounds.west)),
        ("lng", format!("lte.{}", bounds.east)),
    ]
}

pub(crate) fn by_id_query(id: IncidentId) -> Vec<(&'static str, String)> {
    vec![("select", "*".to_string()), ("id", format!("eq.{id}"))]
}

// --- wire rows ---------------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SummaryRow {
    id: IncidentId,
    user_id: String,
    lat: f64,
    lng: f64,
    status: IncidentStatus,
}

impl From<SummaryRow> for IncidentSummary {
    fn from(row: SummaryRow) -> Self {
        Self {
            id: row.id,
            owner_id: row.user_id,
            lat: row.lat,
            lng: row.lng,
            status: row.status,
        }
    }
}

#[derive(Debug, Deserialize)]
struct IncidentRow {
    id: IncidentId,
    user_id: String,
    lat: f64,
    lng: f64,
    #[serde(default)]
    status: IncidentStatus,
    title: String,
    #[serde(default)]
    content: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    address_name: Option<String>,
    #[serde(default)]
    address_display: Option<String>,
}

impl From<IncidentRow> for Incident {
    fn from(row: IncidentRow) -> Self {
        let address = match (row.address_name, row.address_display) {
            (None, None) => None,
            (name, display) => Some(Address {
                display_line: display.unwrap_or_default(),
                name,
            }),
        };
        Self {
            id: row.id,
            owner_id: row.user_id,
            lat: row.lat,
            lng: row.lng,
            status: row.status,
            title: row.title,
            content: row.content.unwrap_or_default(),
            created_at: row.created_at,
            address,
        }
    }
}

#[derive(Debug, Serialize)]
struct InsertRow<'a> {
    title: &'a str,
    content: &'a str,
    lat: f64,
    lng: f64,
    user_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    address_display: Option<&'a str>,
}

impl<'a> From<&'a NewIncident> for InsertRow<'a> {
    fn from(incident: &'a NewIncident) -> Self {
        let address = incident.address.as_ref();
        Self {
            title: &incident.title,
            content: &incident.content,
            lat: incident.lat,
            lng: incident.lng,
            user_id: &incident.owner_id,
            address_name: address.and_then(|a| a.name.as_deref()),
            address_display: address.map(|a| a.display_line.as_str()),
        }
    }
}

// --- store -------------------------------------------------------------------------------------

/// Incident store speaking the PostgREST dialect over HTTP
pub struct RestIncidentStore {
    config: StoreConfig,
}

impl RestIncidentStore {
    pub fn new(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(StoreConfig::from_env()?)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.timeout(self.config.timeout);
        match &self.config.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(IncidentMapError::Transport(format!(
        "backend responded {status}: {body}"
    )))
}

#[async_trait]
impl IncidentStore for RestIncidentStore {
    async fn list_incidents_in_bounds(&self, bounds: GeoBounds) -> Result<Vec<IncidentSummary>> {
        let request = HTTP_CLIENT
            .get(self.config.table_url())
            .query(&bounds_query(&bounds));
        let response = ensure_success(self.authorize(request).send().await?).await?;
        let body = response.bytes().await?;
        let rows: Vec<SummaryRow> = serde_json::from_slice(&body)?;

        log::debug!("listed {} incidents in {:?}", rows.len(), bounds);
        Ok(rows.into_iter().map(IncidentSummary::from).collect())
    }

    async fn get_incident_by_id(&self, id: IncidentId) -> Result<Incident> {
        let request = HTTP_CLIENT
            .get(self.config.table_url())
            .query(&by_id_query(id))
            .header(reqwest::header::ACCEPT, OBJECT_MEDIA_TYPE);
        let response = self.authorize(request).send().await?;
        // PostgREST answers 406 when the singular object form matches no row.
        if matches!(response.status(), StatusCode::NOT_ACCEPTABLE | StatusCode::NOT_FOUND) {
            return Err(IncidentMapError::NotFound(id));
        }
        let body = ensure_success(response).await?.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(IncidentMapError::NotFound(id));
        }
        let row: IncidentRow = serde_json::from_slice(&body)?;
        Ok(row.into())
    }

    async fn create_incident(&self, incident: NewIncident) -> Result<Incident> {
        let request = HTTP_CLIENT
            .post(self.config.table_url())
            .header("Prefer", "return=representation")
            .header(reqwest::header::ACCEPT, OBJECT_MEDIA_TYPE)
            .json(&InsertRow::from(&incident));
        let body = ensure_success(self.authorize(request).send().await?)
            .await?
            .bytes()
            .await?;
        let row: IncidentRow = serde_json::from_slice(&body)?;

        log::info!("created incident {} ({})", row.id, row.title);
        Ok(row.into())
    }
}
