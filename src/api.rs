// Upstream hotel catalog: wire types, the client trait and its reqwest implementation

use crate::config::ApiConfig;
use crate::locale::Locale;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

pub const LOCATIONS_PATH: &str = "/locations/search";
pub const PROPERTIES_PATH: &str = "/properties/list";
pub const DEFAULT_PAGE_SIZE: u32 = 25;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("status {status_code}")]
    Status { status_code: u16 },

    #[error("network error: {0}")]
    Network(String),

    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Default, Clone)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub pages_fetched: usize,
    pub average_response_time_ms: f64,
}

impl ClientStats {
    fn record(&mut self, elapsed: Duration, succeeded: bool) {
        self.requests_sent += 1;
        if succeeded {
            self.requests_succeeded += 1;
        } else {
            self.requests_failed += 1;
        }
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.average_response_time_ms = (self.average_response_time_ms
            * (self.requests_sent - 1) as f64
            + elapsed_ms)
            / self.requests_sent as f64;
    }
}

// Location search response
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationSearchResponse {
    pub suggestions: Vec<SuggestionGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SuggestionGroup {
    pub group: String,
    pub entities: Vec<LocationEntity>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LocationEntity {
    pub destination_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub caption: String,
    pub name: String,
}

impl LocationEntity {
    pub fn is_city(&self) -> bool {
        self.kind == "CITY"
    }
}

// Property listing response
#[derive(Debug, Deserialize)]
struct PropertiesEnvelope {
    data: PropertiesData,
}

#[derive(Debug, Deserialize)]
struct PropertiesData {
    body: PropertiesBody,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertiesBody {
    search_results: PropertiesPage,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PropertiesPage {
    pub results: Vec<Listing>,
    pub pagination: Pagination,
}

impl PropertiesPage {
    pub fn has_next_page(&self) -> bool {
        self.pagination.next_page_number.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: Option<u32>,
    pub next_page_number: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Listing {
    pub name: String,
    pub address: Address,
    pub landmarks: Vec<Landmark>,
    pub rate_plan: Option<RatePlan>,
}

impl Listing {
    // Distance string of the first landmark, which upstream reports relative to the city center
    pub fn landmark_distance(&self) -> Option<&str> {
        self.landmarks.first().map(|landmark| landmark.distance.as_str())
    }

    pub fn current_price(&self) -> Option<&str> {
        self.rate_plan
            .as_ref()
            .map(|plan| plan.price.current.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Address {
    pub country_name: String,
    pub locality: String,
    pub street_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Landmark {
    pub label: String,
    pub distance: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RatePlan {
    pub price: RatePrice,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RatePrice {
    pub current: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "PRICE")]
    Price,
    #[serde(rename = "PRICE_HIGHEST_FIRST")]
    PriceHighestFirst,
}

// Query parameters of the property listing endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertiesQuery {
    pub page_number: u32,
    pub page_size: u32,
    pub destination_id: String,
    pub sort_order: SortOrder,
    pub locale: Locale,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "amount")]
    pub price_min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "amount")]
    pub price_max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landmark_ids: Option<String>,
}

// Prices go out as the user typed them: `100`, not `100.0`
fn amount<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}

#[derive(Debug, Serialize)]
struct LocationQuery<'a> {
    query: &'a str,
    locale: Locale,
}

#[async_trait]
pub trait HotelsApi: Send + Sync + 'static {
    // Free-text location lookup
    async fn search_locations(
        &self,
        query: &str,
        locale: Locale,
    ) -> Result<LocationSearchResponse, ApiError>;

    // One page of the property listing
    async fn list_properties(&self, query: &PropertiesQuery) -> Result<PropertiesPage, ApiError>;

    fn stats(&self) -> ClientStats;
}

pub struct RapidApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    stats: Mutex<ClientStats>,
}

impl RapidApiClient {
    pub fn new(config: ApiConfig) -> Result<Self, ClientError> {
        if config.api_key.trim().is_empty() {
            return Err(ClientError::ConfigError("api_key is not set".to_string()));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            http,
            config,
            stats: Mutex::new(ClientStats::default()),
        })
    }

    // Sends one GET request and returns the raw body of a successful response
    async fn fetch<Q>(&self, path: &str, query: &Q) -> Result<Bytes, ApiError>
    where
        Q: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let started = Instant::now();

        let result = self.send(&url, query).await;
        self.stats.lock().record(started.elapsed(), result.is_ok());
        result
    }

    async fn send<Q>(&self, url: &str, query: &Q) -> Result<Bytes, ApiError>
    where
        Q: Serialize + ?Sized,
    {
        let response = self
            .http
            .get(url)
            .header("X-RapidAPI-Key", &self.config.api_key)
            .header("X-RapidAPI-Host", &self.config.api_host)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        debug!(url, status = status.as_u16(), "upstream responded");
        if !status.is_success() {
            warn!(url, status = status.as_u16(), "upstream request failed");
            return Err(ApiError::Status {
                status_code: status.as_u16(),
            });
        }

        response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }
}

fn decode<T: DeserializeOwned>(body: Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(&body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn decode_properties(body: Bytes) -> Result<PropertiesPage, ApiError> {
    let envelope: PropertiesEnvelope = decode(body)?;
    Ok(envelope.data.body.search_results)
}

#[async_trait]
impl HotelsApi for RapidApiClient {
    async fn search_locations(
        &self,
        query: &str,
        locale: Locale,
    ) -> Result<LocationSearchResponse, ApiError> {
        decode(
            self.fetch(LOCATIONS_PATH, &LocationQuery { query, locale })
                .await?,
        )
    }

    async fn list_properties(&self, query: &PropertiesQuery) -> Result<PropertiesPage, ApiError> {
        let page = decode_properties(self.fetch(PROPERTIES_PATH, query).await?)?;
        self.stats.lock().pages_fetched += 1;
        Ok(page)
    }

    fn stats(&self) -> ClientStats {
        self.stats.lock().clone()
    }
}
