//! Reverse geocoding: convert coordinates to a human-readable place name.
//! Uses the Google Geocoding API, which needs an API key.
//!
//! The place name is read from a fixed position in the response:
//! `results[PLACE_RESULT_INDEX].address_components[PLACE_COMPONENT_INDEX].long_name`.
//! Google orders results from most to least specific, so index 3 usually
//! lands on the locality level, but the position is not guaranteed. Both
//! indices are configurable for that reason.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::retry::{with_retry, RetryConfig};
use crate::types::{Coordinates, FetchError};

pub const DEFAULT_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode";
pub const PLACE_RESULT_INDEX: usize = 3;
pub const PLACE_COMPONENT_INDEX: usize = 3;
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = concat!("SkyCast/", env!("CARGO_PKG_VERSION"));

/// Resolves coordinates to a place name.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn resolve(&self, coords: Coordinates) -> Result<String, FetchError>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
    status: Option<String>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    long_name: String,
}

#[derive(Debug, Clone)]
pub struct GeocodeSettings {
    pub base_url: String,
    pub api_key: String,
    pub result_index: usize,
    pub component_index: usize,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for GeocodeSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GEOCODE_URL.to_string(),
            api_key: String::new(),
            result_index: PLACE_RESULT_INDEX,
            component_index: PLACE_COMPONENT_INDEX,
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }
}

/// Google Geocoding API client.
#[derive(Debug, Clone)]
pub struct GeocodeClient {
    client: Client,
    settings: GeocodeSettings,
}

impl GeocodeClient {
    pub fn new(settings: GeocodeSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, settings })
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_once(&self, coords: Coordinates) -> Result<String, FetchError> {
        let url = format!("{}/json", self.settings.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latlng", coords.latlng()),
                ("key", self.settings.api_key.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FetchError::Http {
                status: status.as_u16(),
                message: text,
            });
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| FetchError::MalformedResponse(format!("geocode JSON: {}", e)))?;

        let place = extract_place(
            body,
            self.settings.result_index,
            self.settings.component_index,
        )?;
        tracing::info!("Reverse geocoded to: {}", place);
        Ok(place)
    }
}

#[async_trait]
impl Geocoder for GeocodeClient {
    async fn resolve(&self, coords: Coordinates) -> Result<String, FetchError> {
        with_retry(&self.settings.retry, || self.fetch_once(coords)).await
    }
}

fn extract_place(
    body: GeocodeResponse,
    result_index: usize,
    component_index: usize,
) -> Result<String, FetchError> {
    if let Some(status) = body.status.as_deref() {
        if status != "OK" {
            let detail = body.error_message.unwrap_or_default();
            return Err(FetchError::Provider(if detail.is_empty() {
                status.to_string()
            } else {
                format!("{}: {}", status, detail)
            }));
        }
    }

    let result_count = body.results.len();
    let result = body.results.into_iter().nth(result_index).ok_or_else(|| {
        FetchError::MalformedResponse(format!(
            "geocode returned {} results, need index {}",
            result_count, result_index
        ))
    })?;

    let component_count = result.address_components.len();
    result
        .address_components
        .into_iter()
        .nth(component_index)
        .map(|c| c.long_name)
        .ok_or_else(|| {
            FetchError::MalformedResponse(format!(
                "geocode result {} has {} address components, need index {}",
                result_index, component_count, component_index
            ))
        })
}
