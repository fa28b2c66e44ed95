//! Open-Meteo forecast client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

use crate::retry::{with_retry, RetryConfig};
use crate::types::{Coordinates, FetchError, Forecast};

pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/v1";
const REQUEST_TIMEOUT_SECS: u64 = 10;

const CURRENT_FIELDS: &str = "temperature_2m,weather_code,is_day,wind_speed_10m";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation_probability,weather_code,wind_speed_10m";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min,sunrise,sunset,uv_index_max,rain_sum,precipitation_probability_max";

/// Resolves coordinates to a forecast.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn resolve(&self, coords: Coordinates) -> Result<Forecast, FetchError>;
}

#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryConfig,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_WEATHER_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Client,
    settings: WeatherSettings,
}

impl WeatherClient {
    pub fn new(settings: WeatherSettings) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(settings.timeout).build()?;

        Ok(Self { client, settings })
    }

    #[instrument(skip(self), level = "info")]
    async fn fetch_once(&self, coords: Coordinates) -> Result<Forecast, FetchError> {
        let url = format!("{}/forecast", self.settings.base_url.trim_end_matches('/'));

        let response = self
            .client
            .get(&url)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
            ])
            .query(&[
                ("current", CURRENT_FIELDS),
                ("hourly", HOURLY_FIELDS),
                ("daily", DAILY_FIELDS),
                ("timezone", "auto"),
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

        let forecast: Forecast = response
            .json()
            .await
            .map_err(|e| FetchError::MalformedResponse(format!("forecast JSON: {}", e)))?;
        forecast.validate()?;

        tracing::debug!(
            "Fetched forecast: {} hours, {} days",
            forecast.hourly.len(),
            forecast.daily.len()
        );
        Ok(forecast)
    }
}

#[async_trait]
impl ForecastSource for WeatherClient {
    async fn resolve(&self, coords: Coordinates) -> Result<Forecast, FetchError> {
        with_retry(&self.settings.retry, || self.fetch_once(coords)).await
    }
}
