use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{AppError, ConfigError};

/// Environment variable that overrides `geocoding.api_key`.
pub const GEOCODING_KEY_ENV: &str = "SKYCAST_GEOCODING_API_KEY";

/// Milliseconds between location fixes unless configured otherwise.
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 5000;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Forecast service settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Reverse geocoding settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,

    /// Location source settings
    #[serde(default)]
    pub location: LocationConfig,

    /// Retry policy shared by both HTTP clients
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Open-Meteo API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Google Geocoding API base URL
    pub base_url: String,

    /// API key (can also be set via SKYCAST_GEOCODING_API_KEY)
    #[serde(default)]
    pub api_key: String,

    /// Which entry of `results` holds the place name
    #[serde(default = "default_place_index")]
    pub result_index: usize,

    /// Which entry of that result's `address_components` holds the place name
    #[serde(default = "default_place_index")]
    pub component_index: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

fn default_place_index() -> usize {
    3
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com/maps/api/geocode".to_string(),
            api_key: String::new(),
            result_index: default_place_index(),
            component_index: default_place_index(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Fixed device latitude; unset means no location is available
    pub latitude: Option<f64>,

    /// Fixed device longitude
    pub longitude: Option<f64>,

    /// Milliseconds between location fixes
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,

    /// Fine location grant
    #[serde(default = "default_granted")]
    pub fine_location: bool,

    /// Coarse location grant
    #[serde(default = "default_granted")]
    pub coarse_location: bool,
}

fn default_update_interval_ms() -> u64 {
    DEFAULT_UPDATE_INTERVAL_MS
}

fn default_granted() -> bool {
    true
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            update_interval_ms: default_update_interval_ms(),
            fine_location: default_granted(),
            coarse_location: default_granted(),
        }
    }
}

impl LocationConfig {
    /// Both coordinates, when configured
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: u32,

    /// First backoff delay in milliseconds, doubled per attempt
    pub initial_delay_ms: u64,

    /// Backoff cap in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 250,
            max_delay_ms: 5000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("skycast");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            geocoding: GeocodingConfig::default(),
            location: LocationConfig::default(),
            retry: RetrySettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from the user config directory, creating a default
    /// file if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, creating a default file if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str::<Config>(&contents)
                .map_err(|e| AppError::Config(ConfigError::ParseError(e.to_string())))
                .context("Failed to parse config file")?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Self::load()?.into_validated()
    }

    /// Validate an already loaded configuration, logging warnings.
    pub fn into_validated(self) -> Result<(Self, ValidationResult)> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(AppError::Config(ConfigError::Invalid(validation.error_summary())).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((self, validation))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var(GEOCODING_KEY_ENV) {
            if !key.is_empty() {
                self.geocoding.api_key = key;
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        self.validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        self.validate_url(&self.geocoding.base_url, "geocoding.base_url", &mut result);

        if self.weather.timeout_secs == 0 {
            result.add_error("weather.timeout_secs", "Timeout must be greater than 0");
        }
        if self.geocoding.timeout_secs == 0 {
            result.add_error("geocoding.timeout_secs", "Timeout must be greater than 0");
        }

        if self.geocoding.api_key.is_empty() {
            result.add_warning(
                "geocoding.api_key",
                format!("No API key set (config or {}); place lookup will fail", GEOCODING_KEY_ENV),
            );
        }

        match (self.location.latitude, self.location.longitude) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) {
                    result.add_error("location.latitude", format!("Latitude out of range: {}", lat));
                }
                if !(-180.0..=180.0).contains(&lon) {
                    result.add_error(
                        "location.longitude",
                        format!("Longitude out of range: {}", lon),
                    );
                }
            }
            (None, None) => {
                result.add_warning(
                    "location",
                    "No coordinates configured - no location fixes will be delivered",
                );
            }
            _ => {
                result.add_error("location", "Latitude and longitude must be set together");
            }
        }

        if self.location.update_interval_ms == 0 {
            result.add_error(
                "location.update_interval_ms",
                "Update interval must be greater than 0",
            );
        }

        if !(self.location.fine_location && self.location.coarse_location) {
            result.add_warning(
                "location",
                "Location permission not granted - no location fixes will be delivered",
            );
        }

        if self.retry.max_retries > 10 {
            result.add_warning("retry.max_retries", "More than 10 retries configured");
        }
        if self.retry.initial_delay_ms > self.retry.max_delay_ms {
            result.add_warning(
                "retry.initial_delay_ms",
                "Initial delay exceeds the maximum delay",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }
                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to the user config directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}
