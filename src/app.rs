use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use skycast_core::{AppError, Config};
use skycast_weather::{
    Coordinates, FetchOrchestrator, FetchState, GeocodeClient, GeocodeSettings,
    LocationPermissions, LocationSource, ManualLocationSource, RetryConfig, StaticLocationSource,
    WeatherClient, WeatherSettings,
};
use tokio::sync::watch;

/// Application state and lifecycle: wires config into the clients, the
/// location source and the fetch orchestrator.
pub struct App {
    config: Arc<Config>,
    orchestrator: Arc<FetchOrchestrator>,
    source: Arc<dyn LocationSource>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let retry = RetryConfig::new(
            config.retry.max_retries,
            config.retry.initial_delay_ms,
            config.retry.max_delay_ms,
        );

        let geocoder = GeocodeClient::new(GeocodeSettings {
            base_url: config.geocoding.base_url.clone(),
            api_key: config.geocoding.api_key.clone(),
            result_index: config.geocoding.result_index,
            component_index: config.geocoding.component_index,
            timeout: Duration::from_secs(config.geocoding.timeout_secs),
            retry: retry.clone(),
        })
        .map_err(|e| AppError::Service(e.to_string()))?;

        let weather = WeatherClient::new(WeatherSettings {
            base_url: config.weather.base_url.clone(),
            timeout: Duration::from_secs(config.weather.timeout_secs),
            retry,
        })
        .map_err(|e| AppError::Service(e.to_string()))?;

        let permissions = LocationPermissions {
            fine: config.location.fine_location,
            coarse: config.location.coarse_location,
        };
        let source: Arc<dyn LocationSource> = match config.location.coordinates() {
            Some((latitude, longitude)) => Arc::new(StaticLocationSource::new(
                Coordinates::new(latitude, longitude),
                Duration::from_millis(config.location.update_interval_ms),
                permissions,
            )),
            None => {
                tracing::warn!("No coordinates configured, waiting for a location fix");
                Arc::new(ManualLocationSource::new(permissions))
            }
        };

        let orchestrator = Arc::new(FetchOrchestrator::new(Arc::new(geocoder), Arc::new(weather)));

        Ok(Self {
            config: Arc::new(config),
            orchestrator,
            source,
        })
    }

    /// Start the lookup pipeline in the background.
    pub fn start(&self) -> tokio::task::JoinHandle<()> {
        tracing::info!("Starting location updates");
        let orchestrator = self.orchestrator.clone();
        let source = self.source.clone();
        tokio::spawn(async move { orchestrator.run(source.as_ref()).await })
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.orchestrator.subscribe()
    }

    pub fn snapshot(&self) -> FetchState {
        self.orchestrator.snapshot()
    }

    /// Cancel location updates and any in-flight lookup
    pub fn shutdown(&self) {
        tracing::info!("Shutting down application");
        self.orchestrator.shutdown();
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }
}
