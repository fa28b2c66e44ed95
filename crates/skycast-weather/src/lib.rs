//! Weather lookup for SkyCast
//!
//! Resolves the device location to a place name (Google Geocoding) and a
//! current/hourly/daily forecast (Open-Meteo), and publishes the result as a
//! snapshot for presentation layers.

pub mod day_view;
pub mod geocode;
pub mod location;
pub mod orchestrator;
pub mod provider;
pub mod retry;
pub mod types;
pub mod view;

pub use geocode::{GeocodeClient, GeocodeSettings, Geocoder};
pub use location::{
    LocationCallback, LocationPermissions, LocationSource, ManualLocationSource,
    StaticLocationSource,
};
pub use orchestrator::{FetchOrchestrator, FetchPhase, FetchState};
pub use provider::{ForecastSource, WeatherClient, WeatherSettings};
pub use retry::RetryConfig;
pub use types::*;
pub use view::{DayDetailView, Screen, SummaryView};
