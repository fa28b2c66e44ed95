//! Drives the location → place name + forecast pipeline and owns the
//! resulting [`FetchState`].
//!
//! The lookup runs on the first usable fix. Fixes that arrive once a place
//! name is known are ignored; a failed lookup leaves the place empty, so the
//! next fix starts a new attempt.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::geocode::Geocoder;
use crate::location::LocationSource;
use crate::provider::ForecastSource;
use crate::types::{Coordinates, Forecast};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Snapshot published to presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchState {
    pub is_loading: bool,
    /// Empty until resolved
    pub place: String,
    pub forecast: Option<Arc<Forecast>>,
    pub phase: FetchPhase,
}

impl Default for FetchState {
    fn default() -> Self {
        Self {
            is_loading: true,
            place: String::new(),
            forecast: None,
            phase: FetchPhase::Idle,
        }
    }
}

impl FetchState {
    fn ready(place: String, forecast: Forecast) -> Self {
        Self {
            is_loading: false,
            place,
            forecast: Some(Arc::new(forecast)),
            phase: FetchPhase::Ready,
        }
    }

    fn failed() -> Self {
        Self {
            is_loading: false,
            place: String::new(),
            forecast: None,
            phase: FetchPhase::Failed,
        }
    }

    pub fn has_place(&self) -> bool {
        !self.place.is_empty()
    }
}

pub struct FetchOrchestrator {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn ForecastSource>,
    state: watch::Sender<FetchState>,
    cancel: CancellationToken,
}

impl FetchOrchestrator {
    pub fn new(geocoder: Arc<dyn Geocoder>, weather: Arc<dyn ForecastSource>) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            geocoder,
            weather,
            state,
            cancel: CancellationToken::new(),
        }
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Stop the location subscription and abandon any in-flight lookup.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Subscribe to `source` and process fixes until shutdown or until the
    /// source stops delivering.
    pub async fn run(&self, source: &dyn LocationSource) {
        // Latest fix only; bursts that arrive during a lookup coalesce.
        let (fix_tx, mut fix_rx) = watch::channel::<Option<Coordinates>>(None);
        source.start_updates(
            Box::new(move |coords| {
                fix_tx.send_replace(Some(coords));
            }),
            self.cancel.child_token(),
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!("Fetch orchestrator shut down");
                    break;
                }
                changed = fix_rx.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Location source closed");
                        break;
                    }
                    let Some(coords) = *fix_rx.borrow_and_update() else {
                        continue;
                    };
                    self.handle_fix(coords).await;
                }
            }
        }
    }

    async fn handle_fix(&self, coords: Coordinates) {
        if self.state.borrow().has_place() {
            tracing::debug!(
                "Place already resolved, ignoring fix {}, {}",
                coords.latitude,
                coords.longitude
            );
            return;
        }

        tracing::info!(
            "Looking up place and forecast for {}, {}",
            coords.latitude,
            coords.longitude
        );
        self.state.send_modify(|s| {
            s.is_loading = true;
            s.phase = FetchPhase::Loading;
        });

        let lookup = async {
            tokio::join!(
                self.geocoder.resolve(coords),
                self.weather.resolve(coords)
            )
        };
        let (place, forecast) = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!("Lookup cancelled");
                return;
            }
            results = lookup => results,
        };

        match (place, forecast) {
            (Ok(place), Ok(forecast)) => {
                tracing::info!("Forecast ready for {}", place);
                self.state.send_replace(FetchState::ready(place, forecast));
            }
            (place, forecast) => {
                if let Err(e) = &place {
                    tracing::warn!("Reverse geocoding failed: {}", e);
                }
                if let Err(e) = &forecast {
                    tracing::warn!("Weather fetch failed: {}", e);
                }
                self.state.send_replace(FetchState::failed());
            }
        }
    }
}
