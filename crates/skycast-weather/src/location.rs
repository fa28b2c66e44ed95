//! Location sources: push-style subscriptions that deliver device fixes.
//!
//! A source only starts emitting when both the fine and coarse location
//! grants are present. Without them `start_updates` does nothing and the
//! callback is never invoked.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::types::{Coordinates, FetchError};

/// Shortest interval a [`StaticLocationSource`] will tick at.
pub const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(1);

/// Callback invoked with every new fix.
pub type LocationCallback = Box<dyn Fn(Coordinates) + Send + Sync + 'static>;

/// The two grants a location subscription requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LocationPermissions {
    pub fine: bool,
    pub coarse: bool,
}

impl LocationPermissions {
    pub fn granted() -> Self {
        Self {
            fine: true,
            coarse: true,
        }
    }

    pub fn denied() -> Self {
        Self::default()
    }

    pub fn is_granted(&self) -> bool {
        self.fine && self.coarse
    }

    pub fn check(&self) -> Result<(), FetchError> {
        if self.is_granted() {
            Ok(())
        } else {
            Err(FetchError::PermissionDenied)
        }
    }
}

/// A stream of device locations.
pub trait LocationSource: Send + Sync {
    /// Begin delivering fixes to `on_update` until `cancel` fires.
    /// Identical consecutive fixes may be delivered more than once.
    fn start_updates(&self, on_update: LocationCallback, cancel: CancellationToken);
}

/// Re-emits fixed coordinates at a regular interval.
#[derive(Debug, Clone)]
pub struct StaticLocationSource {
    coords: Coordinates,
    interval: Duration,
    permissions: LocationPermissions,
}

impl StaticLocationSource {
    /// Intervals below [`MIN_UPDATE_INTERVAL`] are raised to it.
    pub fn new(coords: Coordinates, interval: Duration, permissions: LocationPermissions) -> Self {
        if interval < MIN_UPDATE_INTERVAL {
            tracing::warn!(
                "Location update interval {:?} too short, using {:?}",
                interval,
                MIN_UPDATE_INTERVAL
            );
        }
        Self {
            coords,
            interval: interval.max(MIN_UPDATE_INTERVAL),
            permissions,
        }
    }
}

impl LocationSource for StaticLocationSource {
    fn start_updates(&self, on_update: LocationCallback, cancel: CancellationToken) {
        if let Err(e) = self.permissions.check() {
            tracing::debug!("Location updates not started: {}", e);
            return;
        }

        let coords = self.coords;
        let interval = self.interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => on_update(coords),
                }
            }
            tracing::debug!("Location updates stopped");
        });
    }
}

/// Delivers whatever is pushed into it; for embedding a platform location
/// service or driving the pipeline by hand.
#[derive(Clone, Default)]
pub struct ManualLocationSource {
    permissions: LocationPermissions,
    subscribers: Arc<Mutex<Vec<(LocationCallback, CancellationToken)>>>,
}

impl ManualLocationSource {
    pub fn new(permissions: LocationPermissions) -> Self {
        Self {
            permissions,
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Deliver a fix to every live subscriber. Returns how many received it.
    pub fn push(&self, coords: Coordinates) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|(_, cancel)| !cancel.is_cancelled());
        for (callback, _) in subscribers.iter() {
            callback(coords);
        }
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .lock()
            .iter()
            .filter(|(_, cancel)| !cancel.is_cancelled())
            .count()
    }
}

impl std::fmt::Debug for ManualLocationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualLocationSource")
            .field("permissions", &self.permissions)
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl LocationSource for ManualLocationSource {
    fn start_updates(&self, on_update: LocationCallback, cancel: CancellationToken) {
        if let Err(e) = self.permissions.check() {
            tracing::debug!("Location updates not started: {}", e);
            return;
        }
        self.subscribers.lock().push((on_update, cancel));
    }
}
