// Position provider — the abstract contract over the OS location
// service. Two acquisition modes: a one-shot fetch and a continuous
// watch. Real implementations bridge platform callbacks into the
// watch channel; tests script both sides.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::geo::GeoPoint;

/// A raw position sample from the OS provider. Ephemeral: consumed
/// once by the sample filter, then either promoted to "previous
/// accepted sample" or discarded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UserPositionSample {
    pub coords: GeoPoint,
    pub captured_at: DateTime<Utc>,
}

impl UserPositionSample {
    pub fn new(coords: GeoPoint, captured_at: DateTime<Utc>) -> Self {
        Self {
            coords,
            captured_at,
        }
    }
}

/// Position acquisition failures, by recoverability.
///
/// `Timeout` is recoverable while a sibling source is still pending;
/// the others fail the acquisition upward so the caller can fall back
/// to a non-located view.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    /// The provider refuses access. Fatal to location-dependent
    /// features for the session; not retried automatically.
    #[error("location permission denied")]
    PermissionDenied,

    /// No fix arrived in time. Only fatal once every racing source
    /// has timed out.
    #[error("timed out waiting for a position fix")]
    Timeout,

    /// Any other provider failure.
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// A running watch subscription: a stream of samples plus a stop
/// signal. Stopping is idempotent, and dropping the watch stops it,
/// so a torn-down screen can't leak a live subscription.
pub struct PositionWatch {
    rx: mpsc::Receiver<Result<UserPositionSample, PositionError>>,
    stop: Option<oneshot::Sender<()>>,
}

impl PositionWatch {
    pub fn new(
        rx: mpsc::Receiver<Result<UserPositionSample, PositionError>>,
        stop: oneshot::Sender<()>,
    ) -> Self {
        Self {
            rx,
            stop: Some(stop),
        }
    }

    /// The next sample or error from the provider. `None` once the
    /// provider side has shut down.
    pub async fn next(&mut self) -> Option<Result<UserPositionSample, PositionError>> {
        self.rx.recv().await
    }

    /// Stop the subscription. Safe to call more than once; only the
    /// first call signals the provider.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

impl Drop for PositionWatch {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The OS location service contract.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// One-shot position fetch. Can be slow when nothing is cached.
    async fn get_once(&self) -> Result<UserPositionSample, PositionError>;

    /// Start a continuous watch. The returned handle must be stopped
    /// (or dropped) to release the underlying subscription.
    fn watch(&self) -> Result<PositionWatch, PositionError>;
}
