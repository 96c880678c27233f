// Location telemetry — the "user is here" backend contract.
//
// The backend uses reported positions for awareness and notification
// processing. Payload shape is a logical contract; implementations
// serialize however their transport expects.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

use crate::geo::GeoPoint;

/// A single outbound location report.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LocationUpdate {
    pub coords: GeoPoint,
    /// Radius within which the user wants to be made aware of content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_of_awareness: Option<f64>,
    /// Radius within which the user's own content exerts presence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius_of_influence: Option<f64>,
}

impl LocationUpdate {
    pub fn new(coords: GeoPoint) -> Self {
        Self {
            coords,
            radius_of_awareness: None,
            radius_of_influence: None,
        }
    }
}

/// Backend sink for location reports. Best-effort: callers treat
/// failures as droppable.
#[async_trait]
pub trait LocationTelemetryService: Send + Sync {
    async fn post_location(&self, update: LocationUpdate) -> Result<()>;
}
