// Data shapes for geofenced content and per-user activation state.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

/// A piece of content anchored to a geographic point with a visibility
/// radius. Produced by the backend when a content search resolves;
/// read-only to this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeofencedContent {
    pub id: String,
    pub owner_id: String,
    pub center: GeoPoint,
    /// Radius of the fence circle, in meters. Non-negative when well
    /// formed; the gate fails closed on malformed values.
    pub radius_meters: f64,
    /// Additional allowance beyond the fence edge within which
    /// activation is still permitted.
    pub max_proximity_meters: f64,
    /// When true, history never bypasses the distance check — every
    /// view re-evaluates proximity, even for already-activated content.
    #[serde(default)]
    pub requires_proximity_to_view: bool,
}

impl GeofencedContent {
    /// Whether the fence geometry is well formed: finite center, finite
    /// non-negative radius and max-proximity.
    pub fn has_valid_geometry(&self) -> bool {
        self.center.is_finite()
            && self.radius_meters.is_finite()
            && self.radius_meters >= 0.0
            && self.max_proximity_meters.is_finite()
            && self.max_proximity_meters >= 0.0
    }
}

/// Per (user, content) activation state, owned by the reaction cache.
///
/// `has_activated` is an OR-latch: once true it never transitions back
/// within a session. The engine writes it only through
/// [`super::store::ActivationStore::upgrade`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationRecord {
    pub content_id: String,
    pub has_activated: bool,
    pub view_count: u32,
}

impl ActivationRecord {
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            has_activated: false,
            view_count: 0,
        }
    }
}
