// Proximity gate — the single authority on content activation.
//
// Whether a user may activate/view a piece of geofenced content comes
// down to four inputs: their position, the fence geometry, ownership,
// and any prior activation. The decision itself is a pure function;
// the one side effect (upgrading the activation record on a first
// permit) lives in the effectful wrapper and is gated strictly behind
// a permit outcome. Callers must not upgrade activation on their own.

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::content::{ActivationRecord, ActivationStore, ActivationUpgrade, GeofencedContent};
use crate::geo::{self, GeoPoint};

/// Why an activation was denied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DenialReason {
    /// The user stands too far outside the fence edge. Carries the
    /// proximity slack so callers can render a "move closer" notice.
    TooFar {
        slack_meters: f64,
        max_proximity_meters: f64,
    },
    /// The fence geometry is malformed (negative/NaN radius or
    /// coordinates). Denied rather than erroring so bad backend data
    /// can't take down the caller.
    InvalidGeometry,
}

/// Outcome of a gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Viewing is allowed. `first_activation` is true when this permit
    /// should upgrade the activation record.
    Permit { first_activation: bool },
    Deny { reason: DenialReason },
}

impl GateDecision {
    pub fn is_permit(&self) -> bool {
        matches!(self, GateDecision::Permit { .. })
    }
}

/// Evaluate the gate. Pure: same inputs, same decision.
///
/// Order of authority:
/// 1. Owners always see their own content, regardless of geometry.
/// 2. Malformed geometry (content or user position) denies outright.
/// 3. Proximity: permit when `distance - radius <= max_proximity`.
/// 4. History: already-activated content that doesn't require repeat
///    proximity stays viewable.
/// 5. Otherwise deny with the measured slack.
pub fn evaluate(
    user_position: GeoPoint,
    content: &GeofencedContent,
    is_owner: bool,
    activation: Option<&ActivationRecord>,
) -> GateDecision {
    if is_owner {
        return GateDecision::Permit {
            first_activation: false,
        };
    }

    if !content.has_valid_geometry() || !user_position.is_finite() {
        return GateDecision::Deny {
            reason: DenialReason::InvalidGeometry,
        };
    }

    let distance_to_center = geo::distance_meters(user_position, content.center);
    // Slack: how far outside the fence edge the user stands. Negative
    // or zero means inside or at the edge.
    let slack = distance_to_center - content.radius_meters;
    let proximity_satisfied = slack <= content.max_proximity_meters;

    if proximity_satisfied {
        let already_activated = activation.map(|a| a.has_activated).unwrap_or(false);
        return GateDecision::Permit {
            first_activation: !already_activated,
        };
    }

    let previously_discovered = activation.map(|a| a.has_activated).unwrap_or(false);
    if previously_discovered && !content.requires_proximity_to_view {
        return GateDecision::Permit {
            first_activation: false,
        };
    }

    GateDecision::Deny {
        reason: DenialReason::TooFar {
            slack_meters: slack,
            max_proximity_meters: content.max_proximity_meters,
        },
    }
}

/// The effectful gate: reads the activation record from the reaction
/// cache, evaluates, and records the upgrade on a first permit.
pub struct ProximityGate {
    store: Arc<dyn ActivationStore>,
}

impl ProximityGate {
    pub fn new(store: Arc<dyn ActivationStore>) -> Self {
        Self { store }
    }

    /// Evaluate the gate for the current position, upgrading the
    /// activation record when this is the first permit for the pair.
    ///
    /// An upgrade write failure does not revoke the permit: the store
    /// write is best-effort, and denying would make a network blip look
    /// like "too far" to the user.
    pub async fn check(
        &self,
        user_position: GeoPoint,
        content: &GeofencedContent,
        is_owner: bool,
    ) -> Result<GateDecision> {
        let activation = self.store.get(&content.id).await?;
        let decision = evaluate(user_position, content, is_owner, activation.as_ref());

        match decision {
            GateDecision::Permit {
                first_activation: true,
            } => {
                debug!(content_id = %content.id, "first activation");
                if let Err(err) = self
                    .store
                    .upgrade(&content.id, ActivationUpgrade::first_view())
                    .await
                {
                    warn!(content_id = %content.id, error = %err, "activation upgrade failed");
                }
            }
            GateDecision::Deny { reason } => {
                debug!(content_id = %content.id, ?reason, "activation denied");
            }
            _ => {}
        }

        Ok(decision)
    }
}
