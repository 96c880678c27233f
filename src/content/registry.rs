// Layered containment lookup over the known set of geofenced content.
//
// A map press resolves to "the first fence containing the pressed
// point". Which item wins a tie is determined by layer priority: the
// user's own content is checked before connections' content. The
// layering is an explicit constructor parameter so the tie-break rule
// is visible and testable rather than an implicit caller convention.

use crate::content::models::GeofencedContent;
use crate::geo::{self, GeoPoint};

/// A read-only view over the currently known content, organized as
/// ordered layers (highest priority first).
pub struct GeofenceRegistry {
    layers: Vec<Vec<GeofencedContent>>,
}

impl GeofenceRegistry {
    /// Build a registry from priority-ordered layers. Within a layer,
    /// items keep their input ordering.
    pub fn new(layers: Vec<Vec<GeofencedContent>>) -> Self {
        Self { layers }
    }

    /// Every item whose fence circle contains `point`, in layer order
    /// then input order. Items with malformed geometry contain nothing.
    pub fn find_containing(&self, point: GeoPoint) -> Vec<&GeofencedContent> {
        self.layers
            .iter()
            .flatten()
            .filter(|item| geo::is_inside(point, item.center, item.radius_meters))
            .collect()
    }

    /// The first containing item, if any — first-match-wins across the
    /// layer ordering.
    pub fn select(&self, point: GeoPoint) -> Option<&GeofencedContent> {
        self.layers
            .iter()
            .flatten()
            .find(|item| geo::is_inside(point, item.center, item.radius_meters))
    }

    /// Total number of items across all layers.
    pub fn len(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
