// Viewport-to-radius estimation.
//
// A map viewport is approximated as a circle from its center to a
// visible edge. The radius gets 10% padding so fences whose centers
// sit just past the visible boundary still come back in the search,
// and a floor so a fully zoomed-in viewport still finds the content
// around the user.

use crate::geo::{self, GeoPoint};

/// Default radius floor, matching the content-awareness proximity the
/// backend assumes.
pub const DEFAULT_RADIUS_FLOOR_METERS: f64 = 1_000.0;

/// Fractional padding applied on top of the viewport radius.
const RADIUS_PADDING: f64 = 0.10;

/// Estimate a content-search radius from a viewport center and a
/// point on its visible edge.
pub fn search_radius(center: GeoPoint, edge: GeoPoint, floor_meters: f64) -> f64 {
    let radius = geo::distance_meters(center, edge).max(floor_meters);
    radius + radius * RADIUS_PADDING
}
