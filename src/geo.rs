// Great-circle geography primitives.
//
// Everything here is a pure function over WGS84 degree coordinates.
// Distances use the haversine formula with the mean Earth radius — no
// ellipsoid correction, which is accurate to well under 0.5% at the
// sub-tens-of-kilometers scale geofenced content operates at.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// An immutable WGS84 coordinate pair, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// True when both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// Haversine great-circle distance between two points, in meters.
///
/// Deterministic and side-effect free. Finite inputs always produce a
/// finite, non-negative result; NaN inputs propagate NaN.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let phi_a = a.latitude.to_radians();
    let phi_b = b.latitude.to_radians();
    let d_phi = (b.latitude - a.latitude).to_radians();
    let d_lambda = (b.longitude - a.longitude).to_radians();

    let h = (d_phi / 2.0).sin().powi(2)
        + phi_a.cos() * phi_b.cos() * (d_lambda / 2.0).sin().powi(2);

    // Clamp guards against h creeping above 1.0 from rounding on
    // antipodal points, which would make asin return NaN.
    2.0 * EARTH_RADIUS_METERS * h.sqrt().clamp(0.0, 1.0).asin()
}

/// Whether `point` lies inside (or on the edge of) the circle at `center`.
///
/// A zero or negative radius contains nothing, and a NaN radius or NaN
/// coordinate fails every comparison, so malformed circles are empty.
pub fn is_inside(point: GeoPoint, center: GeoPoint, radius_meters: f64) -> bool {
    if !(radius_meters > 0.0) {
        return false;
    }
    distance_meters(point, center) <= radius_meters
}
