// Live-sample filtering: reject GPS jitter and implausible jumps.
//
// Telemetry is only meaningful for pedestrian-speed movement, and raw
// GPS emits both sub-5-meter wobble and occasional teleport artifacts.
// Each sample is judged against the previous *accepted* sample, in
// strict arrival order, with no buffering beyond that one sample.

use serde::Deserialize;
use tracing::debug;

use super::provider::UserPositionSample;
use crate::geo;

/// Displacements below this are treated as GPS jitter, not movement.
pub const DEFAULT_MIN_DISPLACEMENT_METERS: f64 = 5.0;

/// Implied speeds above this are treated as vehicle travel or a
/// teleport artifact.
pub const DEFAULT_MAX_SPEED_KMH: f64 = 15.0;

/// How implied speed is computed from displacement and elapsed time.
///
/// The original client divided meters by `elapsed_ms * 3600` without
/// converting milliseconds to hours, which yields a value far below
/// true km/h and makes the speed ceiling effectively unreachable.
/// `Corrected` does the real conversion; `Legacy` reproduces the
/// permissive behavior bit-for-bit for anyone depending on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedFilterMode {
    #[default]
    Corrected,
    Legacy,
}

impl SpeedFilterMode {
    /// Implied speed in "km/h" for the given displacement and elapsed
    /// time. Non-positive elapsed time reads as infinite speed.
    fn implied_kmh(self, traveled_meters: f64, elapsed_ms: f64) -> f64 {
        if elapsed_ms <= 0.0 {
            return f64::INFINITY;
        }
        match self {
            // meters per millisecond * 3600 = kilometers per hour
            SpeedFilterMode::Corrected => traveled_meters * 3600.0 / elapsed_ms,
            SpeedFilterMode::Legacy => traveled_meters / (elapsed_ms * 3600.0),
        }
    }
}

/// What the filter did with an offered sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleDisposition {
    /// First sample ever seen; accepted unconditionally.
    AcceptedFirst,
    Accepted {
        traveled_meters: f64,
        implied_kmh: f64,
    },
    /// Displacement below the jitter floor; previous sample unchanged.
    RejectedJitter { traveled_meters: f64 },
    /// Implied speed above the ceiling; previous sample unchanged.
    RejectedSpeed { implied_kmh: f64 },
}

impl SampleDisposition {
    pub fn is_accepted(&self) -> bool {
        matches!(
            self,
            SampleDisposition::AcceptedFirst | SampleDisposition::Accepted { .. }
        )
    }
}

/// Stateful sample filter. Holds only the previous accepted sample.
#[derive(Debug)]
pub struct SampleFilter {
    previous: Option<UserPositionSample>,
    min_displacement_meters: f64,
    max_speed_kmh: f64,
    mode: SpeedFilterMode,
}

impl Default for SampleFilter {
    fn default() -> Self {
        Self::new(
            DEFAULT_MIN_DISPLACEMENT_METERS,
            DEFAULT_MAX_SPEED_KMH,
            SpeedFilterMode::default(),
        )
    }
}

impl SampleFilter {
    pub fn new(min_displacement_meters: f64, max_speed_kmh: f64, mode: SpeedFilterMode) -> Self {
        Self {
            previous: None,
            min_displacement_meters,
            max_speed_kmh,
            mode,
        }
    }

    /// The previous accepted sample, if any.
    pub fn previous(&self) -> Option<&UserPositionSample> {
        self.previous.as_ref()
    }

    /// Offer a raw sample. Accepted samples become the new reference
    /// point; rejected samples leave the filter untouched.
    pub fn offer(&mut self, sample: UserPositionSample) -> SampleDisposition {
        let Some(previous) = self.previous else {
            self.previous = Some(sample);
            return SampleDisposition::AcceptedFirst;
        };

        let traveled_meters = geo::distance_meters(sample.coords, previous.coords);
        let elapsed_ms = (sample.captured_at - previous.captured_at).num_milliseconds() as f64;
        let implied_kmh = self.mode.implied_kmh(traveled_meters, elapsed_ms);

        if traveled_meters < self.min_displacement_meters {
            debug!(traveled_meters, "sample rejected as jitter");
            return SampleDisposition::RejectedJitter { traveled_meters };
        }

        if implied_kmh > self.max_speed_kmh {
            debug!(implied_kmh, "sample rejected, above walking pace");
            return SampleDisposition::RejectedSpeed { implied_kmh };
        }

        self.previous = Some(sample);
        SampleDisposition::Accepted {
            traveled_meters,
            implied_kmh,
        }
    }
}
