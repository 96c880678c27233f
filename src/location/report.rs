// Outbound location report pacing.
//
// Accepted samples still update the live map position locally on every
// tick; only the backend report is throttled. Reporting is at-most-once
// and best-effort: a failed post is logged and dropped, never queued.

use std::sync::Arc;

use tokio::time::Duration;
use tracing::{debug, warn};

use super::telemetry::{LocationTelemetryService, LocationUpdate};
use crate::geo::GeoPoint;
use crate::throttle::ThrottleWindow;

/// Default minimum time between location reports.
pub const DEFAULT_REPORT_COOLDOWN: Duration = Duration::from_secs(30);

/// Cooldown-gated dispatcher for location telemetry.
pub struct LocationReporter {
    window: ThrottleWindow,
    telemetry: Arc<dyn LocationTelemetryService>,
    radius_of_awareness: Option<f64>,
    radius_of_influence: Option<f64>,
}

impl LocationReporter {
    pub fn new(telemetry: Arc<dyn LocationTelemetryService>, cooldown: Duration) -> Self {
        Self {
            window: ThrottleWindow::new(cooldown),
            telemetry,
            radius_of_awareness: None,
            radius_of_influence: None,
        }
    }

    /// Attach the awareness/influence radii the backend expects on
    /// each report.
    pub fn with_radii(mut self, awareness: Option<f64>, influence: Option<f64>) -> Self {
        self.radius_of_awareness = awareness;
        self.radius_of_influence = influence;
        self
    }

    /// Offer an accepted position for reporting. Returns whether a
    /// report was dispatched (throttled-out offers return false).
    ///
    /// The window advances on dispatch regardless of outcome: a failed
    /// post is not retried and does not re-open the window early.
    pub async fn offer(&mut self, coords: GeoPoint) -> bool {
        if !self.window.try_fire() {
            debug!("location report suppressed by cooldown");
            return false;
        }

        let update = LocationUpdate {
            coords,
            radius_of_awareness: self.radius_of_awareness,
            radius_of_influence: self.radius_of_influence,
        };
        if let Err(err) = self.telemetry.post_location(update).await {
            warn!(error = %err, "location report failed, dropping");
        }
        true
    }
}
