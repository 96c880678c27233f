// Throttle window — minimum elapsed time between repeated firings.
//
// One instance per throttled operation (location report, content
// refresh), mutated only by its owning component. Built on
// tokio::time::Instant, which is monotonic (wall-clock adjustments
// can't produce negative elapsed time) and controllable from
// paused-time tests.

use tokio::time::{Duration, Instant};

/// Tracks when an operation last fired and enforces a cool-down
/// between firings. `last_fired` only advances forward.
#[derive(Debug)]
pub struct ThrottleWindow {
    cooldown: Duration,
    last_fired: Option<Instant>,
}

impl ThrottleWindow {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_fired: None,
        }
    }

    /// Whether the operation may fire now. Always true before the
    /// first firing.
    pub fn ready(&self) -> bool {
        match self.last_fired {
            None => true,
            Some(last) => last.elapsed() > self.cooldown,
        }
    }

    /// Record a firing at the current instant.
    pub fn fire(&mut self) {
        self.last_fired = Some(Instant::now());
    }

    /// Fire if ready; returns whether the operation fired.
    pub fn try_fire(&mut self) -> bool {
        if self.ready() {
            self.fire();
            true
        } else {
            false
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }
}
