// Waymark: proximity gating and location telemetry for geofenced content.
//
// This is the library root. Each module corresponds to a major subsystem
// of the location engine: geographic math, the content/activation model,
// the activation gate, position sampling, and search refresh pacing.

pub mod config;
pub mod content;
pub mod gate;
pub mod geo;
pub mod location;
pub mod search;
pub mod throttle;
