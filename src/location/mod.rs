// Live position pipeline.
//
// Raw position events flow: provider -> first-fix race -> sample
// filter -> { local position state, report throttle -> telemetry }.
// The provider is an external collaborator (the OS location service);
// everything downstream of it lives here.

pub mod filter;
pub mod fix;
pub mod provider;
pub mod report;
pub mod session;
pub mod telemetry;

pub use filter::{SampleDisposition, SampleFilter, SpeedFilterMode};
pub use fix::first_fix;
pub use provider::{PositionError, PositionProvider, PositionWatch, UserPositionSample};
pub use report::LocationReporter;
pub use session::LocationSession;
pub use telemetry::{LocationTelemetryService, LocationUpdate};
