// Content search pacing.
//
// Map interaction (pan/zoom/search) produces refresh requests; this
// module converts the viewport into a search radius and paces the
// backend calls so a burst of map movement costs at most one search
// per cool-down window.

pub mod scheduler;
pub mod service;
pub mod viewport;

pub use scheduler::{RefreshRequest, RefreshScheduler, SearchResults};
pub use service::{ContentSearchService, OwnerScope, SearchQuery};
pub use viewport::search_radius;
