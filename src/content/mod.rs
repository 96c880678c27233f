// Geofenced content model and read-side access.
//
// Content items and activation records are owned by external caches
// (the content cache and the reaction cache). This module holds the
// data shapes, the layered containment lookup used to resolve a map
// press to a content item, and the narrow write interface for
// activation upgrades.

pub mod models;
pub mod registry;
pub mod store;

pub use models::{ActivationRecord, GeofencedContent};
pub use registry::GeofenceRegistry;
pub use store::{ActivationStore, ActivationUpgrade, MemoryActivationStore};
