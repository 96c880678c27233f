// Content search — the backend contract for nearby-content queries.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::content::GeofencedContent;
use crate::geo::GeoPoint;

/// Which content layer a search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerScope {
    /// The caller's own content.
    Me,
    /// Content from the caller's connections.
    Connections,
}

/// A nearby-content query. Payload shape is a logical contract.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SearchQuery {
    pub scope: OwnerScope,
    pub center: GeoPoint,
    pub radius_meters: f64,
    pub page: u32,
    pub page_size: u32,
}

/// Backend search endpoint for geofenced content.
#[async_trait]
pub trait ContentSearchService: Send + Sync {
    async fn search(&self, query: SearchQuery) -> Result<Vec<GeofencedContent>>;
}
