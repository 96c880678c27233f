// Activation store — the narrow write interface to the reaction cache.
//
// The reaction cache owns ActivationRecord storage (it also carries
// server-confirmed fields this engine doesn't own). The engine reads
// freely but writes only through `upgrade`, never by replacing a whole
// record, so concurrent fields are never clobbered.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::models::ActivationRecord;

/// The delta applied when a gate permit upgrades an activation.
/// `user_has_activated` is OR-ed in; `user_view_count` is added.
#[derive(Debug, Clone, Copy)]
pub struct ActivationUpgrade {
    pub user_view_count: u32,
    pub user_has_activated: bool,
}

impl ActivationUpgrade {
    /// The upgrade recorded on a first successful activation.
    pub fn first_view() -> Self {
        Self {
            user_view_count: 1,
            user_has_activated: true,
        }
    }
}

/// Async interface to the reaction cache. Implementations are expected
/// to treat `upgrade` as monotonic: `has_activated` never transitions
/// back to false.
#[async_trait]
pub trait ActivationStore: Send + Sync {
    /// The activation record for a content item, if one exists yet.
    async fn get(&self, content_id: &str) -> Result<Option<ActivationRecord>>;

    /// Apply an upgrade, creating the record lazily on first write.
    async fn upgrade(&self, content_id: &str, upgrade: ActivationUpgrade) -> Result<()>;
}

/// In-memory activation store: a session-local stand-in for the
/// reaction cache, used by tests and the replay CLI.
#[derive(Default)]
pub struct MemoryActivationStore {
    records: Mutex<HashMap<String, ActivationRecord>>,
}

impl MemoryActivationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ActivationStore for MemoryActivationStore {
    async fn get(&self, content_id: &str) -> Result<Option<ActivationRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(content_id).cloned())
    }

    async fn upgrade(&self, content_id: &str, upgrade: ActivationUpgrade) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .entry(content_id.to_string())
            .or_insert_with(|| ActivationRecord::new(content_id));
        record.has_activated |= upgrade.user_has_activated;
        record.view_count += upgrade.user_view_count;
        Ok(())
    }
}
