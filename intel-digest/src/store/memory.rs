use crate::traits::{DigestStore, ItemSink, PoolProvider, SettingsStore};
use crate::types::{Digest, DigestError, Item, PoolRecord, Result, Verdict};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[derive(Default)]
struct MemoryState {
    /// Insertion order is kept so equal scores come back in ingest order.
    items: Vec<Item>,
    item_index: HashMap<String, usize>,
    verdicts: HashMap<String, Verdict>,
    digests: HashMap<NaiveDate, Digest>,
    settings: HashMap<String, String>,
}

/// In-process implementation of every storage seam. Used by tests and by
/// dry runs that do not need a database.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn item_count(&self) -> usize {
        self.state.read().await.items.len()
    }

    pub async fn digest_count(&self) -> usize {
        self.state.read().await.digests.len()
    }

    pub async fn verdict_for(&self, identity_key: &str) -> Option<Verdict> {
        self.state.read().await.verdicts.get(identity_key).cloned()
    }
}

#[async_trait]
impl PoolProvider for MemoryStore {
    async fn eligible_pool(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<PoolRecord>> {
        let state = self.state.read().await;

        let mut records: Vec<PoolRecord> = state
            .items
            .iter()
            .filter_map(|item| {
                let verdict = state.verdicts.get(item.identity_key())?;
                (verdict.created_at >= since && verdict.created_at <= until)
                    .then(|| PoolRecord::from_parts(item, verdict))
            })
            .collect();

        records.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
        debug!(count = records.len(), "Loaded eligible pool from memory");
        Ok(records)
    }
}

#[async_trait]
impl DigestStore for MemoryStore {
    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<Digest>> {
        Ok(self.state.read().await.digests.get(&date).cloned())
    }

    async fn insert_if_absent(&self, digest: &Digest) -> Result<()> {
        let mut state = self.state.write().await;
        if state.digests.contains_key(&digest.date) {
            return Err(DigestError::Conflict { date: digest.date });
        }
        state.digests.insert(digest.date, digest.clone());
        Ok(())
    }

    async fn mark_notified(&self, digest_id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        let digest = state
            .digests
            .values_mut()
            .find(|digest| digest.id == digest_id)
            .ok_or_else(|| DigestError::Persistence(format!("Digest not found: {digest_id}")))?;
        digest.notified = true;
        Ok(())
    }
}

#[async_trait]
impl ItemSink for MemoryStore {
    async fn upsert_item(&self, item: &Item) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.item_index.contains_key(item.identity_key()) {
            return Ok(false);
        }
        let position = state.items.len();
        state.item_index.insert(item.identity_key().to_string(), position);
        state.items.push(item.clone());
        Ok(true)
    }

    async fn record_verdict(&self, identity_key: &str, verdict: &Verdict) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.item_index.contains_key(identity_key) {
            return Err(DigestError::Validation(format!("No item with key {identity_key}")));
        }
        state.verdicts.insert(identity_key.to_string(), verdict.clone());
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.read().await.settings.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.state
            .write()
            .await
            .settings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
