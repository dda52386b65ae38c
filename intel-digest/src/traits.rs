use crate::types::{Digest, DigestContent, Item, PoolRecord, Result, Verdict};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Source of classified items for a digest run.
#[async_trait]
pub trait PoolProvider: Send + Sync {
    /// Every item+verdict pair whose verdict was created in `since..=until`,
    /// highest score first.
    async fn eligible_pool(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<PoolRecord>>;
}

/// Date-keyed digest storage. The store, not the caller, guarantees one
/// digest per date.
#[async_trait]
pub trait DigestStore: Send + Sync {
    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<Digest>>;

    /// Write the digest and its content as one unit. Returns
    /// `DigestError::Conflict` if a digest already exists for the date.
    async fn insert_if_absent(&self, digest: &Digest) -> Result<()>;

    async fn mark_notified(&self, digest_id: Uuid) -> Result<()>;
}

/// Write side used by ingestion and classification collaborators.
#[async_trait]
pub trait ItemSink: Send + Sync {
    /// Insert keyed on the canonical URL. A duplicate is not an error; it
    /// returns `false` and leaves the stored item alone.
    async fn upsert_item(&self, item: &Item) -> Result<bool>;

    /// Attach a verdict, replacing any previous one for the same item.
    async fn record_verdict(&self, identity_key: &str, verdict: &Verdict) -> Result<()>;
}

/// Key-value runtime settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn get_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.to_string()))
    }
}

/// Renders and transmits a digest.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn notifier_name(&self) -> String;

    async fn send(&self, date: NaiveDate, content: &DigestContent) -> anyhow::Result<()>;
}
