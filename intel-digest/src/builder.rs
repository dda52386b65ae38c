use crate::normalizer::is_stale;
use crate::traits::{DigestStore, Notifier, PoolProvider};
use crate::types::{
    parse_digest_date, BuilderConfig, Digest, DigestEntry, DigestError, PoolRecord, Result, TierCounts,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerateStatus {
    AlreadyExisted,
    Created,
    NoContent,
}

/// Result of one `generate` call. Notification trouble never turns into an
/// `Err`; it is reported here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerateOutcome {
    pub status: GenerateStatus,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<TierCounts>,
    pub notification_attempted: bool,
    pub notified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
}

impl GenerateOutcome {
    fn for_digest(status: GenerateStatus, digest: &Digest) -> Self {
        Self {
            status,
            date: digest.date,
            digest_id: Some(digest.id),
            counts: Some(digest.content.counts()),
            notification_attempted: false,
            notified: digest.notified,
            notification_error: None,
        }
    }

    fn no_content(date: NaiveDate) -> Self {
        Self {
            status: GenerateStatus::NoContent,
            date,
            digest_id: None,
            counts: None,
            notification_attempted: false,
            notified: false,
            notification_error: None,
        }
    }
}

/// Runs one digest generation: pool query, tiering, date-unique persistence
/// and optional delivery.
pub struct DigestBuilder {
    pool: Arc<dyn PoolProvider>,
    store: Arc<dyn DigestStore>,
    notifier: Arc<dyn Notifier>,
    config: BuilderConfig,
}

impl DigestBuilder {
    pub fn new(pool: Arc<dyn PoolProvider>, store: Arc<dyn DigestStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pool,
            store,
            notifier,
            config: BuilderConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Generate the digest for `date` (`YYYY-MM-DD`) using the current time
    /// as the end of the pool window.
    pub async fn generate(&self, date: &str, send_notification: bool) -> Result<GenerateOutcome> {
        self.generate_at(date, send_notification, Utc::now()).await
    }

    pub async fn generate_at(&self, date: &str, send_notification: bool, now: DateTime<Utc>) -> Result<GenerateOutcome> {
        let date = parse_digest_date(date)?;

        if let Some(existing) = self.load_existing(date).await? {
            info!(%date, digest_id = %existing.id, "Digest already exists");
            return Ok(self.resend_existing(existing, send_notification).await);
        }

        let since = now
            .checked_sub_signed(self.config.window)
            .ok_or_else(|| DigestError::Validation(format!("Pool window {} is out of range", self.config.window)))?;
        let records = self
            .persist_call("load eligible pool", self.pool.eligible_pool(since, now))
            .await?;
        info!(%date, pool = records.len(), "Loaded eligible pool");

        let (entries, excluded) = self.snapshot(records, now);
        let content = self.config.policy.tier(entries, &excluded);

        if content.is_empty() {
            info!(%date, "No entries qualified, digest not created");
            return Ok(GenerateOutcome::no_content(date));
        }

        let digest = Digest::new(date, content, now);
        match self
            .persist_call("insert digest", self.store.insert_if_absent(&digest))
            .await
        {
            Ok(()) => {}
            Err(DigestError::Conflict { .. }) => {
                warn!(%date, "Digest created concurrently, using the stored one");
                return match self.load_existing(date).await? {
                    Some(existing) => Ok(self.resend_existing(existing, send_notification).await),
                    None => Err(DigestError::Persistence(format!(
                        "Digest for {date} conflicted on insert but could not be read back"
                    ))),
                };
            }
            Err(e) => {
                error!(%date, error = %e, "Failed to persist digest");
                return Err(e);
            }
        }

        let counts = digest.content.counts();
        info!(
            %date,
            digest_id = %digest.id,
            must_know = counts.must_know,
            worth_a_look = counts.worth_a_look,
            quick_hits = counts.quick_hits,
            "Digest created"
        );

        let mut outcome = GenerateOutcome::for_digest(GenerateStatus::Created, &digest);
        if send_notification {
            self.deliver(&digest, &mut outcome).await;
        }
        Ok(outcome)
    }

    async fn load_existing(&self, date: NaiveDate) -> Result<Option<Digest>> {
        self.persist_call("load digest", self.store.get_by_date(date)).await
    }

    /// Existing digests are never recomputed. At most a pending delivery is
    /// retried.
    async fn resend_existing(&self, existing: Digest, send_notification: bool) -> GenerateOutcome {
        let mut outcome = GenerateOutcome::for_digest(GenerateStatus::AlreadyExisted, &existing);
        if send_notification && !existing.notified {
            self.deliver(&existing, &mut outcome).await;
        }
        outcome
    }

    /// Apply the age cutoff, order by score and snapshot each record, with
    /// its exclusion flag alongside.
    fn snapshot(&self, records: Vec<PoolRecord>, now: DateTime<Utc>) -> (Vec<DigestEntry>, Vec<bool>) {
        let total = records.len();
        let mut records: Vec<PoolRecord> = match self.config.max_item_age {
            Some(max_age) => records
                .into_iter()
                .filter(|record| !is_stale(record.published_at, now, max_age))
                .collect(),
            None => records,
        };
        if records.len() < total {
            debug!(dropped = total - records.len(), "Dropped records with stale publish dates");
        }

        records.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

        records
            .iter()
            .map(|record| (record.to_entry(), self.config.exclusion.is_excluded(record)))
            .unzip()
    }

    async fn deliver(&self, digest: &Digest, outcome: &mut GenerateOutcome) {
        outcome.notification_attempted = true;

        let timeout = self.config.notification_timeout;
        let sent = match tokio::time::timeout(timeout, self.notifier.send(digest.date, &digest.content)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("Notification timed out after {}s", timeout.as_secs())),
        };

        if let Err(e) = sent {
            warn!(date = %digest.date, notifier = %self.notifier.notifier_name(), error = %e, "Digest notification failed");
            outcome.notified = false;
            outcome.notification_error = Some(e);
            return;
        }

        match self
            .persist_call("mark digest notified", self.store.mark_notified(digest.id))
            .await
        {
            Ok(()) => {
                info!(date = %digest.date, notifier = %self.notifier.notifier_name(), "Digest notification sent");
                outcome.notified = true;
            }
            Err(e) => {
                error!(date = %digest.date, error = %e, "Digest sent but notified flag not recorded");
                outcome.notified = false;
                outcome.notification_error = Some(format!("Digest sent but notified flag not recorded: {e}"));
            }
        }
    }

    async fn persist_call<T>(&self, operation: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        let timeout = self.config.persistence_timeout;
        match tokio::time::timeout(timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(DigestError::Timeout {
                operation: operation.to_string(),
                seconds: timeout.as_secs(),
            }),
        }
    }
}
