#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use intel_digest::{
    Category, Digest, DigestContent, DigestEntry, DigestError, DigestStore, Item, ItemSink, MemoryStore, Notifier,
    Result, Verdict,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tokio::sync::Mutex;
use uuid::Uuid;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// 06:00 UTC on the digest date used throughout the tests.
pub fn run_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 7, 6, 0, 0).unwrap()
}

pub const RUN_DATE: &str = "2026-01-07";

pub fn run_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 7).unwrap()
}

pub struct Seed<'a> {
    pub slug: &'a str,
    pub score: u8,
    pub must_read: bool,
    pub not_relevant: bool,
    pub classified_hours_ago: i64,
    pub published_days_ago: Option<i64>,
}

impl<'a> Seed<'a> {
    pub fn new(slug: &'a str, score: u8) -> Self {
        Self {
            slug,
            score,
            must_read: false,
            not_relevant: false,
            classified_hours_ago: 1,
            published_days_ago: Some(1),
        }
    }

    pub fn must_read(mut self) -> Self {
        self.must_read = true;
        self
    }

    pub fn not_relevant(mut self) -> Self {
        self.not_relevant = true;
        self
    }

    pub fn classified_hours_ago(mut self, hours: i64) -> Self {
        self.classified_hours_ago = hours;
        self
    }

    pub fn published_days_ago(mut self, days: Option<i64>) -> Self {
        self.published_days_ago = days;
        self
    }
}

pub fn item_url(slug: &str) -> String {
    format!("https://news.example.com/{slug}")
}

pub async fn seed(store: &MemoryStore, seed: Seed<'_>) {
    let now = run_time();
    let item = Item {
        url: item_url(seed.slug),
        title: format!("Story {}", seed.slug),
        content: Some(format!("Body of {}", seed.slug)),
        published_at: seed.published_days_ago.map(|d| now - Duration::days(d)),
        fetched_at: now - Duration::hours(seed.classified_hours_ago + 1),
    };
    store.upsert_item(&item).await.unwrap();

    let verdict = Verdict {
        summary: format!("Summary of {}", seed.slug),
        why_it_matters: "Affects beacon demand".to_string(),
        category: Category::Maritime,
        topics: vec!["epirb".to_string()],
        relevance_score: seed.score,
        must_read: seed.must_read,
        low_signal: false,
        not_relevant: seed.not_relevant,
        created_at: now - Duration::hours(seed.classified_hours_ago),
    };
    store.record_verdict(&item.url, &verdict).await.unwrap();
}

pub fn entry(title: &str, score: i32, must_read: bool) -> DigestEntry {
    DigestEntry {
        title: title.to_string(),
        summary: format!("{title} summary"),
        why_it_matters: "matters".to_string(),
        url: item_url(title),
        category: Category::Aviation,
        topics: vec![],
        relevance_score: score,
        must_read,
    }
}

pub fn scores(entries: &[DigestEntry]) -> Vec<i32> {
    entries.iter().map(|e| e.relevance_score).collect()
}

/// Records every delivery it is asked to make.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(NaiveDate, DigestContent)>>,
}

impl RecordingNotifier {
    pub async fn count(&self) -> usize {
        self.sent.lock().await.len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn notifier_name(&self) -> String {
        "recording".to_string()
    }

    async fn send(&self, date: NaiveDate, content: &DigestContent) -> anyhow::Result<()> {
        self.sent.lock().await.push((date, content.clone()));
        Ok(())
    }
}

pub struct FailingNotifier {
    pub attempts: AtomicUsize,
}

impl FailingNotifier {
    pub fn new() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Notifier for FailingNotifier {
    fn notifier_name(&self) -> String {
        "failing".to_string()
    }

    async fn send(&self, _date: NaiveDate, _content: &DigestContent) -> anyhow::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("mail relay rejected the message")
    }
}

pub struct SlowNotifier {
    pub delay: StdDuration,
}

#[async_trait]
impl Notifier for SlowNotifier {
    fn notifier_name(&self) -> String {
        "slow".to_string()
    }

    async fn send(&self, _date: NaiveDate, _content: &DigestContent) -> anyhow::Result<()> {
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}

/// Wraps a store and misbehaves on demand.
pub struct FaultyStore {
    pub inner: Arc<MemoryStore>,
    /// Report "not found" on the next lookup, as if another caller had not
    /// committed yet.
    pub hide_next_lookup: AtomicBool,
    pub fail_inserts: bool,
    pub fail_mark_notified: bool,
    pub insert_delay: Option<StdDuration>,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            hide_next_lookup: AtomicBool::new(false),
            fail_inserts: false,
            fail_mark_notified: false,
            insert_delay: None,
        }
    }
}

#[async_trait]
impl DigestStore for FaultyStore {
    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<Digest>> {
        if self.hide_next_lookup.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.get_by_date(date).await
    }

    async fn insert_if_absent(&self, digest: &Digest) -> Result<()> {
        if let Some(delay) = self.insert_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_inserts {
            return Err(DigestError::Persistence("disk full".to_string()));
        }
        self.inner.insert_if_absent(digest).await
    }

    async fn mark_notified(&self, digest_id: Uuid) -> Result<()> {
        if self.fail_mark_notified {
            return Err(DigestError::Persistence("connection reset".to_string()));
        }
        self.inner.mark_notified(digest_id).await
    }
}
