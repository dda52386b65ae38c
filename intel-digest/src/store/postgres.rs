use crate::traits::{DigestStore, ItemSink, PoolProvider, SettingsStore};
use crate::types::{Category, Digest, DigestContent, DigestError, Item, PoolRecord, Result, Verdict};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Pool, Postgres, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// PostgreSQL-backed store. Date uniqueness of digests is enforced by the
/// `digests.digest_date` unique constraint.
pub struct PgStore {
    db: Pool<Postgres>,
}

impl PgStore {
    pub async fn new(database_url: &str) -> Result<Self> {
        let db = PgPool::connect(database_url).await?;
        Ok(Self { db })
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.db).await?;
        info!("Database migrations applied");
        Ok(())
    }
}

fn row_to_digest(row: PgRow) -> Result<Digest> {
    let Json(content): Json<DigestContent> = row.try_get("content")?;
    Ok(Digest {
        id: row.try_get("id")?,
        date: row.try_get("digest_date")?,
        content,
        notified: row.try_get("notified")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_pool_record(row: PgRow) -> Result<PoolRecord> {
    let category: String = row.try_get("category")?;
    let relevance_score: i16 = row.try_get("relevance_score")?;
    Ok(PoolRecord {
        title: row.try_get("title")?,
        url: row.try_get("url")?,
        summary: row.try_get("summary")?,
        why_it_matters: row.try_get("why_it_matters")?,
        category: Category::from_label(&category),
        topics: row.try_get("topics")?,
        relevance_score: i32::from(relevance_score),
        must_read: row.try_get("must_read")?,
        low_signal: row.try_get("low_signal")?,
        not_relevant: row.try_get("not_relevant")?,
        published_at: row.try_get("published_at")?,
        verdict_created_at: row.try_get("verdict_created_at")?,
    })
}

#[async_trait]
impl PoolProvider for PgStore {
    async fn eligible_pool(&self, since: DateTime<Utc>, until: DateTime<Utc>) -> Result<Vec<PoolRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT i.title, i.url, i.published_at,
                   v.summary, v.why_it_matters, v.category, v.topics, v.relevance_score,
                   v.must_read, v.low_signal, v.not_relevant, v.created_at AS verdict_created_at
            FROM verdicts v
            JOIN items i ON i.id = v.item_id
            WHERE v.created_at >= $1 AND v.created_at <= $2
            ORDER BY v.relevance_score DESC, v.created_at ASC
            "#,
        )
        .bind(since)
        .bind(until)
        .fetch_all(&self.db)
        .await?;

        debug!(count = rows.len(), "Loaded eligible pool from database");
        rows.into_iter().map(row_to_pool_record).collect()
    }
}

#[async_trait]
impl DigestStore for PgStore {
    async fn get_by_date(&self, date: NaiveDate) -> Result<Option<Digest>> {
        let row = sqlx::query(
            "SELECT id, digest_date, content, notified, created_at FROM digests WHERE digest_date = $1",
        )
        .bind(date)
        .fetch_optional(&self.db)
        .await?;

        row.map(row_to_digest).transpose()
    }

    async fn insert_if_absent(&self, digest: &Digest) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO digests (id, digest_date, content, notified, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (digest_date) DO NOTHING
            "#,
        )
        .bind(digest.id)
        .bind(digest.date)
        .bind(Json(&digest.content))
        .bind(digest.notified)
        .bind(digest.created_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DigestError::Conflict { date: digest.date });
        }
        Ok(())
    }

    async fn mark_notified(&self, digest_id: Uuid) -> Result<()> {
        let result = sqlx::query("UPDATE digests SET notified = TRUE WHERE id = $1")
            .bind(digest_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DigestError::Persistence(format!("Digest not found: {digest_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ItemSink for PgStore {
    async fn upsert_item(&self, item: &Item) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO items (id, url, title, content, published_at, fetched_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (url) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&item.url)
        .bind(&item.title)
        .bind(&item.content)
        .bind(item.published_at)
        .bind(item.fetched_at)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn record_verdict(&self, identity_key: &str, verdict: &Verdict) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO verdicts (item_id, summary, why_it_matters, category, topics, relevance_score,
                                  must_read, low_signal, not_relevant, created_at)
            SELECT id, $2, $3, $4, $5, $6, $7, $8, $9, $10 FROM items WHERE url = $1
            ON CONFLICT (item_id) DO UPDATE SET
                summary = EXCLUDED.summary,
                why_it_matters = EXCLUDED.why_it_matters,
                category = EXCLUDED.category,
                topics = EXCLUDED.topics,
                relevance_score = EXCLUDED.relevance_score,
                must_read = EXCLUDED.must_read,
                low_signal = EXCLUDED.low_signal,
                not_relevant = EXCLUDED.not_relevant,
                created_at = EXCLUDED.created_at
            "#,
        )
        .bind(identity_key)
        .bind(&verdict.summary)
        .bind(&verdict.why_it_matters)
        .bind(verdict.category.as_str())
        .bind(&verdict.topics)
        .bind(i16::from(verdict.relevance_score))
        .bind(verdict.must_read)
        .bind(verdict.low_signal)
        .bind(verdict.not_relevant)
        .bind(verdict.created_at)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DigestError::Validation(format!("No item with key {identity_key}")));
        }
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for PgStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.db)
            .await?;

        Ok(row.map(|r| r.try_get("value")).transpose()?)
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key)
            DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;
        Ok(())
    }
}
