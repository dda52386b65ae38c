//! Storage tests against a live PostgreSQL. Run with
//! `TEST_DATABASE_URL=postgresql://... cargo test -- --ignored`.

mod common;

use chrono::{Duration, NaiveDate, Utc};
use common::*;
use intel_digest::{
    tier, Category, Digest, DigestBuilder, DigestError, DigestStore, GenerateStatus, Item, ItemSink, PgStore,
    PoolProvider, SettingsStore, Verdict,
};
use std::sync::Arc;
use uuid::Uuid;

async fn connect() -> PgStore {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let store = PgStore::new(&url).await.unwrap();
    store.run_migrations().await.unwrap();
    store
}

/// A date nobody else uses, so tests can share a database.
async fn unused_date(store: &PgStore) -> NaiveDate {
    loop {
        let offset = (Uuid::new_v4().as_u128() % 300_000) as i64;
        let date = NaiveDate::from_ymd_opt(3000, 1, 1).unwrap() + Duration::days(offset);
        if store.get_by_date(date).await.unwrap().is_none() {
            return date;
        }
    }
}

fn unique_item(tag: &str) -> Item {
    Item {
        url: format!("https://pg.example.com/{tag}/{}", Uuid::new_v4()),
        title: format!("Story {tag}"),
        content: None,
        published_at: Some(Utc::now() - Duration::days(1)),
        fetched_at: Utc::now(),
    }
}

fn verdict(score: u8) -> Verdict {
    Verdict {
        summary: "summary".to_string(),
        why_it_matters: "matters".to_string(),
        category: Category::Aviation,
        topics: vec!["ads-b".to_string()],
        relevance_score: score,
        must_read: false,
        low_signal: false,
        not_relevant: false,
        created_at: Utc::now(),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn digest_date_is_unique() {
    let store = connect().await;
    let date = unused_date(&store).await;
    let content = tier(vec![entry("a", 80, false)], &[]);

    let first = Digest::new(date, content.clone(), Utc::now());
    store.insert_if_absent(&first).await.unwrap();

    let second = Digest::new(date, content, Utc::now());
    let err = store.insert_if_absent(&second).await.unwrap_err();
    assert!(matches!(err, DigestError::Conflict { .. }));

    let stored = store.get_by_date(date).await.unwrap().unwrap();
    assert_eq!(stored.id, first.id);
    assert_eq!(stored.content, first.content);
    assert!(!stored.notified);

    store.mark_notified(first.id).await.unwrap();
    assert!(store.get_by_date(date).await.unwrap().unwrap().notified);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn items_are_keyed_on_url_and_verdicts_replace() {
    let store = connect().await;
    let item = unique_item("upsert");

    assert!(store.upsert_item(&item).await.unwrap());
    assert!(!store.upsert_item(&item).await.unwrap());

    store.record_verdict(&item.url, &verdict(40)).await.unwrap();
    store.record_verdict(&item.url, &verdict(77)).await.unwrap();

    let pool = store
        .eligible_pool(Utc::now() - Duration::minutes(5), Utc::now() + Duration::minutes(5))
        .await
        .unwrap();
    let record = pool.iter().find(|r| r.url == item.url).unwrap();
    assert_eq!(record.relevance_score, 77);
    assert_eq!(record.category, Category::Aviation);
    assert_eq!(record.topics, vec!["ads-b"]);
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn settings_round_trip() {
    let store = connect().await;
    let key = format!("test_setting_{}", Uuid::new_v4());

    assert_eq!(store.get_or(&key, "fallback").await.unwrap(), "fallback");
    store.set(&key, "one").await.unwrap();
    store.set(&key, "two").await.unwrap();
    assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("two"));
}

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn builder_is_idempotent_on_postgres() {
    init_tracing();
    let store = Arc::new(connect().await);
    let date = unused_date(&store).await.format("%Y-%m-%d").to_string();

    let item = unique_item("builder");
    store.upsert_item(&item).await.unwrap();
    store.record_verdict(&item.url, &verdict(90)).await.unwrap();

    let builder = DigestBuilder::new(store.clone(), store.clone(), Arc::new(RecordingNotifier::default()));
    let first = builder.generate(&date, false).await.unwrap();
    let second = builder.generate(&date, false).await.unwrap();

    assert_eq!(first.status, GenerateStatus::Created);
    assert_eq!(second.status, GenerateStatus::AlreadyExisted);
    assert_eq!(first.digest_id, second.digest_id);
}
