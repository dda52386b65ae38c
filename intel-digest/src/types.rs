use chrono::{Duration, NaiveDate};
use std::time::Duration as StdDuration;
// Use the interfaces crate for core types
pub use interfaces::defs::{Category, Digest, DigestContent, DigestEntry, Item, PoolRecord, RawCandidate, TierCounts, Verdict};

use crate::exclusion::ExclusionRule;
use crate::tiering::TierPolicy;

/// Knobs for one digest run.
#[derive(Debug, Clone)]
pub struct BuilderConfig {
    /// Trailing window on verdict creation time.
    pub window: Duration,
    /// Items published longer ago than this are left out even if freshly
    /// classified. `None` disables the cutoff.
    pub max_item_age: Option<Duration>,
    pub persistence_timeout: StdDuration,
    pub notification_timeout: StdDuration,
    pub exclusion: ExclusionRule,
    pub policy: TierPolicy,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            window: Duration::hours(24),
            max_item_age: Some(Duration::days(7)),
            persistence_timeout: StdDuration::from_secs(10),
            notification_timeout: StdDuration::from_secs(30),
            exclusion: ExclusionRule::default(),
            policy: TierPolicy::default(),
        }
    }
}

/// Parse a `YYYY-MM-DD` digest key.
pub fn parse_digest_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| DigestError::InvalidDate {
        input: input.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("Invalid digest date '{input}', expected YYYY-MM-DD")]
    InvalidDate { input: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Digest already exists for {date}")]
    Conflict { date: NaiveDate },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },
}

impl DigestError {
    /// Storage read/write failures, which are fatal for a digest run.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            DigestError::Database(_)
                | DigestError::Migration(_)
                | DigestError::Persistence(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_dates() {
        let date = parse_digest_date("2026-01-07").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 7).unwrap());
    }

    #[test]
    fn storage_failures_are_persistence_errors() {
        assert!(DigestError::Persistence("disk full".to_string()).is_persistence());
        assert!(!DigestError::Validation("bad".to_string()).is_persistence());
        assert!(!DigestError::Timeout {
            operation: "insert digest".to_string(),
            seconds: 10,
        }
        .is_persistence());
    }

    #[test]
    fn rejects_malformed_dates() {
        for input in ["2026-13-01", "07/01/2026", "", "2026-01-07T00:00:00Z"] {
            assert!(matches!(
                parse_digest_date(input),
                Err(DigestError::InvalidDate { .. })
            ));
        }
    }
}
