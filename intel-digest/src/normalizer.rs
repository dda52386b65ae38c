//! Canonical identity for ingested items.
//!
//! Two raw links that canonicalize to the same string are the same item, no
//! matter which feed or scrape produced them.

use crate::types::{Item, RawCandidate, Result};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use url::{Position, Url};

/// Query parameters that only carry attribution and never change the page.
pub const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "ref",
    "fbclid",
    "gclid",
    "mc_cid",
    "mc_eid",
];

pub const MAX_TITLE_CHARS: usize = 500;
pub const MAX_CONTENT_CHARS: usize = 10_000;
pub const UNTITLED: &str = "Untitled";

/// Canonical form of a link: lowercase scheme and host, default port dropped,
/// tracking parameters and fragment removed, no trailing slash. Remaining
/// query parameters keep their order.
pub fn canonicalize_url(raw: &str) -> Result<String> {
    let parsed = Url::parse(raw.trim())?;

    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut canonical = parsed[..Position::BeforePath].to_string();
    canonical.push_str(parsed.path().trim_end_matches('/'));

    if !kept.is_empty() {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept)
            .finish();
        canonical.push('?');
        canonical.push_str(&query);
    }

    Ok(canonical)
}

/// Build an `Item` from a collaborator's raw candidate.
pub fn normalize_candidate(raw: &RawCandidate, fetched_at: DateTime<Utc>) -> Result<Item> {
    let url = canonicalize_url(&raw.url)?;

    let title = truncate_chars(raw.title.trim(), MAX_TITLE_CHARS);
    let title = if title.is_empty() { UNTITLED.to_string() } else { title };

    let content = raw
        .content
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|c| truncate_chars(c, MAX_CONTENT_CHARS));

    Ok(Item {
        url,
        title,
        content,
        published_at: raw.published_at,
        fetched_at,
    })
}

/// Keep the first occurrence of every identity key.
pub fn dedup_items(items: Vec<Item>) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.identity_key().to_string()))
        .collect()
}

/// Whether a publish date falls outside the accepted age. Undated items are
/// never stale.
pub fn is_stale(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>, max_age: Duration) -> bool {
    match published_at {
        Some(published) => now.signed_duration_since(published) > max_age,
        None => false,
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
