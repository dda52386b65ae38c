//! Turning a classifier's loose answer into a well-formed `Verdict`.
//!
//! The classifier itself is opaque. Whatever it returns, the verdict that
//! leaves this module has a score in 0..=100, a known category and at most
//! three topics.

use crate::types::{Category, Verdict};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

pub const MAX_TOPICS: usize = 3;
pub const DEFAULT_SCORE: i64 = 50;
pub const FALLBACK_SCORE: u8 = 30;
pub const FALLBACK_RATIONALE: &str = "Unable to analyze significance";

/// Classifier output as it arrives, before any normalization. Every field is
/// optional and loosely typed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVerdict {
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default)]
    pub why_it_matters: Option<Value>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub topics: Option<Vec<Value>>,
    #[serde(default)]
    pub relevance_score: Option<Value>,
    #[serde(default)]
    pub must_read: Option<Value>,
    #[serde(default)]
    pub hype_flag: Option<Value>,
    #[serde(default)]
    pub not_relevant: Option<Value>,
}

impl RawVerdict {
    pub fn normalize(self, created_at: DateTime<Utc>) -> Verdict {
        Verdict {
            summary: text_or(self.summary, "No summary available"),
            why_it_matters: text_or(self.why_it_matters, "Significance unclear"),
            category: self
                .category
                .as_deref()
                .map(Category::from_label)
                .unwrap_or_default(),
            topics: normalize_topics(self.topics.unwrap_or_default()),
            relevance_score: clamp_raw_score(self.relevance_score.as_ref().and_then(as_score).unwrap_or(DEFAULT_SCORE)),
            must_read: truthy(self.must_read.as_ref()),
            low_signal: truthy(self.hype_flag.as_ref()),
            not_relevant: truthy(self.not_relevant.as_ref()),
            created_at,
        }
    }
}

/// Parse free-form classifier text. The outermost `{...}` span is read as
/// JSON; anything unreadable yields the fallback verdict for `title`.
pub fn parse_classifier_response(text: &str, title: &str, created_at: DateTime<Utc>) -> Verdict {
    let Some(json) = extract_json_object(text) else {
        warn!(title = %title, "Classifier response contained no JSON object");
        return fallback_verdict(title, created_at);
    };

    match serde_json::from_str::<RawVerdict>(json) {
        Ok(raw) => raw.normalize(created_at),
        Err(e) => {
            warn!(title = %title, error = %e, "Failed to parse classifier response");
            fallback_verdict(title, created_at)
        }
    }
}

/// Verdict used when the classifier answer cannot be read at all.
pub fn fallback_verdict(title: &str, created_at: DateTime<Utc>) -> Verdict {
    Verdict {
        summary: title.to_string(),
        why_it_matters: FALLBACK_RATIONALE.to_string(),
        category: Category::default(),
        topics: Vec::new(),
        relevance_score: FALLBACK_SCORE,
        must_read: false,
        low_signal: false,
        not_relevant: false,
        created_at,
    }
}

pub fn clamp_raw_score(score: i64) -> u8 {
    score.clamp(0, 100) as u8
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn as_score(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => matches!(s.trim().to_lowercase().as_str(), "true" | "yes" | "1"),
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        _ => false,
    }
}

fn text_or(value: Option<Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Null) | None => default.to_string(),
        Some(Value::String(_)) => default.to_string(),
        Some(other) => other.to_string(),
    }
}

fn normalize_topics(raw: Vec<Value>) -> Vec<String> {
    let mut topics: Vec<String> = Vec::new();
    for value in raw {
        let Value::String(topic) = value else { continue };
        let topic = topic.trim().to_string();
        if !topic.is_empty() && !topics.contains(&topic) {
            topics.push(topic);
        }
        if topics.len() == MAX_TOPICS {
            break;
        }
    }
    topics
}
