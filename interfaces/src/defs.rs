use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Raw candidate as handed over by an ingestion collaborator (RSS reader,
/// page scraper). Nothing here is trusted or canonical yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCandidate {
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// A deduplicated content unit. `url` is the canonical form and doubles as
/// the identity key across sources and runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub url: String,
    pub title: String,
    pub content: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

impl Item {
    pub fn identity_key(&self) -> &str {
        &self.url
    }
}

/// Business categories a verdict can land in. Unknown labels fold into
/// `Sar`, the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "&'static str")]
pub enum Category {
    #[default]
    Sar,
    Aviation,
    Maritime,
    Manufacturing,
    Geopolitical,
    Competitor,
    Customer,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Sar,
        Category::Aviation,
        Category::Maritime,
        Category::Manufacturing,
        Category::Geopolitical,
        Category::Competitor,
        Category::Customer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Sar => "sar",
            Category::Aviation => "aviation",
            Category::Maritime => "maritime",
            Category::Manufacturing => "manufacturing",
            Category::Geopolitical => "geopolitical",
            Category::Competitor => "competitor",
            Category::Customer => "customer",
        }
    }

    /// Lenient parse: case and surrounding whitespace are ignored, anything
    /// unrecognised becomes the default category.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == label)
            .unwrap_or_default()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Category {
    fn from(label: String) -> Self {
        Category::from_label(&label)
    }
}

impl From<Category> for &'static str {
    fn from(category: Category) -> Self {
        category.as_str()
    }
}

/// Classification result for one item. At most one verdict exists per item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub summary: String,
    pub why_it_matters: String,
    pub category: Category,
    /// Up to three distinct tags, in classifier order.
    pub topics: Vec<String>,
    /// Always within 0..=100.
    pub relevance_score: u8,
    pub must_read: bool,
    /// Vague or hype-driven coverage.
    pub low_signal: bool,
    /// Classifier explicitly judged the item irrelevant.
    pub not_relevant: bool,
    pub created_at: DateTime<Utc>,
}

/// Point-in-time snapshot of an item and its verdict inside a digest. Never
/// refers back to the source rows, so later re-classification leaves
/// historical digests untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestEntry {
    pub title: String,
    pub summary: String,
    pub why_it_matters: String,
    pub url: String,
    pub category: Category,
    pub topics: Vec<String>,
    pub relevance_score: i32,
    pub must_read: bool,
}

/// The three tiers of a digest, each sorted by descending relevance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestContent {
    pub must_know: Vec<DigestEntry>,
    pub worth_a_look: Vec<DigestEntry>,
    pub quick_hits: Vec<DigestEntry>,
}

impl DigestContent {
    pub fn counts(&self) -> TierCounts {
        TierCounts {
            must_know: self.must_know.len(),
            worth_a_look: self.worth_a_look.len(),
            quick_hits: self.quick_hits.len(),
        }
    }

    pub fn total(&self) -> usize {
        self.counts().total()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// All entries, highest tier first.
    pub fn entries(&self) -> impl Iterator<Item = &DigestEntry> {
        self.must_know
            .iter()
            .chain(self.worth_a_look.iter())
            .chain(self.quick_hits.iter())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub must_know: usize,
    pub worth_a_look: usize,
    pub quick_hits: usize,
}

impl TierCounts {
    pub fn total(&self) -> usize {
        self.must_know + self.worth_a_look + self.quick_hits
    }
}

/// One digest per calendar date. Content is immutable once stored; only
/// `notified` may change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Digest {
    pub id: Uuid,
    pub date: NaiveDate,
    pub content: DigestContent,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}

impl Digest {
    pub fn new(date: NaiveDate, content: DigestContent, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            content,
            notified: false,
            created_at,
        }
    }
}

/// Item joined with its verdict, as served by a pool provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolRecord {
    pub title: String,
    pub url: String,
    pub summary: String,
    pub why_it_matters: String,
    pub category: Category,
    pub topics: Vec<String>,
    pub relevance_score: i32,
    pub must_read: bool,
    pub low_signal: bool,
    pub not_relevant: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub verdict_created_at: DateTime<Utc>,
}

impl PoolRecord {
    pub fn from_parts(item: &Item, verdict: &Verdict) -> Self {
        Self {
            title: item.title.clone(),
            url: item.url.clone(),
            summary: verdict.summary.clone(),
            why_it_matters: verdict.why_it_matters.clone(),
            category: verdict.category,
            topics: verdict.topics.clone(),
            relevance_score: i32::from(verdict.relevance_score),
            must_read: verdict.must_read,
            low_signal: verdict.low_signal,
            not_relevant: verdict.not_relevant,
            published_at: item.published_at,
            verdict_created_at: verdict.created_at,
        }
    }

    pub fn to_entry(&self) -> DigestEntry {
        DigestEntry {
            title: self.title.clone(),
            summary: self.summary.clone(),
            why_it_matters: self.why_it_matters.clone(),
            url: self.url.clone(),
            category: self.category,
            topics: self.topics.clone(),
            relevance_score: self.relevance_score,
            must_read: self.must_read,
        }
    }
}
