use crate::types::{DigestContent, DigestEntry};
use tracing::debug;

pub const MUST_KNOW_THRESHOLD: i32 = 70;
pub const WORTH_A_LOOK_THRESHOLD: i32 = 50;
pub const QUICK_HITS_THRESHOLD: i32 = 35;

pub const MUST_KNOW_CAP: usize = 5;
pub const WORTH_A_LOOK_CAP: usize = 10;
pub const QUICK_HITS_CAP: usize = 10;

/// How many entries may move up when `must_know` would otherwise be empty.
pub const PROMOTION_LIMIT: usize = 2;

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    MustKnow,
    WorthALook,
    QuickHits,
}

/// Thresholds and caps for splitting scored entries into tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPolicy {
    pub must_know_threshold: i32,
    pub worth_a_look_threshold: i32,
    pub quick_hits_threshold: i32,
    pub must_know_cap: usize,
    pub worth_a_look_cap: usize,
    pub quick_hits_cap: usize,
    pub promotion_limit: usize,
}

impl Default for TierPolicy {
    fn default() -> Self {
        Self {
            must_know_threshold: MUST_KNOW_THRESHOLD,
            worth_a_look_threshold: WORTH_A_LOOK_THRESHOLD,
            quick_hits_threshold: QUICK_HITS_THRESHOLD,
            must_know_cap: MUST_KNOW_CAP,
            worth_a_look_cap: WORTH_A_LOOK_CAP,
            quick_hits_cap: QUICK_HITS_CAP,
            promotion_limit: PROMOTION_LIMIT,
        }
    }
}

impl TierPolicy {
    /// First matching tier, checked top-down. An entry that lands in a tier is
    /// never considered for the ones below it.
    pub fn classify(&self, entry: &DigestEntry) -> Option<Tier> {
        let score = entry.relevance_score;
        if entry.must_read || score >= self.must_know_threshold {
            Some(Tier::MustKnow)
        } else if score >= self.worth_a_look_threshold {
            Some(Tier::WorthALook)
        } else if score >= self.quick_hits_threshold {
            Some(Tier::QuickHits)
        } else {
            None
        }
    }

    /// Partition, promote, then cap. `excluded[i]` drops `entries[i]`
    /// outright; a missing flag counts as not excluded. Scores are clamped to
    /// 0..=100 before anything else looks at them.
    pub fn tier(&self, entries: Vec<DigestEntry>, excluded: &[bool]) -> DigestContent {
        let mut candidates: Vec<DigestEntry> = entries
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !excluded.get(*index).copied().unwrap_or(false))
            .map(|(_, mut entry)| {
                entry.relevance_score = clamp_score(entry.relevance_score);
                entry
            })
            .collect();

        sort_by_score(&mut candidates);

        let mut content = DigestContent::default();
        for entry in candidates {
            match self.classify(&entry) {
                Some(Tier::MustKnow) => content.must_know.push(entry),
                Some(Tier::WorthALook) => content.worth_a_look.push(entry),
                Some(Tier::QuickHits) => content.quick_hits.push(entry),
                None => {}
            }
        }

        self.promote(&mut content);

        content.must_know.truncate(self.must_know_cap);
        content.worth_a_look.truncate(self.worth_a_look_cap);
        content.quick_hits.truncate(self.quick_hits_cap);

        debug!(
            must_know = content.must_know.len(),
            worth_a_look = content.worth_a_look.len(),
            quick_hits = content.quick_hits.len(),
            "Tiered digest entries"
        );

        content
    }

    /// With no headline items, lift the best `worth_a_look` entries that
    /// still clear the `must_know` threshold. Nothing below the threshold is
    /// ever promoted.
    pub fn promote(&self, content: &mut DigestContent) {
        if !content.must_know.is_empty() || content.worth_a_look.is_empty() {
            return;
        }

        let mut eligible: Vec<usize> = content
            .worth_a_look
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.relevance_score >= self.must_know_threshold)
            .map(|(index, _)| index)
            .collect();

        if eligible.is_empty() {
            return;
        }

        let worth = &content.worth_a_look;
        eligible.sort_by(|a, b| worth[*b].relevance_score.cmp(&worth[*a].relevance_score));
        eligible.truncate(self.promotion_limit);

        let mut slots: Vec<Option<DigestEntry>> =
            std::mem::take(&mut content.worth_a_look).into_iter().map(Some).collect();

        for index in eligible {
            if let Some(entry) = slots[index].take() {
                content.must_know.push(entry);
            }
        }

        content.worth_a_look = slots.into_iter().flatten().collect();
    }
}

/// Tier with the default policy.
pub fn tier(entries: Vec<DigestEntry>, excluded: &[bool]) -> DigestContent {
    TierPolicy::default().tier(entries, excluded)
}

pub fn clamp_score(score: i32) -> i32 {
    score.clamp(MIN_SCORE, MAX_SCORE)
}

/// Stable descending sort, so equal scores keep their input order.
pub fn sort_by_score(entries: &mut [DigestEntry]) {
    entries.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));
}
