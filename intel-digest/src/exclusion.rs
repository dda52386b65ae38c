use crate::types::PoolRecord;

/// Rationale phrases that read as the classifier dismissing the item. Only
/// consulted by [`ExclusionRule::with_dismissal_phrases`].
pub const DEFAULT_DISMISSAL_PHRASES: &[&str] = &["not relevant", "no relevance", "irrelevant to", "unrelated to"];

/// Decides whether a record was explicitly judged not relevant. Such records
/// never reach any tier, whatever their score.
///
/// The verdict's `not_relevant` flag is authoritative and, by default, the
/// only signal. A phrase scan over the rationale can be switched on for
/// classifiers that only say so in prose.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRule {
    pub match_rationale_phrases: bool,
    pub phrases: Vec<String>,
}

impl ExclusionRule {
    /// Only honour the explicit flag. Same as `default()`.
    pub fn flag_only() -> Self {
        Self::default()
    }

    /// Also exclude records whose rationale contains one of `phrases`
    /// (case-insensitive).
    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            match_rationale_phrases: true,
            phrases: phrases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_dismissal_phrases() -> Self {
        Self::with_phrases(DEFAULT_DISMISSAL_PHRASES.iter().copied())
    }

    pub fn is_excluded(&self, record: &PoolRecord) -> bool {
        record.not_relevant || (self.match_rationale_phrases && self.rationale_dismisses(&record.why_it_matters))
    }

    pub fn rationale_dismisses(&self, rationale: &str) -> bool {
        let rationale = rationale.to_lowercase();
        self.phrases
            .iter()
            .any(|phrase| !phrase.is_empty() && rationale.contains(&phrase.to_lowercase()))
    }
}
