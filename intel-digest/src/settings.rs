use crate::traits::SettingsStore;
use tracing::warn;

pub const RECIPIENTS_KEY: &str = "digest_recipients";

/// Split a comma-separated address list, dropping blanks.
pub fn parse_recipient_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Recipients from runtime settings, or `fallback` when the setting is
/// missing, blank or unreadable.
pub async fn resolve_recipients(store: &dyn SettingsStore, fallback: &[String]) -> Vec<String> {
    match store.get(RECIPIENTS_KEY).await {
        Ok(Some(value)) => {
            let recipients = parse_recipient_list(&value);
            if recipients.is_empty() {
                fallback.to_vec()
            } else {
                recipients
            }
        }
        Ok(None) => fallback.to_vec(),
        Err(e) => {
            warn!(error = %e, "Could not read recipients from settings, using fallback");
            fallback.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn list_is_trimmed() {
        assert_eq!(
            parse_recipient_list(" ops@example.com, ,ceo@example.com,"),
            vec!["ops@example.com", "ceo@example.com"]
        );
    }

    #[tokio::test]
    async fn stored_value_wins_over_fallback() {
        let store = MemoryStore::new();
        let fallback = vec!["fallback@example.com".to_string()];

        assert_eq!(resolve_recipients(&store, &fallback).await, fallback);

        store.set(RECIPIENTS_KEY, "a@example.com,b@example.com").await.unwrap();
        assert_eq!(
            resolve_recipients(&store, &fallback).await,
            vec!["a@example.com", "b@example.com"]
        );

        store.set(RECIPIENTS_KEY, " , ").await.unwrap();
        assert_eq!(resolve_recipients(&store, &fallback).await, fallback);
    }
}
