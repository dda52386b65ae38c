use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;

use crate::traits::Notifier;
use crate::types::DigestContent;

/// Accepts every digest without sending anything. Used when no delivery
/// endpoint is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    fn notifier_name(&self) -> String {
        "noop".to_string()
    }

    async fn send(&self, date: NaiveDate, content: &DigestContent) -> anyhow::Result<()> {
        info!(%date, entries = content.total(), "No notifier configured, skipping delivery");
        Ok(())
    }
}
