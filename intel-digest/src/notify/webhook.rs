use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::webhook_host;
use crate::settings::resolve_recipients;
use crate::traits::{Notifier, SettingsStore};
use crate::types::DigestContent;

/// Hands the digest payload to a delivery service over HTTP. The service
/// owns rendering and transport; this side only posts the structured
/// content and who should receive it.
pub struct WebhookNotifier {
    webhook_url: String,
    settings: Arc<dyn SettingsStore>,
    fallback_recipients: Vec<String>,
    http: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String, settings: Arc<dyn SettingsStore>, fallback_recipients: Vec<String>) -> Self {
        Self {
            webhook_url,
            settings,
            fallback_recipients,
            http: reqwest::Client::new(),
        }
    }

    pub async fn payload(&self, date: NaiveDate, content: &DigestContent) -> serde_json::Value {
        let recipients = resolve_recipients(self.settings.as_ref(), &self.fallback_recipients).await;
        json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "recipients": recipients,
            "content": content,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn notifier_name(&self) -> String {
        format!("webhook ({})", webhook_host(&self.webhook_url))
    }

    async fn send(&self, date: NaiveDate, content: &DigestContent) -> anyhow::Result<()> {
        let payload = self.payload(date, content).await;
        if payload["recipients"].as_array().is_some_and(|r| r.is_empty()) {
            anyhow::bail!("No digest recipients configured");
        }

        let resp = self
            .http
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| e.without_url())?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Digest webhook returned non-success");
            anyhow::bail!("Digest webhook returned {status}");
        }

        info!(%date, "Digest delivered to webhook");
        Ok(())
    }
}
