use reqwest::Client;
use std::time::Duration;
use url::Url;

use super::Notifier;
use crate::config::NotifyConfig;
use crate::{Error, Result};

/// Incoming-webhook notifier: POSTs `{"text": ...}` to the destination URL
pub struct WebhookNotifier {
    client: Client,
}

impl WebhookNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, destination: &str, text: &str) -> Result<()> {
        let url = Url::parse(destination)?;

        let response = self
            .client
            .post(url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Notify(format!(
                "Webhook returned HTTP {}: {}",
                status,
                body.chars().take(200).collect::<String>()
            )));
        }

        Ok(())
    }
}
