//! Slack Web API notifier (`chat.postMessage` with a bot token).

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::Notifier;
use crate::config::NotifyConfig;
use crate::{Error, Result};

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
    unfurl_links: bool,
}

#[derive(Debug, Deserialize)]
struct PostMessageResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

pub struct SlackNotifier {
    client: Client,
    token: String,
    endpoint: String,
}

impl SlackNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self> {
        let token = config
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| Error::Config("Slack notifier requires notify.token".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            token,
            endpoint: format!("{}/chat.postMessage", config.api_base.trim_end_matches('/')),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        "slack"
    }

    async fn send(&self, destination: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&PostMessageRequest {
                channel: destination,
                text,
                unfurl_links: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Notify(format!("Slack returned HTTP {}", status)));
        }

        // Slack reports most failures with HTTP 200 and ok=false
        let body: PostMessageResponse = response.json().await?;
        if !body.ok {
            return Err(Error::Notify(format!(
                "chat.postMessage failed: {}",
                body.error.unwrap_or_else(|| "unknown".to_string())
            )));
        }

        Ok(())
    }
}
