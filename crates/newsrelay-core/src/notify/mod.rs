mod slack;
mod webhook;

pub use slack::SlackNotifier;
pub use webhook::WebhookNotifier;

use std::sync::Arc;

use crate::config::{NotifyConfig, NotifyProvider};
use crate::feed::Article;
use crate::Result;

/// Transport for notification messages
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Post `text` to `destination`. Anything short of a confirmed post is an error.
    async fn send(&self, destination: &str, text: &str) -> Result<()>;
}

/// Create the notifier selected in configuration
pub fn create_notifier(config: &NotifyConfig) -> Result<Arc<dyn Notifier>> {
    let notifier: Arc<dyn Notifier> = match config.provider {
        NotifyProvider::Slack => Arc::new(SlackNotifier::new(config)?),
        NotifyProvider::Webhook => Arc::new(WebhookNotifier::new(config)?),
    };
    Ok(notifier)
}

/// Render the chat message for one article
pub fn format_message(article: &Article) -> String {
    format!(
        "{}\n{} | views {} | {}\n{}",
        article.title,
        article.office_name,
        article.view_count,
        article.published_at.format("%Y-%m-%d %H:%M"),
        article.url()
    )
}
