use super::cursor::{Cursor, CursorStore};
use super::error::CycleError;
use crate::feed::Article;
use crate::notify::{format_message, Notifier};

/// Sends a delta in order, moving the cursor after every confirmed send.
///
/// The first failure ends the run: later articles are never sent ahead of an
/// earlier one that failed.
pub struct Dispatcher<'a> {
    notifier: &'a dyn Notifier,
    store: &'a dyn CursorStore,
    destination: &'a str,
}

impl<'a> Dispatcher<'a> {
    pub fn new(notifier: &'a dyn Notifier, store: &'a dyn CursorStore, destination: &'a str) -> Self {
        Self {
            notifier,
            store,
            destination,
        }
    }

    /// Deliver `delta` (oldest first). Returns how many were delivered.
    pub async fn dispatch(&self, delta: &[Article]) -> Result<usize, CycleError> {
        let mut delivered = 0;

        for article in delta {
            let text = format_message(article);

            if let Err(source) = self.notifier.send(self.destination, &text).await {
                tracing::warn!(
                    article = %article.id,
                    delivered,
                    remaining = delta.len() - delivered,
                    "Send failed, stopping dispatch: {}",
                    source
                );
                return Err(CycleError::Send {
                    delivered,
                    article: article.id.clone(),
                    source,
                });
            }

            if let Err(source) = self.store.save(&Cursor::at(article)).await {
                tracing::error!(
                    article = %article.id,
                    "Article sent but cursor not saved; it will be sent again: {}",
                    source
                );
                return Err(CycleError::State { delivered, source });
            }

            delivered += 1;
            tracing::info!(
                article = %article.id,
                published_at = %article.published_at,
                via = self.notifier.name(),
                "Delivered: {}",
                article.title
            );
        }

        Ok(delivered)
    }
}
