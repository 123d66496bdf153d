mod fetcher;
mod models;
mod parser;

pub use fetcher::FeedFetcher;
pub use models::{Article, ArticleId, FeedSnapshot};
pub use parser::parse_news_list;

use chrono::NaiveDate;

use crate::Result;

/// Source of team news snapshots
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch the first page of `team` news published on `date`.
    /// Any unreachable or malformed response is an error.
    async fn fetch(&self, team: &str, date: NaiveDate) -> Result<FeedSnapshot>;
}
