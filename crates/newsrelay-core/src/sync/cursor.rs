use chrono::NaiveDateTime;

use crate::feed::{Article, ArticleId};
use crate::Result;

/// Marker of the last article that was actually delivered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub last_article: ArticleId,
    pub last_published_at: NaiveDateTime,
}

impl Cursor {
    pub fn at(article: &Article) -> Self {
        Self {
            last_article: article.id.clone(),
            last_published_at: article.published_at,
        }
    }

    pub fn points_at(&self, article: &Article) -> bool {
        self.last_article == article.id
    }
}

/// Durable cursor storage.
///
/// `None` from `load` means nothing was ever delivered. Each `save` is its
/// own durable write of the whole cursor.
#[async_trait::async_trait]
pub trait CursorStore: Send + Sync {
    async fn load(&self) -> Result<Option<Cursor>>;

    async fn save(&self, cursor: &Cursor) -> Result<()>;
}
