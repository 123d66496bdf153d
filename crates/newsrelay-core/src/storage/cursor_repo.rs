use chrono::{NaiveDateTime, Utc};
use sqlx::FromRow;

use super::retry::with_retry;
use super::Database;
use crate::feed::ArticleId;
use crate::sync::{Cursor, CursorStore};
use crate::{Error, Result};

/// SQLite-backed cursor for one stream (the tracked team code)
#[derive(Clone)]
pub struct CursorRepository {
    db: Database,
    stream: String,
}

#[derive(FromRow)]
struct CursorRow {
    office_id: String,
    article_id: String,
    published_at: NaiveDateTime,
}

impl From<CursorRow> for Cursor {
    fn from(row: CursorRow) -> Self {
        Cursor {
            last_article: ArticleId::new(row.office_id, row.article_id),
            last_published_at: row.published_at,
        }
    }
}

impl CursorRepository {
    pub fn new(db: Database, stream: impl Into<String>) -> Self {
        Self {
            db,
            stream: stream.into(),
        }
    }

    pub fn stream(&self) -> &str {
        &self.stream
    }

    /// Remove the stored cursor; the next cycle starts over without a backlog.
    /// Returns whether a cursor existed.
    pub async fn reset(&self) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cursors WHERE stream = ?")
            .bind(&self.stream)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl CursorStore for CursorRepository {
    async fn load(&self) -> Result<Option<Cursor>> {
        let pool = self.db.pool().clone();
        let stream = self.stream.clone();

        let row: Option<CursorRow> = with_retry("load cursor", || {
            let pool = pool.clone();
            let stream = stream.clone();
            async move {
                sqlx::query_as::<_, CursorRow>(
                    r#"
                    SELECT office_id, article_id, published_at
                    FROM cursors
                    WHERE stream = ?
                    "#,
                )
                .bind(stream)
                .fetch_optional(&pool)
                .await
            }
        })
        .await?;

        Ok(row.map(Cursor::from))
    }

    async fn save(&self, cursor: &Cursor) -> Result<()> {
        let pool = self.db.pool().clone();
        let stream = self.stream.clone();
        let cursor = cursor.clone();
        let now = Utc::now();

        // The WHERE on the upsert refuses to move the cursor back in time, so
        // an overlapping cycle that already advanced further is never undone.
        let result = with_retry("save cursor", || {
            let pool = pool.clone();
            let stream = stream.clone();
            let cursor = cursor.clone();
            async move {
                sqlx::query(
                    r#"
                    INSERT INTO cursors (stream, office_id, article_id, published_at, updated_at)
                    VALUES (?, ?, ?, ?, ?)
                    ON CONFLICT(stream) DO UPDATE SET
                        office_id = excluded.office_id,
                        article_id = excluded.article_id,
                        published_at = excluded.published_at,
                        updated_at = excluded.updated_at
                    WHERE excluded.published_at >= cursors.published_at
                    "#,
                )
                .bind(stream)
                .bind(cursor.last_article.office_id)
                .bind(cursor.last_article.article_id)
                .bind(cursor.last_published_at)
                .bind(now)
                .execute(&pool)
                .await
            }
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::StateConflict(format!(
                "stored cursor for '{}' is newer than {} ({})",
                self.stream, cursor.last_article, cursor.last_published_at
            )));
        }

        Ok(())
    }
}
