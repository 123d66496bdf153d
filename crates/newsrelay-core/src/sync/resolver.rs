//! Delta resolution: which articles of a snapshot still have to be delivered.
//!
//! Snapshots are newest first; a delta is always oldest first. The cursor's
//! identity is the exact boundary when the article is still listed. When it
//! has dropped out of the list (or belongs to another day) the cursor's
//! timestamp is used instead, with a strict greater-than.

use std::fmt;

use super::cursor::Cursor;
use crate::feed::{Article, FeedSnapshot};

/// How the boundary between delivered and pending articles was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// The cursor's article is still in the snapshot
    Identity,
    /// The cursor's article is gone; compared by publication time
    Timestamp,
}

impl fmt::Display for MatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchStrategy::Identity => f.write_str("identity"),
            MatchStrategy::Timestamp => f.write_str("timestamp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// The snapshot had no articles; nothing to do, cursor untouched
    Idle,
    /// First run: anchor the cursor at the newest article and deliver nothing
    Bootstrap(Cursor),
    /// Articles to deliver, oldest first (possibly none)
    Deliver {
        articles: Vec<Article>,
        strategy: MatchStrategy,
    },
}

impl Resolution {
    /// Articles this resolution asks to deliver
    pub fn pending(&self) -> &[Article] {
        match self {
            Resolution::Deliver { articles, .. } => articles,
            _ => &[],
        }
    }
}

pub fn resolve(snapshot: &FeedSnapshot, cursor: Option<&Cursor>) -> Resolution {
    let Some(newest) = snapshot.newest() else {
        return Resolution::Idle;
    };

    let Some(cursor) = cursor else {
        return Resolution::Bootstrap(Cursor::at(newest));
    };

    let articles = snapshot.articles();

    let (newer, strategy) = match articles.iter().position(|a| cursor.points_at(a)) {
        Some(index) => (&articles[..index], MatchStrategy::Identity),
        None => {
            // Newest-first order means everything after the first article at
            // or before the cursor time is older still.
            let end = articles
                .iter()
                .position(|a| a.published_at <= cursor.last_published_at)
                .unwrap_or(articles.len());
            (&articles[..end], MatchStrategy::Timestamp)
        }
    };

    Resolution::Deliver {
        articles: newer.iter().rev().cloned().collect(),
        strategy,
    }
}
