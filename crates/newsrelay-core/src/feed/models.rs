use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::fmt;

const ARTICLE_URL_BASE: &str = "https://sports.news.naver.com/news";

/// Stable identity of an article: the publishing office plus its article id
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArticleId {
    pub office_id: String,
    pub article_id: String,
}

impl ArticleId {
    pub fn new(office_id: impl Into<String>, article_id: impl Into<String>) -> Self {
        Self {
            office_id: office_id.into(),
            article_id: article_id.into(),
        }
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.office_id, self.article_id)
    }
}

/// One article as returned by the team news list
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: ArticleId,
    pub office_name: String,
    pub title: String,
    pub sub_content: String,
    /// Feed-local time, minute resolution
    pub published_at: NaiveDateTime,
    /// Changes between polls; never part of identity
    pub view_count: u64,
    pub canonical_url: Option<String>,
}

impl Article {
    /// Link to the article, derived from its identity when the feed omits one
    pub fn url(&self) -> String {
        match self.canonical_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!(
                "{}?oid={}&aid={}",
                ARTICLE_URL_BASE, self.id.office_id, self.id.article_id
            ),
        }
    }
}

/// A single poll's result for one calendar day, newest first
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub date: NaiveDate,
    articles: Vec<Article>,
}

impl FeedSnapshot {
    /// Build a snapshot from articles in the order the feed returned them.
    ///
    /// The list is stable-sorted newest first, so equal timestamps keep the
    /// feed's relative order. A repeated identity keeps its first occurrence.
    pub fn from_feed_order(date: NaiveDate, articles: Vec<Article>) -> Self {
        let mut seen = HashSet::new();
        let mut articles: Vec<Article> = articles
            .into_iter()
            .filter(|a| seen.insert(a.id.clone()))
            .collect();
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        Self { date, articles }
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn newest(&self) -> Option<&Article> {
        self.articles.first()
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}
