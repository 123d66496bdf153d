//! Fixtures and fakes shared by unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::feed::{Article, ArticleId, FeedSnapshot, FeedSource};
use crate::notify::Notifier;
use crate::sync::{Cursor, CursorStore};
use crate::{Error, Result};

pub fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

/// `"HH:MM"` on the fixture day
pub fn at(time: &str) -> NaiveDateTime {
    day().and_time(NaiveTime::parse_from_str(time, "%H:%M").unwrap())
}

pub fn article(aid: &str, time: &str) -> Article {
    Article {
        id: ArticleId::new("001", aid),
        office_name: "Sports Daily".to_string(),
        title: format!("Headline {}", aid),
        sub_content: String::new(),
        published_at: at(time),
        view_count: 0,
        canonical_url: None,
    }
}

pub fn snapshot(articles: Vec<Article>) -> FeedSnapshot {
    FeedSnapshot::from_feed_order(day(), articles)
}

pub fn ids(articles: &[Article]) -> Vec<&str> {
    articles.iter().map(|a| a.id.article_id.as_str()).collect()
}

/// Records every send; optionally fails for one article until healed.
#[derive(Default)]
pub struct RecordingNotifier {
    fail_on: Mutex<Option<String>>,
    sent: Mutex<Vec<(String, String)>>,
    attempts: Mutex<usize>,
}

impl RecordingNotifier {
    pub fn failing_on(aid: &str) -> Self {
        Self {
            fail_on: Mutex::new(Some(aid.to_string())),
            ..Self::default()
        }
    }

    pub fn heal(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_ids(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|(_, text)| text.rsplit_once("aid=").map(|(_, aid)| aid.to_string()))
            .collect()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, destination: &str, text: &str) -> Result<()> {
        *self.attempts.lock().unwrap() += 1;

        if let Some(aid) = self.fail_on.lock().unwrap().as_deref() {
            if text.ends_with(&format!("aid={}", aid)) {
                return Err(Error::Notify(format!("refusing {}", aid)));
            }
        }

        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        Ok(())
    }
}

/// Feed that replays queued responses in order
#[derive(Default)]
pub struct ScriptedFeed {
    responses: Mutex<VecDeque<std::result::Result<Vec<Article>, String>>>,
    requests: Mutex<Vec<(String, NaiveDate)>>,
}

impl ScriptedFeed {
    pub fn push(&self, response: std::result::Result<Vec<Article>, String>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn requests(&self) -> Vec<(String, NaiveDate)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch(&self, team: &str, date: NaiveDate) -> Result<FeedSnapshot> {
        self.requests.lock().unwrap().push((team.to_string(), date));

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(articles)) => Ok(FeedSnapshot::from_feed_order(date, articles)),
            Some(Err(message)) => Err(Error::FeedParse(message)),
            None => Ok(FeedSnapshot::from_feed_order(date, Vec::new())),
        }
    }
}

/// Cursor store whose reads or writes always fail
#[derive(Default)]
pub struct FailingStore {
    pub fail_load: bool,
    pub fail_save: bool,
    saves: Mutex<usize>,
}

impl FailingStore {
    pub fn failing_load() -> Self {
        Self {
            fail_load: true,
            ..Self::default()
        }
    }

    pub fn failing_save() -> Self {
        Self {
            fail_save: true,
            ..Self::default()
        }
    }

    pub fn saves(&self) -> usize {
        *self.saves.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl CursorStore for FailingStore {
    async fn load(&self) -> Result<Option<Cursor>> {
        if self.fail_load {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(None)
    }

    async fn save(&self, _cursor: &Cursor) -> Result<()> {
        *self.saves.lock().unwrap() += 1;
        if self.fail_save {
            return Err(Error::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}
