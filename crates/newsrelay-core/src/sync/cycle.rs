use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use tracing::Instrument;
use uuid::Uuid;

use super::cursor::{Cursor, CursorStore};
use super::dispatcher::Dispatcher;
use super::error::CycleError;
use super::resolver::{resolve, MatchStrategy, Resolution};
use crate::config::{AppConfig, DayBoundaryConfig};
use crate::feed::{FeedSnapshot, FeedSource};
use crate::notify::Notifier;

/// Settings one cycle needs, taken from `AppConfig`
#[derive(Debug, Clone)]
pub struct CycleConfig {
    pub team: String,
    pub destination: String,
    pub day_boundary: DayBoundaryConfig,
}

impl CycleConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            team: config.feed.team.clone(),
            destination: config.notify.destination.clone(),
            day_boundary: config.sync.day_boundary.clone(),
        }
    }

    /// Day whose list is fetched at local time `now`.
    ///
    /// Within the grace window after midnight this is still yesterday, so the
    /// articles of yesterday's last hour are picked up.
    pub fn target_date(&self, now: NaiveDateTime) -> NaiveDate {
        let today = now.date();
        if !self.day_boundary.enabled {
            return today;
        }

        let minutes_into_day = now.time().num_seconds_from_midnight() / 60;
        if minutes_into_day < self.day_boundary.grace_minutes {
            today.pred_opt().unwrap_or(today)
        } else {
            today
        }
    }
}

/// What a finished cycle did
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub date: NaiveDate,
    pub fetched: usize,
    pub delivered: usize,
    /// Set when this cycle anchored a first cursor instead of delivering
    pub bootstrapped: Option<Cursor>,
    pub strategy: Option<MatchStrategy>,
}

/// Snapshot and resolution computed without sending anything
#[derive(Debug, Clone)]
pub struct Preview {
    pub snapshot: FeedSnapshot,
    pub cursor: Option<Cursor>,
    pub resolution: Resolution,
}

/// One poll cycle: fetch, resolve against the stored cursor, dispatch.
pub struct PollCycle {
    config: CycleConfig,
    feed: Arc<dyn FeedSource>,
    notifier: Arc<dyn Notifier>,
    store: Arc<dyn CursorStore>,
}

impl PollCycle {
    pub fn new(
        config: CycleConfig,
        feed: Arc<dyn FeedSource>,
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn CursorStore>,
    ) -> Self {
        Self {
            config,
            feed,
            notifier,
            store,
        }
    }

    pub fn config(&self) -> &CycleConfig {
        &self.config
    }

    async fn fetch(&self, now: NaiveDateTime) -> Result<FeedSnapshot, CycleError> {
        let date = self.config.target_date(now);
        self.feed
            .fetch(&self.config.team, date)
            .await
            .map_err(CycleError::Fetch)
    }

    async fn load_cursor(&self) -> Result<Option<Cursor>, CycleError> {
        self.store.load().await.map_err(CycleError::state)
    }

    /// Run one cycle at feed-local time `now`
    pub async fn run_once(&self, now: NaiveDateTime) -> Result<CycleReport, CycleError> {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!("cycle", id = %cycle_id, team = %self.config.team);
        self.run_in_span(cycle_id, now).instrument(span).await
    }

    async fn run_in_span(&self, cycle_id: Uuid, now: NaiveDateTime) -> Result<CycleReport, CycleError> {
        // FETCH
        let snapshot = self.fetch(now).await?;
        let cursor = self.load_cursor().await?;

        // RESOLVE
        let resolution = resolve(&snapshot, cursor.as_ref());
        let mut report = CycleReport {
            cycle_id,
            date: snapshot.date,
            fetched: snapshot.len(),
            delivered: 0,
            bootstrapped: None,
            strategy: None,
        };

        // DISPATCH
        match resolution {
            Resolution::Idle => {
                tracing::debug!("Empty snapshot for {}, nothing to do", snapshot.date);
            }
            Resolution::Bootstrap(anchor) => {
                self.store.save(&anchor).await.map_err(CycleError::state)?;
                tracing::info!(
                    "No cursor yet; anchored at {} ({}) without sending {} existing articles",
                    anchor.last_article,
                    anchor.last_published_at,
                    snapshot.len()
                );
                report.bootstrapped = Some(anchor);
            }
            Resolution::Deliver { articles, strategy } => {
                tracing::debug!(
                    strategy = %strategy,
                    pending = articles.len(),
                    "Resolved delta"
                );
                report.strategy = Some(strategy);

                let dispatcher =
                    Dispatcher::new(self.notifier.as_ref(), self.store.as_ref(), &self.config.destination);
                report.delivered = dispatcher.dispatch(&articles).await?;
            }
        }

        tracing::info!(
            date = %report.date,
            fetched = report.fetched,
            delivered = report.delivered,
            "Cycle complete"
        );
        Ok(report)
    }

    /// Fetch and resolve without sending or saving anything
    pub async fn preview(&self, now: NaiveDateTime) -> Result<Preview, CycleError> {
        let snapshot = self.fetch(now).await?;
        let cursor = self.load_cursor().await?;
        let resolution = resolve(&snapshot, cursor.as_ref());

        Ok(Preview {
            snapshot,
            cursor,
            resolution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{CursorRepository, Database};
    use crate::test_support::{article, at, ids, FailingStore, RecordingNotifier, ScriptedFeed};

    struct Harness {
        feed: Arc<ScriptedFeed>,
        notifier: Arc<RecordingNotifier>,
        store: Arc<CursorRepository>,
        cycle: PollCycle,
    }

    async fn harness(notifier: RecordingNotifier) -> Harness {
        let feed = Arc::new(ScriptedFeed::default());
        let notifier = Arc::new(notifier);
        let store = Arc::new(CursorRepository::new(
            Database::new_in_memory().await.unwrap(),
            "OB",
        ));
        let config = CycleConfig {
            team: "OB".to_string(),
            destination: "C123".to_string(),
            day_boundary: DayBoundaryConfig::default(),
        };
        let cycle = PollCycle::new(config, feed.clone(), notifier.clone(), store.clone());

        Harness {
            feed,
            notifier,
            store,
            cycle,
        }
    }

    fn config(enabled: bool, grace_minutes: u32) -> CycleConfig {
        CycleConfig {
            team: "OB".to_string(),
            destination: "C123".to_string(),
            day_boundary: DayBoundaryConfig {
                enabled,
                grace_minutes,
            },
        }
    }

    #[test]
    fn test_target_date_day_boundary() {
        let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 4, 30).unwrap();

        let policy = config(true, 60);
        assert_eq!(policy.target_date(day.and_hms_opt(0, 0, 0).unwrap()), yesterday);
        assert_eq!(policy.target_date(day.and_hms_opt(0, 59, 0).unwrap()), yesterday);
        assert_eq!(policy.target_date(day.and_hms_opt(1, 0, 0).unwrap()), day);
        assert_eq!(policy.target_date(day.and_hms_opt(23, 59, 0).unwrap()), day);

        let disabled = config(false, 60);
        assert_eq!(disabled.target_date(day.and_hms_opt(0, 10, 0).unwrap()), day);
    }

    #[tokio::test]
    async fn test_scenario_bootstrap_deliver_fail_retry() {
        let h = harness(RecordingNotifier::failing_on("D")).await;

        // first run: no cursor, nothing sent, anchored at C
        h.feed.push(Ok(vec![
            article("C", "12:30"),
            article("B", "12:15"),
            article("A", "12:00"),
        ]));
        let report = h.cycle.run_once(at("12:40")).await.unwrap();
        assert_eq!(report.delivered, 0);
        assert_eq!(report.bootstrapped.as_ref().unwrap().last_article.article_id, "C");
        assert_eq!(h.notifier.attempts(), 0);

        // next run: D fails, cursor stays on C
        let next = vec![
            article("E", "13:00"),
            article("D", "12:45"),
            article("C", "12:30"),
            article("B", "12:15"),
            article("A", "12:00"),
        ];
        h.feed.push(Ok(next.clone()));
        let err = h.cycle.run_once(at("13:05")).await.unwrap_err();
        assert_eq!(err.stage(), "send");
        let cursor = h.store.load().await.unwrap().unwrap();
        assert_eq!(cursor.last_article.article_id, "C");
        assert_eq!(cursor.last_published_at, at("12:30"));

        // the following run resolves [D, E] again
        h.feed.push(Ok(next.clone()));
        let preview = h.cycle.preview(at("13:10")).await.unwrap();
        assert_eq!(ids(preview.resolution.pending()), vec!["D", "E"]);

        h.notifier.heal();
        h.feed.push(Ok(next));
        let report = h.cycle.run_once(at("13:10")).await.unwrap();
        assert_eq!(report.delivered, 2);
        assert_eq!(report.strategy, Some(MatchStrategy::Identity));
        assert_eq!(h.notifier.sent_ids(), vec!["D", "E"]);
        let cursor = h.store.load().await.unwrap().unwrap();
        assert_eq!(cursor.last_article.article_id, "E");
    }

    #[tokio::test]
    async fn test_no_duplicate_delivery_across_cycles() {
        let h = harness(RecordingNotifier::default()).await;
        h.store.save(&Cursor::at(&article("C", "12:30"))).await.unwrap();

        let feed = vec![article("D", "12:45"), article("C", "12:30")];
        h.feed.push(Ok(feed.clone()));
        h.feed.push(Ok(feed));

        assert_eq!(h.cycle.run_once(at("13:00")).await.unwrap().delivered, 1);
        assert_eq!(h.cycle.run_once(at("14:00")).await.unwrap().delivered, 0);
        assert_eq!(h.notifier.sent_ids(), vec!["D"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_changes_nothing() {
        let h = harness(RecordingNotifier::default()).await;
        h.store.save(&Cursor::at(&article("C", "12:30"))).await.unwrap();

        h.feed.push(Err("connection reset".to_string()));
        let err = h.cycle.run_once(at("13:00")).await.unwrap_err();
        assert!(matches!(err, CycleError::Fetch(_)));
        assert_eq!(h.notifier.attempts(), 0);
        assert_eq!(
            h.store.load().await.unwrap().unwrap().last_article.article_id,
            "C"
        );
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_noop() {
        let h = harness(RecordingNotifier::default()).await;

        h.feed.push(Ok(vec![]));
        let report = h.cycle.run_once(at("13:00")).await.unwrap();
        assert_eq!(report.fetched, 0);
        assert!(report.bootstrapped.is_none());
        assert!(h.store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_cursor_is_monotonic_over_cycles() {
        let h = harness(RecordingNotifier::default()).await;
        let mut last = None;

        let polls = vec![
            vec![article("A", "10:00")],
            vec![article("B", "10:15"), article("A", "10:00")],
            // A aged out and the list came back shuffled
            vec![article("B", "10:15"), article("D", "10:45"), article("C", "10:30")],
            vec![],
            vec![article("E", "11:00"), article("D", "10:45")],
        ];

        for (i, poll) in polls.into_iter().enumerate() {
            h.feed.push(Ok(poll));
            h.cycle.run_once(at("11:30")).await.unwrap();

            if let Some(cursor) = h.store.load().await.unwrap() {
                if let Some(prev) = last {
                    assert!(cursor.last_published_at >= prev, "cursor moved back at poll {}", i);
                }
                last = Some(cursor.last_published_at);
            }
        }

        assert_eq!(h.notifier.sent_ids(), vec!["B", "C", "D", "E"]);
    }

    #[tokio::test]
    async fn test_fetches_previous_day_in_grace_window() {
        let h = harness(RecordingNotifier::default()).await;

        h.feed.push(Ok(vec![]));
        let report = h
            .cycle
            .run_once(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap().and_hms_opt(0, 30, 0).unwrap())
            .await
            .unwrap();

        assert_eq!(report.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(h.feed.requests(), vec![("OB".to_string(), report.date)]);
    }

    fn with_store(store: Arc<FailingStore>) -> (Arc<ScriptedFeed>, Arc<RecordingNotifier>, PollCycle) {
        let feed = Arc::new(ScriptedFeed::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let cycle = PollCycle::new(config(false, 0), feed.clone(), notifier.clone(), store);
        (feed, notifier, cycle)
    }

    #[tokio::test]
    async fn test_unreadable_cursor_sends_nothing() {
        let store = Arc::new(FailingStore::failing_load());
        let (feed, notifier, cycle) = with_store(store.clone());

        feed.push(Ok(vec![article("D", "12:45"), article("C", "12:30")]));
        let err = cycle.run_once(at("13:00")).await.unwrap_err();

        assert_eq!(err.stage(), "state");
        assert!(matches!(err, CycleError::State { delivered: 0, .. }));
        assert_eq!(notifier.attempts(), 0);
        assert_eq!(store.saves(), 0);
    }

    #[tokio::test]
    async fn test_unwritable_first_cursor_is_state_error() {
        let store = Arc::new(FailingStore::failing_save());
        let (feed, notifier, cycle) = with_store(store.clone());

        feed.push(Ok(vec![article("C", "12:30"), article("B", "12:15")]));
        let err = cycle.run_once(at("13:00")).await.unwrap_err();

        assert!(matches!(err, CycleError::State { delivered: 0, .. }));
        assert_eq!(store.saves(), 1);
        assert_eq!(notifier.attempts(), 0);
    }

    #[tokio::test]
    async fn test_preview_surfaces_unreadable_cursor() {
        let (feed, _, cycle) = with_store(Arc::new(FailingStore::failing_load()));

        feed.push(Ok(vec![article("C", "12:30")]));
        let err = cycle.preview(at("13:00")).await.unwrap_err();
        assert_eq!(err.stage(), "state");
    }
}
