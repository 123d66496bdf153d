use std::sync::Arc;

use anyhow::Result;

use newsrelay_core::{
    feed::FeedFetcher,
    notify::{create_notifier, Notifier},
    storage::{CursorRepository, Database},
    sync::{CycleConfig, PollCycle},
    AppConfig,
};

pub mod daemon;
pub mod preview;
pub mod reset;
pub mod run;
pub mod status;

/// Cursor store for the configured team
pub async fn open_store(config: &AppConfig) -> Result<CursorRepository> {
    let db = Database::new(config).await?;
    Ok(CursorRepository::new(db, config.feed.team.clone()))
}

/// Wire the HTTP feed, the configured notifier and the SQLite cursor into a cycle
pub async fn build_cycle(config: &AppConfig) -> Result<PollCycle> {
    config.validate()?;
    let notifier = create_notifier(&config.notify)?;
    assemble(config, notifier).await
}

/// Cycle with a caller-supplied notifier; only the feed settings are checked
pub async fn assemble(config: &AppConfig, notifier: Arc<dyn Notifier>) -> Result<PollCycle> {
    config.validate_feed()?;

    let feed = Arc::new(FeedFetcher::new(&config.feed)?);
    let store = Arc::new(open_store(config).await?);

    Ok(PollCycle::new(
        CycleConfig::from_app(config),
        feed,
        notifier,
        store,
    ))
}

/// Current feed-local time
pub fn now() -> chrono::NaiveDateTime {
    chrono::Local::now().naive_local()
}
