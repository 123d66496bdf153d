use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::info;

use newsrelay_core::{
    scheduler::{SchedulerEvent, SchedulerService},
    AppConfig,
};

/// Run the scheduler in the foreground until Ctrl+C
pub async fn run(config: &AppConfig) -> Result<()> {
    let cycle = Arc::new(super::build_cycle(config).await?);

    println!(
        "Polling {} news every {}s. Press Ctrl+C to stop.",
        config.feed.team, config.sync.poll_interval_secs
    );

    // Create shutdown channel
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    // One status line per cycle; the channel closes when the scheduler stops
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("{}", describe(&event));
        }
    });

    SchedulerService::new(cycle, config.sync.poll_interval_secs)
        .with_event_sender(event_tx)
        .run(shutdown_rx)
        .await;

    printer.await.ok();
    println!("Daemon stopped.");
    Ok(())
}

fn describe(event: &SchedulerEvent) -> String {
    match event {
        SchedulerEvent::CycleCompleted {
            bootstrapped: true, ..
        } => "Cursor anchored, nothing sent".to_string(),
        SchedulerEvent::CycleCompleted { delivered, .. } => {
            format!("{} articles delivered", delivered)
        }
        SchedulerEvent::CycleFailed {
            stage,
            delivered,
            message,
        } => format!(
            "Cycle failed at {} after {} delivered: {}",
            stage, delivered, message
        ),
    }
}
