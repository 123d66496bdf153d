use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::sync::{CycleReport, PollCycle};

/// Events emitted after every cycle the scheduler runs
#[derive(Debug, Clone)]
pub enum SchedulerEvent {
    /// Cycle finished; `bootstrapped` is true when it only anchored the cursor
    CycleCompleted { delivered: usize, bootstrapped: bool },
    /// Cycle aborted at `stage`; the next tick retries from the stored cursor
    CycleFailed {
        stage: String,
        delivered: usize,
        message: String,
    },
}

/// Runs poll cycles back to back on a fixed interval until shutdown
pub struct SchedulerService {
    cycle: Arc<PollCycle>,
    interval: Duration,
    event_tx: Option<mpsc::UnboundedSender<SchedulerEvent>>,
}

impl SchedulerService {
    /// `poll_interval_secs` of 0 disables polling
    pub fn new(cycle: Arc<PollCycle>, poll_interval_secs: u64) -> Self {
        Self {
            cycle,
            interval: Duration::from_secs(poll_interval_secs),
            event_tx: None,
        }
    }

    /// Set the event sender for cycle notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, event: SchedulerEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send scheduler event: receiver dropped");
            }
        }
    }

    /// Run cycles until the shutdown signal. The first cycle runs immediately.
    ///
    /// Shutdown is only observed between cycles; a running cycle is never cut
    /// off halfway through its dispatch.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if self.interval.is_zero() {
            info!("Scheduler disabled (poll_interval_secs = 0)");
            let _ = shutdown.changed().await;
            return;
        }

        info!(
            "Scheduler started: team={}, every {}s",
            self.cycle.config().team,
            self.interval.as_secs()
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                }

                _ = interval.tick() => {
                    self.run_cycle().await;
                }
            }
        }

        info!("Scheduler stopped");
    }

    async fn run_cycle(&self) {
        let now = chrono::Local::now().naive_local();

        match self.cycle.run_once(now).await {
            Ok(report) => self.completed(&report),
            Err(e) => {
                error!(stage = e.stage(), delivered = e.delivered(), "Cycle failed: {}", e);
                self.send_event(SchedulerEvent::CycleFailed {
                    stage: e.stage().to_string(),
                    delivered: e.delivered(),
                    message: e.to_string(),
                });
            }
        }
    }

    fn completed(&self, report: &CycleReport) {
        if report.delivered > 0 {
            info!("Scheduled cycle: {} articles delivered", report.delivered);
        }
        self.send_event(SchedulerEvent::CycleCompleted {
            delivered: report.delivered,
            bootstrapped: report.bootstrapped.is_some(),
        });
    }
}
