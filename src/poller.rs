//! Fixed-interval polling task

use crate::client::StatusSource;
use crate::errors::DashboardError;
use crate::status::Snapshot;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};

/// Outcome of one poll.
#[derive(Debug)]
pub enum PollEvent {
    Loaded(Snapshot),
    Failed(DashboardError),
}

/// Handle to a running poll loop. Dropping it stops the loop.
pub struct Poller {
    events: mpsc::Receiver<PollEvent>,
    task: JoinHandle<()>,
}

impl Poller {
    /// Start polling `source` now and then every `period`.
    pub fn spawn(source: Arc<dyn StatusSource>, period: Duration) -> Self {
        let (tx, events) = mpsc::channel(8);
        let task = tokio::spawn(poll_loop(source, period, tx));
        Self { events, task }
    }

    /// Next pending result, if any, without waiting.
    pub fn try_next(&mut self) -> Option<PollEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the next result. `None` once the loop has stopped.
    pub async fn next(&mut self) -> Option<PollEvent> {
        self.events.recv().await
    }

    pub fn shutdown(self) {
        debug!("Stopping status poller");
        self.task.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn poll_loop(source: Arc<dyn StatusSource>, period: Duration, tx: mpsc::Sender<PollEvent>) {
    info!("Polling status every {}s", period.as_secs());

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let event = match source.fetch_snapshot().await {
            Ok(snapshot) => PollEvent::Loaded(snapshot),
            Err(e) => {
                warn!("Status poll failed: {}", e);
                PollEvent::Failed(e)
            }
        };

        if tx.send(event).await.is_err() {
            debug!("Dashboard closed, discarding poll result");
            break;
        }
    }
}
