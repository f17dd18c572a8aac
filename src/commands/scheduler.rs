use crate::commands::refresh::{RefreshCoordinator, RefreshOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Periodic background refresh. At most one periodic task exists per scheduler; starting it
/// again replaces the previous one. Results are handed to whoever owns the rendering surface
/// through the channel passed to [`RefreshScheduler::start`].
pub struct RefreshScheduler {
    coordinator: Arc<RefreshCoordinator>,
    task: Option<(CancellationToken, JoinHandle<()>)>,
}

impl RefreshScheduler {
    pub fn new(coordinator: Arc<RefreshCoordinator>) -> Self {
        Self {
            coordinator,
            task: None,
        }
    }

    pub fn start(&mut self, interval: Duration, results: mpsc::Sender<RefreshOutcome>) {
        self.stop();

        let token = CancellationToken::new();
        let coordinator = self.coordinator.clone();
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            run_periodic(coordinator, interval, results, task_token).await;
        });

        log::info!("Scheduled contribution refresh every {}s", interval.as_secs());
        self.task = Some((token, handle));
    }

    pub fn stop(&mut self) {
        if let Some((token, _handle)) = self.task.take() {
            token.cancel();
            log::debug!("Cancelled scheduled contribution refresh");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .is_some_and(|(token, handle)| !token.is_cancelled() && !handle.is_finished())
    }

    /// On-demand refresh of the stored handle, answered through a one-shot channel.
    pub fn trigger_now(&self) -> oneshot::Receiver<Option<RefreshOutcome>> {
        let (tx, rx) = oneshot::channel();
        let coordinator = self.coordinator.clone();
        tokio::spawn(async move {
            let outcome = coordinator.refresh_stored().await;
            let _ = tx.send(outcome);
        });
        rx
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_periodic(
    coordinator: Arc<RefreshCoordinator>,
    interval: Duration,
    results: mpsc::Sender<RefreshOutcome>,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        // An in-flight refresh runs to completion so its cache write is never cut short.
        let Some(outcome) = coordinator.refresh_stored().await else {
            continue;
        };

        // The owner may have gone away while we were fetching.
        if token.is_cancelled() || results.is_closed() {
            break;
        }
        if results.send(outcome).await.is_err() {
            break;
        }
    }
}
