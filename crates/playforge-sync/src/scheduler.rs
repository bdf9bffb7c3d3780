//! Scheduled pushes
//!
//! A background task that wakes every period and pushes when commits are
//! pending. The handle can run the same step on demand with
//! [`PushScheduler::tick`], and stops the task on [`PushScheduler::cancel`]
//! or when dropped.

use crate::error::SyncError;
use crate::manager::{PushReport, SyncManager};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Handle to the background push task
#[derive(Debug)]
pub struct PushScheduler {
    manager: SyncManager,
    period: Duration,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PushScheduler {
    pub(crate) fn spawn(manager: SyncManager, period: Duration) -> Self {
        let (stop, mut stopped) = oneshot::channel::<()>();
        let background = manager.clone();

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = &mut stopped => break,
                    _ = ticker.tick() => {
                        scheduled_push(&background).await;
                    }
                }
            }
            tracing::debug!("push scheduler stopped");
        });

        tracing::info!(period_secs = period.as_secs(), "push scheduler started");
        Self {
            manager,
            period,
            stop: Some(stop),
            task: Some(task),
        }
    }

    #[inline]
    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Whether the background task is still running
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Run one scheduled step now
    ///
    /// Returns `None` when nothing was pending.
    pub async fn tick(&self) -> Option<Result<PushReport, SyncError>> {
        scheduled_push(&self.manager).await
    }

    /// Stop the background task and wait for it to finish
    pub async fn cancel(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PushScheduler {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn scheduled_push(manager: &SyncManager) -> Option<Result<PushReport, SyncError>> {
    if !manager.has_pending().await {
        return None;
    }

    tracing::info!("scheduled push to remote");
    let result = manager.push().await;
    match &result {
        Ok(report) => tracing::info!(%report, "scheduled push finished"),
        Err(e) => tracing::warn!(error = %e, "scheduled push failed"),
    }
    Some(result)
}
