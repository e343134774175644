//! Tokio-backed scheduler and timer.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::task::TaskTracker;
use tracing::{error, info, warn};

use crate::registration::ports::{
    RetryTimer, TaskDescriptor, TaskFuture, TaskHandle, TaskScheduler,
};

/// Spawns registration tasks on the current tokio runtime.
///
/// Tasks are tracked so that shutdown can wait for in-flight deliveries for a
/// bounded time. Task results are reported here: delivered registrations at
/// info level, abandoned ones at error level.
#[derive(Debug, Clone, Default)]
pub struct TokioTaskScheduler {
    tracker: TaskTracker,
}

impl TokioTaskScheduler {
    /// Creates a scheduler with no tasks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tasks still running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Closes the tracker and waits up to `grace` for running tasks.
    ///
    /// Returns `true` when every task finished in time. Tasks still running
    /// afterwards are abandoned with the runtime.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tracker.close();
        if tokio::time::timeout(grace, self.tracker.wait()).await.is_ok() {
            return true;
        }
        warn!(
            remaining = self.tracker.len(),
            grace_secs = grace.as_secs(),
            "abandoning in-flight registration tasks"
        );
        false
    }
}

impl TaskScheduler for TokioTaskScheduler {
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    fn submit(&self, descriptor: TaskDescriptor, task: TaskFuture) -> TaskHandle {
        let handle = TaskHandle::new(descriptor.task_id);
        self.tracker.spawn(report_outcome(descriptor, task));
        handle
    }
}

async fn report_outcome(descriptor: TaskDescriptor, task: TaskFuture) {
    let TaskDescriptor { task_id, entity_id } = descriptor;
    match task.await {
        Ok(report) => info!(
            %task_id,
            %entity_id,
            status = report.status,
            failed_attempts = report.failed_attempts,
            "registration task finished"
        ),
        Err(task_error) => error!(
            %task_id,
            %entity_id,
            error = %task_error,
            "registration task abandoned"
        ),
    }
}

/// Waits with `tokio::time::sleep`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioRetryTimer;

#[async_trait]
impl RetryTimer for TokioRetryTimer {
    async fn wait(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}
