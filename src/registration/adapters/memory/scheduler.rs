//! Scheduler that defers tasks until the test drives them.

use std::sync::{Mutex, PoisonError};

use crate::registration::ports::{
    TaskDescriptor, TaskFuture, TaskHandle, TaskResult, TaskScheduler,
};

/// Collects submitted tasks without running them.
///
/// Tests use it to check that submission never waits for delivery, then run
/// the queued tasks explicitly with [`Self::run_all`].
#[derive(Default)]
pub struct DeferredTaskScheduler {
    queue: Mutex<Vec<(TaskDescriptor, TaskFuture)>>,
}

impl DeferredTaskScheduler {
    /// Creates an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns the descriptors of waiting tasks, in submission order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<TaskDescriptor> {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(descriptor, _)| descriptor.clone())
            .collect()
    }

    /// Runs every waiting task sequentially and returns their results.
    pub async fn run_all(&self) -> Vec<(TaskDescriptor, TaskResult)> {
        let queued = std::mem::take(&mut *self.queue.lock().unwrap_or_else(PoisonError::into_inner));
        let mut results = Vec::with_capacity(queued.len());
        for (descriptor, task) in queued {
            results.push((descriptor, task.await));
        }
        results
    }
}

impl TaskScheduler for DeferredTaskScheduler {
    fn submit(&self, descriptor: TaskDescriptor, task: TaskFuture) -> TaskHandle {
        let handle = TaskHandle::new(descriptor.task_id);
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((descriptor, task));
        handle
    }
}
