//! Task scheduling port.

use std::future::Future;
use std::pin::Pin;

use crate::registration::domain::{DeliveryReport, RegistrationTaskError, TaskId};

/// Final result of one registration task.
pub type TaskResult = Result<DeliveryReport, RegistrationTaskError>;

/// A registration task ready to run.
pub type TaskFuture = Pin<Box<dyn Future<Output = TaskResult> + Send + 'static>>;

/// Identifies a submitted task for logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    /// Task identifier.
    pub task_id: TaskId,
    /// Entity the task registers.
    pub entity_id: String,
}

impl TaskDescriptor {
    /// Describes a new task for `entity_id`.
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            task_id: TaskId::new(),
            entity_id: entity_id.into(),
        }
    }
}

/// Handle returned on submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    task_id: TaskId,
}

impl TaskHandle {
    /// Creates a handle for a submitted task.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self { task_id }
    }

    /// Returns the submitted task identifier.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }
}

/// Runs registration tasks off the listener's flow of control.
///
/// `submit` must return without waiting for the task. The scheduler owns the
/// task result: delivered registrations and terminal failures are reported
/// there.
pub trait TaskScheduler: Send + Sync {
    /// Schedules `task` for asynchronous execution.
    fn submit(&self, descriptor: TaskDescriptor, task: TaskFuture) -> TaskHandle;
}
