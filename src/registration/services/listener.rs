//! Bus listener that schedules registrations for created instances.

use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::RegistrationRunner;
use crate::registration::{
    domain::{EventClass, EventMessage, classify},
    ports::{BusError, EventBus, TaskDescriptor, TaskHandle, TaskScheduler},
};

/// Why the listener stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
    /// The bus closed the subscription.
    BusClosed,
    /// The cancellation token fired.
    Cancelled,
}

/// Message counters accumulated by one listener run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Messages received from the bus.
    pub received: u64,
    /// Creation events handed to the scheduler.
    pub scheduled: u64,
    /// Deletion events observed.
    pub deletions: u64,
    /// Irrelevant events.
    pub ignored: u64,
    /// Messages that could not be classified.
    pub malformed: u64,
}

/// Result of a listener run that ended cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSummary {
    /// Reason the loop stopped.
    pub exit: ListenerExit,
    /// Counters at exit.
    pub stats: ListenerStats,
}

/// Errors that end the listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The bus subscription failed or the connection was lost.
    #[error(transparent)]
    Bus(#[from] BusError),
}

/// Consumes a topic and schedules one registration task per creation event.
///
/// The loop never waits for a task: submission returns immediately and the
/// scheduler owns the task from then on. Deletion events are logged only.
pub struct ListenerLoop<B, S, R>
where
    B: EventBus,
    S: TaskScheduler,
    R: RegistrationRunner,
{
    bus: Arc<B>,
    scheduler: Arc<S>,
    runner: Arc<R>,
    topic: String,
}

impl<B, S, R> ListenerLoop<B, S, R>
where
    B: EventBus,
    S: TaskScheduler,
    R: RegistrationRunner,
{
    /// Creates a listener for `topic`.
    #[must_use]
    pub fn new(bus: Arc<B>, scheduler: Arc<S>, runner: Arc<R>, topic: impl Into<String>) -> Self {
        Self {
            bus,
            scheduler,
            runner,
            topic: topic.into(),
        }
    }

    /// Returns the consumed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Subscribes once and processes messages until the bus closes or `cancel`
    /// fires. Scheduled tasks keep running after the loop returns.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerError::Bus`] when the subscription cannot be opened or
    /// the bus connection is lost.
    pub async fn run(&self, cancel: CancellationToken) -> Result<ListenerSummary, ListenerError> {
        let mut subscription = self.bus.subscribe(&self.topic).await?;
        info!(topic = subscription.topic(), "listening for instance notifications");

        let mut stats = ListenerStats::default();
        let exit = loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => break ListenerExit::Cancelled,
                next = subscription.next() => next,
            };

            match next {
                None => break ListenerExit::BusClosed,
                Some(Err(bus_error)) => {
                    error!(topic = %self.topic, error = %bus_error, "bus connection lost");
                    return Err(bus_error.into());
                }
                Some(Ok(message)) => {
                    self.dispatch(&message, &mut stats);
                }
            }
        };

        info!(
            topic = %self.topic,
            ?exit,
            received = stats.received,
            scheduled = stats.scheduled,
            "listener stopped"
        );
        Ok(ListenerSummary { exit, stats })
    }

    /// Classifies one message and acts on it.
    ///
    /// Returns the handle of the scheduled task for creation events.
    pub fn dispatch(&self, message: &EventMessage, stats: &mut ListenerStats) -> Option<TaskHandle> {
        stats.received = stats.received.saturating_add(1);
        let event_type = message.event_type().unwrap_or_default();

        let class = match classify(message) {
            Ok(class) => class,
            Err(classification_error) => {
                warn!(event_type, error = %classification_error, "ignoring malformed notification");
                stats.malformed = stats.malformed.saturating_add(1);
                return None;
            }
        };

        match class {
            EventClass::Creation(created) => {
                let info = created.info();
                debug!(
                    instance_id = info.instance_id(),
                    hostname = info.hostname(),
                    region = info.region(),
                    tenant_id = info.tenant_id(),
                    project = info.project(),
                    user = info.user(),
                    event_type,
                    "instance created"
                );
                let entity = created.into_entity();
                let descriptor = TaskDescriptor::new(entity.id());
                let runner = Arc::clone(&self.runner);
                let handle = self.scheduler.submit(
                    descriptor,
                    Box::pin(async move { runner.register(entity).await }),
                );
                stats.scheduled = stats.scheduled.saturating_add(1);
                Some(handle)
            }
            EventClass::Deletion(info) => {
                debug!(instance_id = info.instance_id(), event_type, "instance deleted");
                stats.deletions = stats.deletions.saturating_add(1);
                None
            }
            EventClass::Ignored => {
                stats.ignored = stats.ignored.saturating_add(1);
                None
            }
        }
    }
}
