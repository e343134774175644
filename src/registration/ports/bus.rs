//! Notification bus port.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::registration::domain::EventMessage;

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Topic-based notification source.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Subscribes to `topic`.
    ///
    /// Sources are not restartable: once a subscription ends, no further
    /// messages will be delivered.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::AlreadySubscribed`] when the source has already
    /// been consumed and [`BusError::ConnectionLost`] when the bus cannot be
    /// reached.
    async fn subscribe(&self, topic: &str) -> BusResult<Subscription>;
}

/// Stream of messages received on one topic.
///
/// `next` yields `None` once the bus connection has been closed in an orderly
/// way. A [`BusError`] item means the connection was lost.
#[derive(Debug)]
pub struct Subscription {
    topic: String,
    receiver: mpsc::UnboundedReceiver<BusResult<EventMessage>>,
}

impl Subscription {
    /// Wraps the receiving half of a message channel.
    #[must_use]
    pub fn new(
        topic: impl Into<String>,
        receiver: mpsc::UnboundedReceiver<BusResult<EventMessage>>,
    ) -> Self {
        Self {
            topic: topic.into(),
            receiver,
        }
    }

    /// Returns the subscribed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Waits for the next message.
    pub async fn next(&mut self) -> Option<BusResult<EventMessage>> {
        self.receiver.recv().await
    }
}

/// Errors returned by bus adapters.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// The source has already handed out its only subscription.
    #[error("topic '{0}' has already been subscribed")]
    AlreadySubscribed(String),

    /// The connection to the bus broke.
    #[error("bus connection lost: {0}")]
    ConnectionLost(Arc<dyn std::error::Error + Send + Sync>),
}

impl BusError {
    /// Wraps the error that broke the bus connection.
    pub fn connection_lost(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ConnectionLost(Arc::new(err))
    }
}
