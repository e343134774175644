//! In-memory topic bus.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::registration::{
    domain::EventMessage,
    ports::{BusError, BusResult, EventBus, Subscription},
};

/// Thread-safe in-memory bus with one non-restartable subscription per topic.
///
/// Messages published before the subscription is opened are buffered.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEventBus {
    state: Arc<Mutex<HashMap<String, TopicChannel>>>,
}

#[derive(Debug)]
struct TopicChannel {
    sender: Option<mpsc::UnboundedSender<BusResult<EventMessage>>>,
    receiver: Option<mpsc::UnboundedReceiver<BusResult<EventMessage>>>,
}

impl TopicChannel {
    fn open() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            sender: Some(sender),
            receiver: Some(receiver),
        }
    }
}

impl InMemoryEventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `message` on `topic`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ConnectionLost`] when the topic has been closed.
    pub fn publish(&self, topic: &str, message: impl Into<EventMessage>) -> BusResult<()> {
        self.send(topic, Ok(message.into()))
    }

    /// Breaks the connection of `topic`: the subscriber receives a
    /// [`BusError::ConnectionLost`] and the topic is closed.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ConnectionLost`] when the topic is already closed.
    pub fn fail(&self, topic: &str, reason: &str) -> BusResult<()> {
        let lost = BusError::connection_lost(std::io::Error::other(reason.to_owned()));
        self.send(topic, Err(lost))?;
        self.close(topic)
    }

    /// Closes `topic` in an orderly way; the subscription ends once buffered
    /// messages are drained.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::ConnectionLost`] when the bus state is poisoned.
    pub fn close(&self, topic: &str) -> BusResult<()> {
        let mut state = self.state.lock().map_err(poisoned)?;
        state
            .entry(topic.to_owned())
            .or_insert_with(TopicChannel::open)
            .sender = None;
        Ok(())
    }

    fn send(&self, topic: &str, item: BusResult<EventMessage>) -> BusResult<()> {
        let mut state = self.state.lock().map_err(poisoned)?;
        let channel = state
            .entry(topic.to_owned())
            .or_insert_with(TopicChannel::open);
        let sender = channel.sender.as_ref().ok_or_else(|| {
            BusError::connection_lost(std::io::Error::other(format!("topic '{topic}' is closed")))
        })?;
        sender.send(item).map_err(|_| {
            BusError::connection_lost(std::io::Error::other(format!(
                "subscriber of topic '{topic}' is gone"
            )))
        })
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn subscribe(&self, topic: &str) -> BusResult<Subscription> {
        let mut state = self.state.lock().map_err(poisoned)?;
        let receiver = state
            .entry(topic.to_owned())
            .or_insert_with(TopicChannel::open)
            .receiver
            .take()
            .ok_or_else(|| BusError::AlreadySubscribed(topic.to_owned()))?;
        Ok(Subscription::new(topic, receiver))
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> BusError {
    BusError::connection_lost(std::io::Error::other(err.to_string()))
}
