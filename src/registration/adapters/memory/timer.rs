//! Timer that records delays instead of sleeping.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::registration::ports::RetryTimer;

/// Records every requested delay and returns after a yield.
#[derive(Debug, Clone, Default)]
pub struct RecordingRetryTimer {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingRetryTimer {
    /// Creates a timer with no recorded delays.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded delays in request order.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the recorded delays in whole seconds.
    #[must_use]
    pub fn delay_secs(&self) -> Vec<u64> {
        self.delays().iter().map(Duration::as_secs).collect()
    }
}

#[async_trait]
impl RetryTimer for RecordingRetryTimer {
    async fn wait(&self, delay: Duration) {
        self.delays
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(delay);
        tokio::task::yield_now().await;
    }
}
