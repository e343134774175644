//! Retry timer port.

use async_trait::async_trait;
use std::time::Duration;

/// Suspends a task between delivery attempts.
///
/// Implementations must not busy-wait: the task yields its worker until the
/// delay has elapsed.
#[async_trait]
pub trait RetryTimer: Send + Sync {
    /// Resolves once `delay` has elapsed.
    async fn wait(&self, delay: Duration);
}
