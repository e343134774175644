//! Attempt state of a single registration task.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{EntityRef, RetryPolicy};

/// Phase of a registration task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryPhase {
    /// The next step is a delivery attempt.
    Pending,
    /// The last attempt failed and the task waits for its backoff delay.
    RetryWait,
    /// A response was received. Terminal.
    Delivered,
    /// The task gave up. Terminal.
    Abandoned,
}

impl RetryPhase {
    /// Returns the canonical representation used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::RetryWait => "retry_wait",
            Self::Delivered => "delivered",
            Self::Abandoned => "abandoned",
        }
    }

    /// Returns whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Abandoned)
    }
}

/// What the task must do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the delay, then attempt again.
    RetryAfter(Duration),
    /// Stop: the retry budget is spent.
    Abandon,
}

/// Sequential attempt bookkeeping for one task invocation.
///
/// `attempt_count` starts at 0 and grows by one per failure. The task is
/// abandoned as soon as `attempt_count > max_retries`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt_count: u32,
    phase: RetryPhase,
}

impl RetryState {
    /// Creates a pending state governed by `policy`.
    #[must_use]
    pub const fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempt_count: 0,
            phase: RetryPhase::Pending,
        }
    }

    /// Returns the number of failed attempts so far.
    #[must_use]
    pub const fn attempt_count(&self) -> u32 {
        self.attempt_count
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> RetryPhase {
        self.phase
    }

    /// Returns the governing policy.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Marks the task as delivered. Ignored once terminal.
    pub const fn record_success(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = RetryPhase::Delivered;
        }
    }

    /// Records a failed attempt and decides whether to retry.
    ///
    /// The delay of retry `n` (0-indexed) is the policy delay for attempt `n`.
    /// A terminal state always answers [`RetryDecision::Abandon`].
    pub fn record_failure<R: Rng + ?Sized>(&mut self, rng: &mut R) -> RetryDecision {
        if self.phase.is_terminal() {
            return RetryDecision::Abandon;
        }

        self.attempt_count = self.attempt_count.saturating_add(1);
        if self.attempt_count > self.policy.max_retries() {
            self.phase = RetryPhase::Abandoned;
            return RetryDecision::Abandon;
        }

        self.phase = RetryPhase::RetryWait;
        let retry_index = self.attempt_count.saturating_sub(1);
        RetryDecision::RetryAfter(self.policy.delay_with(retry_index, rng))
    }

    /// Leaves the wait phase once the backoff delay has elapsed.
    pub const fn resume(&mut self) {
        if matches!(self.phase, RetryPhase::RetryWait) {
            self.phase = RetryPhase::Pending;
        }
    }

    /// Abandons the task without consuming a retry.
    pub const fn abandon(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = RetryPhase::Abandoned;
        }
    }
}

/// Result of a delivered registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    /// Registered entity.
    pub entity: EntityRef,
    /// HTTP status returned by the registry.
    pub status: u16,
    /// Failed attempts preceding the successful one.
    pub failed_attempts: u32,
    /// When the response was received.
    pub completed_at: DateTime<Utc>,
}
