//! Retry policy and exponential backoff.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::PolicyError;

const MILLIS_PER_SECOND: u64 = 1_000;

/// Bounded exponential backoff policy attached to every registration task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_retries: u32,
    factor: u32,
    randomize: bool,
    min_delay_secs: u64,
    max_delay_secs: u64,
}

impl RetryPolicy {
    /// Creates a non-randomised policy.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::ZeroFactor`] when `factor` is zero and
    /// [`PolicyError::MinDelayExceedsMax`] when the delay bounds are inverted.
    pub const fn new(
        max_retries: u32,
        factor: u32,
        min_delay_secs: u64,
        max_delay_secs: u64,
    ) -> Result<Self, PolicyError> {
        if factor == 0 {
            return Err(PolicyError::ZeroFactor);
        }
        if min_delay_secs > max_delay_secs {
            return Err(PolicyError::MinDelayExceedsMax {
                min_secs: min_delay_secs,
                max_secs: max_delay_secs,
            });
        }
        Ok(Self {
            max_retries,
            factor,
            randomize: false,
            min_delay_secs,
            max_delay_secs,
        })
    }

    /// Enables or disables the random multiplier.
    #[must_use]
    pub const fn with_randomization(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    /// Returns how many retries follow the first attempt.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the exponential growth factor.
    #[must_use]
    pub const fn factor(&self) -> u32 {
        self.factor
    }

    /// Returns whether delays are randomised.
    #[must_use]
    pub const fn randomize(&self) -> bool {
        self.randomize
    }

    /// Returns the delay before the first retry, without randomisation.
    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        Duration::from_secs(self.min_delay_secs)
    }

    /// Returns the upper bound of any delay.
    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_secs(self.max_delay_secs)
    }

    /// Computes the delay before retry number `attempt` (0 for the first retry)
    /// using the thread-local random source.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut rand::rng())
    }

    /// Computes the delay before retry number `attempt` (0 for the first retry).
    ///
    /// The delay is `multiplier * min_delay * factor^attempt` clamped to
    /// `max_delay` and floored to whole seconds. The multiplier is 1, or drawn
    /// uniformly from `[1, 2]` in steps of 1/1000 when randomisation is on.
    /// Arithmetic saturates, so huge attempts yield `max_delay`.
    #[must_use]
    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base_secs = self
            .min_delay_secs
            .saturating_mul(u64::from(self.factor).saturating_pow(attempt));
        if base_secs >= self.max_delay_secs {
            return self.max_delay();
        }
        let jitter_millis = if self.randomize {
            rng.random_range(0..=MILLIS_PER_SECOND)
        } else {
            0
        };
        // Below the cap `base_secs` fits in u64, so the scaled value fits in u128.
        let scaled_millis = u128::from(base_secs)
            .saturating_mul(u128::from(MILLIS_PER_SECOND.saturating_add(jitter_millis)));
        let secs = scaled_millis
            .checked_div(u128::from(MILLIS_PER_SECOND))
            .unwrap_or_default()
            .min(u128::from(self.max_delay_secs));
        Duration::from_secs(u64::try_from(secs).unwrap_or(self.max_delay_secs))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            factor: 2,
            randomize: false,
            min_delay_secs: 1,
            max_delay_secs: u64::MAX,
        }
    }
}
