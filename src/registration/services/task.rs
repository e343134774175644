//! Retried registration of one entity.

use async_trait::async_trait;
use mockable::Clock;
use std::sync::Arc;
use tracing::warn;

use super::{DeliveryClient, DeliveryOutcome};
use crate::registration::{
    domain::{
        DeliveryReport, EntityRef, RegistrationProfile, RegistrationTaskError, RetryDecision,
        RetryPolicy, RetryState,
    },
    ports::{RegistryTransport, RetryTimer, TaskResult},
};

/// Runs the registration of one entity to completion.
///
/// The listener depends on this seam rather than on the concrete task so that
/// the task's transport, timer, and clock stay out of its signature.
#[async_trait]
pub trait RegistrationRunner: Send + Sync + 'static {
    /// Registers `entity`, retrying as the policy allows.
    async fn register(&self, entity: EntityRef) -> TaskResult;
}

/// Retry task: builds and delivers a registration until it is delivered or
/// abandoned.
///
/// Attempts are strictly sequential. The document is rebuilt before every
/// attempt. A schema or rendering error abandons the task immediately; a
/// transport failure consumes one retry and waits for the backoff delay.
pub struct RegistrationTask<T, W, C>
where
    T: RegistryTransport,
    W: RetryTimer,
    C: Clock + Send + Sync,
{
    delivery: DeliveryClient<T>,
    profile: Arc<RegistrationProfile>,
    policy: RetryPolicy,
    timer: Arc<W>,
    clock: Arc<C>,
}

impl<T, W, C> RegistrationTask<T, W, C>
where
    T: RegistryTransport,
    W: RetryTimer,
    C: Clock + Send + Sync,
{
    /// Creates a retry task.
    #[must_use]
    pub const fn new(
        delivery: DeliveryClient<T>,
        profile: Arc<RegistrationProfile>,
        policy: RetryPolicy,
        timer: Arc<W>,
        clock: Arc<C>,
    ) -> Self {
        Self {
            delivery,
            profile,
            policy,
            timer,
            clock,
        }
    }

    /// Returns the retry policy applied to every invocation.
    #[must_use]
    pub const fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Registers `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationTaskError::Schema`] or
    /// [`RegistrationTaskError::Document`] when no document can be produced,
    /// and [`RegistrationTaskError::RetriesExhausted`] once more than
    /// `max_retries` attempts failed.
    pub async fn run(&self, entity: EntityRef) -> TaskResult {
        let mut state = RetryState::new(self.policy);
        loop {
            let document = match self.profile.document_for(&entity) {
                Ok(document) => document,
                Err(error) => {
                    state.abandon();
                    return Err(error.into());
                }
            };

            let reason = match self.delivery.send(&document).await {
                Ok(DeliveryOutcome::Success(status)) => {
                    state.record_success();
                    return Ok(DeliveryReport {
                        entity,
                        status,
                        failed_attempts: state.attempt_count(),
                        completed_at: self.clock.utc(),
                    });
                }
                Ok(DeliveryOutcome::TransportFailure(reason)) => reason,
                Err(error) => {
                    state.abandon();
                    return Err(error.into());
                }
            };

            let decision = state.record_failure(&mut rand::rng());
            match decision {
                RetryDecision::RetryAfter(delay) => {
                    warn!(
                        entity_id = entity.id(),
                        attempt = state.attempt_count(),
                        max_retries = self.policy.max_retries(),
                        delay_secs = delay.as_secs(),
                        %reason,
                        "registration attempt failed, retrying"
                    );
                    self.timer.wait(delay).await;
                    state.resume();
                }
                RetryDecision::Abandon => {
                    return Err(RegistrationTaskError::RetriesExhausted {
                        endpoint: self.delivery.endpoint().to_owned(),
                        attempts: state.attempt_count(),
                        last_reason: reason,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl<T, W, C> RegistrationRunner for RegistrationTask<T, W, C>
where
    T: RegistryTransport + 'static,
    W: RetryTimer + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn register(&self, entity: EntityRef) -> TaskResult {
        self.run(entity).await
    }
}
