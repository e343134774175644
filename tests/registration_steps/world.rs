//! Shared world state for instance registration BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use nova_registrar::registration::{
    adapters::memory::{RecordingRetryTimer, ScriptedRegistryTransport},
    domain::{
        AttributeSchema, ClassificationError, EventClass, EventMessage, RegistrationProfile,
        RetryPolicy,
    },
    ports::TaskResult,
    services::{DeliveryClient, RegistrationTask},
};
use rstest::fixture;

/// Registry endpoint used by every scenario.
pub const ENDPOINT: &str = "http://orion:1026/NGSI9/registerContext";

/// Task type exercised by the scenarios.
pub type ScenarioTask =
    RegistrationTask<ScriptedRegistryTransport, RecordingRetryTimer, DefaultClock>;

/// Retry policy values collected from given steps.
#[derive(Debug, Clone, Copy)]
pub struct PolicySettings {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Exponential growth factor.
    pub factor: u32,
    /// Delay before the first retry, in seconds.
    pub min_delay_secs: u64,
    /// Upper bound of any delay, in seconds.
    pub max_delay_secs: u64,
}

impl Default for PolicySettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_retries: policy.max_retries(),
            factor: policy.factor(),
            min_delay_secs: policy.min_delay().as_secs(),
            max_delay_secs: policy.max_delay().as_secs(),
        }
    }
}

/// Scenario world for instance registration behaviour tests.
pub struct RegistrationWorld {
    /// Notification under classification.
    pub message: Option<EventMessage>,
    /// Result of the last classification.
    pub classification: Option<Result<EventClass, ClassificationError>>,
    /// Retry policy values for the next registration.
    pub policy: PolicySettings,
    /// Registry double recording every request.
    pub transport: ScriptedRegistryTransport,
    /// Timer double recording every backoff delay.
    pub timer: RecordingRetryTimer,
    /// Result of the last registration.
    pub task_result: Option<TaskResult>,
}

impl RegistrationWorld {
    /// Creates a world with an accepting registry and the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self {
            message: None,
            classification: None,
            policy: PolicySettings::default(),
            transport: ScriptedRegistryTransport::new(),
            timer: RecordingRetryTimer::new(),
            task_result: None,
        }
    }

    /// Builds the registration task from the collected settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the collected policy values are invalid.
    pub fn task(&self) -> Result<ScenarioTask, eyre::Report> {
        let settings = self.policy;
        let policy = RetryPolicy::new(
            settings.max_retries,
            settings.factor,
            settings.min_delay_secs,
            settings.max_delay_secs,
        )?;
        Ok(RegistrationTask::new(
            DeliveryClient::new(Arc::new(self.transport.clone()), ENDPOINT),
            Arc::new(RegistrationProfile::new(
                "http://fiware/vm/",
                "P99Y",
                AttributeSchema::default(),
            )),
            policy,
            Arc::new(self.timer.clone()),
            Arc::new(DefaultClock),
        ))
    }
}

impl Default for RegistrationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> RegistrationWorld {
    RegistrationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
