//! Shared test helpers for in-memory registration integration tests.

use mockable::DefaultClock;
use nova_registrar::registration::{
    adapters::memory::ScriptedRegistryTransport,
    domain::{AttributeSchema, RegistrationProfile, RetryPolicy},
    ports::RetryTimer,
    services::{DeliveryClient, RegistrationTask},
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Topic the listener consumes.
pub const TOPIC: &str = "notifications.info";

/// Registry endpoint receiving registrations.
pub const ENDPOINT: &str = "http://orion:1026/NGSI9/registerContext";

/// Builds a `compute.instance.create.end` notification.
pub fn creation_event(instance_id: &str, region: &str) -> Value {
    json!({
        "event_type": "compute.instance.create.end",
        "_context_tenant": "tenant-1",
        "_context_service_catalog": [{ "endpoints": [{ "region": region }] }],
        "payload": { "instance_id": instance_id, "hostname": format!("host-{instance_id}") },
    })
}

/// Builds a `compute.instance.delete.end` notification.
pub fn deletion_event(instance_id: &str) -> Value {
    json!({
        "event_type": "compute.instance.delete.end",
        "payload": { "instance_id": instance_id },
    })
}

/// Builds a retry policy, panicking on invalid test input.
///
/// # Panics
///
/// Panics when the policy is invalid.
pub fn policy(max_retries: u32, factor: u32, min_secs: u64, max_secs: u64) -> RetryPolicy {
    RetryPolicy::new(max_retries, factor, min_secs, max_secs).expect("valid test policy")
}

/// Builds a registration task posting to [`ENDPOINT`] through `transport`.
pub fn registration_task<W: RetryTimer>(
    transport: &ScriptedRegistryTransport,
    timer: W,
    retry_policy: RetryPolicy,
) -> RegistrationTask<ScriptedRegistryTransport, W, DefaultClock> {
    RegistrationTask::new(
        DeliveryClient::new(Arc::new(transport.clone()), ENDPOINT),
        Arc::new(RegistrationProfile::new(
            "http://fiware/vm/",
            "P99Y",
            AttributeSchema::default(),
        )),
        retry_policy,
        Arc::new(timer),
        Arc::new(DefaultClock),
    )
}
