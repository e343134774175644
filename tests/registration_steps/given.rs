//! Given steps for instance registration BDD scenarios.

use super::world::RegistrationWorld;
use eyre::WrapErr;
use nova_registrar::registration::{domain::EventMessage, ports::TransportError};
use rstest_bdd_macros::given;
use serde_json::json;

#[given(r#"a "{event_type}" notification for instance "{instance_id}" in region "{region}""#)]
fn a_notification(
    world: &mut RegistrationWorld,
    event_type: String,
    instance_id: String,
    region: String,
) {
    world.message = Some(EventMessage::new(json!({
        "event_type": event_type,
        "payload": {
            "instance_id": instance_id,
            "hostname": "h1",
            "_context_service_catalog": [{ "endpoints": [{ "region": region }] }],
        },
    })));
}

fn update_notification(state: &str, transition: &str) -> EventMessage {
    EventMessage::new(json!({
        "event_type": "compute.instance.update",
        "_context_service_catalog": [{ "endpoints": [{ "region": "region1" }] }],
        "payload": {
            "instance_id": "i-7",
            "state": state,
            "state_description": transition,
        },
    }))
}

#[given(r#"an update notification in state "{state}" with no pending transition"#)]
fn an_update_without_transition(world: &mut RegistrationWorld, state: String) {
    world.message = Some(update_notification(&state, ""));
}

#[given(r#"an update notification in state "{state}" with transition "{transition}""#)]
fn an_update_in_transition(world: &mut RegistrationWorld, state: String, transition: String) {
    world.message = Some(update_notification(&state, &transition));
}

#[given("a retry policy allowing {retries:u64} retries with factor {factor:u64}")]
fn a_retry_policy(
    world: &mut RegistrationWorld,
    retries: u64,
    factor: u64,
) -> Result<(), eyre::Report> {
    world.policy.max_retries = u32::try_from(retries).wrap_err("retry count fits u32")?;
    world.policy.factor = u32::try_from(factor).wrap_err("factor fits u32")?;
    Ok(())
}

#[given("retry delays bounded between {min:u64} and {max:u64} seconds")]
fn retry_delays_bounded(world: &mut RegistrationWorld, min: u64, max: u64) {
    world.policy.min_delay_secs = min;
    world.policy.max_delay_secs = max;
}

#[given("a registry that is unreachable")]
fn an_unreachable_registry(world: &mut RegistrationWorld) {
    world.transport = world
        .transport
        .clone()
        .then_fail(TransportError::Unreachable("connection refused".to_owned()))
        .then_fail(TransportError::Unreachable("connection refused".to_owned()))
        .then_fail(TransportError::Unreachable("connection refused".to_owned()));
}

#[given("a registry that accepts registrations")]
fn an_accepting_registry(world: &mut RegistrationWorld) {
    world.transport = world.transport.clone().then_respond(201);
}
