//! Then steps for instance registration BDD scenarios.

use super::world::{ENDPOINT, RegistrationWorld};
use nova_registrar::registration::{
    domain::{EventClass, RegistrationTaskError},
    ports::TaskResult,
};
use rstest_bdd_macros::then;

fn classification(world: &RegistrationWorld) -> Result<&EventClass, eyre::Report> {
    let result = world
        .classification
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing classification in scenario world"))?;
    result
        .as_ref()
        .map_err(|err| eyre::eyre!("classification failed: {err}"))
}

fn task_result(world: &RegistrationWorld) -> Result<&TaskResult, eyre::Report> {
    world
        .task_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing registration result in scenario world"))
}

#[then(r#"it is a creation of entity "{entity_id}" with type "{entity_type}""#)]
fn is_a_creation(
    world: &RegistrationWorld,
    entity_id: String,
    entity_type: String,
) -> Result<(), eyre::Report> {
    let EventClass::Creation(created) = classification(world)? else {
        return Err(eyre::eyre!("expected a creation, got {:?}", world.classification));
    };
    let entity = created.entity();
    if entity.id() != entity_id || entity.entity_type() != entity_type {
        return Err(eyre::eyre!(
            "expected {entity_id} ({entity_type}), got {entity}"
        ));
    }
    Ok(())
}

#[then("it is ignored")]
fn is_ignored(world: &RegistrationWorld) -> Result<(), eyre::Report> {
    let class = classification(world)?;
    if *class != EventClass::Ignored {
        return Err(eyre::eyre!("expected the notification to be ignored, got {class:?}"));
    }
    Ok(())
}

#[then("the retry delays were {first:u64} and {second:u64} seconds")]
fn retry_delays_were(
    world: &RegistrationWorld,
    first: u64,
    second: u64,
) -> Result<(), eyre::Report> {
    let observed = world.timer.delay_secs();
    if observed != [first, second] {
        return Err(eyre::eyre!(
            "expected delays [{first}, {second}], observed {observed:?}"
        ));
    }
    Ok(())
}

#[then("the registration is abandoned after {count:usize} attempts")]
fn abandoned_after(world: &RegistrationWorld, count: usize) -> Result<(), eyre::Report> {
    match task_result(world)? {
        Err(RegistrationTaskError::RetriesExhausted {
            endpoint, attempts, ..
        }) if endpoint == ENDPOINT && usize::try_from(*attempts)? == count => Ok(()),
        other => Err(eyre::eyre!(
            "expected abandonment after {count} attempts, got {other:?}"
        )),
    }
}

#[then("the registration is delivered after {count:usize} failed attempts")]
fn delivered_after(world: &RegistrationWorld, count: usize) -> Result<(), eyre::Report> {
    let report = task_result(world)?
        .as_ref()
        .map_err(|err| eyre::eyre!("registration failed: {err}"))?;
    if usize::try_from(report.failed_attempts)? != count {
        return Err(eyre::eyre!(
            "expected {count} failed attempts, got {}",
            report.failed_attempts
        ));
    }
    Ok(())
}

#[then("the registry received {count:usize} requests")]
fn registry_received(world: &RegistrationWorld, count: usize) -> Result<(), eyre::Report> {
    let requests = world.transport.requests();
    if requests.len() != count {
        return Err(eyre::eyre!(
            "expected {count} requests, got {}",
            requests.len()
        ));
    }
    if requests.iter().any(|request| request.url != ENDPOINT) {
        return Err(eyre::eyre!("a request missed {ENDPOINT}"));
    }
    Ok(())
}
