//! When steps for instance registration BDD scenarios.

use super::world::{RegistrationWorld, run_async};
use nova_registrar::registration::domain::{EntityRef, classify};
use rstest_bdd_macros::when;

#[when("the notification is classified")]
fn classify_notification(world: &mut RegistrationWorld) -> Result<(), eyre::Report> {
    let message = world
        .message
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no notification in scenario world"))?;
    world.classification = Some(classify(message));
    Ok(())
}

#[when(r#"instance "{instance_id}" in region "{region}" is registered"#)]
fn register_instance(
    world: &mut RegistrationWorld,
    instance_id: String,
    region: String,
) -> Result<(), eyre::Report> {
    let task = world.task()?;
    let entity = EntityRef::for_server(&region, &instance_id);
    world.task_result = Some(run_async(task.run(entity)));
    Ok(())
}
