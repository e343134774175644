//! End-to-end registration flow over in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use nova_registrar::registration::{
    adapters::{
        TokioRetryTimer, TokioTaskScheduler,
        memory::{InMemoryEventBus, RecordingRetryTimer, ScriptedRegistryTransport},
    },
    domain::RetryPolicy,
    ports::TransportError,
    services::{ListenerExit, ListenerLoop},
};
use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

use super::helpers::{ENDPOINT, TOPIC, creation_event, deletion_event, policy, registration_task};

const GRACE: Duration = Duration::from_secs(5);

#[fixture]
fn bus() -> Arc<InMemoryEventBus> {
    Arc::new(InMemoryEventBus::new())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn created_instances_are_registered(bus: Arc<InMemoryEventBus>) {
    let transport = ScriptedRegistryTransport::new();
    let scheduler = Arc::new(TokioTaskScheduler::new());
    let task = registration_task(&transport, RecordingRetryTimer::new(), RetryPolicy::default());
    let listener = ListenerLoop::new(Arc::clone(&bus), Arc::clone(&scheduler), Arc::new(task), TOPIC);
    bus.publish(TOPIC, creation_event("i-1", "region1"))
        .expect("publish creation");
    bus.publish(TOPIC, creation_event("i-2", "region2"))
        .expect("publish creation");
    bus.publish(TOPIC, deletion_event("i-0")).expect("publish deletion");
    bus.close(TOPIC).expect("close topic");

    let summary = listener
        .run(CancellationToken::new())
        .await
        .expect("listener exits cleanly");
    let drained = scheduler.shutdown(GRACE).await;

    assert!(drained, "tasks should finish within the grace period");
    assert_eq!(summary.exit, ListenerExit::BusClosed);
    assert_eq!(summary.stats.scheduled, 2);
    assert_eq!(summary.stats.deletions, 1);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|request| request.url == ENDPOINT));
    for entity_id in ["region1:i-1", "region2:i-2"] {
        let expected = format!("<id>{entity_id}</id>");
        assert!(
            requests.iter().any(|request| request.body.contains(&expected)),
            "no registration for {entity_id}"
        );
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unreachable_registry_is_retried_then_abandoned(bus: Arc<InMemoryEventBus>) {
    let transport = ScriptedRegistryTransport::always_failing(TransportError::Unreachable(
        "connection refused".to_owned(),
    ));
    let timer = RecordingRetryTimer::new();
    let scheduler = Arc::new(TokioTaskScheduler::new());
    let task = registration_task(&transport, timer.clone(), policy(2, 2, 1, 100));
    let listener = ListenerLoop::new(Arc::clone(&bus), Arc::clone(&scheduler), Arc::new(task), TOPIC);
    bus.publish(TOPIC, creation_event("i-1", "region1"))
        .expect("publish creation");
    bus.close(TOPIC).expect("close topic");

    listener
        .run(CancellationToken::new())
        .await
        .expect("listener exits cleanly");
    let drained = scheduler.shutdown(GRACE).await;

    assert!(drained);
    assert_eq!(transport.requests().len(), 3);
    assert_eq!(timer.delay_secs(), vec![1, 2]);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn shutdown_gives_up_on_tasks_outliving_the_grace_period(bus: Arc<InMemoryEventBus>) {
    let transport = ScriptedRegistryTransport::always_failing(TransportError::Timeout(
        "no answer".to_owned(),
    ));
    let scheduler = Arc::new(TokioTaskScheduler::new());
    let task = registration_task(&transport, TokioRetryTimer, policy(2, 2, 60, 600));
    let listener = ListenerLoop::new(Arc::clone(&bus), Arc::clone(&scheduler), Arc::new(task), TOPIC);
    bus.publish(TOPIC, creation_event("i-1", "region1"))
        .expect("publish creation");
    bus.close(TOPIC).expect("close topic");

    let summary = listener
        .run(CancellationToken::new())
        .await
        .expect("listener exits cleanly");

    assert_eq!(summary.stats.scheduled, 1);
    assert_eq!(scheduler.in_flight(), 1);
    assert!(!scheduler.shutdown(Duration::from_secs(1)).await);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancellation_leaves_scheduled_tasks_running(bus: Arc<InMemoryEventBus>) {
    let transport = ScriptedRegistryTransport::new();
    let scheduler = Arc::new(TokioTaskScheduler::new());
    let task = registration_task(&transport, RecordingRetryTimer::new(), RetryPolicy::default());
    let listener = Arc::new(ListenerLoop::new(
        Arc::clone(&bus),
        Arc::clone(&scheduler),
        Arc::new(task),
        TOPIC,
    ));
    let cancel = CancellationToken::new();
    let running = tokio::spawn({
        let listener_ref = Arc::clone(&listener);
        let token = cancel.clone();
        async move { listener_ref.run(token).await }
    });
    bus.publish(TOPIC, creation_event("i-1", "region1"))
        .expect("publish creation");

    while transport.requests().is_empty() {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cancel.cancel();
    let summary = running
        .await
        .expect("listener task joins")
        .expect("listener exits cleanly");

    assert_eq!(summary.exit, ListenerExit::Cancelled);
    assert_eq!(summary.stats.scheduled, 1);
    assert!(scheduler.shutdown(GRACE).await);
}
