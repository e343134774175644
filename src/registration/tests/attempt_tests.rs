//! Tests for the retry state machine.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rstest::{fixture, rstest};
use std::time::Duration;

use super::fixtures::policy;
use crate::registration::domain::{RetryDecision, RetryPhase, RetryState};

#[fixture]
fn rng() -> StdRng {
    StdRng::seed_from_u64(1)
}

#[rstest]
fn failures_back_off_then_abandon(mut rng: StdRng) {
    let mut state = RetryState::new(policy(2, 2, 1, u64::MAX));

    assert_eq!(
        state.record_failure(&mut rng),
        RetryDecision::RetryAfter(Duration::from_secs(1))
    );
    assert_eq!(state.phase(), RetryPhase::RetryWait);
    state.resume();
    assert_eq!(state.phase(), RetryPhase::Pending);

    assert_eq!(
        state.record_failure(&mut rng),
        RetryDecision::RetryAfter(Duration::from_secs(2))
    );
    state.resume();

    assert_eq!(state.record_failure(&mut rng), RetryDecision::Abandon);
    assert_eq!(state.attempt_count(), 3);
    assert_eq!(state.phase(), RetryPhase::Abandoned);
}

#[rstest]
fn zero_retries_abandon_on_first_failure(mut rng: StdRng) {
    let mut state = RetryState::new(policy(0, 2, 1, 10));

    assert_eq!(state.record_failure(&mut rng), RetryDecision::Abandon);
    assert_eq!(state.attempt_count(), 1);
}

#[rstest]
fn success_is_terminal(mut rng: StdRng) {
    let mut state = RetryState::new(policy(2, 2, 1, 10));
    assert_eq!(
        state.record_failure(&mut rng),
        RetryDecision::RetryAfter(Duration::from_secs(1))
    );
    state.resume();

    state.record_success();

    assert_eq!(state.phase(), RetryPhase::Delivered);
    assert!(state.phase().is_terminal());
    assert_eq!(state.record_failure(&mut rng), RetryDecision::Abandon);
    assert_eq!(state.attempt_count(), 1);
    assert_eq!(state.phase(), RetryPhase::Delivered);
}

#[test]
fn abandon_does_not_consume_a_retry() {
    let mut state = RetryState::new(policy(2, 2, 1, 10));

    state.abandon();
    state.record_success();

    assert_eq!(state.phase(), RetryPhase::Abandoned);
    assert_eq!(state.attempt_count(), 0);
}

#[rstest]
#[case(RetryPhase::Pending, "pending", false)]
#[case(RetryPhase::RetryWait, "retry_wait", false)]
#[case(RetryPhase::Delivered, "delivered", true)]
#[case(RetryPhase::Abandoned, "abandoned", true)]
fn phase_labels(#[case] phase: RetryPhase, #[case] label: &str, #[case] terminal: bool) {
    assert_eq!(phase.as_str(), label);
    assert_eq!(phase.is_terminal(), terminal);
}
