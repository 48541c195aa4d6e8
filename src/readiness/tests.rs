//! Unit tests for the readiness controller, driven by a scripted probe.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use rstest::rstest;
use thiserror::Error;
use tokio::time::Instant;

use super::{InstanceProbe, PowerState, ProbeFuture, ReadinessController, ReadinessError};

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("scripted probe failure")]
struct ScriptError;

/// Probe double that replays scripted observations and counts calls.
struct ScriptedProbe {
    states: Mutex<VecDeque<PowerState>>,
    steady_state: PowerState,
    online: Mutex<VecDeque<bool>>,
    power_queries: AtomicU32,
    agent_queries: AtomicU32,
    starts: AtomicU32,
    fail_start: bool,
    fail_queries: bool,
}

impl ScriptedProbe {
    fn new(states: &[PowerState], online: &[bool]) -> Self {
        Self {
            states: Mutex::new(states.iter().cloned().collect()),
            steady_state: PowerState::Stopped,
            online: Mutex::new(online.iter().copied().collect()),
            power_queries: AtomicU32::new(0),
            agent_queries: AtomicU32::new(0),
            starts: AtomicU32::new(0),
            fail_start: false,
            fail_queries: false,
        }
    }

    fn with_steady_state(mut self, state: PowerState) -> Self {
        self.steady_state = state;
        self
    }

    fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    fn power_queries(&self) -> u32 {
        self.power_queries.load(Ordering::SeqCst)
    }

    fn agent_queries(&self) -> u32 {
        self.agent_queries.load(Ordering::SeqCst)
    }

    fn starts(&self) -> u32 {
        self.starts.load(Ordering::SeqCst)
    }
}

impl InstanceProbe for &ScriptedProbe {
    type Error = ScriptError;

    fn power_state<'a>(&'a self, _instance_id: &'a str) -> ProbeFuture<'a, PowerState, Self::Error> {
        Box::pin(async move {
            self.power_queries.fetch_add(1, Ordering::SeqCst);
            if self.fail_queries {
                return Err(ScriptError);
            }
            let next = self
                .states
                .lock()
                .expect("states lock")
                .pop_front()
                .unwrap_or_else(|| self.steady_state.clone());
            Ok(next)
        })
    }

    fn agent_online<'a>(&'a self, _instance_id: &'a str) -> ProbeFuture<'a, bool, Self::Error> {
        Box::pin(async move {
            self.agent_queries.fetch_add(1, Ordering::SeqCst);
            if self.fail_queries {
                return Err(ScriptError);
            }
            let next = self
                .online
                .lock()
                .expect("online lock")
                .pop_front()
                .unwrap_or(false);
            Ok(next)
        })
    }

    fn start_instance<'a>(&'a self, _instance_id: &'a str) -> ProbeFuture<'a, (), Self::Error> {
        Box::pin(async move {
            self.starts.fetch_add(1, Ordering::SeqCst);
            if self.fail_start {
                return Err(ScriptError);
            }
            Ok(())
        })
    }
}

fn controller(probe: &ScriptedProbe) -> ReadinessController<&ScriptedProbe> {
    ReadinessController::new(probe).with_poll_interval(Duration::ZERO)
}

#[tokio::test]
async fn running_instance_succeeds_without_start_command() {
    let probe = ScriptedProbe::new(&[PowerState::Running], &[]);

    let result = controller(&probe).ensure_running("i-123").await;

    assert!(result.is_ok());
    assert_eq!(probe.starts(), 0);
    assert_eq!(probe.power_queries(), 1);
}

#[tokio::test]
async fn stopped_instance_issues_exactly_one_start_command() {
    let probe = ScriptedProbe::new(
        &[PowerState::Stopped, PowerState::Pending, PowerState::Running],
        &[],
    );

    let result = controller(&probe).ensure_running("i-123").await;

    assert!(result.is_ok());
    assert_eq!(probe.starts(), 1);
    assert_eq!(probe.power_queries(), 3);
}

#[rstest]
#[case(PowerState::Pending)]
#[case(PowerState::Stopping)]
#[tokio::test]
async fn transitional_state_waits_without_start_command(#[case] initial: PowerState) {
    let probe = ScriptedProbe::new(&[initial, PowerState::Running], &[]);

    let result = controller(&probe).ensure_running("i-123").await;

    assert!(result.is_ok());
    assert_eq!(probe.starts(), 0);
    assert_eq!(probe.power_queries(), 2);
}

#[tokio::test]
async fn terminated_instance_fails_after_single_query() {
    let probe = ScriptedProbe::new(&[PowerState::Other(String::from("terminated"))], &[]);

    let result = controller(&probe).ensure_running("i-123").await;

    assert!(matches!(
        result,
        Err(ReadinessError::UnexpectedState { ref state, .. }) if state == "terminated"
    ));
    assert_eq!(probe.starts(), 0);
    assert_eq!(probe.power_queries(), 1);
}

#[tokio::test]
async fn power_on_timeout_exhausts_exact_attempt_budget() {
    let probe = ScriptedProbe::new(&[], &[]).with_steady_state(PowerState::Pending);

    let result = controller(&probe)
        .with_poll_attempts(5)
        .ensure_running("i-123")
        .await;

    assert!(matches!(result, Err(ReadinessError::PowerOnTimeout { .. })));
    // One initial query plus the full wait-phase budget.
    assert_eq!(probe.power_queries(), 6);
    assert_eq!(probe.starts(), 0);
}

#[tokio::test(start_paused = true)]
async fn wait_phase_delays_between_attempts_only() {
    let probe = ScriptedProbe::new(
        &[
            PowerState::Stopped,
            PowerState::Stopped,
            PowerState::Pending,
            PowerState::Running,
        ],
        &[],
    );
    let interval = Duration::from_secs(10);
    let began = Instant::now();

    let result = ReadinessController::new(&probe)
        .with_poll_interval(interval)
        .ensure_running("i-123")
        .await;

    assert!(result.is_ok());
    // Success on wait attempt 3: three wait queries, two delays.
    assert_eq!(probe.power_queries(), 4);
    assert_eq!(began.elapsed(), interval * 2);
}

#[tokio::test]
async fn start_command_failure_is_fatal() {
    let probe = ScriptedProbe::new(&[PowerState::Stopped], &[]).failing_start();

    let result = controller(&probe).ensure_running("i-123").await;

    assert!(matches!(result, Err(ReadinessError::Start { .. })));
    assert_eq!(probe.power_queries(), 1);
}

#[tokio::test]
async fn query_failure_is_fatal() {
    let probe = ScriptedProbe::new(&[], &[]).failing_queries();

    let result = controller(&probe).ensure_running("i-123").await;

    assert!(matches!(result, Err(ReadinessError::Probe { .. })));
}

#[tokio::test]
async fn agent_reachability_succeeds_on_first_true() {
    let probe = ScriptedProbe::new(&[], &[false, false, true]);

    let result = controller(&probe).ensure_agent_reachable("i-123").await;

    assert!(result.is_ok());
    assert_eq!(probe.agent_queries(), 3);
}

#[tokio::test]
async fn agent_reachability_timeout_exhausts_exact_attempt_budget() {
    let probe = ScriptedProbe::new(&[], &[]);

    let result = controller(&probe)
        .with_poll_attempts(4)
        .ensure_agent_reachable("i-123")
        .await;

    assert!(matches!(result, Err(ReadinessError::AgentTimeout { .. })));
    assert_eq!(probe.agent_queries(), 4);
}

#[tokio::test]
async fn stopped_then_running_then_reachable_end_to_end() {
    let probe = ScriptedProbe::new(
        &[PowerState::Stopped, PowerState::Pending, PowerState::Running],
        &[true],
    );
    let readiness = controller(&probe);

    readiness
        .ensure_running("i-123")
        .await
        .expect("instance should reach running");
    readiness
        .ensure_agent_reachable("i-123")
        .await
        .expect("agent should come online");

    assert_eq!(probe.starts(), 1);
    assert_eq!(probe.power_queries(), 3);
    assert_eq!(probe.agent_queries(), 1);
}
