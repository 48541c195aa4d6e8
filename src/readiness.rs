//! Instance readiness polling.
//!
//! The connect workflow must not assume anything about the management
//! instance's lifecycle: it may be stopped overnight, already running, or
//! mid-transition. The controller here normalises all of those into a single
//! wait-until-ready contract: first bring the instance to the `running`
//! power state (issuing a start command only when it is stopped), then wait
//! for the management agent to report the instance online. Both phases poll
//! with a fixed attempt budget and fixed delay; exhausting either budget is
//! fatal, with an error naming the phase that timed out.
//!
//! Queries and commands are injected through [`InstanceProbe`] so tests can
//! script state transitions without touching AWS.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use thiserror::Error;
use tokio::time::sleep;
use tracing::info;

/// Default number of status-check attempts per polling phase.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 30;

/// Default delay between status-check attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Lifecycle state reported for an instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PowerState {
    /// The instance is up.
    Running,
    /// The instance is powered off and may be started.
    Stopped,
    /// The instance is starting.
    Pending,
    /// The instance is shutting down towards `Stopped`.
    Stopping,
    /// Any state outside the known set, carrying the raw state string.
    Other(String),
}

impl PowerState {
    /// Renders the state the way the provider spells it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Pending => "pending",
            Self::Stopping => "stopping",
            Self::Other(raw) => raw,
        }
    }
}

/// Future returned by probe operations.
pub type ProbeFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Read-only instance observations plus the single start command.
pub trait InstanceProbe {
    /// Error type returned by the underlying provider.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Queries the current power state of the instance.
    fn power_state<'a>(&'a self, instance_id: &'a str) -> ProbeFuture<'a, PowerState, Self::Error>;

    /// Queries whether the management agent reports the instance online.
    fn agent_online<'a>(&'a self, instance_id: &'a str) -> ProbeFuture<'a, bool, Self::Error>;

    /// Issues the start command for the instance.
    fn start_instance<'a>(&'a self, instance_id: &'a str) -> ProbeFuture<'a, (), Self::Error>;
}

/// Errors raised while driving an instance to readiness.
#[derive(Debug, Error)]
pub enum ReadinessError<ProbeError>
where
    ProbeError: std::error::Error + 'static,
{
    /// Raised when the start command itself fails.
    #[error("failed to start instance {instance_id}: {source}")]
    Start {
        /// Instance the start command targeted.
        instance_id: String,
        /// Provider error raised by the command.
        #[source]
        source: ProbeError,
    },
    /// Raised when the initial query reports a state outside the known set.
    #[error("instance {instance_id} is in unexpected state: {state}")]
    UnexpectedState {
        /// Instance that was queried.
        instance_id: String,
        /// Raw state string reported by the provider.
        state: String,
    },
    /// Raised when the power-on phase exhausts its attempt budget.
    #[error("instance {instance_id} failed to start within {waited_secs}s")]
    PowerOnTimeout {
        /// Instance that never reached `running`.
        instance_id: String,
        /// Upper wait bound that was exhausted.
        waited_secs: u64,
    },
    /// Raised when the agent-reachability phase exhausts its attempt budget.
    #[error(
        "management-agent connectivity to instance {instance_id} could not be established \
         within {waited_secs}s"
    )]
    AgentTimeout {
        /// Instance that never came online.
        instance_id: String,
        /// Upper wait bound that was exhausted.
        waited_secs: u64,
    },
    /// Raised when a status query fails.
    #[error("failed to query instance {instance_id}: {source}")]
    Probe {
        /// Instance that was queried.
        instance_id: String,
        /// Provider error raised by the query.
        #[source]
        source: ProbeError,
    },
}

/// Drives an instance to a running, agent-reachable state.
#[derive(Debug)]
pub struct ReadinessController<P: InstanceProbe> {
    probe: P,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl<P: InstanceProbe> ReadinessController<P> {
    /// Creates a controller with the default attempt budget and delay.
    #[must_use]
    pub const fn new(probe: P) -> Self {
        Self {
            probe,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the per-phase attempt budget.
    #[must_use]
    pub const fn with_poll_attempts(mut self, attempts: u32) -> Self {
        self.poll_attempts = attempts;
        self
    }

    /// Overrides the delay between attempts.
    ///
    /// This is primarily used by tests to keep timeout scenarios fast.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Ensures the instance reaches the `running` power state.
    ///
    /// An already-running instance succeeds immediately without issuing a
    /// start command. A stopped instance is started exactly once; a
    /// transitioning instance (`pending`/`stopping`) is simply waited on.
    ///
    /// # Errors
    ///
    /// Returns [`ReadinessError::UnexpectedState`] for states outside the
    /// known set, [`ReadinessError::Start`] when the start command fails,
    /// [`ReadinessError::Probe`] when a query fails, and
    /// [`ReadinessError::PowerOnTimeout`] when the attempt budget runs out.
    pub async fn ensure_running(&self, instance_id: &str) -> Result<(), ReadinessError<P::Error>> {
        let state = self.query_power_state(instance_id).await?;
        info!(instance = %instance_id, state = %state.as_str(), "current instance state");

        match state {
            PowerState::Running => {
                info!(instance = %instance_id, "instance is already running");
                return Ok(());
            }
            PowerState::Stopped => {
                info!(instance = %instance_id, "starting instance");
                self.probe
                    .start_instance(instance_id)
                    .await
                    .map_err(|source| ReadinessError::Start {
                        instance_id: instance_id.to_owned(),
                        source,
                    })?;
            }
            PowerState::Pending | PowerState::Stopping => {
                info!(
                    instance = %instance_id,
                    state = %state.as_str(),
                    "instance is in a transitional state"
                );
            }
            PowerState::Other(raw) => {
                return Err(ReadinessError::UnexpectedState {
                    instance_id: instance_id.to_owned(),
                    state: raw,
                });
            }
        }

        self.wait_for_running(instance_id).await
    }

    /// Waits until the management agent reports the instance online.
    ///
    /// # Errors
    ///
    /// Returns [`ReadinessError::Probe`] when a query fails and
    /// [`ReadinessError::AgentTimeout`] when the attempt budget runs out.
    pub async fn ensure_agent_reachable(
        &self,
        instance_id: &str,
    ) -> Result<(), ReadinessError<P::Error>> {
        info!(instance = %instance_id, "waiting for management-agent connectivity");

        for attempt in 1..=self.poll_attempts {
            let online = self.probe.agent_online(instance_id).await.map_err(|source| {
                ReadinessError::Probe {
                    instance_id: instance_id.to_owned(),
                    source,
                }
            })?;

            if online {
                info!(instance = %instance_id, "management-agent connectivity established");
                return Ok(());
            }

            info!(instance = %instance_id, attempt, "agent not ready yet, waiting");
            if attempt < self.poll_attempts {
                sleep(self.poll_interval).await;
            }
        }

        Err(ReadinessError::AgentTimeout {
            instance_id: instance_id.to_owned(),
            waited_secs: self.budget_secs(),
        })
    }

    async fn wait_for_running(&self, instance_id: &str) -> Result<(), ReadinessError<P::Error>> {
        info!(instance = %instance_id, "waiting for instance to start");

        for attempt in 1..=self.poll_attempts {
            let state = self.query_power_state(instance_id).await?;
            if state == PowerState::Running {
                info!(instance = %instance_id, "instance is now running");
                return Ok(());
            }

            info!(
                instance = %instance_id,
                state = %state.as_str(),
                attempt,
                "instance not running yet, waiting"
            );
            if attempt < self.poll_attempts {
                sleep(self.poll_interval).await;
            }
        }

        Err(ReadinessError::PowerOnTimeout {
            instance_id: instance_id.to_owned(),
            waited_secs: self.budget_secs(),
        })
    }

    async fn query_power_state(
        &self,
        instance_id: &str,
    ) -> Result<PowerState, ReadinessError<P::Error>> {
        self.probe
            .power_state(instance_id)
            .await
            .map_err(|source| ReadinessError::Probe {
                instance_id: instance_id.to_owned(),
                source,
            })
    }

    fn budget_secs(&self) -> u64 {
        u64::from(self.poll_attempts) * self.poll_interval.as_secs()
    }
}

#[cfg(test)]
mod tests;
