//! Interactive connection to the EFS management instance.
//!
//! Orchestrates the full connect workflow: discover the management target
//! from stack outputs, report instance details, drive the readiness
//! controller until the instance is running and agent-reachable, then hand
//! off to an interactive SSM session. The session runs under the system
//! `aws` CLI so the Session Manager plugin handles the terminal protocol.

use std::io;
use std::process::Command;

use thiserror::Error;
use tracing::{info, warn};

use crate::aws::{AwsError, AwsServices};
use crate::config::OpsConfig;
use crate::readiness::{ReadinessController, ReadinessError};
use crate::target::{self, TargetError};

/// Launches the interactive session process, injectable for tests.
pub trait SessionLauncher {
    /// Runs `program` with `args`, waits for it to finish, and returns its
    /// exit code (`1` when the process was killed by a signal).
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the process cannot be spawned.
    fn launch(&self, program: &str, args: &[String]) -> io::Result<i32>;
}

/// Launcher running the session attached to the current terminal.
#[derive(Clone, Copy, Debug, Default)]
pub struct InteractiveLauncher;

impl SessionLauncher for InteractiveLauncher {
    fn launch(&self, program: &str, args: &[String]) -> io::Result<i32> {
        let status = Command::new(program).args(args).status()?;
        Ok(status.code().unwrap_or(1))
    }
}

/// Errors raised by the connect workflow.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Raised when target discovery fails.
    #[error(transparent)]
    Target(#[from] TargetError),
    /// Raised when an AWS lookup outside the polling phases fails.
    #[error(transparent)]
    Aws(#[from] AwsError),
    /// Raised when the instance fails to become ready.
    #[error(transparent)]
    Readiness(#[from] ReadinessError<AwsError>),
    /// Raised when the session process cannot be spawned.
    #[error(
        "failed to launch '{program}': {source}. Ensure the AWS CLI and the \
         Session Manager plugin are installed and on PATH"
    )]
    SessionSpawn {
        /// Program that failed to spawn.
        program: String,
        /// Spawn error from the operating system.
        #[source]
        source: io::Error,
    },
}

/// Runs the connect workflow and returns the session's exit code.
///
/// # Errors
///
/// Returns [`ConnectError`] when discovery, readiness, or the session
/// hand-off fails.
pub async fn run<L: SessionLauncher>(
    services: &AwsServices,
    config: &OpsConfig,
    stack_name: &str,
    launcher: &L,
) -> Result<i32, ConnectError> {
    let stacks = services.stacks();
    let management = target::discover(&stacks, stack_name).await?;
    let instance_id = management.service_instance_id.as_str();

    match services.instances().details(instance_id).await {
        Ok(details) => info!(
            instance = %instance_id,
            instance_type = %details.instance_type,
            platform = %details.platform,
            private_ip = %details.private_ip,
            availability_zone = %details.availability_zone,
            "management instance details"
        ),
        Err(err) => warn!(instance = %instance_id, error = %err, "could not fetch instance details"),
    }

    let readiness = ReadinessController::new(services.instance_probe())
        .with_poll_attempts(config.poll_attempts)
        .with_poll_interval(config.poll_interval());
    readiness.ensure_running(instance_id).await?;
    readiness.ensure_agent_reachable(instance_id).await?;

    info!(instance = %instance_id, "starting interactive session");
    info!("you will be logged in as ssm-user; run 'sudo su - ubuntu' for the service account");

    launch_session(launcher, &config.session_bin, instance_id)
}

/// Hands off to the interactive session process.
///
/// # Errors
///
/// Returns [`ConnectError::SessionSpawn`] when the process cannot start.
pub fn launch_session<L: SessionLauncher>(
    launcher: &L,
    session_bin: &str,
    instance_id: &str,
) -> Result<i32, ConnectError> {
    let args = vec![
        String::from("ssm"),
        String::from("start-session"),
        String::from("--target"),
        instance_id.to_owned(),
    ];

    launcher
        .launch(session_bin, &args)
        .map_err(|source| ConnectError::SessionSpawn {
            program: session_bin.to_owned(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct RecordingLauncher {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        exit_code: i32,
        fail_spawn: bool,
    }

    impl RecordingLauncher {
        fn new(exit_code: i32) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                exit_code,
                fail_spawn: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail_spawn: true,
                ..Self::new(0)
            }
        }
    }

    impl SessionLauncher for RecordingLauncher {
        fn launch(&self, program: &str, args: &[String]) -> io::Result<i32> {
            if self.fail_spawn {
                return Err(io::Error::new(io::ErrorKind::NotFound, "no such file"));
            }
            self.calls
                .lock()
                .expect("calls lock")
                .push((program.to_owned(), args.to_vec()));
            Ok(self.exit_code)
        }
    }

    #[test]
    fn session_command_targets_the_instance() {
        let launcher = RecordingLauncher::new(0);

        let code = launch_session(&launcher, "aws", "i-0abc").expect("launch should succeed");

        assert_eq!(code, 0);
        let calls = launcher.calls.lock().expect("calls lock");
        assert_eq!(
            *calls,
            vec![(
                String::from("aws"),
                vec![
                    String::from("ssm"),
                    String::from("start-session"),
                    String::from("--target"),
                    String::from("i-0abc"),
                ],
            )]
        );
    }

    #[test]
    fn session_exit_code_is_propagated() {
        let launcher = RecordingLauncher::new(130);

        let code = launch_session(&launcher, "aws", "i-0abc").expect("launch should succeed");

        assert_eq!(code, 130);
    }

    #[test]
    fn spawn_failure_names_the_program() {
        let launcher = RecordingLauncher::failing();

        let result = launch_session(&launcher, "aws", "i-0abc");

        assert!(matches!(
            result,
            Err(ConnectError::SessionSpawn { ref program, .. }) if program == "aws"
        ));
    }
}
