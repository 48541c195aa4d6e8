//! Core library for the efsctl operator tool.
//!
//! The crate exposes the workflows behind the `efsctl` binary: generating a
//! `.env` file from the deployment's ECS task definition, discovering the
//! EFS management target from CloudFormation stack outputs, and driving the
//! management EC2 instance to a running, SSM-reachable state before handing
//! off to an interactive session.

pub mod aws;
pub mod config;
pub mod connect;
pub mod envfile;
pub mod readiness;
pub mod slug;
pub mod target;

pub use aws::{AwsError, AwsInstanceProbe, AwsServices};
pub use config::{ConfigError, OpsConfig};
pub use connect::{ConnectError, InteractiveLauncher, SessionLauncher};
pub use envfile::{
    EnvFileError, EnvLine, Prompter, SecretRef, StdinPrompter, WriteOutcome, parse_secret_ref,
};
pub use readiness::{
    DEFAULT_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL, InstanceProbe, PowerState, ProbeFuture,
    ReadinessController, ReadinessError,
};
pub use target::{ConnectionTarget, TargetError};
