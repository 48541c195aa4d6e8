//! Thin typed wrappers around the AWS SDK clients used by `efsctl`.
//!
//! Each submodule exposes exactly the calls the workflows need, translated
//! into domain types so the rest of the crate never handles raw SDK output.
//! All clients share one resolved [`SdkConfig`] so region and credential
//! discovery happen once per invocation.

pub mod cloudformation;
pub mod ec2;
pub mod ecs;
pub mod error;
pub mod secrets;
pub mod ssm;
pub mod sts;

use aws_config::SdkConfig;

use crate::readiness::{InstanceProbe, PowerState, ProbeFuture};

pub use error::AwsError;

/// Bundle of lazily constructed service clients for one invocation.
#[derive(Clone, Debug)]
pub struct AwsServices {
    config: SdkConfig,
}

impl AwsServices {
    /// Resolves shared AWS configuration from the default provider chain
    /// (environment, profile, instance metadata).
    pub async fn from_env() -> Self {
        let config = aws_config::load_from_env().await;
        Self { config }
    }

    /// Builds services from an already resolved SDK configuration.
    #[must_use]
    pub const fn from_config(config: SdkConfig) -> Self {
        Self { config }
    }

    /// Verifies that credentials resolve by calling STS `GetCallerIdentity`.
    ///
    /// # Errors
    ///
    /// Returns [`AwsError::Credentials`] when the identity check fails.
    pub async fn preflight(&self) -> Result<(), AwsError> {
        sts::caller_identity(&self.config).await.map(|_| ())
    }

    /// Client for CloudFormation stack output lookups.
    #[must_use]
    pub fn stacks(&self) -> cloudformation::StackClient {
        cloudformation::StackClient::new(&self.config)
    }

    /// Client for EC2 instance state queries and the start command.
    #[must_use]
    pub fn instances(&self) -> ec2::InstanceClient {
        ec2::InstanceClient::new(&self.config)
    }

    /// Client for SSM managed-instance reachability queries.
    #[must_use]
    pub fn agents(&self) -> ssm::AgentClient {
        ssm::AgentClient::new(&self.config)
    }

    /// Client for ECS task definition lookups.
    #[must_use]
    pub fn task_definitions(&self) -> ecs::TaskDefinitionClient {
        ecs::TaskDefinitionClient::new(&self.config)
    }

    /// Client for Secrets Manager value retrieval.
    #[must_use]
    pub fn secrets(&self) -> secrets::SecretClient {
        secrets::SecretClient::new(&self.config)
    }

    /// Builds the readiness probe backed by EC2 and SSM.
    #[must_use]
    pub fn instance_probe(&self) -> AwsInstanceProbe {
        AwsInstanceProbe {
            instances: self.instances(),
            agents: self.agents(),
        }
    }
}

/// [`InstanceProbe`] implementation backed by the EC2 and SSM clients.
#[derive(Clone, Debug)]
pub struct AwsInstanceProbe {
    instances: ec2::InstanceClient,
    agents: ssm::AgentClient,
}

impl InstanceProbe for AwsInstanceProbe {
    type Error = AwsError;

    fn power_state<'a>(&'a self, instance_id: &'a str) -> ProbeFuture<'a, PowerState, Self::Error> {
        Box::pin(async move { self.instances.power_state(instance_id).await })
    }

    fn agent_online<'a>(&'a self, instance_id: &'a str) -> ProbeFuture<'a, bool, Self::Error> {
        Box::pin(async move { self.agents.ping_online(instance_id).await })
    }

    fn start_instance<'a>(&'a self, instance_id: &'a str) -> ProbeFuture<'a, (), Self::Error> {
        Box::pin(async move { self.instances.start(instance_id).await })
    }
}
