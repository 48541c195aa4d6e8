//! ECS task definition lookups.

use aws_config::SdkConfig;
use aws_sdk_ecs::Client;
use aws_sdk_ecs::error::DisplayErrorContext;
use tracing::info;

use super::AwsError;

/// Plain environment variable declared on a container definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EnvVar {
    /// Variable name, when present.
    pub name: Option<String>,
    /// Literal value, when present.
    pub value: Option<String>,
}

/// Secret reference declared on a container definition.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SecretEntry {
    /// Environment variable name the secret resolves into.
    pub name: Option<String>,
    /// Secrets Manager reference string (`valueFrom`).
    pub value_from: Option<String>,
}

/// Projection of the first container definition of a task definition.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContainerEnv {
    /// Plain environment variables, in declaration order.
    pub environment: Vec<EnvVar>,
    /// Secret references, in declaration order.
    pub secrets: Vec<SecretEntry>,
}

/// Client projecting task definitions into [`ContainerEnv`].
#[derive(Clone, Debug)]
pub struct TaskDefinitionClient {
    client: Client,
}

impl TaskDefinitionClient {
    /// Creates the client from shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Fetches the environment projection of `task_definition_arn`.
    ///
    /// Only the first container definition is considered; the deployment's
    /// capacity-manager task runs a single container.
    ///
    /// # Errors
    ///
    /// Returns [`AwsError::Api`] on request failure and
    /// [`AwsError::NoContainerDefinitions`] when the task definition holds
    /// no containers.
    pub async fn container_env(&self, task_definition_arn: &str) -> Result<ContainerEnv, AwsError> {
        info!(task_definition = %task_definition_arn, "describing task definition");

        let response = self
            .client
            .describe_task_definition()
            .task_definition(task_definition_arn)
            .send()
            .await
            .map_err(|err| AwsError::api("ecs", &DisplayErrorContext(&err)))?;

        let container = response
            .task_definition()
            .map(|task_definition| task_definition.container_definitions())
            .and_then(<[_]>::first)
            .ok_or_else(|| AwsError::NoContainerDefinitions {
                task_definition: task_definition_arn.to_owned(),
            })?;

        Ok(ContainerEnv {
            environment: container
                .environment()
                .iter()
                .map(|pair| EnvVar {
                    name: pair.name().map(str::to_owned),
                    value: pair.value().map(str::to_owned),
                })
                .collect(),
            secrets: container
                .secrets()
                .iter()
                .map(|secret| SecretEntry {
                    name: secret.name().map(str::to_owned),
                    value_from: secret.value_from().map(str::to_owned),
                })
                .collect(),
        })
    }
}
