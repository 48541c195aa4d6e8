//! Error types shared by the AWS client wrappers.

use thiserror::Error;

/// Errors raised while talking to AWS services.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum AwsError {
    /// Raised when credential resolution or the STS identity check fails.
    #[error("AWS credentials are not configured or are invalid: {message}")]
    Credentials {
        /// Message returned by the credential provider or STS.
        message: String,
    },
    /// Wrapper for service-level request failures.
    #[error("{service} request failed: {message}")]
    Api {
        /// Service the request was issued against.
        service: &'static str,
        /// Message rendered from the SDK error chain.
        message: String,
    },
    /// Raised when a stack output key is absent or empty.
    #[error("output key '{output_key}' not found in stack '{stack_name}'")]
    OutputNotFound {
        /// Stack that was described.
        stack_name: String,
        /// Output key that was requested.
        output_key: String,
    },
    /// Raised when a described instance is missing from the response.
    #[error("instance {instance_id} not found")]
    InstanceNotFound {
        /// Instance identifier that was queried.
        instance_id: String,
    },
    /// Raised when a task definition contains no container definitions.
    #[error("no container definitions found in task definition {task_definition}")]
    NoContainerDefinitions {
        /// Task definition ARN that was described.
        task_definition: String,
    },
    /// Raised when Secrets Manager returns an empty or missing value.
    #[error("empty or null secret value returned for {secret_id}")]
    EmptySecret {
        /// Secret identifier that was fetched.
        secret_id: String,
    },
}

impl AwsError {
    /// Builds an [`AwsError::Api`] from any displayable SDK error.
    pub(crate) fn api(service: &'static str, err: &dyn std::fmt::Display) -> Self {
        Self::Api {
            service,
            message: err.to_string(),
        }
    }
}
