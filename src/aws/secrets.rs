//! Secrets Manager value retrieval.

use aws_config::SdkConfig;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use tracing::info;

use super::AwsError;

/// Client fetching raw secret strings.
#[derive(Clone, Debug)]
pub struct SecretClient {
    client: Client,
}

impl SecretClient {
    /// Creates the client from shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Fetches the secret string for `secret_id`.
    ///
    /// JSON field extraction happens at the call site so failures there can
    /// report the keys the secret actually contains.
    ///
    /// # Errors
    ///
    /// Returns [`AwsError::Api`] on request failure and
    /// [`AwsError::EmptySecret`] when no secret string is present.
    pub async fn secret_string(&self, secret_id: &str) -> Result<String, AwsError> {
        info!(secret = %secret_id, "fetching secret value");

        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|err| AwsError::api("secretsmanager", &DisplayErrorContext(&err)))?;

        response
            .secret_string()
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AwsError::EmptySecret {
                secret_id: secret_id.to_owned(),
            })
    }
}
