//! SSM managed-instance reachability queries.

use aws_config::SdkConfig;
use aws_sdk_ssm::Client;
use aws_sdk_ssm::error::DisplayErrorContext;
use aws_sdk_ssm::types::{InstanceInformationStringFilter, PingStatus};

use super::AwsError;

/// Client answering "does SSM consider this instance online".
#[derive(Clone, Debug)]
pub struct AgentClient {
    client: Client,
}

impl AgentClient {
    /// Creates the client from shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Reports whether the SSM agent on `instance_id` is online.
    ///
    /// An instance that has not registered with SSM yet is simply not
    /// online (`false`), not an error; only request failures are surfaced.
    ///
    /// # Errors
    ///
    /// Returns [`AwsError::Api`] when the describe call fails.
    pub async fn ping_online(&self, instance_id: &str) -> Result<bool, AwsError> {
        let response = self
            .client
            .describe_instance_information()
            .filters(
                InstanceInformationStringFilter::builder()
                    .key("InstanceIds")
                    .values(instance_id)
                    .build()
                    .map_err(|err| AwsError::api("ssm", &DisplayErrorContext(&err)))?,
            )
            .send()
            .await
            .map_err(|err| AwsError::api("ssm", &DisplayErrorContext(&err)))?;

        Ok(response
            .instance_information_list()
            .first()
            .and_then(|info| info.ping_status())
            .is_some_and(|status| matches!(status, PingStatus::Online)))
    }
}
