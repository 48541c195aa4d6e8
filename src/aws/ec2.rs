//! EC2 instance state queries and the start command.

use aws_config::SdkConfig;
use aws_sdk_ec2::Client;
use aws_sdk_ec2::error::DisplayErrorContext;
use aws_sdk_ec2::types::InstanceStateName;

use super::AwsError;
use crate::readiness::PowerState;

/// Descriptive details for an instance, used for operator-facing logging.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstanceDetails {
    /// Commercial instance type (for example `t3.small`).
    pub instance_type: String,
    /// Platform reported by EC2; Linux instances report nothing, so this
    /// defaults to `linux`.
    pub platform: String,
    /// Private IPv4 address, or `unknown` before one is assigned.
    pub private_ip: String,
    /// Availability zone the instance is placed in.
    pub availability_zone: String,
}

/// Client for the EC2 calls the connect workflow needs.
#[derive(Clone, Debug)]
pub struct InstanceClient {
    client: Client,
}

impl InstanceClient {
    /// Creates the client from shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Queries the current power state of `instance_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AwsError::Api`] on request failure and
    /// [`AwsError::InstanceNotFound`] when the response carries no matching
    /// instance.
    pub async fn power_state(&self, instance_id: &str) -> Result<PowerState, AwsError> {
        let response = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|err| AwsError::api("ec2", &DisplayErrorContext(&err)))?;

        let state = response
            .reservations()
            .first()
            .and_then(|reservation| reservation.instances().first())
            .and_then(|instance| instance.state())
            .and_then(|state| state.name())
            .ok_or_else(|| AwsError::InstanceNotFound {
                instance_id: instance_id.to_owned(),
            })?;

        Ok(power_state_from(state))
    }

    /// Issues the start command for `instance_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AwsError::Api`] when the start request is rejected.
    pub async fn start(&self, instance_id: &str) -> Result<(), AwsError> {
        self.client
            .start_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|err| AwsError::api("ec2", &DisplayErrorContext(&err)))?;
        Ok(())
    }

    /// Fetches descriptive details for `instance_id`.
    ///
    /// # Errors
    ///
    /// Returns [`AwsError::Api`] on request failure and
    /// [`AwsError::InstanceNotFound`] when the instance is absent from the
    /// response.
    pub async fn details(&self, instance_id: &str) -> Result<InstanceDetails, AwsError> {
        let response = self
            .client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|err| AwsError::api("ec2", &DisplayErrorContext(&err)))?;

        let instance = response
            .reservations()
            .first()
            .and_then(|reservation| reservation.instances().first())
            .ok_or_else(|| AwsError::InstanceNotFound {
                instance_id: instance_id.to_owned(),
            })?;

        Ok(InstanceDetails {
            instance_type: instance
                .instance_type()
                .map_or_else(|| String::from("unknown"), |value| value.as_str().to_owned()),
            platform: instance
                .platform()
                .map_or_else(|| String::from("linux"), |value| value.as_str().to_owned()),
            private_ip: instance
                .private_ip_address()
                .map_or_else(|| String::from("unknown"), str::to_owned),
            availability_zone: instance
                .placement()
                .and_then(|placement| placement.availability_zone())
                .map_or_else(|| String::from("unknown"), str::to_owned),
        })
    }
}

fn power_state_from(state: &InstanceStateName) -> PowerState {
    match state {
        InstanceStateName::Running => PowerState::Running,
        InstanceStateName::Stopped => PowerState::Stopped,
        InstanceStateName::Pending => PowerState::Pending,
        InstanceStateName::Stopping => PowerState::Stopping,
        other => PowerState::Other(other.as_str().to_owned()),
    }
}
