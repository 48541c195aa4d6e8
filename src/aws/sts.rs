//! STS credential preflight.

use aws_config::SdkConfig;
use aws_sdk_sts::Client;
use aws_sdk_sts::error::DisplayErrorContext;
use tracing::debug;

use super::AwsError;

/// Confirms credentials resolve and returns the caller ARN.
///
/// # Errors
///
/// Returns [`AwsError::Credentials`] when `GetCallerIdentity` fails,
/// which almost always means the environment has no usable credentials.
pub async fn caller_identity(config: &SdkConfig) -> Result<String, AwsError> {
    let client = Client::new(config);
    let response = client
        .get_caller_identity()
        .send()
        .await
        .map_err(|err| AwsError::Credentials {
            message: DisplayErrorContext(&err).to_string(),
        })?;

    let arn = response.arn().unwrap_or("unknown").to_owned();
    debug!(caller = %arn, "AWS credentials verified");
    Ok(arn)
}
