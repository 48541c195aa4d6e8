//! CloudFormation stack output lookups.

use aws_config::SdkConfig;
use aws_sdk_cloudformation::Client;
use aws_sdk_cloudformation::error::DisplayErrorContext;
use tracing::info;

use super::AwsError;

/// Client answering "what is the value of output X on stack Y".
#[derive(Clone, Debug)]
pub struct StackClient {
    client: Client,
}

impl StackClient {
    /// Creates the client from shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Fetches a single stack output value by key.
    ///
    /// # Errors
    ///
    /// Returns [`AwsError::Api`] when the describe call fails (including an
    /// unknown stack name) and [`AwsError::OutputNotFound`] when the key is
    /// absent or carries an empty value.
    pub async fn stack_output(
        &self,
        stack_name: &str,
        output_key: &str,
    ) -> Result<String, AwsError> {
        info!(stack = %stack_name, key = %output_key, "looking up stack output");

        let response = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|err| AwsError::api("cloudformation", &DisplayErrorContext(&err)))?;

        response
            .stacks()
            .first()
            .into_iter()
            .flat_map(|stack| stack.outputs())
            .find(|output| output.output_key() == Some(output_key))
            .and_then(|output| output.output_value())
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| AwsError::OutputNotFound {
                stack_name: stack_name.to_owned(),
                output_key: output_key.to_owned(),
            })
    }
}
