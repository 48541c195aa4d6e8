//! EFS management target discovery from CloudFormation stack outputs.
//!
//! The deployment publishes a JSON blob under the `<slug>efnConnectionInfo`
//! output key naming the management EC2 instance and the S3 transfer bucket.
//! The printed form (`<bucket> <instance-id>`) is a stable contract consumed
//! by downstream copy tooling, so it goes to stdout while everything else is
//! logged.

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::aws::AwsError;
use crate::aws::cloudformation::StackClient;
use crate::slug;

/// Management target discovered from the stack.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConnectionTarget {
    /// EC2 instance id providing EFS access.
    pub service_instance_id: String,
    /// S3 bucket used for temporary transfers.
    pub transfer_bucket_name: String,
}

impl ConnectionTarget {
    /// Renders the machine-readable output line.
    #[must_use]
    pub fn as_line(&self) -> String {
        format!("{} {}", self.transfer_bucket_name, self.service_instance_id)
    }
}

/// Errors raised while discovering the management target.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum TargetError {
    /// Raised when the stack output lookup fails.
    #[error(transparent)]
    Aws(#[from] AwsError),
    /// Raised when the output value is not valid JSON.
    #[error("invalid JSON in connection info output: {message} (raw value: {raw})")]
    InvalidJson {
        /// Parser error string.
        message: String,
        /// Raw output value for diagnosis.
        raw: String,
    },
    /// Raised when a required field is absent from the JSON.
    #[error("could not extract {field} from connection info: {raw}")]
    MissingField {
        /// JSON field that was absent or empty.
        field: &'static str,
        /// Raw output value for diagnosis.
        raw: String,
    },
}

/// Wire shape of the connection info output value.
#[derive(Debug, Deserialize)]
struct ConnectionInfo {
    #[serde(rename = "serviceInstanceId")]
    service_instance_id: Option<String>,
    #[serde(rename = "transferBucketName")]
    transfer_bucket_name: Option<String>,
}

/// Discovers the management target for `stack_name`.
///
/// # Errors
///
/// Returns [`TargetError`] when the output is missing or its JSON payload
/// is malformed.
pub async fn discover(
    stacks: &StackClient,
    stack_name: &str,
) -> Result<ConnectionTarget, TargetError> {
    let output_key = slug::connection_info_output_key(stack_name);
    let raw = stacks.stack_output(stack_name, &output_key).await?;
    let target = parse_connection_info(&raw)?;

    info!(
        instance = %target.service_instance_id,
        bucket = %target.transfer_bucket_name,
        "discovered EFS management target"
    );
    Ok(target)
}

/// Parses the connection info JSON payload.
///
/// # Errors
///
/// Returns [`TargetError::InvalidJson`] for malformed JSON and
/// [`TargetError::MissingField`] when either field is absent or empty.
pub fn parse_connection_info(raw: &str) -> Result<ConnectionTarget, TargetError> {
    let info: ConnectionInfo =
        serde_json::from_str(raw).map_err(|err| TargetError::InvalidJson {
            message: err.to_string(),
            raw: raw.to_owned(),
        })?;

    let service_instance_id = require_field(info.service_instance_id, "serviceInstanceId", raw)?;
    let transfer_bucket_name = require_field(info.transfer_bucket_name, "transferBucketName", raw)?;

    Ok(ConnectionTarget {
        service_instance_id,
        transfer_bucket_name,
    })
}

fn require_field(
    value: Option<String>,
    field: &'static str,
    raw: &str,
) -> Result<String, TargetError> {
    value
        .filter(|candidate| !candidate.is_empty())
        .ok_or_else(|| TargetError::MissingField {
            field,
            raw: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_complete_connection_info() {
        let raw = r#"{"serviceInstanceId": "i-0abc", "transferBucketName": "my-bucket"}"#;

        let target = parse_connection_info(raw).expect("payload should parse");

        assert_eq!(target.service_instance_id, "i-0abc");
        assert_eq!(target.transfer_bucket_name, "my-bucket");
        assert_eq!(target.as_line(), "my-bucket i-0abc");
    }

    #[test]
    fn rejects_malformed_json() {
        let result = parse_connection_info("not json");

        assert!(matches!(result, Err(TargetError::InvalidJson { .. })));
    }

    #[test]
    fn rejects_missing_instance_id() {
        let raw = r#"{"transferBucketName": "my-bucket"}"#;

        let result = parse_connection_info(raw);

        assert!(matches!(
            result,
            Err(TargetError::MissingField {
                field: "serviceInstanceId",
                ..
            })
        ));
    }

    #[test]
    fn rejects_empty_bucket_name() {
        let raw = r#"{"serviceInstanceId": "i-0abc", "transferBucketName": ""}"#;

        let result = parse_connection_info(raw);

        assert!(matches!(
            result,
            Err(TargetError::MissingField {
                field: "transferBucketName",
                ..
            })
        ));
    }

    #[test]
    fn tolerates_extra_fields() {
        let raw = r#"{"serviceInstanceId": "i-0abc", "transferBucketName": "b", "efsId": "fs-1"}"#;

        assert!(parse_connection_info(raw).is_ok());
    }
}
