//! `.env` generation from the capacity-manager ECS task definition.
//!
//! Plain environment variables are copied through verbatim; secret
//! references are resolved against Secrets Manager, optionally extracting a
//! single field from a JSON secret. Resolution failures degrade to commented
//! placeholder lines rather than aborting the run, so one broken secret does
//! not block the rest of the file.

use std::io::{self, BufRead, Write as _};

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::aws::AwsError;
use crate::aws::ecs::ContainerEnv;
use crate::aws::secrets::SecretClient;
use crate::readiness::ProbeFuture;

/// ARN prefix identifying a Secrets Manager reference.
pub const SECRETS_MANAGER_ARN_PREFIX: &str = "arn:aws:secretsmanager:";

/// Placeholder value for secrets that could not be fetched or decoded.
pub const FETCH_FAILED_PLACEHOLDER: &str = "<FAILED_TO_FETCH_SECRET>";

/// Placeholder value for references that could not be parsed.
pub const PARSE_FAILED_PLACEHOLDER: &str = "<FAILED_TO_PARSE_SECRET_ARN>";

/// Parsed Secrets Manager reference from a task definition `valueFrom`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SecretRef {
    /// ARN of the secret to fetch.
    pub secret_arn: String,
    /// JSON field to extract, when the reference names one.
    pub json_key: Option<String>,
}

/// Parses a `valueFrom` reference string.
///
/// ECS appends `:json-key:version-stage:version-id` segments to the secret
/// ARN; the deployment only ever uses the json-key segment, leaving the
/// trailing segments empty (`::`). A reference containing `::` therefore
/// has its trailing colons stripped and splits on the last remaining colon
/// into ARN and JSON key. A reference without `::` is a whole-secret ARN.
///
/// Returns `None` when the string is not a Secrets Manager ARN at all.
#[must_use]
pub fn parse_secret_ref(value_from: &str) -> Option<SecretRef> {
    if !value_from.starts_with(SECRETS_MANAGER_ARN_PREFIX) {
        return None;
    }

    if value_from.contains("::") {
        let trimmed = value_from.trim_end_matches(':');
        let (arn, key) = trimmed.rsplit_once(':')?;
        Some(SecretRef {
            secret_arn: arn.to_owned(),
            json_key: Some(key.to_owned()),
        })
    } else {
        Some(SecretRef {
            secret_arn: value_from.to_owned(),
            json_key: None,
        })
    }
}

/// One line of the generated `.env` file.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EnvLine {
    /// A resolved `NAME=value` pair.
    Pair {
        /// Variable name.
        name: String,
        /// Resolved value.
        value: String,
    },
    /// A secret that could not be fetched or decoded.
    FetchFailed {
        /// Variable name.
        name: String,
    },
    /// A reference that was not a parseable Secrets Manager ARN.
    ParseFailed {
        /// Variable name.
        name: String,
    },
}

impl EnvLine {
    fn render(&self) -> String {
        match self {
            Self::Pair { name, value } => format!("{name}={value}"),
            Self::FetchFailed { name } => format!("# {name}={FETCH_FAILED_PLACEHOLDER}"),
            Self::ParseFailed { name } => format!("# {name}={PARSE_FAILED_PLACEHOLDER}"),
        }
    }
}

/// Source of raw secret strings, injectable for tests.
pub trait SecretSource {
    /// Fetches the secret string for `secret_id`.
    fn secret_string<'a>(&'a self, secret_id: &'a str) -> ProbeFuture<'a, String, AwsError>;
}

impl SecretSource for SecretClient {
    fn secret_string<'a>(&'a self, secret_id: &'a str) -> ProbeFuture<'a, String, AwsError> {
        Box::pin(async move { Self::secret_string(self, secret_id).await })
    }
}

/// Resolves the container environment into ordered `.env` lines.
///
/// Plain variables come first in declaration order, then resolved secrets.
/// Entries missing a name or value are skipped with a warning; secret
/// resolution failures yield placeholder lines instead of errors.
pub async fn resolve_lines<S: SecretSource>(
    container_env: &ContainerEnv,
    secrets: &S,
) -> Vec<EnvLine> {
    let mut lines = Vec::new();

    for var in &container_env.environment {
        match (var.name.as_deref(), var.value.as_deref()) {
            (Some(name), Some(value)) => lines.push(EnvLine::Pair {
                name: name.to_owned(),
                value: value.to_owned(),
            }),
            _ => warn!(?var, "skipping environment entry missing name or value"),
        }
    }

    for entry in &container_env.secrets {
        let (Some(name), Some(value_from)) = (entry.name.as_deref(), entry.value_from.as_deref())
        else {
            warn!(?entry, "skipping secrets entry missing name or valueFrom");
            continue;
        };

        lines.push(resolve_secret(name, value_from, secrets).await);
    }

    lines
}

async fn resolve_secret<S: SecretSource>(name: &str, value_from: &str, secrets: &S) -> EnvLine {
    let Some(secret_ref) = parse_secret_ref(value_from) else {
        warn!(
            name = %name,
            value_from = %value_from,
            "secret reference is not a Secrets Manager ARN"
        );
        return EnvLine::ParseFailed {
            name: name.to_owned(),
        };
    };

    let raw = match secrets.secret_string(&secret_ref.secret_arn).await {
        Ok(raw) => raw,
        Err(err) => {
            warn!(name = %name, secret = %secret_ref.secret_arn, error = %err, "failed to fetch secret");
            return EnvLine::FetchFailed {
                name: name.to_owned(),
            };
        }
    };

    let Some(json_key) = secret_ref.json_key else {
        return EnvLine::Pair {
            name: name.to_owned(),
            value: raw,
        };
    };

    match extract_json_field(&raw, &json_key) {
        Some(value) => EnvLine::Pair {
            name: name.to_owned(),
            value,
        },
        None => {
            warn!(
                name = %name,
                secret = %secret_ref.secret_arn,
                key = %json_key,
                available = %available_keys(&raw),
                "secret JSON does not contain the requested key"
            );
            EnvLine::FetchFailed {
                name: name.to_owned(),
            }
        }
    }
}

fn extract_json_field(raw: &str, key: &str) -> Option<String> {
    let parsed: serde_json::Value = serde_json::from_str(raw).ok()?;
    let field = parsed.get(key)?;
    match field {
        serde_json::Value::String(value) => Some(value.clone()),
        other => Some(other.to_string()),
    }
}

fn available_keys(raw: &str) -> String {
    serde_json::from_str::<serde_json::Value>(raw)
        .ok()
        .and_then(|value| {
            value.as_object().map(|map| {
                map.keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            })
        })
        .unwrap_or_else(|| String::from("(secret is not a JSON object)"))
}

/// Renders the full `.env` contents with header and footer comments.
#[must_use]
pub fn render(stack_name: &str, lines: &[EnvLine]) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let mut out = String::new();
    out.push_str(&format!(
        "# Generated from the {stack_name} capacity-manager task definition\n# Generated at {timestamp}\n# Do not edit by hand; rerun the generator instead.\n\n"
    ));
    for line in lines {
        out.push_str(&line.render());
        out.push('\n');
    }
    out.push_str("\n# End of generated file\n");
    out
}

/// Answers the overwrite confirmation for an existing output file.
pub trait Prompter {
    /// Returns whether the user confirmed overwriting `path`.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] when the prompt cannot be read or written.
    fn confirm_overwrite(&self, path: &Utf8Path) -> io::Result<bool>;
}

/// Prompter reading the answer from standard input.
#[derive(Clone, Copy, Debug, Default)]
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn confirm_overwrite(&self, path: &Utf8Path) -> io::Result<bool> {
        let mut stderr = io::stderr().lock();
        write!(stderr, "{path} already exists. Overwrite? [y/N] ")?;
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        let answer = answer.trim().to_ascii_lowercase();
        Ok(answer == "y" || answer == "yes")
    }
}

/// Outcome of an attempted `.env` write.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WriteOutcome {
    /// The file was written with the given number of lines.
    Written {
        /// Total line count of the written file.
        line_count: usize,
    },
    /// The user declined to overwrite the existing file.
    Skipped,
}

/// Errors raised while writing the `.env` file.
#[derive(Debug, Error)]
pub enum EnvFileError {
    /// Raised when the filesystem write or directory creation fails.
    #[error("failed to write {path}: {source}")]
    Io {
        /// Path that was written.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Raised when the overwrite confirmation cannot be completed.
    #[error("overwrite confirmation failed: {source}")]
    Prompt {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Writes `contents` to `path`, creating parent directories as needed.
///
/// An existing file triggers the overwrite confirmation unless `force` is
/// set; declining returns [`WriteOutcome::Skipped`] without touching the
/// file.
///
/// # Errors
///
/// Returns [`EnvFileError`] when the prompt or the write fails.
pub fn write_env_file<P: Prompter>(
    path: &Utf8Path,
    contents: &str,
    force: bool,
    prompter: &P,
) -> Result<WriteOutcome, EnvFileError> {
    if path.exists() && !force {
        let confirmed = prompter
            .confirm_overwrite(path)
            .map_err(|source| EnvFileError::Prompt { source })?;
        if !confirmed {
            info!(path = %path, "keeping existing file");
            return Ok(WriteOutcome::Skipped);
        }
    }

    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|source| EnvFileError::Io {
            path: path.to_owned(),
            source,
        })?;
    }

    std::fs::write(path, contents).map_err(|source| EnvFileError::Io {
        path: path.to_owned(),
        source,
    })?;

    let line_count = contents.lines().count();
    info!(path = %path, lines = line_count, "wrote env file");
    Ok(WriteOutcome::Written { line_count })
}
