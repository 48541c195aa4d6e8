//! Configuration loading via `ortho-config` and the deployment config file.
//!
//! Operational tuning (poll budget, session binary, config directory) merges
//! defaults, configuration files, and `EFSCTL_*` environment variables. The
//! stack name itself resolves in precedence order: explicit CLI argument,
//! `EFSCTL_STACK_NAME`/config sources, then the deployment config JSON named
//! by the `CONFIG_FILE_NAME` environment variable under the configs
//! directory.

use std::env;
use std::fs;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Environment variable naming the deployment config file.
pub const CONFIG_FILE_ENV_VAR: &str = "CONFIG_FILE_NAME";

/// Operational settings for `efsctl`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "EFSCTL")]
pub struct OpsConfig {
    /// Stack name override. Usually supplied as a CLI argument instead.
    pub stack_name: Option<String>,
    /// Directory holding the deployment config JSON files.
    #[ortho_config(default = "configs".to_owned())]
    pub configs_dir: String,
    /// Status-check attempts per polling phase.
    #[ortho_config(default = 30)]
    pub poll_attempts: u32,
    /// Seconds between status-check attempts.
    #[ortho_config(default = 10)]
    pub poll_interval_secs: u64,
    /// Binary used to launch the interactive SSM session.
    #[ortho_config(default = "aws".to_owned())]
    pub session_bin: String,
}

impl OpsConfig {
    /// Loads configuration without attempting to parse CLI arguments. Values
    /// merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("efsctl")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Delay between polling attempts as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Resolves the stack name, preferring the explicit `argument`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when no source yields a stack name or the
    /// deployment config file is missing or malformed.
    pub fn resolve_stack_name(&self, argument: Option<&str>) -> Result<String, ConfigError> {
        if let Some(name) = non_empty(argument) {
            info!(stack = %name, "using stack name from argument");
            return Ok(name.to_owned());
        }

        if let Some(name) = non_empty(self.stack_name.as_deref()) {
            info!(stack = %name, "using stack name from configuration");
            return Ok(name.to_owned());
        }

        info!("no stack name provided, reading deployment config file");
        self.stack_name_from_deploy_config()
    }

    fn stack_name_from_deploy_config(&self) -> Result<String, ConfigError> {
        let file_name = env::var(CONFIG_FILE_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingConfigFileName)?;

        let path = Utf8Path::new(&self.configs_dir).join(file_name);
        info!(path = %path, "reading deployment config");

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigError::ConfigFileUnreadable {
                path: path.clone(),
                message: err.to_string(),
            })?;

        let deploy: DeployConfig =
            serde_json::from_str(&contents).map_err(|err| ConfigError::InvalidConfigFile {
                path: path.clone(),
                message: err.to_string(),
            })?;

        let stack_name = deploy
            .stack_name
            .filter(|value| !value.trim().is_empty())
            .ok_or(ConfigError::MissingStackName { path })?;

        info!(stack = %stack_name, "found stack name in deployment config");
        Ok(stack_name)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|trimmed| !trimmed.is_empty())
}

/// Shape of the deployment config JSON (`configs/<CONFIG_FILE_NAME>`).
#[derive(Debug, Deserialize)]
struct DeployConfig {
    #[serde(rename = "stackName")]
    stack_name: Option<String>,
}

/// Errors raised during configuration loading and stack-name resolution.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
    /// Raised when no stack name source is available.
    #[error(
        "no stack name provided: pass one as an argument or set {CONFIG_FILE_ENV_VAR} to a \
         deployment config file name (e.g. 'test.json')"
    )]
    MissingConfigFileName,
    /// Raised when the deployment config file cannot be read.
    #[error("deployment config not found or unreadable at {path}: {message}")]
    ConfigFileUnreadable {
        /// Path that was attempted.
        path: Utf8PathBuf,
        /// Operating system error string.
        message: String,
    },
    /// Raised when the deployment config file is not valid JSON.
    #[error("invalid JSON in deployment config {path}: {message}")]
    InvalidConfigFile {
        /// Path that was parsed.
        path: Utf8PathBuf,
        /// Parser error string.
        message: String,
    },
    /// Raised when the deployment config lacks a usable `stackName` field.
    #[error("deployment config {path} does not contain a 'stackName' field")]
    MissingStackName {
        /// Path that was parsed.
        path: Utf8PathBuf,
    },
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Serialises tests that mutate the process-global environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn base_config(configs_dir: &str) -> OpsConfig {
        OpsConfig {
            stack_name: None,
            configs_dir: configs_dir.to_owned(),
            poll_attempts: 30,
            poll_interval_secs: 10,
            session_bin: String::from("aws"),
        }
    }

    #[test]
    fn argument_takes_precedence() {
        let config = OpsConfig {
            stack_name: Some(String::from("from-config")),
            ..base_config("configs")
        };

        let resolved = config
            .resolve_stack_name(Some("from-arg"))
            .expect("argument should resolve");

        assert_eq!(resolved, "from-arg");
    }

    #[test]
    fn blank_argument_falls_back_to_configured_name() {
        let config = OpsConfig {
            stack_name: Some(String::from("from-config")),
            ..base_config("configs")
        };

        let resolved = config
            .resolve_stack_name(Some("  "))
            .expect("configured name should resolve");

        assert_eq!(resolved, "from-config");
    }

    #[test]
    fn deploy_config_supplies_stack_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("test.json"),
            r#"{"stackName": "my-efs-stack"}"#,
        )
        .expect("write config");

        let config = base_config(dir.path().to_str().expect("utf-8 tempdir"));
        let _guard = ENV_LOCK.lock().expect("env lock");
        unsafe { env::set_var(CONFIG_FILE_ENV_VAR, "test.json") };
        let resolved = config.resolve_stack_name(None);
        unsafe { env::remove_var(CONFIG_FILE_ENV_VAR) };

        assert_eq!(
            resolved.expect("deploy config should resolve"),
            "my-efs-stack"
        );
    }

    #[test]
    fn missing_stack_name_field_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("empty.json"), "{}").expect("write config");

        let config = base_config(dir.path().to_str().expect("utf-8 tempdir"));
        let _guard = ENV_LOCK.lock().expect("env lock");
        unsafe { env::set_var(CONFIG_FILE_ENV_VAR, "empty.json") };
        let result = config.resolve_stack_name(None);
        unsafe { env::remove_var(CONFIG_FILE_ENV_VAR) };

        assert!(matches!(result, Err(ConfigError::MissingStackName { .. })));
    }
}
