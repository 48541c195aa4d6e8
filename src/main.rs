//! Binary entry point for the efsctl CLI.

use std::io::{self, Write};
use std::process;

use camino::Utf8PathBuf;
use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use efsctl::envfile::{self, StdinPrompter, WriteOutcome};
use efsctl::{
    AwsError, AwsServices, ConfigError, ConnectError, EnvFileError, InteractiveLauncher, OpsConfig,
    TargetError, connect, slug, target,
};

mod cli;

use cli::{BuildEnvCommand, Cli, ConnectCommand, TargetCommand};

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Aws(#[from] AwsError),
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(transparent)]
    EnvFile(#[from] EnvFileError),
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("EFSCTL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    match cli {
        Cli::BuildEnv(command) => build_env_command(command).await,
        Cli::Target(command) => target_command(command).await,
        Cli::Connect(command) => connect_command(command).await,
    }
}

async fn build_env_command(args: BuildEnvCommand) -> Result<i32, CliError> {
    let config = OpsConfig::load_without_cli_args()?;
    let stack_name = config.resolve_stack_name(args.stack_name.as_deref())?;

    let services = AwsServices::from_env().await;
    services.preflight().await?;

    let output_key = slug::task_definition_output_key(&stack_name);
    let task_definition_arn = services.stacks().stack_output(&stack_name, &output_key).await?;
    let container_env = services
        .task_definitions()
        .container_env(&task_definition_arn)
        .await?;

    let lines = envfile::resolve_lines(&container_env, &services.secrets()).await;
    let contents = envfile::render(&stack_name, &lines);

    let output_path = Utf8PathBuf::from(args.output);
    let outcome = envfile::write_env_file(&output_path, &contents, args.force, &StdinPrompter)?;

    if let WriteOutcome::Written { line_count } = outcome {
        writeln!(io::stdout(), "wrote {line_count} lines to {output_path}").ok();
    }
    Ok(0)
}

async fn target_command(args: TargetCommand) -> Result<i32, CliError> {
    let config = OpsConfig::load_without_cli_args()?;
    let stack_name = config.resolve_stack_name(args.stack_name.as_deref())?;

    let services = AwsServices::from_env().await;
    services.preflight().await?;

    let management = target::discover(&services.stacks(), &stack_name).await?;

    // Machine-readable contract: "<bucket> <instance-id>" on stdout.
    writeln!(io::stdout(), "{}", management.as_line()).ok();
    Ok(0)
}

async fn connect_command(args: ConnectCommand) -> Result<i32, CliError> {
    let config = OpsConfig::load_without_cli_args()?;
    let stack_name = config.resolve_stack_name(args.stack_name.as_deref())?;

    let services = AwsServices::from_env().await;
    services.preflight().await?;

    let code = connect::run(&services, &config, &stack_name, &InteractiveLauncher).await?;
    Ok(code)
}

fn report_error(err: &CliError) {
    write_error(io::stderr(), err);
}

fn write_error(mut target: impl Write, err: &CliError) {
    writeln!(target, "error: {err}").ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_error_renders_config_errors() {
        let mut buf = Vec::new();
        let err = CliError::Config(ConfigError::MissingConfigFileName);

        write_error(&mut buf, &err);

        let rendered = String::from_utf8(buf).expect("utf8");
        assert!(
            rendered.contains("no stack name provided"),
            "rendered: {rendered}"
        );
    }

    #[test]
    fn write_error_renders_aws_errors() {
        let mut buf = Vec::new();
        let err = CliError::Aws(AwsError::OutputNotFound {
            stack_name: String::from("my-stack"),
            output_key: String::from("mystackefnConnectionInfo"),
        });

        write_error(&mut buf, &err);

        let rendered = String::from_utf8(buf).expect("utf8");
        assert!(
            rendered.contains("output key 'mystackefnConnectionInfo' not found in stack 'my-stack'"),
            "rendered: {rendered}"
        );
    }
}
