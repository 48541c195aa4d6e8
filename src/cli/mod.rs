//! Command-line interface definitions for the `efsctl` binary.
//!
//! This module centralises the clap parser structures so both the main binary
//! and the build script can reuse them when generating the manual page.

use clap::Parser;

/// Top-level CLI for the `efsctl` binary.
#[derive(Debug, Parser)]
#[command(
    name = "efsctl",
    about = "Operator tooling for the capacity-manager AWS deployment",
    arg_required_else_help = true
)]
pub(crate) enum Cli {
    /// Generate a .env file from the capacity-manager ECS task definition.
    #[command(
        name = "build-env",
        about = "Generate a .env file from the capacity-manager task definition"
    )]
    BuildEnv(BuildEnvCommand),
    /// Print the EFS management target discovered from stack outputs.
    #[command(
        name = "target",
        about = "Print the transfer bucket and EC2 instance id for the EFS target"
    )]
    Target(TargetCommand),
    /// Open an interactive SSM session on the EFS management instance.
    #[command(
        name = "connect",
        about = "Start the EFS management instance if needed and open an SSM session"
    )]
    Connect(ConnectCommand),
}

/// Arguments for the `efsctl build-env` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct BuildEnvCommand {
    /// CloudFormation stack name. Falls back to the deployment config file
    /// named by `CONFIG_FILE_NAME` when omitted.
    #[arg(value_name = "STACK")]
    pub(crate) stack_name: Option<String>,
    /// Output path for the generated .env file.
    #[arg(value_name = "OUTPUT", default_value = "../capacity-manager/.env")]
    pub(crate) output: String,
    /// Overwrite an existing output file without prompting.
    #[arg(long)]
    pub(crate) force: bool,
}

/// Arguments for the `efsctl target` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct TargetCommand {
    /// CloudFormation stack name. Falls back to the deployment config file
    /// named by `CONFIG_FILE_NAME` when omitted.
    #[arg(value_name = "STACK")]
    pub(crate) stack_name: Option<String>,
}

/// Arguments for the `efsctl connect` subcommand.
#[derive(Debug, Parser)]
pub(crate) struct ConnectCommand {
    /// CloudFormation stack name. Falls back to the deployment config file
    /// named by `CONFIG_FILE_NAME` when omitted.
    #[arg(value_name = "STACK")]
    pub(crate) stack_name: Option<String>,
}
