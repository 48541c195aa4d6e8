//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn help_lists_all_subcommands() {
    let mut cmd = cargo_bin_cmd!("efsctl");
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("build-env"))
        .stdout(predicate::str::contains("target"))
        .stdout(predicate::str::contains("connect"));
}

#[test]
fn no_arguments_shows_help_and_fails() {
    let mut cmd = cargo_bin_cmd!("efsctl");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn build_env_help_documents_output_default() {
    let mut cmd = cargo_bin_cmd!("efsctl");
    cmd.args(["build-env", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("../capacity-manager/.env"))
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn target_help_names_the_stack_argument() {
    let mut cmd = cargo_bin_cmd!("efsctl");
    cmd.args(["target", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[STACK]"));
}

#[test]
fn connect_help_names_the_stack_argument() {
    let mut cmd = cargo_bin_cmd!("efsctl");
    cmd.args(["connect", "--help"]);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("[STACK]"));
}
