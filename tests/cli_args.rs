// tests/cli_args.rs

use std::path::PathBuf;

use clap::Parser;

use jobdag::cli::{CliArgs, Command, LogLevel};
use jobdag::config::DEFAULT_CONFIG_FILE;
use jobdag::errors::{ExecutionError, JobdagError, StagingError, TransferError};
use jobdag::logging::parse_level_str;

#[test]
fn run_subcommand_with_overrides() {
    let args = CliArgs::try_parse_from([
        "jobdag",
        "--config",
        "jobs/Jobdag.toml",
        "run",
        "--max-parallel",
        "8",
        "--agent-dir",
        "/tmp/agent",
    ])
    .unwrap();

    assert_eq!(args.config, "jobs/Jobdag.toml");
    match args.command {
        Command::Run {
            max_parallel,
            agent_dir,
        } => {
            assert_eq!(max_parallel, Some(8));
            assert_eq!(agent_dir, Some(PathBuf::from("/tmp/agent")));
        }
        other => panic!("expected run, got {other:?}"),
    }
}

#[test]
fn validate_uses_default_config_path() {
    let args = CliArgs::try_parse_from(["jobdag", "validate", "--log-level", "debug"]).unwrap();
    assert_eq!(args.config, DEFAULT_CONFIG_FILE);
    assert!(matches!(args.command, Command::Validate));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
}

#[test]
fn subcommand_is_required() {
    assert!(CliArgs::try_parse_from(["jobdag"]).is_err());
}

#[test]
fn log_level_env_values() {
    assert_eq!(parse_level_str(" WARNING "), Some(tracing::Level::WARN));
    assert_eq!(parse_level_str("trace"), Some(tracing::Level::TRACE));
    assert_eq!(parse_level_str("loud"), None);
}

#[test]
fn exit_codes_separate_validation_from_execution() {
    assert_eq!(JobdagError::ConfigError("x".into()).exit_code(), 1);

    let staging = JobdagError::from(StagingError::Transfer(TransferError {
        file: "a".into(),
        reason: "gone".into(),
    }));
    assert_eq!(staging.exit_code(), 2);
    assert_eq!(staging.to_string(), "staging failed: transfer of file 'a' failed: gone");

    let exec = JobdagError::from(ExecutionError {
        job: "j".into(),
        task: "t".into(),
        exit_code: 5,
        stdout: String::new(),
        stderr: String::new(),
    });
    assert_eq!(exec.exit_code(), 2);
    assert_eq!(exec.to_string(), "task 't' of job 'j' exited with code 5");
}
