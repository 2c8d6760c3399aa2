// src/errors.rs

//! Crate-wide error types.
//!
//! [`JobdagError`] covers everything that can abort a whole invocation
//! (configuration, registry and graph validation). Failures that are scoped
//! to a single task travel as [`TaskFailure`] inside run records instead.

use thiserror::Error;

use crate::types::{EntityKind, FileName, JobName, TaskName};

#[derive(Error, Debug)]
pub enum JobdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("duplicate {kind} name '{name}'")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("{owner_kind} '{owner}' refers to undeclared {kind} '{name}'")]
    UnresolvedReference {
        owner_kind: EntityKind,
        owner: String,
        kind: EntityKind,
        name: String,
    },

    #[error("cyclic job dependency: {}", format_cycle(.cycle))]
    CyclicDependency { cycle: Vec<JobName> },

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl JobdagError {
    /// Process exit code for this error: 1 for anything detected before
    /// execution starts, 2 for staging/execution failures.
    pub fn exit_code(&self) -> i32 {
        match self {
            JobdagError::Staging(_) | JobdagError::Execution(_) => 2,
            _ => 1,
        }
    }
}

fn format_cycle(cycle: &[JobName]) -> String {
    match cycle.first() {
        Some(first) => format!("{} -> {}", cycle.join(" -> "), first),
        None => String::new(),
    }
}

/// The transfer collaborator could not place a file at its agent path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("transfer of file '{file}' failed: {reason}")]
pub struct TransferError {
    pub file: FileName,
    pub reason: String,
}

/// A file that must be executable could not be marked so.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot mark file '{file}' executable: {reason}")]
pub struct PermissionError {
    pub file: FileName,
    pub reason: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StagingError {
    #[error("staging failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("staging failed: {0}")]
    Permission(#[from] PermissionError),
}

impl StagingError {
    /// Name of the file that could not be staged.
    pub fn file(&self) -> &str {
        match self {
            StagingError::Transfer(e) => &e.file,
            StagingError::Permission(e) => &e.file,
        }
    }
}

/// A task command exited unsuccessfully (or could not be spawned, in which
/// case `exit_code` is -1 and `stderr` holds the spawn error).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task '{task}' of job '{job}' exited with code {exit_code}")]
pub struct ExecutionError {
    pub job: JobName,
    pub task: TaskName,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Why a single task failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

impl From<TaskFailure> for JobdagError {
    fn from(failure: TaskFailure) -> Self {
        match failure {
            TaskFailure::Staging(e) => JobdagError::Staging(e),
            TaskFailure::Execution(e) => JobdagError::Execution(e),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, JobdagError>;
