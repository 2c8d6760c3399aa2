// src/exec/task_runner.rs

//! Individual task runner: stage, execute, report.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::errors::{ExecutionError, StagingError, TaskFailure, TransferError};
use crate::exec::process::Executor;
use crate::staging::{StagingCoordinator, Transfer};

/// Run a single scheduled task and report its lifecycle to the runtime:
///
/// 1. stage every referenced file (`TaskStaged`); a staging failure
///    completes the task as failed without running the command
/// 2. hand the command to the executor (`TaskStarted`)
/// 3. report `TaskCompleted` with the outcome
pub async fn run_task<X, T>(
    task: ScheduledTask,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executor: Arc<X>,
    staging: Arc<StagingCoordinator<T>>,
) where
    X: Executor,
    T: Transfer + 'static,
{
    let job = task.job.clone();
    let name = task.task.clone();

    if let Err(err) = run_task_inner(task, &runtime_tx, executor, staging).await {
        // Only reachable if the runtime went away; nobody is left to tell.
        error!(
            job = %job,
            task = %name,
            error = %err,
            "task runner could not report to runtime"
        );
    }
}

async fn run_task_inner<X, T>(
    task: ScheduledTask,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    executor: Arc<X>,
    staging: Arc<StagingCoordinator<T>>,
) -> Result<()>
where
    X: Executor,
    T: Transfer + 'static,
{
    if let Err(err) = stage_files(&task, staging).await {
        warn!(
            job = %task.job,
            task = %task.task,
            file = %err.file(),
            error = %err,
            "staging failed; task will not run"
        );
        return send_completion(runtime_tx, &task, TaskOutcome::Failed(err.into())).await;
    }

    send(
        runtime_tx,
        RuntimeEvent::TaskStaged {
            job: task.job.clone(),
            task: task.task.clone(),
        },
    )
    .await?;

    send(
        runtime_tx,
        RuntimeEvent::TaskStarted {
            job: task.job.clone(),
            task: task.task.clone(),
        },
    )
    .await?;

    info!(
        job = %task.job,
        task = %task.task,
        command = %task.command,
        "starting task"
    );

    let outcome = match executor.execute(&task.command, &task.arguments).await {
        Ok(output) if output.success() => {
            info!(job = %task.job, task = %task.task, "task exited successfully");
            TaskOutcome::Success
        }
        Ok(output) => {
            info!(
                job = %task.job,
                task = %task.task,
                exit_code = output.exit_code,
                "task exited with failure"
            );
            TaskOutcome::Failed(TaskFailure::Execution(ExecutionError {
                job: task.job.clone(),
                task: task.task.clone(),
                exit_code: output.exit_code,
                stdout: output.stdout,
                stderr: output.stderr,
            }))
        }
        Err(err) => {
            error!(
                job = %task.job,
                task = %task.task,
                error = %err,
                "task execution error"
            );
            TaskOutcome::Failed(TaskFailure::Execution(ExecutionError {
                job: task.job.clone(),
                task: task.task.clone(),
                exit_code: -1,
                stdout: String::new(),
                stderr: format!("{err:#}"),
            }))
        }
    };

    send_completion(runtime_tx, &task, outcome).await
}

/// Stage the task's files on the blocking pool.
async fn stage_files<T>(
    task: &ScheduledTask,
    staging: Arc<StagingCoordinator<T>>,
) -> std::result::Result<(), StagingError>
where
    T: Transfer + 'static,
{
    if task.files.is_empty() {
        return Ok(());
    }

    let files = task.files.clone();
    let first = files[0].name.clone();

    match tokio::task::spawn_blocking(move || staging.ensure_all_staged(&files)).await {
        Ok(result) => result,
        Err(join_err) => Err(StagingError::Transfer(TransferError {
            file: first,
            reason: format!("staging worker aborted: {join_err}"),
        })),
    }
}

async fn send_completion(
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    task: &ScheduledTask,
    outcome: TaskOutcome,
) -> Result<()> {
    send(
        runtime_tx,
        RuntimeEvent::TaskCompleted {
            job: task.job.clone(),
            task: task.task.clone(),
            outcome,
        },
    )
    .await
}

async fn send(runtime_tx: &mpsc::Sender<RuntimeEvent>, event: RuntimeEvent) -> Result<()> {
    runtime_tx
        .send(event)
        .await
        .context("sending event to runtime")
}
