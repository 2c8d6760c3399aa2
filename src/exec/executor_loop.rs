// src/exec/executor_loop.rs

//! Main executor loop that hands scheduled tasks to a bounded worker pool.

use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::process::Executor;
use crate::exec::task_runner::run_task;
use crate::staging::{StagingCoordinator, Transfer};

/// Spawn the background executor loop.
///
/// The returned `mpsc::Sender<ScheduledTask>` is what
/// [`RealExecutorBackend`](super::RealExecutorBackend) forwards dispatched
/// tasks to. Each task runs in its own Tokio task; at most `max_parallel`
/// of them stage or execute at the same time.
///
/// The loop itself never waits for a permit, so it keeps draining the
/// channel while the pool is saturated.
pub fn spawn_executor<X, T>(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executor: Arc<X>,
    staging: Arc<StagingCoordinator<T>>,
    max_parallel: usize,
) -> mpsc::Sender<ScheduledTask>
where
    X: Executor,
    T: Transfer + 'static,
{
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);
    let permits = Arc::new(Semaphore::new(max_parallel.max(1)));

    tokio::spawn(async move {
        info!(max_parallel, "executor loop started");

        while let Some(task) = rx.recv().await {
            let permits = Arc::clone(&permits);
            let runtime_tx = runtime_tx.clone();
            let executor = Arc::clone(&executor);
            let staging = Arc::clone(&staging);

            tokio::spawn(async move {
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        warn!(job = %task.job, task = %task.task, "worker pool closed; dropping task");
                        return;
                    }
                };
                let job = task.job.clone();
                let name = task.task.clone();
                run_task(task, runtime_tx, executor, staging).await;
                debug!(job = %job, task = %name, "task runner future finished");
            });
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}
