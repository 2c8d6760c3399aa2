// tests/runtime_fake_executor.rs

mod common;
use crate::common::builders::{RegistryBuilder, chain_graph};
use crate::common::fake_executor::{FakeBackend, FakeExecutor};
use crate::common::fake_transfer::FakeTransfer;
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use jobdag::dag::{JobGraph, JobRunState, RunReport, RunStatus, Scheduler, TaskRunState};
use jobdag::engine::{CoreRuntime, RunOptions, Runtime, RuntimeEvent, run_graph};
use jobdag::errors::TaskFailure;
use jobdag::staging::StagingCoordinator;

type TestResult = Result<(), Box<dyn Error>>;

async fn run_with_fakes(
    graph: JobGraph,
    executor: Arc<FakeExecutor>,
    transfer: FakeTransfer,
    max_parallel_tasks: usize,
) -> (RunReport, Arc<StagingCoordinator<FakeTransfer>>) {
    let staging = Arc::new(StagingCoordinator::new(transfer));
    let options = RunOptions {
        max_parallel_tasks,
        handle_ctrl_c: false,
    };
    let report = with_timeout(run_graph(graph, executor, Arc::clone(&staging), options))
        .await
        .expect("runtime error");
    (report, staging)
}

#[tokio::test]
async fn bc_job_stages_its_file_once_and_succeeds() -> TestResult {
    init_tracing();

    let graph = RegistryBuilder::new()
        .file("bc_exp1.txt")
        .task("bc", "/usr/bin/bc", &["-q", "bc_exp1.txt"], &["bc_exp1.txt"])
        .job("job1", &["bc"], &[])
        .graph();

    let executor = Arc::new(FakeExecutor::new());
    let (report, staging) =
        run_with_fakes(graph, Arc::clone(&executor), FakeTransfer::new(), 4).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(report.job_state("job1"), Some(JobRunState::Succeeded));
    assert_eq!(report.task_state("job1", "bc"), Some(TaskRunState::Succeeded));
    assert_eq!(staging.transfer().transfers("bc_exp1.txt"), 1);
    assert_eq!(executor.started(), vec!["/usr/bin/bc -q bc_exp1.txt".to_string()]);
    Ok(())
}

#[tokio::test]
async fn shared_file_is_staged_once_across_jobs() -> TestResult {
    init_tracing();

    let graph = RegistryBuilder::new()
        .file("shared.txt")
        .task("read1", "cat", &["1", "shared.txt"], &["shared.txt"])
        .task("read2", "cat", &["2", "shared.txt"], &["shared.txt"])
        .task("read3", "cat", &["3", "shared.txt"], &["shared.txt"])
        .job("a", &["read1"], &[])
        .job("b", &["read2"], &[])
        .job("c", &["read3"], &[])
        .graph();

    let executor = Arc::new(FakeExecutor::new());
    let (report, staging) = run_with_fakes(
        graph,
        Arc::clone(&executor),
        FakeTransfer::with_delay(Duration::from_millis(10)),
        3,
    )
    .await;

    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(staging.transfer().transfers("shared.txt"), 1);
    assert_eq!(executor.started().len(), 3);
    Ok(())
}

#[tokio::test]
async fn tasks_in_a_job_never_overlap_under_concurrency() -> TestResult {
    init_tracing();

    let graph = RegistryBuilder::new()
        .task("a1", "step", &["a1"], &[])
        .task("a2", "step", &["a2"], &[])
        .task("a3", "step", &["a3"], &[])
        .task("b1", "step", &["b1"], &[])
        .task("b2", "step", &["b2"], &[])
        .job("a", &["a1", "a2", "a3"], &[])
        .job("b", &["b1", "b2"], &[])
        .graph();

    let executor = Arc::new(FakeExecutor::with_delay(Duration::from_millis(15)));
    let (report, _) = run_with_fakes(graph, Arc::clone(&executor), FakeTransfer::new(), 4).await;

    assert_eq!(report.status, RunStatus::Succeeded);

    for (prev, next) in [
        ("step a1", "step a2"),
        ("step a2", "step a3"),
        ("step b1", "step b2"),
    ] {
        let finished = executor.finish_index(prev).expect("prev finished");
        let started = executor.start_index(next).expect("next started");
        assert!(finished < started, "{next} started before {prev} finished");
    }

    // Independent jobs do run side by side.
    assert_eq!(executor.max_concurrency(), 2);
    Ok(())
}

#[tokio::test]
async fn dependent_job_starts_after_dependency_finishes() -> TestResult {
    init_tracing();

    let graph = RegistryBuilder::new()
        .task("echo1", "echo", &["1"], &[])
        .task("echo2", "echo", &["2"], &[])
        .job("job0", &[], &[])
        .job("job1", &["echo1"], &[])
        .job("job2", &["echo2"], &["job0", "job1"])
        .graph();

    let executor = Arc::new(FakeExecutor::with_delay(Duration::from_millis(5)));
    let (report, _) = run_with_fakes(graph, Arc::clone(&executor), FakeTransfer::new(), 4).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    let echo1_done = executor.finish_index("echo 1").expect("echo1 finished");
    let echo2_start = executor.start_index("echo 2").expect("echo2 started");
    assert!(echo1_done < echo2_start);
    Ok(())
}

#[tokio::test]
async fn staging_failure_prevents_execution_and_skips_dependents() -> TestResult {
    init_tracing();

    let graph = RegistryBuilder::new()
        .file("input.csv")
        .task("load", "load", &["input.csv"], &["input.csv"])
        .task("report", "report", &[], &[])
        .task("other", "other", &[], &[])
        .job("ingest", &["load"], &[])
        .job("summarize", &["report"], &["ingest"])
        .job("independent", &["other"], &[])
        .graph();

    let transfer = FakeTransfer::new();
    transfer.fail_transfer("input.csv");

    let executor = Arc::new(FakeExecutor::new());
    let (report, staging) = run_with_fakes(graph, Arc::clone(&executor), transfer, 4).await;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.job_state("ingest"), Some(JobRunState::Failed));
    assert_eq!(report.job_state("summarize"), Some(JobRunState::Skipped));
    assert_eq!(report.job_state("independent"), Some(JobRunState::Succeeded));
    assert_eq!(report.task_state("ingest", "load"), Some(TaskRunState::Failed));

    assert!(!executor.was_run("load input.csv"));
    assert!(!executor.was_run("report"));
    assert!(executor.was_run("other"));
    assert!(!staging.is_staged("input.csv"));

    match report.failure("ingest", "load") {
        Some(TaskFailure::Staging(e)) => assert_eq!(e.file(), "input.csv"),
        other => panic!("expected staging failure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_and_spawn_errors_become_execution_failures() -> TestResult {
    init_tracing();

    let graph = RegistryBuilder::new()
        .task("bad_exit", "tool", &["--fail"], &[])
        .task("no_binary", "/does/not/exist", &[], &[])
        .job("exit", &["bad_exit"], &[])
        .job("spawn", &["no_binary"], &[])
        .graph();

    let executor = Arc::new(FakeExecutor::new());
    executor.exit_with("tool --fail", 3);
    executor.unavailable("/does/not/exist");

    let (report, _) = run_with_fakes(graph, Arc::clone(&executor), FakeTransfer::new(), 2).await;

    assert_eq!(report.status, RunStatus::Failed);
    match report.failure("exit", "bad_exit") {
        Some(TaskFailure::Execution(e)) => {
            assert_eq!(e.exit_code, 3);
            assert_eq!(e.job, "exit");
            assert_eq!(e.task, "bad_exit");
            assert_eq!(e.stdout, "tool --fail");
        }
        other => panic!("expected execution failure, got {other:?}"),
    }
    match report.failure("spawn", "no_binary") {
        Some(TaskFailure::Execution(e)) => {
            assert_eq!(e.exit_code, -1);
            assert!(e.stderr.contains("/does/not/exist"), "{}", e.stderr);
        }
        other => panic!("expected execution failure, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn worker_pool_respects_max_parallel_tasks() -> TestResult {
    init_tracing();

    let edges: Vec<(String, Vec<&str>)> = (0..6).map(|i| (format!("j{i}"), vec![])).collect();
    let borrowed: Vec<(&str, &[&str])> = edges
        .iter()
        .map(|(name, deps)| (name.as_str(), deps.as_slice()))
        .collect();
    let graph = chain_graph(&borrowed);

    let executor = Arc::new(FakeExecutor::with_delay(Duration::from_millis(20)));
    let (report, _) = run_with_fakes(graph, Arc::clone(&executor), FakeTransfer::new(), 2).await;

    assert_eq!(report.status, RunStatus::Succeeded);
    assert_eq!(executor.started().len(), 6);
    assert!(executor.max_concurrency() <= 2);
    Ok(())
}

#[tokio::test]
async fn empty_graph_finishes_immediately() -> TestResult {
    init_tracing();

    let executor = Arc::new(FakeExecutor::new());
    let (report, _) =
        run_with_fakes(RegistryBuilder::new().graph(), executor, FakeTransfer::new(), 1).await;
    assert_eq!(report.status, RunStatus::Succeeded);
    assert!(report.jobs.is_empty());
    Ok(())
}

#[tokio::test]
async fn runtime_with_fake_backend_runs_chain_in_order() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::new(chain_graph(&[("A", &[]), ("B", &["A"]), ("C", &["B"])]));
    let dispatched = Arc::new(Mutex::new(Vec::new()));

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let backend = FakeBackend::new(tx, Arc::clone(&dispatched));
    let runtime = Runtime::new(CoreRuntime::new(scheduler), rx, backend);

    let report = with_timeout(runtime.run()).await?;

    assert_eq!(report.status, RunStatus::Succeeded);
    let order: Vec<String> = dispatched.lock().unwrap().iter().map(|(j, _)| j.clone()).collect();
    assert_eq!(order, vec!["A", "B", "C"]);
    Ok(())
}

#[tokio::test]
async fn runtime_with_fake_backend_reports_failure() -> TestResult {
    init_tracing();

    let scheduler = Scheduler::new(chain_graph(&[("A", &[]), ("B", &["A"]), ("C", &[])]));
    let dispatched = Arc::new(Mutex::new(Vec::new()));

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let backend = FakeBackend::new(tx, Arc::clone(&dispatched)).failing("t_A");
    let report = with_timeout(Runtime::new(CoreRuntime::new(scheduler), rx, backend).run()).await?;

    assert_eq!(report.status, RunStatus::Failed);
    assert_eq!(report.job_state("A"), Some(JobRunState::Failed));
    assert_eq!(report.job_state("B"), Some(JobRunState::Skipped));
    assert_eq!(report.job_state("C"), Some(JobRunState::Succeeded));
    assert!(!dispatched.lock().unwrap().iter().any(|(j, _)| j == "B"));
    Ok(())
}

#[tokio::test]
async fn shutdown_request_skips_remaining_jobs() -> TestResult {
    init_tracing();

    let mut core = CoreRuntime::new(Scheduler::new(chain_graph(&[("A", &[]), ("B", &["A"])])));
    let start = core.start();
    assert!(start.keep_running);

    let step = core.step(RuntimeEvent::ShutdownRequested);
    assert!(!step.keep_running);
    assert!(core.is_finished());

    let report = core.report();
    assert_eq!(report.job_state("A"), Some(JobRunState::Skipped));
    assert_eq!(report.job_state("B"), Some(JobRunState::Skipped));
    assert_eq!(report.status, RunStatus::Failed);
    Ok(())
}
