// tests/scheduler_properties.rs

mod common;
use crate::common::builders::RegistryBuilder;

use std::collections::{HashSet, VecDeque};

use proptest::prelude::*;

use jobdag::dag::{JobGraph, JobRunState, RunStatus, Scheduler};
use jobdag::engine::TaskOutcome;
use jobdag::errors::{ExecutionError, TaskFailure};

/// Random acyclic job graphs: job N may only depend on jobs 0..N, and has
/// between zero and three tasks.
fn job_graph_strategy(max_jobs: usize) -> impl Strategy<Value = (JobGraph, usize)> {
    (1..=max_jobs).prop_flat_map(|num_jobs| {
        let deps = proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..3),
            num_jobs,
        );
        let task_counts = proptest::collection::vec(0..4usize, num_jobs);

        (deps, task_counts).prop_map(move |(raw_deps, task_counts)| {
            let mut builder = RegistryBuilder::new();
            for (i, potential) in raw_deps.into_iter().enumerate() {
                let job = format!("job_{i}");

                let tasks: Vec<String> = (0..task_counts[i]).map(|t| format!("{job}_t{t}")).collect();
                for task in &tasks {
                    builder = builder.task(task, "echo", &[task.as_str()], &[]);
                }

                let deps: HashSet<String> = potential
                    .into_iter()
                    .filter(|_| i > 0)
                    .map(|d| format!("job_{}", d % i.max(1)))
                    .collect();

                let task_refs: Vec<&str> = tasks.iter().map(String::as_str).collect();
                let dep_refs: Vec<&str> = deps.iter().map(String::as_str).collect();
                builder = builder.job(&job, &task_refs, &dep_refs);
            }
            (builder.graph(), num_jobs)
        })
    })
}

fn failure(job: &str, task: &str) -> TaskOutcome {
    TaskOutcome::Failed(TaskFailure::Execution(ExecutionError {
        job: job.to_string(),
        task: task.to_string(),
        exit_code: 1,
        stdout: String::new(),
        stderr: String::new(),
    }))
}

proptest! {
    #[test]
    fn scheduler_always_terminates_consistently(
        (graph, num_jobs) in job_graph_strategy(10),
        failing in proptest::collection::hash_set(0..10usize, 0..4),
    ) {
        let failing_jobs: HashSet<String> = failing
            .into_iter()
            .filter(|i| *i < num_jobs)
            .map(|i| format!("job_{i}"))
            .collect();

        let mut scheduler = Scheduler::new(graph.clone());
        let mut in_flight: VecDeque<(String, String)> = VecDeque::new();

        let step = scheduler.start();
        for task in step.newly_dispatched {
            in_flight.push_back((task.job, task.task));
        }

        // Each job holds at most three tasks, so this bound is generous.
        let mut budget = num_jobs * 4 + 1;
        while let Some((job, task)) = in_flight.pop_front() {
            prop_assert!(budget > 0, "scheduler did not terminate");
            budget -= 1;

            // Never more than one task of a job in flight.
            prop_assert!(!in_flight.iter().any(|(j, _)| *j == job));

            scheduler.handle_task_staged(&job, &task);
            scheduler.handle_task_started(&job, &task);
            let outcome = if failing_jobs.contains(&job) {
                failure(&job, &task)
            } else {
                TaskOutcome::Success
            };
            let step = scheduler.handle_task_completion(&job, &task, outcome);
            for next in step.newly_dispatched {
                in_flight.push_back((next.job, next.task));
            }
        }

        prop_assert!(scheduler.is_finished());

        for job in graph.jobs() {
            let state = scheduler.job_state(job).unwrap();
            prop_assert!(state.is_terminal(), "{job} ended in {state:?}");

            let deps = graph.dependencies_of(job);
            if state == JobRunState::Succeeded {
                for dep in deps {
                    prop_assert_eq!(scheduler.job_state(dep), Some(JobRunState::Succeeded));
                }
            }
            for dep in deps {
                if matches!(
                    scheduler.job_state(dep),
                    Some(JobRunState::Failed) | Some(JobRunState::Skipped)
                ) {
                    prop_assert_eq!(state, JobRunState::Skipped);
                }
            }
            if state == JobRunState::Failed {
                prop_assert!(failing_jobs.contains(job));
            }
        }

        let all_succeeded = graph
            .jobs()
            .all(|j| scheduler.job_state(j) == Some(JobRunState::Succeeded));
        let expected = if all_succeeded { RunStatus::Succeeded } else { RunStatus::Failed };
        prop_assert_eq!(scheduler.status(), expected);
    }
}
