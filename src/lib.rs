// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod registry;
pub mod staging;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::config::model::LoadedConfig;
use crate::dag::{JobGraph, RunStatus};
use crate::engine::{RunOptions, run_graph};
use crate::errors::{JobdagError, Result};
use crate::exec::ProcessExecutor;
use crate::fs::RealFileSystem;
use crate::staging::{LocalTransfer, StagingCoordinator};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and validation
/// - staging into the agent directory
/// - process execution
/// - Ctrl-C handling
///
/// Returns the run status; task failures are reported through it rather
/// than through `Err`.
pub async fn run(args: CliArgs) -> Result<RunStatus> {
    let config_path = PathBuf::from(&args.config);
    let loaded = load_and_validate(&config_path)?;

    match args.command {
        Command::Validate => {
            print_plan(&loaded);
            Ok(RunStatus::Succeeded)
        }
        Command::Run {
            max_parallel,
            agent_dir,
        } => {
            let LoadedConfig {
                mut settings,
                graph,
            } = loaded;
            if let Some(n) = max_parallel {
                if n == 0 {
                    return Err(JobdagError::ConfigError(
                        "--max-parallel must be >= 1".to_string(),
                    ));
                }
                settings.max_parallel_tasks = n;
            }
            if let Some(dir) = agent_dir {
                settings.agent_dir = dir;
            }

            info!(
                jobs = graph.len(),
                local_dir = ?settings.local_dir,
                agent_dir = ?settings.agent_dir,
                max_parallel_tasks = settings.max_parallel_tasks,
                "starting run"
            );

            let transfer = LocalTransfer::new(
                RealFileSystem,
                settings.local_dir.clone(),
                settings.agent_dir.clone(),
            );
            transfer.prepare_agent_root()?;
            let staging = Arc::new(StagingCoordinator::new(transfer));
            let executor = Arc::new(ProcessExecutor::with_working_dir(settings.agent_dir.clone()));

            let options = RunOptions {
                max_parallel_tasks: settings.max_parallel_tasks,
                handle_ctrl_c: true,
            };
            let report = run_graph(graph, executor, staging, options).await?;

            print!("{report}");
            Ok(report.status)
        }
    }
}

/// Print jobs in execution order with their dependencies, tasks and files.
fn print_plan(loaded: &LoadedConfig) {
    let graph: &JobGraph = &loaded.graph;
    let catalog = graph.catalog();

    println!("jobdag plan");
    println!(
        "  config.max_parallel_tasks = {}",
        loaded.settings.max_parallel_tasks
    );
    println!("  config.local_dir = {:?}", loaded.settings.local_dir);
    println!("  config.agent_dir = {:?}", loaded.settings.agent_dir);
    println!();

    println!("jobs ({}):", graph.len());
    for name in graph.topological_order() {
        match catalog.job(name).and_then(|j| j.id.as_ref()) {
            Some(id) => println!("  - {name} [{id}]"),
            None => println!("  - {name}"),
        }
        let deps = graph.dependencies_of(name);
        if !deps.is_empty() {
            println!("      depends_on: {:?}", deps);
        }
        for task_name in graph.tasks_of(name) {
            let Some(task) = catalog.task(task_name) else {
                continue;
            };
            println!("      task {task_name}: {} {:?}", task.command, task.arguments);
            for file in catalog.files_of(task) {
                if file.executable {
                    println!("        file {} -> {} (executable)", file.local_path, file.agent_path);
                } else {
                    println!("        file {} -> {}", file.local_path, file.agent_path);
                }
            }
        }
    }

    debug!("validate complete (no execution)");
}
