// src/config/validate.rs

use std::path::Path;

use crate::config::generate;
use crate::config::model::{ConfigSection, RawConfigFile};
use crate::errors::{JobdagError, Result};
use crate::fs::FileSystem;
use crate::registry::{FileSpec, JobSpec, Registry, TaskSpec};

/// Check the `[config]` section.
pub fn validate_settings(cfg: &ConfigSection) -> Result<()> {
    if cfg.max_parallel_tasks == 0 {
        return Err(JobdagError::ConfigError(
            "[config].max_parallel_tasks must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.agent_dir.trim().is_empty() {
        return Err(JobdagError::ConfigError(
            "[config].agent_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Declare everything in `raw` into a fresh [`Registry`].
///
/// Explicit `[file]`, `[task]` and `[job]` tables are declared first, then
/// each `[[generate]]` entry is expanded against `local_dir`. The registry is
/// returned unfinalized.
pub fn build_registry(raw: &RawConfigFile, fs: &dyn FileSystem, local_dir: &Path) -> Result<Registry> {
    let mut registry = Registry::new();

    for (name, file) in &raw.file {
        let mut spec = FileSpec::new(name.clone()).executable(file.executable);
        if let Some(agent) = &file.agent_path {
            spec = spec.agent_path(agent.clone());
        }
        if let Some(local) = &file.local_path {
            spec = spec.local_path(local.clone());
        }
        registry.declare_file(spec)?;
    }

    for (name, task) in &raw.task {
        if task.command.trim().is_empty() {
            return Err(JobdagError::ConfigError(format!(
                "task '{}' has an empty command",
                name
            )));
        }
        let mut spec = TaskSpec::new(name.clone(), task.command.clone())
            .args(task.arguments.iter().cloned());
        spec.refers_to = task.refers_to.clone();
        registry.declare_task(spec)?;
    }

    for (name, job) in &raw.job {
        let mut spec = JobSpec::new(name.clone());
        spec.tasks = job.tasks.clone();
        spec.depends_on_jobs = job.depends_on_jobs.clone();
        spec.id = job.id.clone();
        registry.declare_job(spec)?;
    }

    for entry in &raw.generate {
        generate::expand(entry, fs, local_dir, &mut registry)?;
    }

    Ok(registry)
}
