// src/config/generate.rs

//! Glob-driven declarations.

use std::path::Path;

use anyhow::Context;
use globset::Glob;
use tracing::debug;

use crate::config::model::GenerateConfig;
use crate::errors::{JobdagError, Result};
use crate::fs::FileSystem;
use crate::registry::{FileSpec, JobSpec, Registry, TaskSpec};

/// Placeholder in generator arguments replaced by the matched file name.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Expand one `[[generate]]` entry into the registry.
///
/// For every regular file directly inside `local_dir` whose name matches the
/// pattern (in name order), declares:
/// - a file named after it, with agent and local paths equal to the name
/// - a task `<task_prefix><name>` referring to that file
///
/// and appends the task to `entry.job`, declaring the job if needed. The job is
/// declared even when nothing matches.
///
/// Returns the number of matched files.
pub fn expand(
    entry: &GenerateConfig,
    fs: &dyn FileSystem,
    local_dir: &Path,
    registry: &mut Registry,
) -> Result<usize> {
    let matcher = Glob::new(&entry.pattern)
        .map_err(|e| {
            JobdagError::ConfigError(format!(
                "invalid generate pattern '{}': {}",
                entry.pattern, e
            ))
        })?
        .compile_matcher();

    let mut names: Vec<String> = fs
        .read_dir(local_dir)
        .with_context(|| format!("listing {:?} for pattern '{}'", local_dir, entry.pattern))?
        .into_iter()
        .filter(|path| fs.is_file(path))
        .filter_map(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(str::to_string)
        })
        .filter(|name| matcher.is_match(name))
        .collect();
    names.sort();

    if registry.job_mut(&entry.job).is_none() {
        registry.declare_job(JobSpec::new(entry.job.clone()))?;
    }

    for name in &names {
        registry.declare_file(FileSpec::new(name.clone()).executable(entry.executable))?;

        let task_name = format!("{}{}", entry.task_prefix, name);
        let task = TaskSpec::new(task_name.clone(), entry.command.clone())
            .args(entry.arguments.iter().map(|a| a.replace(FILE_PLACEHOLDER, name)))
            .refers_to(name.clone());
        registry.declare_task(task)?;

        if let Some(job) = registry.job_mut(&entry.job) {
            job.tasks.insert(task_name.clone());
        }
        debug!(file = %name, task = %task_name, job = %entry.job, "generated declaration");
    }

    debug!(
        pattern = %entry.pattern,
        matched = names.len(),
        job = %entry.job,
        "expanded generate entry"
    );
    Ok(names.len())
}
