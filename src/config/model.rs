// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::dag::JobGraph;
use crate::registry::OrderedSet;
use crate::types::{FileName, JobId, JobName, TaskName};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// max_parallel_tasks = 4
///
/// [file."bc_exp1.txt"]
/// agent_path = "bc_exp1.txt"
/// local_path = "bc_exp1.txt"
/// executable = false
///
/// [task.bc]
/// command = "/usr/bin/bc"
/// arguments = ["-q", "bc_exp1.txt"]
/// refers_to = ["bc_exp1.txt"]
///
/// [job.job1]
/// tasks = ["bc"]
/// ```
///
/// All sections are optional. Keys of the `file`, `task` and `job` tables
/// are the entity names. The camelCase spellings (`agentPathName`,
/// `refersTo`, `dependsOnJobs`, ...) are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub file: BTreeMap<FileName, FileConfig>,

    #[serde(default)]
    pub task: BTreeMap<TaskName, TaskConfig>,

    #[serde(default)]
    pub job: BTreeMap<JobName, JobConfig>,

    /// `[[generate]]` entries, expanded in order after explicit declarations.
    #[serde(default)]
    pub generate: Vec<GenerateConfig>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of tasks staging or executing at once.
    #[serde(default = "default_max_parallel_tasks")]
    pub max_parallel_tasks: usize,

    /// Directory holding local files, relative to the config file.
    #[serde(default = "default_local_dir")]
    pub local_dir: String,

    /// Directory files are staged into and commands run from, relative to
    /// the config file.
    #[serde(default = "default_agent_dir")]
    pub agent_dir: String,
}

fn default_max_parallel_tasks() -> usize {
    4
}

fn default_local_dir() -> String {
    ".".to_string()
}

fn default_agent_dir() -> String {
    ".jobdag/agent".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            max_parallel_tasks: default_max_parallel_tasks(),
            local_dir: default_local_dir(),
            agent_dir: default_agent_dir(),
        }
    }
}

/// `[file.<name>]` section. Both paths default to the file name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default, alias = "agentPathName")]
    pub agent_path: Option<String>,

    #[serde(default, alias = "localPathName")]
    pub local_path: Option<String>,

    #[serde(default, alias = "isExecutable")]
    pub executable: bool,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    pub command: String,

    #[serde(default)]
    pub arguments: Vec<String>,

    #[serde(default, alias = "refersTo")]
    pub refers_to: OrderedSet<FileName>,
}

/// `[job.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub tasks: OrderedSet<TaskName>,

    #[serde(default, alias = "dependsOnJobs")]
    pub depends_on_jobs: OrderedSet<JobName>,

    /// `id = { job = "job1", data_file = "bc_map.csv" }`
    #[serde(default)]
    pub id: Option<JobId>,
}

/// `[[generate]]` entry: one file and one task per matching local file.
///
/// ```toml
/// [[generate]]
/// pattern = "*.txt"
/// task_prefix = "bc"
/// command = "/usr/bin/bc"
/// arguments = ["-q", "{file}"]
/// job = "job1"
/// ```
///
/// `{file}` in `arguments` is replaced with the matched file name.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateConfig {
    /// Glob matched against file names directly inside `local_dir`.
    pub pattern: String,

    #[serde(default)]
    pub task_prefix: String,

    pub command: String,

    #[serde(default)]
    pub arguments: Vec<String>,

    /// Job the generated tasks are appended to (declared if missing).
    pub job: JobName,

    #[serde(default, alias = "isExecutable")]
    pub executable: bool,
}

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub max_parallel_tasks: usize,
    pub local_dir: PathBuf,
    pub agent_dir: PathBuf,
}

/// A loaded configuration: settings plus the validated job graph.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub settings: Settings,
    pub graph: JobGraph,
}
