// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::model::{LoadedConfig, RawConfigFile, Settings};
use crate::config::validate::{build_registry, validate_settings};
use crate::dag::JobGraph;
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** check references
/// or the job graph. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and fully validate it.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Resolves `local_dir` / `agent_dir` against the config file's directory.
/// - Declares every entity (including `[[generate]]` expansions) into a
///   registry and finalizes it.
/// - Builds the job graph, rejecting cycles.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<LoadedConfig> {
    let path = path.as_ref();
    let raw = load_from_path(path)?;
    let loaded = validate_raw(&raw, &config_root_dir(path), &RealFileSystem)?;
    info!(
        config = ?path,
        jobs = loaded.graph.len(),
        "configuration loaded"
    );
    Ok(loaded)
}

/// Validate an already-parsed configuration.
///
/// `base_dir` is the directory relative paths in `[config]` are resolved
/// against; `fs` is used to expand `[[generate]]` entries.
pub fn validate_raw(raw: &RawConfigFile, base_dir: &Path, fs: &dyn FileSystem) -> Result<LoadedConfig> {
    validate_settings(&raw.config)?;

    let settings = Settings {
        max_parallel_tasks: raw.config.max_parallel_tasks,
        local_dir: base_dir.join(&raw.config.local_dir),
        agent_dir: base_dir.join(&raw.config.agent_dir),
    };

    let registry = build_registry(raw, fs, &settings.local_dir)?;
    let catalog = registry.finalize()?;
    let graph = JobGraph::build(catalog)?;

    Ok(LoadedConfig { settings, graph })
}

/// Directory that relative paths in a config file are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "jobs/Jobdag.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Jobdag.toml" (parent = ""),
///   we fall back to the current working directory.
pub fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Config file used when `--config` is not given, relative to the current
/// working directory.
pub const DEFAULT_CONFIG_FILE: &str = "Jobdag.toml";
