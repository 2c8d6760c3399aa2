// src/config/mod.rs

//! Configuration loading and validation for jobdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Turn it into registry declarations and check them (`validate.rs`).
//! - Expand glob-driven `[[generate]]` entries (`generate.rs`).

pub mod generate;
pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{config_root_dir, DEFAULT_CONFIG_FILE, load_and_validate, load_from_path, validate_raw};
pub use model::{
    ConfigSection, FileConfig, GenerateConfig, JobConfig, LoadedConfig, RawConfigFile, Settings,
    TaskConfig,
};
pub use validate::{build_registry, validate_settings};
