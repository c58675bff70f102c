// src/config/mod.rs

//! Configuration loading and validation for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model and the built-in layout (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate references, globs and the `after` graph (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_builtin, load_from_path, load_or_builtin};
pub use model::{
    ConfigFile, PathsSection, RawConfigFile, ServerSection, TaskConfig, ValidatorConfig,
};
