// src/errors.rs

//! Crate-wide error types.

use thiserror::Error;

use crate::engine::TaskName;

/// Problems found while registering tasks or resolving a plan.
///
/// These are fatal at startup: nothing runs once one of them is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("task '{0}' is already registered")]
    DuplicateTask(TaskName),

    #[error("task '{task}' lists unknown predecessor '{predecessor}' (predecessors must be registered first)")]
    UnknownPredecessor {
        task: TaskName,
        predecessor: TaskName,
    },

    #[error("unknown task '{0}'")]
    UnknownTask(TaskName),

    #[error("cyclic dependency: {}", .0.join(" -> "))]
    CyclicDependency(Vec<TaskName>),
}

#[derive(Error, Debug)]
pub enum SitepipeError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("task '{task}': {validator} reported {errors} error(s) and {warnings} warning(s)")]
    Validation {
        task: TaskName,
        validator: String,
        errors: usize,
        warnings: usize,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("task '{task}' failed")]
    TaskFailed {
        task: TaskName,
        source: Box<SitepipeError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SitepipeError>;
