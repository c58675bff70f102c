// src/engine/mod.rs

//! Pipeline execution.
//!
//! The [`runner`] drives a resolved [`Plan`](crate::dag::Plan): sequential
//! stages block, parallel stages start every member at once and wait for
//! all of them to settle before the pipeline advances.

use crate::types::LintStrictness;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a single task invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

/// Settings threaded explicitly into every work function of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSettings {
    pub strictness: LintStrictness,
}

impl RunSettings {
    pub fn new(strictness: LintStrictness) -> Self {
        Self { strictness }
    }
}

pub mod runner;

pub use runner::{RunReport, Runner, TaskFailure};
