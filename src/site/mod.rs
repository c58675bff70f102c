// src/site/mod.rs

//! The static site pipeline.
//!
//! Turns a validated [`ConfigFile`] into a registered task graph:
//!
//! - `clean` removes the destination root,
//! - one producer per `[task.<name>]` (select, validate, copy),
//! - `build`, a structural task that follows every producer.
//!
//! It also provides the plan for each entry point and the watch
//! subscriptions for watch mode.

pub mod jobs;
pub mod outputs;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use crate::config::ConfigFile;
use crate::copy::{Copier, SourceSelection};
use crate::dag::{Plan, TaskGraph, TaskGroup};
use crate::engine::{RunSettings, Runner, TaskName};
use crate::errors::{Result, SitepipeError};
use crate::exec::{CommandValidator, Validator};
use crate::fs::FileSystem;
use crate::types::LintStrictness;
use crate::watch::WatchSubscription;

pub use jobs::CopyJob;
pub use outputs::check_disjoint_outputs;

pub const CLEAN_TASK: &str = "clean";
pub const BUILD_TASK: &str = "build";
pub const WATCH_ENTRY: &str = "watch";

/// What the user asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryPoint {
    /// `clean -> build -> start server -> watch`.
    Default,
    Build,
    Clean,
    /// Watch only, without an initial build or server.
    Watch,
    /// A single producer, with its declared predecessors.
    Task(TaskName),
}

impl EntryPoint {
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None | Some("default") => EntryPoint::Default,
            Some(BUILD_TASK) => EntryPoint::Build,
            Some(CLEAN_TASK) => EntryPoint::Clean,
            Some(WATCH_ENTRY) => EntryPoint::Watch,
            Some(name) => EntryPoint::Task(name.to_string()),
        }
    }

    /// The development loop tolerates warnings; everything else is strict.
    pub fn strictness(&self) -> LintStrictness {
        match self {
            EntryPoint::Default => LintStrictness::FailOnError,
            _ => LintStrictness::FailOnWarning,
        }
    }

    pub fn settings(&self) -> RunSettings {
        RunSettings::new(self.strictness())
    }

    pub fn starts_server(&self) -> bool {
        matches!(self, EntryPoint::Default)
    }

    pub fn watches(&self) -> bool {
        matches!(self, EntryPoint::Default | EntryPoint::Watch)
    }

    /// Entry points that rebuild every producer check their outputs first.
    pub fn checks_outputs(&self) -> bool {
        matches!(self, EntryPoint::Default | EntryPoint::Build)
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::Default => f.write_str("default"),
            EntryPoint::Build => f.write_str(BUILD_TASK),
            EntryPoint::Clean => f.write_str(CLEAN_TASK),
            EntryPoint::Watch => f.write_str(WATCH_ENTRY),
            EntryPoint::Task(name) => f.write_str(name),
        }
    }
}

/// Registered graph plus everything needed to run it.
pub struct SitePipeline {
    config: ConfigFile,
    runner: Runner,
    jobs: Vec<Arc<CopyJob>>,
}

impl fmt::Debug for SitePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SitePipeline")
            .field("jobs", &self.jobs)
            .finish_non_exhaustive()
    }
}

impl SitePipeline {
    /// Build the pipeline with one [`CommandValidator`] per
    /// `[validator.<name>]` section.
    pub fn from_config(config: ConfigFile, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let mut validators: HashMap<String, Arc<dyn Validator>> = HashMap::new();
        for (name, v) in config.validator.iter() {
            let validator = CommandValidator::new(name.clone(), v.cmd.clone())?.with_strict(v.strict);
            validators.insert(name.clone(), Arc::new(validator));
        }
        Self::new(config, fs, validators)
    }

    /// Build the pipeline with explicit validator implementations.
    pub fn new(
        config: ConfigFile,
        fs: Arc<dyn FileSystem>,
        validators: HashMap<String, Arc<dyn Validator>>,
    ) -> Result<Self> {
        let copier = Copier::new(Arc::clone(&fs));
        let mut graph = TaskGraph::new();

        graph.register(
            CLEAN_TASK,
            Vec::<TaskName>::new(),
            Some(jobs::clean_work(Arc::clone(&fs), config.paths.dist.clone())),
        )?;

        let mut jobs = Vec::new();
        for (name, task) in config.tasks_in_order() {
            let selection = SourceSelection::new(&config.paths.src, &task.src, &task.exclude)
                .with_context(|| format!("compiling sources of task '{name}'"))?;

            let mut task_validators = Vec::with_capacity(task.validate.len());
            for v in task.validate.iter() {
                let validator = validators.get(v).ok_or_else(|| {
                    SitepipeError::ConfigError(format!(
                        "task '{name}' references unknown validator '{v}'"
                    ))
                })?;
                task_validators.push(Arc::clone(validator));
            }

            let job = Arc::new(CopyJob::new(
                name,
                selection,
                config.paths.dist.join(&task.dest),
                task.changed_only,
                task_validators,
                copier.clone(),
            ));
            graph.register(name, task.after.iter().cloned(), Some(Arc::clone(&job).into_work()))?;
            jobs.push(job);
        }

        let producers: Vec<TaskName> = jobs.iter().map(|j| j.name().to_string()).collect();
        graph.register(BUILD_TASK, producers, None)?;
        debug!(tasks = graph.tasks().count(), "site graph registered");

        Ok(Self {
            config,
            runner: Runner::new(Arc::new(graph)),
            jobs,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn runner(&self) -> &Runner {
        &self.runner
    }

    pub fn producers(&self) -> Vec<TaskName> {
        self.jobs.iter().map(|j| j.name().to_string()).collect()
    }

    /// Group for an entry point, before resolution.
    pub fn group_for(&self, entry: &EntryPoint) -> TaskGroup {
        match entry {
            EntryPoint::Default | EntryPoint::Build => TaskGroup::new()
                .then(CLEAN_TASK)
                .parallel(self.producers())
                .then(BUILD_TASK),
            EntryPoint::Clean => TaskGroup::new().then(CLEAN_TASK),
            EntryPoint::Watch => TaskGroup::new(),
            EntryPoint::Task(name) => TaskGroup::new().then(name.clone()),
        }
    }

    /// Resolved plan for an entry point. Empty for `watch`.
    pub fn plan_for(&self, entry: &EntryPoint) -> Result<Plan> {
        let group = self.group_for(entry);
        Ok(self.runner.graph().resolve_order(&group)?)
    }

    /// One subscription per producer, watching its `watch` globs.
    pub fn subscriptions(&self) -> Result<Vec<WatchSubscription>> {
        let mut subs = Vec::new();
        for (name, task) in self.config.tasks_in_order() {
            subs.push(WatchSubscription::new(
                name,
                task.effective_watch().to_vec(),
                task.exclude.clone(),
                task.reload.clone(),
            )?);
        }
        Ok(subs)
    }

    /// Check that no two producers write the same destination path.
    pub async fn check_outputs(&self) -> Result<()> {
        let jobs = self.jobs.clone();
        tokio::task::spawn_blocking(move || check_disjoint_outputs(&jobs))
            .await
            .context("output check panicked")?
    }
}
