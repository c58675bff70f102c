// src/engine/runner.rs

use std::fmt;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, error, info, warn};

use crate::dag::{Plan, TaskGraph};
use crate::errors::{RegistrationError, Result, SitepipeError};

use super::{RunSettings, TaskName, TaskOutcome};

/// First failure observed in a run.
#[derive(Debug)]
pub struct TaskFailure {
    pub task: TaskName,
    pub error: SitepipeError,
}

/// Result of executing a [`Plan`].
#[derive(Debug, Default)]
pub struct RunReport {
    /// Every task that was started, in the order it settled.
    pub settled: Vec<(TaskName, TaskOutcome)>,
    /// Tasks in stages after a failed stage; never started.
    pub not_started: Vec<TaskName>,
    failure: Option<TaskFailure>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        self.failure.as_ref()
    }

    pub fn outcome_of(&self, task: &str) -> Option<TaskOutcome> {
        self.settled
            .iter()
            .find(|(name, _)| name == task)
            .map(|(_, outcome)| *outcome)
    }

    /// Turn a failed report into `TaskFailed` carrying the recorded error.
    pub fn into_result(self) -> Result<()> {
        match self.failure {
            Some(TaskFailure { task, error }) => Err(SitepipeError::TaskFailed {
                task,
                source: Box::new(error),
            }),
            None => Ok(()),
        }
    }
}

/// Executes plans against a shared [`TaskGraph`].
///
/// The runner itself does no IO; it only invokes work functions. All tasks
/// of a stage are polled concurrently on the caller's task, so "parallel"
/// means interleaved at await points, not spread across threads.
#[derive(Clone)]
pub struct Runner {
    graph: Arc<TaskGraph>,
}

impl fmt::Debug for Runner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runner").finish_non_exhaustive()
    }
}

impl Runner {
    pub fn new(graph: Arc<TaskGraph>) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Execute `plan` stage by stage.
    ///
    /// Within a stage every task is started immediately and every outcome is
    /// awaited, even after a failure. The first failure (in settle order) is
    /// recorded and the remaining stages are skipped.
    pub async fn run(&self, plan: &Plan, settings: RunSettings) -> RunReport {
        let mut report = RunReport::default();
        info!(%plan, strictness = %settings.strictness, "running plan");

        for (index, stage) in plan.stages().iter().enumerate() {
            if report.failure.is_some() {
                report.not_started.extend(stage.iter().cloned());
                continue;
            }

            debug!(stage = index, tasks = ?stage, "starting stage");
            let mut in_flight = FuturesUnordered::new();
            for name in stage {
                in_flight.push(self.invoke(name.clone(), settings));
            }

            while let Some((name, result)) = in_flight.next().await {
                match result {
                    Ok(()) => report.settled.push((name, TaskOutcome::Success)),
                    Err(err) => {
                        report.settled.push((name.clone(), TaskOutcome::Failed));
                        if report.failure.is_none() {
                            report.failure = Some(TaskFailure {
                                task: name,
                                error: err,
                            });
                        } else {
                            warn!(task = %name, error = %err, "additional failure in stage");
                        }
                    }
                }
            }

            if let Some(failure) = &report.failure {
                error!(
                    stage = index,
                    task = %failure.task,
                    error = %failure.error,
                    "stage failed; skipping remaining stages"
                );
            }
        }

        if report.succeeded() {
            info!(tasks = report.settled.len(), "plan finished successfully");
        }
        report
    }

    /// Run a single task without its predecessors.
    ///
    /// Used by watch mode, which re-enters the pipeline one task at a time.
    pub async fn run_task(&self, name: &str, settings: RunSettings) -> Result<()> {
        let (_, result) = self.invoke(name.to_string(), settings).await;
        result
    }

    async fn invoke(&self, name: TaskName, settings: RunSettings) -> (TaskName, Result<()>) {
        let Some(task) = self.graph.get(&name) else {
            return (
                name.clone(),
                Err(RegistrationError::UnknownTask(name).into()),
            );
        };

        let work = task.invoke(settings);
        info!(task = %name, "task started");
        let result = work.await;
        match &result {
            Ok(()) => info!(task = %name, "task finished"),
            Err(err) => error!(task = %name, error = %err, "task failed"),
        }
        (name, result)
    }
}
