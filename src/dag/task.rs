// src/dag/task.rs

//! Task definitions: a name, predecessors, and an optional unit of work.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::engine::{RunSettings, TaskName};
use crate::errors::Result;

/// A unit of work.
///
/// Called once per invocation with the settings of the current run. The
/// returned future is `'static` so the runner can drive several of them
/// concurrently without borrowing the graph.
pub type TaskWork = Arc<dyn Fn(RunSettings) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Wrap an async closure as a [`TaskWork`].
pub fn work_fn<F, Fut>(f: F) -> TaskWork
where
    F: Fn(RunSettings) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    Arc::new(move |settings| f(settings).boxed())
}

/// A registered task.
#[derive(Clone)]
pub struct Task {
    name: TaskName,
    predecessors: Vec<TaskName>,
    work: Option<TaskWork>,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("predecessors", &self.predecessors)
            .field("has_work", &self.work.is_some())
            .finish()
    }
}

impl Task {
    pub(crate) fn new(name: TaskName, predecessors: Vec<TaskName>, work: Option<TaskWork>) -> Self {
        Self {
            name,
            predecessors,
            work,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tasks that must complete before this one, in declaration order.
    pub fn predecessors(&self) -> &[TaskName] {
        &self.predecessors
    }

    /// Start this task's work. Structural tasks resolve immediately.
    pub fn invoke(&self, settings: RunSettings) -> BoxFuture<'static, Result<()>> {
        match &self.work {
            Some(work) => work(settings),
            None => futures::future::ready(Ok(())).boxed(),
        }
    }
}
