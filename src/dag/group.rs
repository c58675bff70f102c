// src/dag/group.rs

//! Sequential/parallel task groups and the resolved execution plan.

use std::fmt;

use crate::engine::TaskName;

/// One element of a [`TaskGroup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupElement {
    /// A single task that runs on its own.
    Task(TaskName),
    /// Tasks started together; the element settles when all of them have.
    Parallel(Vec<TaskName>),
}

impl GroupElement {
    pub fn names(&self) -> &[TaskName] {
        match self {
            GroupElement::Task(name) => std::slice::from_ref(name),
            GroupElement::Parallel(names) => names,
        }
    }
}

/// An ordered sequence of elements: element N+1 never starts before
/// element N has fully settled.
///
/// ```
/// use sitepipe::dag::TaskGroup;
///
/// let group = TaskGroup::new().then("clean").parallel(["images", "css"]);
/// assert_eq!(group.elements().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGroup {
    elements: Vec<GroupElement>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single task.
    pub fn then(mut self, name: impl Into<TaskName>) -> Self {
        self.elements.push(GroupElement::Task(name.into()));
        self
    }

    /// Append a set of tasks to run concurrently.
    pub fn parallel<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        let names: Vec<TaskName> = names.into_iter().map(Into::into).collect();
        if !names.is_empty() {
            self.elements.push(GroupElement::Parallel(names));
        }
        self
    }

    pub fn elements(&self) -> &[GroupElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Executable form of a [`TaskGroup`]: ordered stages of tasks.
///
/// Tasks within a stage have no ordering constraint between them and may
/// run concurrently. Every predecessor of a task sits in an earlier stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    stages: Vec<Vec<TaskName>>,
}

impl Plan {
    pub(crate) fn from_stages(stages: Vec<Vec<TaskName>>) -> Self {
        Self { stages }
    }

    pub fn stages(&self) -> &[Vec<TaskName>] {
        &self.stages
    }

    /// All task names in execution order.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().flatten().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.stages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .stages
            .iter()
            .map(|stage| match stage.as_slice() {
                [single] => single.clone(),
                many => format!("[{}]", many.join(", ")),
            })
            .collect();
        write!(f, "{}", parts.join(" -> "))
    }
}
