// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::group::{Plan, TaskGroup};
use crate::dag::task::{Task, TaskWork};
use crate::engine::TaskName;
use crate::errors::RegistrationError;

/// Registry of named tasks and their predecessors.
///
/// Predecessors must be registered before the tasks that name them, so the
/// predecessor relation is acyclic by construction. Cycles can still be
/// introduced by a [`TaskGroup`] whose ordering contradicts the
/// predecessors; [`TaskGraph::resolve_order`] reports those.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: HashMap<TaskName, Task>,
    /// Registration order, used for deterministic iteration.
    order: Vec<TaskName>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task.
    ///
    /// `work = None` registers a structural task that succeeds immediately
    /// once its predecessors have.
    pub fn register<N, I, P>(
        &mut self,
        name: N,
        predecessors: I,
        work: Option<TaskWork>,
    ) -> Result<(), RegistrationError>
    where
        N: Into<TaskName>,
        I: IntoIterator<Item = P>,
        P: Into<TaskName>,
    {
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(RegistrationError::DuplicateTask(name));
        }

        let mut preds: Vec<TaskName> = Vec::new();
        for pred in predecessors.into_iter().map(Into::into) {
            if pred == name {
                return Err(RegistrationError::CyclicDependency(vec![name.clone(), name]));
            }
            if !self.tasks.contains_key(&pred) {
                return Err(RegistrationError::UnknownPredecessor {
                    task: name,
                    predecessor: pred,
                });
            }
            if !preds.contains(&pred) {
                preds.push(pred);
            }
        }

        debug!(task = %name, predecessors = ?preds, structural = work.is_none(), "registered task");
        self.order.push(name.clone());
        self.tasks.insert(name.clone(), Task::new(name, preds, work));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    /// Registered tasks in registration order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|name| self.tasks.get(name))
    }

    /// Expand a mixed sequential/parallel group into an executable [`Plan`].
    ///
    /// - Every task named in the group is included, along with its
    ///   transitive predecessors.
    /// - Each task of element `i` is ordered before each task of element
    ///   `i + 1`; predecessors are ordered before their dependents.
    /// - A task's stage is the length of the longest ordering chain that
    ///   leads to it, so unrelated tasks share a stage.
    ///
    /// Naming the same task in two elements orders it before itself and is
    /// reported as a cycle.
    pub fn resolve_order(&self, group: &TaskGroup) -> Result<Plan, RegistrationError> {
        let mut discovered: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for element in group.elements() {
            for name in element.names() {
                self.collect_with_predecessors(name, &mut discovered, &mut seen)?;
            }
        }

        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in discovered.iter().copied() {
            graph.add_node(name);
        }
        for name in discovered.iter().copied() {
            if let Some(task) = self.tasks.get(name) {
                for pred in task.predecessors() {
                    graph.add_edge(pred.as_str(), name, ());
                }
            }
        }
        for pair in group.elements().windows(2) {
            for before in pair[0].names() {
                for after in pair[1].names() {
                    graph.add_edge(before.as_str(), after.as_str(), ());
                }
            }
        }

        if let Some(cycle) = find_cycle(&graph, &discovered) {
            return Err(RegistrationError::CyclicDependency(cycle));
        }

        let topo = toposort(&graph, None).map_err(|cycle| {
            RegistrationError::CyclicDependency(vec![cycle.node_id().to_string()])
        })?;

        let mut depth: HashMap<&str, usize> = HashMap::new();
        for node in topo {
            let here = depth.get(node).copied().unwrap_or(0);
            for next in graph.neighbors(node) {
                let entry = depth.entry(next).or_insert(0);
                *entry = (*entry).max(here + 1);
            }
        }

        let stage_count = discovered
            .iter()
            .map(|name| depth.get(name).copied().unwrap_or(0))
            .max()
            .map_or(0, |d| d + 1);
        let mut stages: Vec<Vec<TaskName>> = vec![Vec::new(); stage_count];
        for name in discovered {
            let d = depth.get(name).copied().unwrap_or(0);
            stages[d].push(name.to_string());
        }

        let plan = Plan::from_stages(stages);
        debug!(%plan, "resolved execution plan");
        Ok(plan)
    }

    /// Depth-first, predecessors before the task itself.
    fn collect_with_predecessors<'a>(
        &'a self,
        name: &'a str,
        out: &mut Vec<&'a str>,
        seen: &mut HashSet<&'a str>,
    ) -> Result<(), RegistrationError> {
        if seen.contains(name) {
            return Ok(());
        }
        let task = self
            .tasks
            .get(name)
            .ok_or_else(|| RegistrationError::UnknownTask(name.to_string()))?;

        for pred in task.predecessors() {
            self.collect_with_predecessors(pred, out, seen)?;
        }

        seen.insert(name);
        out.push(name);
        Ok(())
    }
}

/// Return one cycle of the graph, spelled out from its first discovered
/// member back to itself (`a -> b -> a`), or `None` if the graph is acyclic.
fn find_cycle(graph: &DiGraphMap<&str, ()>, discovered: &[&str]) -> Option<Vec<TaskName>> {
    let position = |name: &str| discovered.iter().position(|n| *n == name).unwrap_or(usize::MAX);

    let mut cyclic: Vec<Vec<&str>> = tarjan_scc(graph)
        .into_iter()
        .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
        .collect();
    cyclic.sort_by_key(|scc| scc.iter().map(|n| position(*n)).min());

    let scc = cyclic.into_iter().next()?;
    let members: HashSet<&str> = scc.iter().copied().collect();
    let start = scc.iter().copied().min_by_key(|n| position(*n))?;

    let mut path = vec![start];
    let mut visited = HashSet::from([start]);
    if walk_back_to(graph, &members, start, start, &mut path, &mut visited) {
        Some(path.into_iter().map(str::to_string).collect())
    } else {
        Some(scc.into_iter().map(str::to_string).collect())
    }
}

fn walk_back_to<'a>(
    graph: &DiGraphMap<&'a str, ()>,
    members: &HashSet<&'a str>,
    current: &'a str,
    start: &'a str,
    path: &mut Vec<&'a str>,
    visited: &mut HashSet<&'a str>,
) -> bool {
    for next in graph.neighbors(current) {
        if !members.contains(next) {
            continue;
        }
        if next == start {
            path.push(next);
            return true;
        }
        if visited.insert(next) {
            path.push(next);
            if walk_back_to(graph, members, next, start, path, visited) {
                return true;
            }
            path.pop();
        }
    }
    false
}
