// src/dag/mod.rs

//! Task graph and execution plans.
//!
//! - [`task`] defines a single named task and its unit of work.
//! - [`graph`] holds the registry of tasks and resolves groups into plans.
//! - [`group`] contains the sequential/parallel [`TaskGroup`] description
//!   and the resolved [`Plan`].

pub mod graph;
pub mod group;
pub mod task;

pub use graph::TaskGraph;
pub use group::{GroupElement, Plan, TaskGroup};
pub use task::{work_fn, Task, TaskWork};
