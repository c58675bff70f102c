// src/watch/mod.rs

//! Watch mode.
//!
//! - [`subscription`] compiles a task's watch/exclude globs.
//! - [`watcher`] starts `notify` observers and exposes their events as a
//!   [`ChangeEvents`] stream.
//! - [`coordinator`] consumes that stream, re-running the owning task and
//!   then broadcasting a reload.
//!
//! Nothing here is debounced: every event is one task run.

pub mod coordinator;
pub mod subscription;
pub mod watcher;

pub use coordinator::WatchCoordinator;
pub use subscription::WatchSubscription;
pub use watcher::{spawn_observers, ChangeEvent, ChangeEvents};
