// src/watch/coordinator.rs

use std::path::PathBuf;
use std::sync::Arc;

use futures::{Stream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::engine::{RunSettings, Runner, TaskName};
use crate::exec::ReloadNotifier;
use crate::patterns::relative_str;
use crate::watch::subscription::WatchSubscription;
use crate::watch::watcher::ChangeEvent;

/// Turns change events into single-task runs followed by a reload.
pub struct WatchCoordinator {
    runner: Runner,
    subscriptions: Vec<WatchSubscription>,
    notifier: Arc<dyn ReloadNotifier>,
    src_root: PathBuf,
    settings: RunSettings,
}

impl WatchCoordinator {
    pub fn new(
        runner: Runner,
        subscriptions: Vec<WatchSubscription>,
        notifier: Arc<dyn ReloadNotifier>,
        src_root: impl Into<PathBuf>,
        settings: RunSettings,
    ) -> Self {
        Self {
            runner,
            subscriptions,
            notifier,
            src_root: src_root.into(),
            settings,
        }
    }

    pub fn subscriptions(&self) -> &[WatchSubscription] {
        &self.subscriptions
    }

    /// Consume `events` until the stream ends.
    ///
    /// Failures never stop the loop; they are logged and printed.
    pub async fn run<S>(&self, mut events: S)
    where
        S: Stream<Item = ChangeEvent> + Unpin,
    {
        info!(subscriptions = self.subscriptions.len(), "watching for changes");
        while let Some(event) = events.next().await {
            self.handle_event(&event).await;
        }
        debug!("change stream ended");
    }

    /// Handle one change: run every owning task whose subscription matches,
    /// then broadcast that subscription's reload targets.
    ///
    /// Returns the tasks that were run, in order.
    pub async fn handle_event(&self, event: &ChangeEvent) -> Vec<TaskName> {
        let Some(rel) = relative_str(&self.src_root, &event.path) else {
            warn!(path = ?event.path, root = ?self.src_root, "change outside source root; ignoring");
            return Vec::new();
        };

        let candidates: Vec<&WatchSubscription> = match event.subscription {
            Some(index) => self.subscriptions.get(index).into_iter().collect(),
            None => self.subscriptions.iter().collect(),
        };

        let mut ran = Vec::new();
        for sub in candidates.into_iter().filter(|s| s.matches(&rel)) {
            let task = sub.owner();
            info!(%task, path = %rel, "change detected; re-running task");

            if let Err(err) = self.runner.run_task(task, self.settings).await {
                error!(%task, error = %err, "task failed in watch mode");
                eprintln!("sitepipe: task '{task}' failed: {err}");
            }
            ran.push(task.to_string());

            if let Err(err) = self.notifier.broadcast(sub.reload_targets()).await {
                warn!(%task, error = %err, "reload broadcast failed");
                eprintln!("sitepipe: reload broadcast failed: {err:#}");
            }
        }
        ran
    }
}
