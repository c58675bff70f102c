// src/watch/watcher.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use anyhow::{Context as _, Result};
use futures::Stream;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::patterns::{glob_base, is_recursive};
use crate::watch::subscription::WatchSubscription;

/// A single changed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    /// Index of the subscription whose observer saw the change. `None`
    /// means "check every subscription".
    pub subscription: Option<usize>,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            subscription: None,
        }
    }
}

/// Stream of filesystem changes from every observer.
///
/// The stream is lazy and never ends on its own while observers are alive.
/// Dropping it stops all observers; it cannot be restarted.
pub struct ChangeEvents {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    _observers: Vec<RecommendedWatcher>,
}

impl fmt::Debug for ChangeEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeEvents")
            .field("observers", &self._observers.len())
            .finish()
    }
}

impl ChangeEvents {
    /// A stream fed by a plain channel instead of filesystem observers.
    pub fn from_channel(rx: mpsc::UnboundedReceiver<ChangeEvent>) -> Self {
        Self {
            rx,
            _observers: Vec::new(),
        }
    }
}

impl Stream for ChangeEvents {
    type Item = ChangeEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Start one `notify` observer per subscription pattern.
///
/// Each observer watches the pattern's glob base below `src_root`,
/// recursively only when the pattern can match deeper than its base. A
/// base directory that doesn't exist is skipped with a warning.
pub fn spawn_observers(src_root: &Path, subscriptions: &[WatchSubscription]) -> Result<ChangeEvents> {
    let (tx, rx) = mpsc::unbounded_channel::<ChangeEvent>();
    let mut observers = Vec::new();

    for (index, sub) in subscriptions.iter().enumerate() {
        for pattern in sub.patterns() {
            let dir = src_root.join(glob_base(pattern));
            if !dir.is_dir() {
                warn!(task = %sub.owner(), %pattern, dir = ?dir, "watch directory does not exist; skipping");
                continue;
            }
            let mode = if is_recursive(pattern) {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };

            let mut observer = RecommendedWatcher::new(forwarder(tx.clone(), index), Config::default())
                .context("creating file watcher")?;
            observer
                .watch(&dir, mode)
                .with_context(|| format!("watching {:?}", dir))?;

            info!(task = %sub.owner(), %pattern, dir = ?dir, ?mode, "observer started");
            observers.push(observer);
        }
    }

    Ok(ChangeEvents {
        rx,
        _observers: observers,
    })
}

/// Closure called synchronously by notify whenever an event arrives.
fn forwarder(
    tx: mpsc::UnboundedSender<ChangeEvent>,
    subscription: usize,
) -> impl Fn(notify::Result<Event>) + Send + 'static {
    move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            debug!(?event, "received notify event");
            for path in event.paths {
                // Receiver gone means the watch loop has ended.
                let _ = tx.send(ChangeEvent {
                    path,
                    subscription: Some(subscription),
                });
            }
        }
        Err(err) => {
            eprintln!("sitepipe: file watch error: {err}");
        }
    }
}
