// src/watch/subscription.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::GlobSet;

use crate::engine::TaskName;
use crate::patterns::{build_exclude_set, build_globset};

/// Compiled watch patterns for a single task, plus the reload targets to
/// broadcast once that task has re-run.
///
/// Patterns are relative to the source root; [`matches`](Self::matches)
/// takes root-relative paths with forward slashes (e.g. `"css/main.css"`).
#[derive(Clone)]
pub struct WatchSubscription {
    owner: TaskName,
    patterns: Vec<String>,
    exclude: Vec<String>,
    reload: Vec<String>,
    watch_set: GlobSet,
    exclude_set: Option<GlobSet>,
}

impl fmt::Debug for WatchSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSubscription")
            .field("owner", &self.owner)
            .field("patterns", &self.patterns)
            .field("exclude", &self.exclude)
            .field("reload", &self.reload)
            .finish_non_exhaustive()
    }
}

impl WatchSubscription {
    pub fn new(
        owner: impl Into<TaskName>,
        patterns: Vec<String>,
        exclude: Vec<String>,
        reload: Vec<String>,
    ) -> Result<Self> {
        let owner = owner.into();
        let watch_set = build_globset(&patterns)
            .with_context(|| format!("building watch globset for task '{owner}'"))?;
        let exclude_set = build_exclude_set(&exclude)
            .with_context(|| format!("building exclude globset for task '{owner}'"))?;
        Ok(Self {
            owner,
            patterns,
            exclude,
            reload,
            watch_set,
            exclude_set,
        })
    }

    /// Task re-run when a matching file changes.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Targets passed to the reload broadcast. Empty reloads everything.
    pub fn reload_targets(&self) -> &[String] {
        &self.reload
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.watch_set.is_match(rel_path) {
            return false;
        }
        match &self.exclude_set {
            Some(exclude) => !exclude.is_match(rel_path),
            None => true,
        }
    }
}
