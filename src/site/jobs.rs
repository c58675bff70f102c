// src/site/jobs.rs

//! Work functions behind the registered tasks.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::copy::{Copier, SourceFile, SourceSelection};
use crate::dag::{work_fn, TaskWork};
use crate::engine::{RunSettings, TaskName};
use crate::errors::{Result, SitepipeError};
use crate::exec::Validator;
use crate::fs::FileSystem;

/// A producer task: select, optionally filter to changed files, validate,
/// then copy into the destination.
pub struct CopyJob {
    name: TaskName,
    selection: SourceSelection,
    dest_dir: PathBuf,
    changed_only: bool,
    validators: Vec<Arc<dyn Validator>>,
    copier: Copier,
}

impl fmt::Debug for CopyJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyJob")
            .field("name", &self.name)
            .field("selection", &self.selection)
            .field("dest_dir", &self.dest_dir)
            .field("changed_only", &self.changed_only)
            .field(
                "validators",
                &self.validators.iter().map(|v| v.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl CopyJob {
    pub fn new(
        name: impl Into<TaskName>,
        selection: SourceSelection,
        dest_dir: impl Into<PathBuf>,
        changed_only: bool,
        validators: Vec<Arc<dyn Validator>>,
        copier: Copier,
    ) -> Self {
        Self {
            name: name.into(),
            selection,
            dest_dir: dest_dir.into(),
            changed_only,
            validators,
            copier,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every file this job would write, as (source, destination). Ignores
    /// `changed_only`.
    pub fn outputs(&self) -> anyhow::Result<Vec<(PathBuf, PathBuf)>> {
        Ok(self
            .copier
            .select(&self.selection)?
            .into_iter()
            .map(|f| {
                let dest = f.destination(&self.dest_dir);
                (f.path, dest)
            })
            .collect())
    }

    fn pending_files(&self) -> anyhow::Result<Vec<SourceFile>> {
        let files = self.copier.select(&self.selection)?;
        if self.changed_only {
            self.copier.stale_only(files, &self.dest_dir)
        } else {
            Ok(files)
        }
    }

    pub fn into_work(self: Arc<Self>) -> TaskWork {
        work_fn(move |settings| {
            let job = Arc::clone(&self);
            async move { job.run(settings).await }
        })
    }

    pub async fn run(self: Arc<Self>, settings: RunSettings) -> Result<()> {
        let job = Arc::clone(&self);
        let files = tokio::task::spawn_blocking(move || job.pending_files())
            .await
            .context("file selection panicked")??;

        if files.is_empty() {
            info!(task = %self.name, "nothing to do");
            return Ok(());
        }
        debug!(task = %self.name, files = files.len(), "selected files");

        self.validate(&files, settings).await?;

        let copier = self.copier.clone();
        let dest_dir = self.dest_dir.clone();
        let copied = tokio::task::spawn_blocking(move || copier.copy_files(&files, &dest_dir))
            .await
            .context("copy panicked")??;

        info!(task = %self.name, copied, dest = ?self.dest_dir, "copied files");
        Ok(())
    }

    async fn validate(&self, files: &[SourceFile], settings: RunSettings) -> Result<()> {
        if self.validators.is_empty() {
            return Ok(());
        }
        let paths: Vec<PathBuf> = files.iter().map(|f| f.path.clone()).collect();

        for validator in &self.validators {
            let strictness = validator.strictness(settings.strictness);
            let report = validator.validate(&paths).await?;
            for diagnostic in &report.diagnostics {
                eprintln!("{diagnostic}");
            }

            if !report.passes(strictness) {
                return Err(SitepipeError::Validation {
                    task: self.name.clone(),
                    validator: validator.name().to_string(),
                    errors: report.errors(),
                    warnings: report.warnings(),
                });
            }
            if !report.diagnostics.is_empty() {
                warn!(
                    task = %self.name,
                    validator = %validator.name(),
                    warnings = report.warnings(),
                    %strictness,
                    "validator reported warnings; continuing"
                );
            }
        }
        Ok(())
    }
}

/// Work for the `clean` task: remove the destination root.
pub fn clean_work(fs: Arc<dyn FileSystem>, dist: PathBuf) -> TaskWork {
    work_fn(move |_settings| {
        let fs = Arc::clone(&fs);
        let dist = dist.clone();
        async move {
            info!(dist = ?dist, "removing destination root");
            tokio::task::spawn_blocking(move || fs.remove_dir_all(&dist))
                .await
                .context("clean panicked")??;
            Ok(())
        }
    })
}
