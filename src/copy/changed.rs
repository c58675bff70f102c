// src/copy/changed.rs

//! Stateless change detection.
//!
//! Nothing is cached or persisted: every decision re-reads modification
//! times from the filesystem, so a restart never loses or corrupts state.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::Result;
use tracing::trace;

use crate::copy::selection::SourceFile;
use crate::fs::FileSystem;

/// A source file paired with the artifact it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub source_modified: SystemTime,
}

impl ChangeRecord {
    /// Read the current metadata for `file` as it would be placed under
    /// `dest_dir`.
    pub fn read(fs: &dyn FileSystem, file: &SourceFile, dest_dir: &Path) -> Result<Self> {
        Ok(Self {
            source: file.path.clone(),
            destination: file.destination(dest_dir),
            source_modified: fs.modified(&file.path)?,
        })
    }

    /// `true` when the artifact is missing or strictly older than the source.
    pub fn is_stale(&self, fs: &dyn FileSystem) -> Result<bool> {
        if !fs.exists(&self.destination) {
            return Ok(true);
        }
        let dest_modified = fs.modified(&self.destination)?;
        Ok(self.source_modified > dest_modified)
    }
}

/// Whether `file` must be re-processed into `dest_dir`.
pub fn is_stale(fs: &dyn FileSystem, file: &SourceFile, dest_dir: &Path) -> Result<bool> {
    let record = ChangeRecord::read(fs, file, dest_dir)?;
    let stale = record.is_stale(fs)?;
    trace!(source = ?record.source, destination = ?record.destination, stale, "change check");
    Ok(stale)
}
