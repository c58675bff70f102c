// src/copy/copier.rs

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::copy::changed::is_stale;
use crate::copy::selection::{SourceFile, SourceSelection};
use crate::fs::FileSystem;

/// Copies selected source files into a destination directory, preserving
/// their structure relative to the glob base.
///
/// All methods block on filesystem IO; async callers run them through
/// `tokio::task::spawn_blocking`.
#[derive(Debug, Clone)]
pub struct Copier {
    fs: Arc<dyn FileSystem>,
}

impl Copier {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// List the files `selection` matches.
    pub fn select(&self, selection: &SourceSelection) -> Result<Vec<SourceFile>> {
        selection.collect(self.fs.as_ref())
    }

    /// Keep only files whose artifact under `dest_dir` is missing or older.
    pub fn stale_only(&self, files: Vec<SourceFile>, dest_dir: &Path) -> Result<Vec<SourceFile>> {
        let mut stale = Vec::with_capacity(files.len());
        for file in files {
            if is_stale(self.fs.as_ref(), &file, dest_dir)? {
                stale.push(file);
            } else {
                debug!(source = ?file.path, "unchanged; skipping");
            }
        }
        Ok(stale)
    }

    /// Copy `files` under `dest_dir`. Returns the number of files copied.
    pub fn copy_files(&self, files: &[SourceFile], dest_dir: &Path) -> Result<usize> {
        for file in files {
            let to = file.destination(dest_dir);
            debug!(from = ?file.path, to = ?to, "copying");
            self.fs.copy(&file.path, &to)?;
        }
        Ok(files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use std::path::PathBuf;

    #[test]
    fn copy_preserves_structure_below_base() {
        let fs = MockFileSystem::new();
        fs.add_file("src/images/logo.png", "png");
        fs.add_file("src/images/icons/x.svg", "svg");
        let copier = Copier::new(Arc::new(fs.clone()));

        let sel = SourceSelection::new("src", &["images/**/*".to_string()], &[]).unwrap();
        let files = copier.select(&sel).unwrap();
        let copied = copier.copy_files(&files, Path::new("dist/images")).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs.read(PathBuf::from("dist/images/logo.png")), Some(b"png".to_vec()));
        assert_eq!(fs.read(PathBuf::from("dist/images/icons/x.svg")), Some(b"svg".to_vec()));
    }

    #[test]
    fn stale_only_drops_up_to_date_artifacts() {
        let fs = MockFileSystem::new();
        fs.add_file("src/js/a.js", "a");
        fs.add_file("src/js/b.js", "b");
        // Written after the sources, so newer.
        fs.add_file("dist/js/a.js", "a");
        let copier = Copier::new(Arc::new(fs.clone()));

        let sel = SourceSelection::new("src", &["js/**/*.js".to_string()], &[]).unwrap();
        let files = copier.select(&sel).unwrap();
        let stale = copier.stale_only(files, Path::new("dist/js")).unwrap();

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].rel, PathBuf::from("b.js"));
    }
}
