// src/copy/selection.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::GlobSet;
use tracing::debug;

use crate::fs::FileSystem;
use crate::patterns::{build_exclude_set, build_globset, glob_base};

/// A selected source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Location on disk (source root joined with the relative path).
    pub path: PathBuf,
    /// Path relative to the base of the glob that matched it; this is where
    /// the file lands under the destination directory.
    pub rel: PathBuf,
}

impl SourceFile {
    pub fn destination(&self, dest_dir: &Path) -> PathBuf {
        dest_dir.join(&self.rel)
    }
}

/// Compiled source globs for one task.
#[derive(Clone)]
pub struct SourceSelection {
    root: PathBuf,
    patterns: Vec<String>,
    bases: Vec<PathBuf>,
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for SourceSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSelection")
            .field("root", &self.root)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl SourceSelection {
    /// Compile `patterns` (relative to `root`) minus `exclude`.
    pub fn new(root: impl Into<PathBuf>, patterns: &[String], exclude: &[String]) -> Result<Self> {
        let include = build_globset(patterns).context("building source globset")?;
        let exclude = build_exclude_set(exclude).context("building exclude globset")?;
        Ok(Self {
            root: root.into(),
            patterns: patterns.to_vec(),
            bases: patterns.iter().map(|p| glob_base(p)).collect(),
            include,
            exclude,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether a root-relative path (forward slashes) is selected.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.base_for(rel_path).is_some()
    }

    /// Base directory of the first pattern matching `rel_path`, if the path
    /// is selected at all.
    fn base_for(&self, rel_path: &str) -> Option<&Path> {
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(rel_path) {
                return None;
            }
        }
        let first = self.include.matches(rel_path).into_iter().min()?;
        Some(&self.bases[first])
    }

    /// Collect all files under the root that this selection matches, sorted
    /// by path. A missing root selects nothing.
    pub fn collect(&self, fs: &dyn FileSystem) -> Result<Vec<SourceFile>> {
        if !fs.is_dir(&self.root) {
            debug!(root = ?self.root, "source root does not exist; nothing selected");
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        let mut stack = vec![self.root.clone()];

        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) {
                    let Ok(rel) = path.strip_prefix(&self.root) else {
                        continue;
                    };
                    let rel_str = rel.to_string_lossy().replace('\\', "/");
                    if let Some(base) = self.base_for(&rel_str) {
                        let rel = Path::new(&rel_str)
                            .strip_prefix(base)
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|_| PathBuf::from(&rel_str));
                        files.push(SourceFile { path, rel });
                    }
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn collects_relative_to_glob_base() {
        let fs = MockFileSystem::new();
        fs.add_file("site/index.html", "<html>");
        fs.add_file("site/js/app.js", "a");
        fs.add_file("site/js/vendor/x.js", "x");
        fs.add_file("site/js/notes.txt", "n");

        let sel = SourceSelection::new("site", &["js/**/*.js".to_string()], &[]).unwrap();
        let files = sel.collect(&fs).unwrap();
        let rels: Vec<_> = files.iter().map(|f| f.rel.clone()).collect();

        assert_eq!(rels, vec![PathBuf::from("app.js"), PathBuf::from("vendor/x.js")]);
    }

    #[test]
    fn exclude_wins_over_include() {
        let fs = MockFileSystem::new();
        fs.add_file("site/css/main.css", "a");
        fs.add_file("site/css/main.min.css", "b");

        let sel = SourceSelection::new(
            "site",
            &["css/*.css".to_string()],
            &["**/*.min.css".to_string()],
        )
        .unwrap();
        let files = sel.collect(&fs).unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].rel, PathBuf::from("main.css"));
    }

    #[test]
    fn missing_root_selects_nothing() {
        let fs = MockFileSystem::new();
        let sel = SourceSelection::new("nowhere", &["**/*".to_string()], &[]).unwrap();
        assert!(sel.collect(&fs).unwrap().is_empty());
    }
}
