// src/patterns.rs

//! Glob compilation shared by source selection and watch subscriptions.
//!
//! Patterns are relative to the source root and use `/` separators. A
//! single `*` never crosses a directory boundary, so `*.html` only matches
//! top-level pages while `images/**/*` matches the whole subtree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

/// Build a GlobSet from simple string patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Optional exclude set: `None` when there is nothing to exclude.
pub fn build_exclude_set(patterns: &[String]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        Ok(None)
    } else {
        build_globset(patterns).map(Some)
    }
}

/// The directory prefix of a pattern that contains no glob syntax.
///
/// Matched files are placed under the destination relative to this base:
/// `js/**/*.js` has base `js`, so `js/app/main.js` lands at `app/main.js`.
pub fn glob_base(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').collect();
    let mut base = PathBuf::new();
    // The last component names files, never a base directory.
    for component in &components[..components.len().saturating_sub(1)] {
        if component.is_empty() || component.contains(&['*', '?', '[', '{'][..]) {
            break;
        }
        base.push(component);
    }
    base
}

/// Whether a pattern can match below its base directory, i.e. the base
/// needs to be watched recursively.
pub fn is_recursive(pattern: &str) -> bool {
    let base_depth = glob_base(pattern).components().count();
    pattern.contains("**") || pattern.split('/').count() > base_depth + 1
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    // Lexical resolution works for deleted files, canonicalize does not.
    if let (Ok(root_abs), Ok(path_abs)) = (std::path::absolute(root), std::path::absolute(path)) {
        if let Ok(rel) = path_abs.strip_prefix(&root_abs) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    // Different absolute prefixes may name the same directory (notably
    // /private/var vs /var on macOS).
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}
