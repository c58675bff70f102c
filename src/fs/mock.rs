// src/fs/mock.rs

use super::FileSystem;
use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, modified: SystemTime },
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    entries: HashMap<PathBuf, MockEntry>,
    /// Seconds since the epoch handed out to the next write.
    clock: u64,
}

/// In-memory filesystem with a logical clock.
///
/// Every write gets a modification time one second later than the previous
/// write, so "written later" always means "newer" without sleeping.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut entries = HashMap::new();
        // Ensure root exists
        entries.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            state: Arc::new(Mutex::new(MockState {
                entries,
                clock: 1_000_000,
            })),
        }
    }

    /// Add (or overwrite) a file, stamped with the next clock tick.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.state.lock().unwrap();
        state.clock += 1;
        let modified = UNIX_EPOCH + Duration::from_secs(state.clock);
        Self::insert_file(&mut state.entries, path.as_ref(), content.into(), modified);
    }

    /// Contents of a file, if present.
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        let state = self.state.lock().unwrap();
        match state.entries.get(path.as_ref()) {
            Some(MockEntry::File { content, .. }) => Some(content.clone()),
            _ => None,
        }
    }

    fn insert_file(
        entries: &mut HashMap<PathBuf, MockEntry>,
        path: &Path,
        content: Vec<u8>,
        modified: SystemTime,
    ) {
        entries.insert(path.to_path_buf(), MockEntry::File { content, modified });

        // Ensure parent directories exist implicitly for simplicity in this mock
        if let Some(parent) = path.parent() {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };

            Self::ensure_dir_entry(entries, parent);
            Self::link_child(entries, parent, path);
        }
    }

    fn ensure_dir_entry(entries: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if entries.contains_key(path) {
            return;
        }
        entries.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        if let Some(parent) = path.parent() {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };

            if parent != path {
                // Avoid infinite loop at root
                Self::ensure_dir_entry(entries, parent);
                Self::link_child(entries, parent, path);
            }
        }
    }

    fn link_child(entries: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
        if let Some(MockEntry::Dir(children)) = entries.get_mut(parent) {
            if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.entries.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(path), Some(MockEntry::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        matches!(state.entries.get(path), Some(MockEntry::Dir(_)))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }

    fn modified(&self, path: &Path) -> Result<SystemTime> {
        let state = self.state.lock().unwrap();
        match state.entries.get(path) {
            Some(MockEntry::File { modified, .. }) => Ok(*modified),
            Some(MockEntry::Dir(_)) => Err(anyhow!("Is a directory: {:?}", path)),
            None => Err(anyhow!("File not found: {:?}", path)),
        }
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let content = self
            .read(from)
            .ok_or_else(|| anyhow!("File not found: {:?}", from))?;
        self.add_file(to, content);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.entries.retain(|p, _| !p.starts_with(path));
        if let Some(parent) = path.parent() {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            if let (Some(MockEntry::Dir(children)), Some(name)) = (
                state.entries.get_mut(parent),
                path.file_name().and_then(|n| n.to_str()),
            ) {
                children.retain(|c| c != name);
            }
        }
        Ok(())
    }
}
