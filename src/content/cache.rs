//! Load-once content cache.
//!
//! Built a single time at startup and never mutated afterwards. Handlers
//! share it through an `Arc` and read it without locking.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::content::{read_text, ContentError};

/// Text of every file under the root, keyed by canonical path.
#[derive(Debug, Default)]
pub struct ContentCache {
    entries: HashMap<PathBuf, String>,
    total_bytes: usize,
}

impl ContentCache {
    /// Read the root (a file, or every regular file beneath a directory).
    ///
    /// Failures are logged and leave the affected entries out; a query for a
    /// missing entry simply finds nothing.
    pub async fn load(root: &Path) -> Self {
        let mut cache = Self::default();

        let metadata = match tokio::fs::metadata(root).await {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(
                    root = %root.display(),
                    error = %e,
                    "Root unreadable at startup, cache left empty"
                );
                return cache;
            }
        };

        if metadata.is_dir() {
            cache.load_tree(root).await;
        } else {
            cache.load_file(root.to_path_buf()).await;
        }

        tracing::info!(
            root = %root.display(),
            files = cache.entries.len(),
            bytes = cache.total_bytes,
            "Content cache loaded"
        );
        cache
    }

    async fn load_tree(&mut self, root: &Path) {
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
                    continue;
                }
            };

            loop {
                let entry = match entries.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(dir = %dir.display(), error = %e, "Directory listing interrupted");
                        break;
                    }
                };
                let file_type = match entry.file_type().await {
                    Ok(t) => t,
                    Err(_) => continue,
                };

                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    self.load_file(entry.path()).await;
                } else if file_type.is_symlink() {
                    self.load_symlink(root, entry.path()).await;
                }
            }
        }
    }

    // Symlinked files are cached under their target when the target stays
    // inside the root; symlinked directories are not followed.
    async fn load_symlink(&mut self, root: &Path, link: PathBuf) {
        let Ok(target) = tokio::fs::canonicalize(&link).await else {
            return;
        };
        if !target.starts_with(root) || self.entries.contains_key(&target) {
            return;
        }
        if let Ok(metadata) = tokio::fs::metadata(&target).await {
            if metadata.is_file() {
                self.load_file(target).await;
            }
        }
    }

    async fn load_file(&mut self, path: PathBuf) {
        match read_text(&path).await {
            Ok(text) => {
                self.total_bytes += text.len();
                self.entries.insert(path, text);
            }
            Err(ContentError::Read { path, source }) => {
                tracing::warn!(path = %path.display(), error = %source, "Skipping unreadable file");
            }
        }
    }

    /// Cached text for a canonical path.
    pub fn get(&self, path: &Path) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total size of cached text in bytes.
    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }
}
