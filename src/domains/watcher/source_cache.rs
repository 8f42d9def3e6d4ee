//! Path-keyed cache of tool source files.
//!
//! Entries are keyed by absolute path under the tool-source root so that a
//! path reported by the filesystem watcher invalidates exactly the entry it
//! names.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

pub struct SourceCache {
    root: PathBuf,
    entries: RwLock<HashMap<PathBuf, Arc<String>>>,
}

impl SourceCache {
    /// Create a cache rooted at `root`. The root is canonicalised when it exists.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = root.canonicalize().unwrap_or(root);
        Self {
            root,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a path relative to the root, rejecting anything that escapes it.
    pub fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let rel = Path::new(relative);
        let escapes = rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("source path escapes tool directory: {}", relative),
            ));
        }
        Ok(self.root.join(rel))
    }

    /// Read a file relative to the root, serving it from cache when present.
    pub fn read(&self, relative: &str) -> io::Result<Arc<String>> {
        let path = self.resolve(relative)?;

        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&path)
        {
            debug!("Source cache hit: {}", path.display());
            return Ok(hit.clone());
        }

        let content = Arc::new(std::fs::read_to_string(&path)?);
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, content.clone());
        Ok(content)
    }

    /// Forget the entry for `path`. Returns whether one was held.
    pub fn invalidate(&self, path: &Path) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
            .is_some();
        if removed {
            debug!("Source cache invalidated: {}", path.display());
        }
        removed
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
