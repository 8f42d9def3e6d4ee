//! In-memory holder for the most recently loaded registry document.
//!
//! Readers take an `Arc` snapshot; a reload swaps the slot and never
//! mutates a document someone else is holding.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

use super::document::RegistryDocument;

/// Registry cache with explicit load and invalidate operations.
pub struct RegistryCache {
    path: PathBuf,
    slot: RwLock<Option<Arc<RegistryDocument>>>,
}

impl RegistryCache {
    /// Create an empty cache for the document at `path`. Nothing is read yet.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            slot: RwLock::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the registry, reading from disk unless `use_cache` is set and a
    /// document is already held.
    ///
    /// Returns `None` when the file is absent or unparseable; the previous
    /// document is kept in that case so callers keep serving stale data.
    pub fn load(&self, use_cache: bool) -> Option<Arc<RegistryDocument>> {
        if use_cache {
            if let Some(doc) = self.current() {
                debug!("Registry served from cache");
                return Some(doc);
            }
        }

        match RegistryDocument::read_from(&self.path) {
            Ok(doc) => {
                let doc = Arc::new(doc);
                info!(
                    "Loaded registry from {} ({} servers, {} tools)",
                    self.path.display(),
                    doc.servers.len(),
                    doc.tool_count()
                );
                *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(doc.clone());
                Some(doc)
            }
            Err(e) => {
                warn!("Registry unavailable: {}", e);
                None
            }
        }
    }

    /// The held document, without any I/O.
    pub fn current(&self) -> Option<Arc<RegistryDocument>> {
        self.slot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drop the held document so the next `load` reads from disk.
    pub fn invalidate(&self) {
        debug!("Registry cache invalidated");
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::registry::manifest::{ExecutionType, ServerManifest, ToolDescriptor};
    use tempfile::TempDir;

    fn manifest(name: &str, tools: &[&str]) -> ServerManifest {
        ServerManifest {
            name: name.to_string(),
            description: format!("{} server", name),
            version: "1.0.0".to_string(),
            cli_prefix: None,
            api_base_url: None,
            tools: tools
                .iter()
                .map(|t| ToolDescriptor::new(*t, "test tool", ExecutionType::Api))
                .collect(),
            documentation: format!("{}/README.md", name),
        }
    }

    fn write_registry(path: &Path, servers: Vec<ServerManifest>) {
        RegistryDocument::new(servers).write_to(path).unwrap();
    }

    #[test]
    fn test_cached_load_returns_same_reference() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        write_registry(&path, vec![manifest("alpha", &["toolA"])]);

        let cache = RegistryCache::new(&path);
        let first = cache.load(true).unwrap();
        let second = cache.load(true).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cached_load_skips_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        write_registry(&path, vec![manifest("alpha", &["toolA"])]);

        let cache = RegistryCache::new(&path);
        cache.load(true).unwrap();
        std::fs::remove_file(&path).unwrap();

        let doc = cache.load(true).unwrap();
        assert!(doc.server("alpha").is_some());
    }

    #[test]
    fn test_uncached_load_rereads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        write_registry(&path, vec![manifest("alpha", &["toolA"])]);

        let cache = RegistryCache::new(&path);
        let first = cache.load(true).unwrap();

        write_registry(&path, vec![manifest("beta", &["toolB"])]);
        let second = cache.load(false).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert!(second.server("beta").is_some());
        assert!(Arc::ptr_eq(&second, &cache.current().unwrap()));
    }

    #[test]
    fn test_invalidate_forces_disk_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        write_registry(&path, vec![manifest("alpha", &["toolA"])]);

        let cache = RegistryCache::new(&path);
        let first = cache.load(true).unwrap();
        cache.invalidate();
        assert!(cache.current().is_none());

        write_registry(&path, vec![manifest("alpha", &["toolA", "toolB"])]);
        let second = cache.load(true).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.tool_count(), 2);
    }

    #[test]
    fn test_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        let cache = RegistryCache::new(dir.path().join("absent.json"));
        assert!(cache.load(true).is_none());
        assert!(cache.load(false).is_none());
    }

    #[test]
    fn test_corrupt_file_keeps_previous_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        write_registry(&path, vec![manifest("alpha", &["toolA"])]);

        let cache = RegistryCache::new(&path);
        let first = cache.load(true).unwrap();

        std::fs::write(&path, "not json").unwrap();
        assert!(cache.load(false).is_none());
        assert!(Arc::ptr_eq(&first, &cache.current().unwrap()));
    }
}
