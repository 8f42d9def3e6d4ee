//! The serialized registry: every server manifest plus generation metadata.
//!
//! The document is always regenerated and written in full. Writes go to a
//! sibling temp file first and are renamed into place, so a watcher never
//! observes a half-written registry as the final state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

use super::error::RegistryError;
use super::manifest::{ServerManifest, ToolDescriptor};

/// Snapshot of all server manifests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryDocument {
    /// Version of the generator that produced this document.
    pub version: String,
    pub last_updated: DateTime<Utc>,
    pub servers: Vec<ServerManifest>,
}

impl RegistryDocument {
    /// Build a document stamped with the crate version and the current time.
    pub fn new(servers: Vec<ServerManifest>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            last_updated: Utc::now(),
            servers,
        }
    }

    /// Read and parse a document from disk.
    pub fn read_from(path: &Path) -> Result<Self, RegistryError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RegistryError::NotFound(path.to_path_buf()));
            }
            Err(e) => return Err(RegistryError::io(path, e)),
        };

        serde_json::from_str(&raw).map_err(|source| RegistryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the document as pretty JSON, replacing any existing file atomically.
    pub fn write_to(&self, path: &Path) -> Result<(), RegistryError> {
        let json = serde_json::to_string_pretty(self)?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => std::path::PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| RegistryError::io(&dir, e))?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "registry.json".to_string());
        let tmp_path = dir.join(format!(".{}.tmp", file_name));

        {
            let mut tmp = fs::File::create(&tmp_path).map_err(|e| RegistryError::io(&tmp_path, e))?;
            tmp.write_all(json.as_bytes())
                .and_then(|_| tmp.write_all(b"\n"))
                .and_then(|_| tmp.sync_all())
                .map_err(|e| RegistryError::io(&tmp_path, e))?;
        }
        fs::rename(&tmp_path, path).map_err(|e| RegistryError::io(path, e))?;

        info!(
            "Wrote registry with {} servers and {} tools to {}",
            self.servers.len(),
            self.tool_count(),
            path.display()
        );
        debug!("Registry version {} at {}", self.version, self.last_updated);
        Ok(())
    }

    pub fn server(&self, name: &str) -> Option<&ServerManifest> {
        self.servers.iter().find(|s| s.name == name)
    }

    pub fn tool(&self, server: &str, tool: &str) -> Option<&ToolDescriptor> {
        self.server(server).and_then(|s| s.tool(tool))
    }

    pub fn tool_count(&self) -> usize {
        self.servers.iter().map(|s| s.tools.len()).sum()
    }

    /// Every `(server, tool)` identity in the document.
    pub fn tool_pairs(&self) -> BTreeSet<(String, String)> {
        self.servers
            .iter()
            .flat_map(|s| s.tools.iter().map(move |t| (s.name.clone(), t.name.clone())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::registry::manifest::ExecutionType;
    use tempfile::TempDir;

    fn sample_document() -> RegistryDocument {
        RegistryDocument::new(vec![ServerManifest {
            name: "alpha".to_string(),
            description: "Alpha system".to_string(),
            version: "1.0.0".to_string(),
            cli_prefix: None,
            api_base_url: Some("https://alpha.example.com".to_string()),
            tools: vec![ToolDescriptor::new("toolA", "Does A", ExecutionType::Api)],
            documentation: "alpha/README.md".to_string(),
        }])
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("registry.json");

        let doc = sample_document();
        doc.write_to(&path).unwrap();

        let loaded = RegistryDocument::read_from(&path).unwrap();
        assert_eq!(loaded, doc);
        assert!(!dir.path().join("nested").join(".registry.json.tmp").exists());
    }

    #[test]
    fn test_read_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = RegistryDocument::read_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn test_read_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("registry.json");
        std::fs::write(&path, "{ \"servers\": [").unwrap();
        let err = RegistryDocument::read_from(&path).unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
    }

    #[test]
    fn test_lookup_and_pairs() {
        let doc = sample_document();
        assert!(doc.tool("alpha", "toolA").is_some());
        assert!(doc.tool("alpha", "toolB").is_none());
        assert!(doc.tool("beta", "toolA").is_none());
        assert_eq!(doc.tool_count(), 1);

        let pairs = doc.tool_pairs();
        assert!(pairs.contains(&("alpha".to_string(), "toolA".to_string())));
    }
}
