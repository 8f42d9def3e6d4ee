//! Registry-specific error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading or writing the registry document.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The registry document does not exist on disk.
    #[error("Registry file not found: {0}")]
    NotFound(PathBuf),

    /// The registry document exists but is not a valid registry.
    #[error("Invalid registry file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Reading or writing the registry failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serializing the registry failed.
    #[error("Failed to serialize registry: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RegistryError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
