//! Watcher error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while setting up the filesystem watcher.
///
/// Errors that arrive after startup are logged by the watcher itself.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The OS notification backend refused the watch.
    #[error("Filesystem watch failed: {0}")]
    Notify(#[from] notify::Error),

    /// A watched directory could not be prepared.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WatchError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
