use std::io;
use std::path::{Path, PathBuf};

use crate::core::config::SecurityConfig;

/// Errors that can occur while validating a CLI working directory
#[derive(Debug, thiserror::Error)]
pub enum PathSecurityError {
    #[error("Path '{path}' is outside allowed root directory '{root}'")]
    OutsideRootDirectory { path: PathBuf, root: PathBuf },

    #[error("Symlink '{path}' is not allowed here")]
    SymlinkRejected { path: PathBuf },

    #[error("Path does not exist: '{path}'")]
    PathNotFound { path: PathBuf },

    #[error("Path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    #[error("IO error for path '{path}': {error}")]
    IoError { path: PathBuf, error: io::Error },
}

/// Resolves the working directory a CLI adapter will run in.
///
/// The directory must exist. When `root_path` is configured the canonical
/// directory must sit inside it, and a symlinked directory is refused
/// unless `allow_symlinks` is set. Without a root any existing directory is
/// accepted.
///
/// ```rust,ignore
/// let cwd = validate_working_dir("./web", &config.security)?;
/// ```
pub fn validate_working_dir(
    input_path: &str,
    security: &SecurityConfig,
) -> Result<PathBuf, PathSecurityError> {
    let path = Path::new(input_path);
    let canonical = canonicalize(path)?;

    if !canonical.is_dir() {
        return Err(PathSecurityError::NotADirectory { path: canonical });
    }

    let Some(root) = security.root_path.as_ref() else {
        return Ok(canonical);
    };

    let canonical_root = root.canonicalize().map_err(|e| PathSecurityError::IoError {
        path: root.clone(),
        error: e,
    })?;

    if path.is_symlink() && !security.allow_symlinks {
        return Err(PathSecurityError::SymlinkRejected {
            path: path.to_path_buf(),
        });
    }

    if !canonical.starts_with(&canonical_root) {
        return Err(PathSecurityError::OutsideRootDirectory {
            path: canonical,
            root: canonical_root,
        });
    }

    Ok(canonical)
}

fn canonicalize(path: &Path) -> Result<PathBuf, PathSecurityError> {
    path.canonicalize().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PathSecurityError::PathNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PathSecurityError::IoError {
                path: path.to_path_buf(),
                error: e,
            }
        }
    })
}
