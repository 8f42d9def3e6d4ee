//! Single-instance lock per listening port.
//!
//! The server takes an exclusive advisory lock on
//! `{lock_dir}/mcp-catalog-{port}.lock` before binding. The OS drops the
//! lock when the file handle closes, so a crashed process never leaves a
//! stale lock behind; the file itself stays on disk.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Another instance is already running on port {port} (lock file {path}{})", .holder.map(|pid| format!(", pid {}", pid)).unwrap_or_default())]
    AlreadyRunning {
        port: u16,
        path: PathBuf,
        holder: Option<u32>,
    },

    #[error("Cannot use lock file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Held for the lifetime of the server; dropping it releases the lock.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
    port: u16,
}

impl InstanceLock {
    pub fn lock_path(dir: &Path, port: u16) -> PathBuf {
        dir.join(format!("mcp-catalog-{}.lock", port))
    }

    /// Take the lock for `port` without blocking.
    pub fn acquire(dir: &Path, port: u16) -> Result<Self, LockError> {
        std::fs::create_dir_all(dir).map_err(|e| LockError::io(dir, e))?;
        let path = Self::lock_path(dir, port);

        // Not truncated on open: the current holder's PID must survive a failed attempt.
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| LockError::io(&path, e))?;

        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
                || e.kind() == io::ErrorKind::WouldBlock
            {
                let holder = read_pid(&mut file);
                warn!("Port {} is locked by another instance ({:?})", port, holder);
                return Err(LockError::AlreadyRunning { port, path, holder });
            }
            return Err(LockError::io(&path, e));
        }

        write_pid(&mut file).map_err(|e| LockError::io(&path, e))?;
        info!("Acquired instance lock {}", path.display());

        Ok(Self { file, path, port })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        match FileExt::unlock(&self.file) {
            Ok(()) => debug!("Released instance lock {}", self.path.display()),
            Err(e) => warn!("Failed to release lock {}: {}", self.path.display(), e),
        }
    }
}

fn read_pid(file: &mut File) -> Option<u32> {
    let mut contents = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut contents).ok()?;
    contents.trim().parse().ok()
}

fn write_pid(file: &mut File) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.sync_all()
}
