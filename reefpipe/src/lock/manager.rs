//! Exclusive-create lock files over a shared directory.

use crate::quad::QuadKey;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from lock operations.
///
/// Contention is deliberately not represented here:
/// [`LockManager::try_acquire`] reports a lost race as `Ok(None)`.
#[derive(Debug, Error)]
pub enum LockError {
    /// Lock directory missing or unwritable
    #[error("lock directory '{dir}' unusable: {source}")]
    Directory {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Creating or removing a lock file failed for a reason other than
    /// contention
    #[error("lock I/O for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Acquires and sweeps per-quad lock files under a shared directory.
///
/// The directory must be visible to every worker process (NFS on SLURM
/// clusters). Creation uses `create_new`, which maps to `O_EXCL`: if two
/// workers race, exactly one succeeds and the other observes
/// `AlreadyExists`. Check-then-create would be a race and is never used.
#[derive(Debug, Clone)]
pub struct LockManager {
    lock_dir: PathBuf,
}

impl LockManager {
    /// Create the manager, ensuring the lock directory exists.
    pub fn new(lock_dir: impl Into<PathBuf>) -> Result<Self, LockError> {
        let lock_dir = lock_dir.into();
        fs::create_dir_all(&lock_dir).map_err(|source| LockError::Directory {
            dir: lock_dir.clone(),
            source,
        })?;
        Ok(Self { lock_dir })
    }

    fn lock_path(&self, key: &QuadKey) -> PathBuf {
        self.lock_dir.join(format!("{}.lock", key.label()))
    }

    /// Attempt to claim the quad.
    ///
    /// Returns `Ok(None)` when another worker holds the lock; the caller
    /// skips the quad cleanly. The returned [`QuadLock`] removes the lock
    /// file when dropped, so release happens even when processing errors.
    pub fn try_acquire(&self, key: &QuadKey) -> Result<Option<QuadLock>, LockError> {
        let path = self.lock_path(key);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Owner identity for operators inspecting stale locks
                let _ = writeln!(file, "pid={}", std::process::id());
                let _ = writeln!(file, "acquired={}", chrono::Utc::now().to_rfc3339());
                debug!(quad = %key, "lock acquired");
                Ok(Some(QuadLock {
                    label: key.label(),
                    path,
                    released: false,
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                debug!(quad = %key, "lock held elsewhere, skipping");
                Ok(None)
            }
            Err(source) => Err(LockError::Io { path, source }),
        }
    }

    /// Whether a lock file currently exists for the quad.
    pub fn is_held(&self, key: &QuadKey) -> bool {
        self.lock_path(key).is_file()
    }

    /// Remove lock files older than `max_age`, returning their labels.
    ///
    /// Never called from the processing path: a worker that merely lost a
    /// race must not reap a live peer's lock. Operators run this after
    /// confirming no workers are active, or with an age comfortably above
    /// the job wall-clock limit.
    pub fn sweep_stale(&self, max_age: Duration) -> Result<Vec<String>, LockError> {
        let mut swept = Vec::new();
        let entries = fs::read_dir(&self.lock_dir).map_err(|source| LockError::Directory {
            dir: self.lock_dir.clone(),
            source,
        })?;
        let now = SystemTime::now();
        for entry in entries {
            let entry = entry.map_err(|source| LockError::Directory {
                dir: self.lock_dir.clone(),
                source,
            })?;
            let path = entry.path();
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) if n.ends_with(".lock") => n.trim_end_matches(".lock").to_string(),
                _ => continue,
            };
            let age = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|mtime| now.duration_since(mtime).ok());
            match age {
                Some(age) if age >= max_age => {
                    fs::remove_file(&path).map_err(|source| LockError::Io {
                        path: path.clone(),
                        source,
                    })?;
                    warn!(quad = %name, age_secs = age.as_secs(), "swept stale lock");
                    swept.push(name);
                }
                _ => {}
            }
        }
        swept.sort();
        Ok(swept)
    }
}

/// Ownership of one quad's lock file.
///
/// Dropping the guard removes the file; [`release`](QuadLock::release)
/// does the same but surfaces removal errors.
#[derive(Debug)]
pub struct QuadLock {
    label: String,
    path: PathBuf,
    released: bool,
}

impl QuadLock {
    /// Label of the locked quad.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Path of the lock file, for diagnostics.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the lock file, consuming the guard.
    pub fn release(mut self) -> Result<(), LockError> {
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(LockError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}

impl Drop for QuadLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(quad = %self.label, error = %e, "failed to remove lock file on drop");
            }
        }
    }
}
