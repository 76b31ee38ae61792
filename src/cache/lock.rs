//! File locking for persisted cache entries.
//!
//! Locks live in `<cache_root>/.locks/<name>.lock` and are held for the
//! duration of a read or write of the matching entry. They are released when
//! the guard is dropped.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::utils::ensure_dir;

/// Name of the directory holding lock files inside the cache root.
pub const LOCKS_DIR: &str = ".locks";

/// A held advisory lock on one cache entry.
#[derive(Debug)]
pub struct CacheLock {
    file: File,
    path: PathBuf,
}

impl CacheLock {
    /// Block until an exclusive lock on `name` is held.
    ///
    /// # Errors
    ///
    /// Fails if the lock directory or file cannot be created, or locking fails.
    pub fn acquire(cache_dir: &Path, name: &str) -> Result<Self> {
        let (file, path) = open_lock_file(cache_dir, name)?;
        FileExt::lock_exclusive(&file).with_context(|| format!("Failed to acquire lock for: {name}"))?;
        Ok(Self {
            file,
            path,
        })
    }

    /// Block until a shared lock on `name` is held.
    ///
    /// # Errors
    ///
    /// Same as [`CacheLock::acquire`].
    pub fn acquire_shared(cache_dir: &Path, name: &str) -> Result<Self> {
        let (file, path) = open_lock_file(cache_dir, name)?;
        FileExt::lock_shared(&file).with_context(|| format!("Failed to acquire shared lock for: {name}"))?;
        Ok(Self {
            file,
            path,
        })
    }

    /// Path of the underlying lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(cache_dir: &Path, name: &str) -> Result<(File, PathBuf)> {
    let locks_dir = cache_dir.join(LOCKS_DIR);
    ensure_dir(&locks_dir)?;

    let path = locks_dir.join(format!("{name}.lock"));
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .with_context(|| format!("Failed to open lock file: {}", path.display()))?;
    Ok((file, path))
}

impl Drop for CacheLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
