//! File system helpers for the view cache.
//!
//! Cache entries are written with temp-file-and-rename so a reader, in this
//! process or another, sees either the previous entry or the new one and never
//! a partial write.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Create `path` and its parents if missing.
///
/// # Errors
///
/// Fails if the directory cannot be created or `path` exists as a file.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(|| {
            format!(
                "Failed to create directory: {}\n\nCheck directory permissions and path validity",
                path.display()
            )
        })?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Atomically replace `path` with `content`.
///
/// The data is written to a temporary file in the destination directory,
/// synced, then renamed over the target.
///
/// # Errors
///
/// Fails if the parent directory cannot be created or the temp file cannot be
/// written or persisted.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)
        .with_context(|| format!("Failed to create temp file in: {}", parent.display()))?;
    temp.write_all(content)
        .with_context(|| format!("Failed to write temp file for: {}", path.display()))?;
    temp.as_file().sync_all().context("Failed to sync file to disk")?;
    temp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

    Ok(())
}

/// Remove every regular file directly inside `dir` whose extension is
/// `extension`, returning how many were removed. A missing directory counts as
/// empty.
///
/// # Errors
///
/// Fails if the directory cannot be read or a matching file cannot be removed.
pub fn remove_files_with_extension(dir: &Path, extension: &str) -> Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let mut removed = 0;
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some(extension) {
            fs::remove_file(&path).with_context(|| format!("Failed to remove: {}", path.display()))?;
            removed += 1;
        }
    }
    Ok(removed)
}
