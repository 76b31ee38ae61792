//! Compiled view cache.
//!
//! [`ViewCache`] keeps compiled artifacts in memory and, when given a root
//! directory, persists them as JSON so later processes can skip compilation.
//!
//! # Validity
//!
//! An entry is served only while every template it was compiled from still has
//! the same text (see [`CompiledArtifact::is_fresh`]). Any change anywhere in
//! the chain discards the whole entry; the next compile overwrites it.
//!
//! # Concurrency
//!
//! - The in-memory map sits behind a `Mutex`
//! - [`ViewCache::get_or_compile`] holds a per-identity lock for the whole
//!   lookup-compile-store sequence, so one identity is never compiled twice at
//!   once within a process
//! - Persisted entries are read under a shared [`CacheLock`] and written under
//!   an exclusive one, with an atomic rename
//!
//! # Failure policy
//!
//! The cache never fails a render. Unreadable entries are treated as misses and
//! write failures are logged and ignored.
//!
//! # Layout on disk
//!
//! ```text
//! <cache_root>/
//! ├── .locks/
//! │   └── <sha256(identity)>.lock
//! └── <sha256(identity)>.json
//! ```

pub mod lock;

pub use lock::CacheLock;

use anyhow::{Context, Result};
use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::compiler::CompiledArtifact;
use crate::constants::CACHE_ENTRY_EXTENSION;
use crate::core::ViewError;
use crate::loader::TemplateLoader;
use crate::utils::{atomic_write, remove_files_with_extension};

/// Summary of one persisted cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryInfo {
    pub identity: String,
    pub fingerprint: String,
    pub compiled_at: String,
    pub dependencies: usize,
    pub path: PathBuf,
}

/// Cache of compiled views keyed by identity.
#[derive(Debug, Default)]
pub struct ViewCache {
    root: Option<PathBuf>,
    force_recompile: bool,
    entries: Mutex<HashMap<String, CompiledArtifact>>,
    compile_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ViewCache {
    /// A cache that lives only as long as this value.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// A cache that also persists entries under `root`.
    pub fn persistent(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    /// Always recompile, still overwriting stored entries.
    #[must_use]
    pub fn with_force_recompile(mut self, force: bool) -> Self {
        self.force_recompile = force;
        self
    }

    /// Directory persisted entries live in, if any.
    #[must_use]
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Whether lookups are bypassed.
    #[must_use]
    pub const fn force_recompile(&self) -> bool {
        self.force_recompile
    }

    /// File name of the persisted entry for `identity`.
    #[must_use]
    pub fn entry_file_name(identity: &str) -> String {
        format!("{}.{CACHE_ENTRY_EXTENSION}", entry_key(identity))
    }

    /// Path of the persisted entry for `identity`, if this cache persists.
    #[must_use]
    pub fn entry_path(&self, identity: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(Self::entry_file_name(identity)))
    }

    /// Look up a still-valid artifact for `identity`.
    ///
    /// Checks memory first, then disk. A valid disk entry is promoted into
    /// memory. Returns `None` on any miss, on a stale entry, and always when
    /// forced recompilation is on.
    pub fn get(&self, identity: &str, loader: &dyn TemplateLoader) -> Option<CompiledArtifact> {
        if self.force_recompile {
            return None;
        }

        let cached = self.lock_entries().get(identity).cloned();
        if let Some(artifact) = cached {
            if artifact.is_fresh(loader) {
                return Some(artifact);
            }
            tracing::debug!("Cached view '{}' is stale", identity);
            self.lock_entries().remove(identity);
        }

        let artifact = self.read_entry(identity)?;
        if artifact.is_fresh(loader) {
            tracing::debug!("Loaded view '{}' from persisted cache", identity);
            self.lock_entries().insert(identity.to_string(), artifact.clone());
            Some(artifact)
        } else {
            tracing::debug!("Persisted entry for '{}' is stale", identity);
            None
        }
    }

    /// Store an artifact, replacing any previous entry for its identity.
    ///
    /// Persisting is best effort; failures are logged.
    pub fn put(&self, artifact: CompiledArtifact) {
        if let Err(e) = self.write_entry(&artifact) {
            tracing::warn!("Failed to persist compiled view '{}': {:#}", artifact.identity, e);
        }
        self.lock_entries().insert(artifact.identity.clone(), artifact);
    }

    /// Return a valid cached artifact or compile, store and return a new one.
    ///
    /// At most one call per identity runs this at a time; concurrent callers
    /// for the same identity wait and then reuse the fresh entry.
    ///
    /// # Errors
    ///
    /// Propagates errors from `compile`. Cache failures are never returned.
    pub fn get_or_compile<F>(
        &self,
        identity: &str,
        loader: &dyn TemplateLoader,
        compile: F,
    ) -> Result<CompiledArtifact, ViewError>
    where
        F: FnOnce() -> Result<CompiledArtifact, ViewError>,
    {
        let lock = self.compile_lock(identity);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(artifact) = self.get(identity, loader) {
            tracing::debug!("Cache hit for view '{}'", identity);
            return Ok(artifact);
        }

        let artifact = compile()?;
        self.put(artifact.clone());
        Ok(artifact)
    }

    /// Drop the in-memory entry for `identity`. Persisted entries are left alone.
    pub fn forget(&self, identity: &str) {
        self.lock_entries().remove(identity);
    }

    /// Remove every entry, in memory and on disk. Returns the number of
    /// persisted entries deleted.
    ///
    /// # Errors
    ///
    /// Fails if the cache directory cannot be read or an entry cannot be
    /// removed.
    pub fn clear(&self) -> Result<usize> {
        self.lock_entries().clear();
        match &self.root {
            Some(root) => remove_files_with_extension(root, CACHE_ENTRY_EXTENSION),
            None => Ok(0),
        }
    }

    /// Describe every persisted entry, sorted by identity.
    ///
    /// Entries that cannot be parsed are skipped.
    ///
    /// # Errors
    ///
    /// Fails if the cache directory exists but cannot be read.
    pub fn list(&self) -> Result<Vec<CacheEntryInfo>> {
        let Some(root) = self.root.as_deref().filter(|r| r.is_dir()) else {
            return Ok(Vec::new());
        };

        let mut infos = Vec::new();
        for entry in fs::read_dir(root).with_context(|| format!("Failed to read cache directory: {}", root.display()))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(CACHE_ENTRY_EXTENSION) {
                continue;
            }
            match parse_entry(&path) {
                Ok(artifact) => infos.push(CacheEntryInfo {
                    identity: artifact.identity,
                    fingerprint: artifact.fingerprint,
                    compiled_at: artifact.compiled_at,
                    dependencies: artifact.dependencies.len(),
                    path,
                }),
                Err(e) => tracing::debug!("Skipping unreadable cache entry {}: {:#}", path.display(), e),
            }
        }
        infos.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(infos)
    }

    fn compile_lock(&self, identity: &str) -> Arc<Mutex<()>> {
        self.compile_locks.entry(identity.to_string()).or_default().clone()
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CompiledArtifact>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn read_entry(&self, identity: &str) -> Option<CompiledArtifact> {
        let root = self.root.as_deref()?;
        let path = self.entry_path(identity)?;
        if !path.is_file() {
            return None;
        }

        let result = CacheLock::acquire_shared(root, &entry_key(identity)).and_then(|_lock| parse_entry(&path));
        match result {
            Ok(artifact) if artifact.identity == identity => Some(artifact),
            Ok(artifact) => {
                tracing::warn!(
                    "Cache entry {} belongs to '{}', not '{}'; ignoring it",
                    path.display(),
                    artifact.identity,
                    identity
                );
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {:#}", path.display(), e);
                None
            }
        }
    }

    fn write_entry(&self, artifact: &CompiledArtifact) -> Result<()> {
        let (Some(root), Some(path)) = (self.root.as_deref(), self.entry_path(&artifact.identity)) else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(artifact).context("Failed to serialize compiled view")?;
        let _lock = CacheLock::acquire(root, &entry_key(&artifact.identity))?;
        atomic_write(&path, &json)?;
        tracing::debug!("Persisted compiled view '{}' to {}", artifact.identity, path.display());
        Ok(())
    }
}

fn entry_key(identity: &str) -> String {
    hex::encode(Sha256::digest(identity.as_bytes()))
}

fn parse_entry(path: &Path) -> Result<CompiledArtifact> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read cache entry: {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("Invalid cache entry: {}", path.display()))
}
