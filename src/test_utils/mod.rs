//! Test utilities.
//!
//! - [`init_test_logging`] - install a tracing subscriber once per test binary
//! - [`ViewTree`] - a temporary project with a view root, a cache root and an
//!   optional `vlx.toml`
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use vlx_view::test_utils::ViewTree;
//!
//! let tree = ViewTree::new().unwrap();
//! tree.write("layouts.app", "<main>@yield('content')</main>").unwrap();
//! tree.write("home", "@extends('layouts.app')@section('content')Hi@endsection").unwrap();
//!
//! let html = tree.engine().render("home", &json!({})).unwrap();
//! assert_eq!(html, "<main>Hi</main>");
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::ViewConfig;
use crate::constants::{CONFIG_FILE_NAME, DEFAULT_VIEW_EXTENSION};
use crate::engine::ViewEngine;
use crate::loader::FileSystemLoader;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Uses `level` when given, otherwise `RUST_LOG`; with neither, logging stays
/// off. Only the first call has any effect.
///
/// ```bash
/// RUST_LOG=vlx_view=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}

/// A throwaway project directory holding views.
///
/// Layout:
///
/// ```text
/// <temp>/
/// ├── views/      view root
/// ├── cache/      compiled view cache
/// └── vlx.toml    only if written with `write_config`
/// ```
pub struct ViewTree {
    temp: TempDir,
}

impl ViewTree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Fails if the temp directory cannot be created.
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().context("Failed to create temp dir")?;
        fs::create_dir_all(temp.path().join("views"))?;
        Ok(Self {
            temp,
        })
    }

    /// Project root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// View root.
    #[must_use]
    pub fn views(&self) -> PathBuf {
        self.root().join("views")
    }

    /// Cache root.
    #[must_use]
    pub fn cache(&self) -> PathBuf {
        self.root().join("cache")
    }

    /// Write the source of a view, creating directories for dotted names.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn write(&self, identity: &str, text: &str) -> Result<PathBuf> {
        let path = FileSystemLoader::new(self.views(), DEFAULT_VIEW_EXTENSION).view_path(identity);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Delete a view's source file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be removed.
    pub fn remove(&self, identity: &str) -> Result<()> {
        let path = FileSystemLoader::new(self.views(), DEFAULT_VIEW_EXTENSION).view_path(identity);
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))
    }

    /// Write `vlx.toml` at the project root.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn write_config(&self, toml: &str) -> Result<PathBuf> {
        let path = self.root().join(CONFIG_FILE_NAME);
        fs::write(&path, toml)?;
        Ok(path)
    }

    /// Configuration pointing at this tree's view and cache roots.
    #[must_use]
    pub fn config(&self) -> ViewConfig {
        ViewConfig {
            view_path: self.views(),
            cache_path: self.cache(),
            ..ViewConfig::default()
        }
    }

    /// An engine over this tree with a persistent cache.
    #[must_use]
    pub fn engine(&self) -> ViewEngine {
        ViewEngine::from_config(&self.config())
    }
}
