//! The view engine.
//!
//! [`ViewEngine`] is the entry point applications call. It owns a loader, a
//! [`Compiler`], an optional [`ViewCache`] and the ambient defaults merged into
//! every render, and exposes the view-factory surface: [`render`], [`exists`],
//! [`compile`], [`view_path`] and [`cache_path`].
//!
//! A render runs:
//!
//! 1. cache lookup (validated against every template in the chain)
//! 2. compile on a miss, storing the result
//! 3. scope = ambient defaults deep-merged with the caller's data
//! 4. Tera execution of the compiled artifact
//!
//! [`render`]: ViewEngine::render
//! [`exists`]: ViewEngine::exists
//! [`compile`]: ViewEngine::compile
//! [`view_path`]: ViewEngine::view_path
//! [`cache_path`]: ViewEngine::cache_path
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use std::sync::Arc;
//! use vlx_view::engine::ViewEngine;
//! use vlx_view::loader::MemoryLoader;
//!
//! let loader = MemoryLoader::new().with("hello", "Hello, {{ name }}!");
//! let engine = ViewEngine::new(Arc::new(loader));
//!
//! let html = engine.render("hello", &json!({ "name": "<World>" })).unwrap();
//! assert_eq!(html, "Hello, &lt;World&gt;!");
//! ```

pub mod filters;
pub mod renderer;
pub mod scope;

pub use filters::{escape_html, escape_html_function, escape_html_str};
pub use scope::{RenderScope, deep_merge_json};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::ViewCache;
use crate::compiler::{CompiledArtifact, Compiler};
use crate::config::ViewConfig;
use crate::core::ViewError;
use crate::loader::{FileSystemLoader, TemplateLoader, validate_identity};

/// Compiles, caches and renders views.
pub struct ViewEngine {
    loader: Arc<dyn TemplateLoader>,
    compiler: Compiler,
    cache: Option<ViewCache>,
    ambient: Value,
}

impl std::fmt::Debug for ViewEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewEngine")
            .field("compiler", &self.compiler)
            .field("cache", &self.cache)
            .field("ambient", &self.ambient)
            .finish_non_exhaustive()
    }
}

impl ViewEngine {
    /// An engine over `loader` with an in-memory cache and no ambient values.
    #[must_use]
    pub fn new(loader: Arc<dyn TemplateLoader>) -> Self {
        Self {
            loader,
            compiler: Compiler::new(),
            cache: Some(ViewCache::in_memory()),
            ambient: Value::Object(serde_json::Map::new()),
        }
    }

    /// An engine reading views from disk as configured.
    #[must_use]
    pub fn from_config(config: &ViewConfig) -> Self {
        let loader = FileSystemLoader::new(&config.view_path, config.extension.clone());
        let cache = config.cache_enabled.then(|| {
            ViewCache::persistent(&config.cache_path).with_force_recompile(config.force_recompile)
        });

        Self::new(Arc::new(loader))
            .with_cache(cache)
            .with_ambient(Value::Object(config.ambient.clone()))
    }

    /// Replace the cache; `None` compiles on every render.
    #[must_use]
    pub fn with_cache(mut self, cache: Option<ViewCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the ambient defaults.
    #[must_use]
    pub fn with_ambient(mut self, ambient: Value) -> Self {
        self.ambient = ambient;
        self
    }

    /// Add or replace one ambient value (for example the current user).
    pub fn share(&mut self, key: impl Into<String>, value: Value) {
        if !self.ambient.is_object() {
            self.ambient = Value::Object(serde_json::Map::new());
        }
        if let Value::Object(map) = &mut self.ambient {
            map.insert(key.into(), value);
        }
    }

    /// Register a custom directive rewrite. See [`Compiler::extend`].
    pub fn extend<F>(&mut self, extension: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.compiler.extend(extension);
    }

    /// The loader views are read from.
    #[must_use]
    pub fn loader(&self) -> &dyn TemplateLoader {
        self.loader.as_ref()
    }

    /// The cache, if caching is enabled.
    #[must_use]
    pub const fn cache(&self) -> Option<&ViewCache> {
        self.cache.as_ref()
    }

    /// The ambient defaults.
    #[must_use]
    pub const fn ambient(&self) -> &Value {
        &self.ambient
    }

    /// Whether a view named `identity` exists.
    #[must_use]
    pub fn exists(&self, identity: &str) -> bool {
        validate_identity(identity).is_ok() && self.loader.exists(identity)
    }

    /// Where the source of `identity` lives.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidViewName`] for malformed identities.
    pub fn view_path(&self, identity: &str) -> Result<PathBuf, ViewError> {
        validate_identity(identity)?;
        Ok(self.loader.locate(identity))
    }

    /// Where the compiled form of `identity` is persisted, if it is.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::InvalidViewName`] for malformed identities.
    pub fn cache_path(&self, identity: &str) -> Result<Option<PathBuf>, ViewError> {
        validate_identity(identity)?;
        Ok(self.cache.as_ref().and_then(|cache| cache.entry_path(identity)))
    }

    /// Compile `identity`, going through the cache when one is configured.
    ///
    /// # Errors
    ///
    /// Returns the compile error as a downcastable [`ViewError`] with context
    /// naming the view.
    pub fn compile(&self, identity: &str) -> Result<CompiledArtifact> {
        self.compile_view(identity).with_context(|| format!("Failed to compile view '{identity}'"))
    }

    /// Render `identity` with `data` merged over the ambient defaults.
    ///
    /// `data` must be a JSON object or `null`.
    ///
    /// # Errors
    ///
    /// Any [`ViewError`] from compiling or executing the view, with context
    /// naming the view. Missing `@include` targets are not errors.
    pub fn render(&self, identity: &str, data: &Value) -> Result<String> {
        self.render_view(identity, data).with_context(|| format!("Failed to render view '{identity}'"))
    }

    fn compile_view(&self, identity: &str) -> Result<CompiledArtifact, ViewError> {
        validate_identity(identity)?;
        let compile = || self.compiler.compile(identity, self.loader.as_ref());
        match &self.cache {
            Some(cache) => cache.get_or_compile(identity, self.loader.as_ref(), compile),
            None => compile(),
        }
    }

    fn render_view(&self, identity: &str, data: &Value) -> Result<String, ViewError> {
        let artifact = self.compile_view(identity)?;
        let scope = RenderScope::merged(&self.ambient, data)?;
        renderer::execute(&artifact, &scope)
    }
}
