//! Template compiler.
//!
//! Turns a view and everything it pulls in into a single Tera template. The
//! work is a sequence of whole-document text rewrites, always run in the same
//! order:
//!
//! 1. **Protect** literal `{%` and `{#` in authored text
//! 2. **Extensions** registered with [`Compiler::extend`]
//! 3. **Loops** - `@foreach`, `@for`, `@while`
//! 4. **Conditionals** - `@if`, `@elseif`, `@else`
//! 5. **Includes** - `@include`, recursively
//! 6. **Layouts** - `@extends`, `@section`, `@yield`
//! 7. **Interpolation** - `{{ }}` and `{!! !!}`, last
//!
//! Steps 1-5 run on every template as it is loaded (the view, each layout in
//! its chain, each include), so nested directives in any of them are compiled
//! before layout substitution moves fragments around. Interpolation runs once
//! over the fully assembled document.
//!
//! The compiler holds no per-compile state. Everything a compile accumulates
//! lives in a session created for that call, so one `Compiler` can
//! serve any number of concurrent compiles.
//!
//! # Example
//!
//! ```rust
//! use vlx_view::compiler::Compiler;
//! use vlx_view::loader::MemoryLoader;
//!
//! let loader = MemoryLoader::new()
//!     .with("layouts.app", "<title>@yield('title', 'Site')</title>")
//!     .with("home", "@extends('layouts.app')\n@section('title', 'Home')");
//!
//! let artifact = Compiler::new().compile("home", &loader).unwrap();
//! assert_eq!(artifact.compiled, "<title>Home</title>");
//! ```

pub mod artifact;
pub mod interpolation;
pub mod layout;
pub mod scanner;
pub mod structural;

pub use artifact::{CompiledArtifact, Dependency, chain_fingerprint, source_hash};
pub use layout::{Section, SectionOrigin, Sections};

use std::fmt;

use crate::constants::MAX_INCLUDE_DEPTH;
use crate::core::ViewError;
use crate::loader::{TemplateLoader, TemplateSource};

/// A custom directive rewrite, applied to raw template text.
pub type Extension = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Compiles views into Tera templates.
#[derive(Default)]
pub struct Compiler {
    extensions: Vec<Extension>,
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler").field("extensions", &self.extensions.len()).finish()
    }
}

impl Compiler {
    /// Create a compiler with only the built-in directives.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom rewrite.
    ///
    /// Extensions see each template's text before the built-in directive
    /// passes and run in registration order. Their output may contain host
    /// syntax (`{% … %}`) directly.
    ///
    /// ```rust
    /// use vlx_view::compiler::Compiler;
    /// use vlx_view::loader::MemoryLoader;
    ///
    /// let mut compiler = Compiler::new();
    /// compiler.extend(|text| text.replace("@datetime", "{{ now() | date(format=\"%Y\") }}"));
    ///
    /// let loader = MemoryLoader::new().with("year", "@datetime");
    /// let artifact = compiler.compile("year", &loader).unwrap();
    /// assert!(artifact.compiled.contains("now()"));
    /// ```
    pub fn extend<F>(&mut self, extension: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.extensions.push(Box::new(extension));
    }

    /// Number of registered extensions.
    #[must_use]
    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    /// Compile `identity` and everything it depends on.
    ///
    /// # Errors
    ///
    /// - [`ViewError::TemplateNotFound`] if the view or any layout is missing
    /// - [`ViewError::UnbalancedDelimiter`] for unclosed directive arguments or echoes
    /// - [`ViewError::InvalidDirective`] for unquoted names in layout directives
    /// - [`ViewError::LayoutCycleDetected`] when the `@extends` chain is too deep
    /// - [`ViewError::IncludeDepthExceeded`] when includes nest too deeply
    pub fn compile(&self, identity: &str, loader: &dyn TemplateLoader) -> Result<CompiledArtifact, ViewError> {
        let mut session = CompileSession::new(self, loader);
        let resolved = layout::resolve(&mut session, identity)?;
        let compiled = interpolation::compile_echoes(&resolved)?;
        let dependencies = session.dependencies;

        tracing::debug!("Compiled view '{}' from {} template(s)", identity, dependencies.len());

        Ok(CompiledArtifact {
            identity: identity.to_string(),
            compiled,
            fingerprint: chain_fingerprint(&dependencies),
            dependencies,
            compiled_at: chrono::Utc::now().to_rfc3339(),
        })
    }
}

/// State for a single compile: the loader in use and every template read so far.
pub(crate) struct CompileSession<'a> {
    compiler: &'a Compiler,
    loader: &'a dyn TemplateLoader,
    dependencies: Vec<Dependency>,
}

impl<'a> CompileSession<'a> {
    fn new(compiler: &'a Compiler, loader: &'a dyn TemplateLoader) -> Self {
        Self {
            compiler,
            loader,
            dependencies: Vec::new(),
        }
    }

    /// Load a template that must exist, recording it as a dependency.
    fn load(&mut self, identity: &str) -> Result<TemplateSource, ViewError> {
        let source = self.loader.load(identity)?;
        self.record(identity, Some(source_hash(&source.text)));
        Ok(source)
    }

    /// Load a required template and run the per-template passes over it.
    pub(crate) fn load_prepared(&mut self, identity: &str, include_depth: usize) -> Result<String, ViewError> {
        let source = self.load(identity)?;
        self.prepare(&source.text, include_depth)
    }

    fn prepare(&mut self, text: &str, include_depth: usize) -> Result<String, ViewError> {
        let mut content = interpolation::protect_host_syntax(text);
        for extension in &self.compiler.extensions {
            content = extension(&content);
        }
        let content = structural::compile(&content)?;
        layout::expand_includes(&content, |name| self.include(name, include_depth + 1))
    }

    fn include(&mut self, identity: &str, depth: usize) -> Result<Option<String>, ViewError> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(ViewError::IncludeDepthExceeded {
                identity: identity.to_string(),
                depth,
            });
        }

        match self.loader.load(identity) {
            Ok(source) => {
                self.record(identity, Some(source_hash(&source.text)));
                self.prepare(&source.text, depth).map(Some)
            }
            Err(ViewError::TemplateNotFound {
                path,
                ..
            }) => {
                tracing::debug!("Include '{}' not found at {}; leaving a marker", identity, path);
                self.record(identity, None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn record(&mut self, identity: &str, fingerprint: Option<String>) {
        if self.dependencies.iter().any(|dep| dep.identity == identity) {
            return;
        }
        self.dependencies.push(Dependency {
            identity: identity.to_string(),
            fingerprint,
        });
    }
}
