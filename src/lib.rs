//! Velocix views - a directive-based template compiler and renderer.
//!
//! Views are written with a small directive language layered over HTML:
//!
//! ```text
//! @extends('layouts.app')
//!
//! @section('title', 'Users')
//!
//! @section('content')
//!     @foreach(user in users)
//!         @if(user.admin)<b>{{ user.name }}</b>@else{{ user.name }}@endif
//!     @endforeach
//!     @include('partials.footer')
//! @endsection
//! ```
//!
//! Each view is compiled, together with every layout and include it pulls in,
//! into a single [Tera](https://keats.github.io/tera/) template, cached, and
//! executed against JSON data. `{{ expr }}` output is HTML-escaped at render
//! time; `{!! expr !!}` is emitted raw.
//!
//! # Architecture
//!
//! - [`loader`] - resolves dotted view names (`auth.login`) to source text
//! - [`compiler`] - the directive passes: scanning, control flow, layouts and
//!   includes, interpolation; produces a [`compiler::CompiledArtifact`]
//! - [`cache`] - compiled artifacts in memory and on disk, invalidated when any
//!   template in a view's chain changes
//! - [`engine`] - [`engine::ViewEngine`], the render entry point, plus the Tera
//!   filters and render scopes it uses
//! - [`config`] - `vlx.toml` loading
//! - [`core`] - error types and user-facing error formatting
//! - [`cli`] - the `vlx` command-line tool
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use std::sync::Arc;
//! use vlx_view::engine::ViewEngine;
//! use vlx_view::loader::MemoryLoader;
//!
//! let loader = MemoryLoader::new()
//!     .with("layouts.app", "<h1>@yield('title', 'Welcome')</h1>@yield('content')")
//!     .with("home", "@extends('layouts.app')@section('content')<p>{{ message }}</p>@endsection");
//!
//! let engine = ViewEngine::new(Arc::new(loader));
//! let html = engine.render("home", &json!({ "message": "a < b" })).unwrap();
//! assert_eq!(html, "<h1>Welcome</h1><p>a &lt; b</p>");
//! ```

pub mod cache;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod constants;
pub mod core;
pub mod engine;
pub mod loader;
pub mod utils;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
