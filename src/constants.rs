//! Global constants used throughout the view engine.
//!
//! Depth guards, file conventions and other fixed values shared by the
//! compiler, the loader and the cache. Defining them centrally keeps the
//! magic numbers discoverable.

/// Maximum number of templates in an `@extends` chain, the view itself included.
///
/// A longer chain is treated as a cycle and fails with `LayoutCycleDetected`.
pub const MAX_LAYOUT_DEPTH: usize = 50;

/// Maximum nesting of `@include` expansions.
pub const MAX_INCLUDE_DEPTH: usize = 50;

/// Iteration bound for compiled `@while` loops.
///
/// The host language has no unbounded loop construct, so `@while` compiles to a
/// bounded `for` that breaks as soon as the condition turns false.
pub const MAX_WHILE_ITERATIONS: usize = 10_000;

/// Default file extension appended to a view's path.
pub const DEFAULT_VIEW_EXTENSION: &str = ".vlx.html";

/// Default view root, relative to the working directory.
pub const DEFAULT_VIEW_PATH: &str = "resources/views";

/// Default compiled-view cache root, relative to the working directory.
pub const DEFAULT_CACHE_PATH: &str = "storage/framework/views";

/// File name of the project configuration.
pub const CONFIG_FILE_NAME: &str = "vlx.toml";

/// Extension of persisted cache entries.
pub const CACHE_ENTRY_EXTENSION: &str = "json";

/// Name of the Tera function emitted for escaped output, also registered as a
/// filter for extensions.
pub const ESCAPE_HTML: &str = "escape_html";
