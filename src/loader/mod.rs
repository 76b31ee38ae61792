//! Template loading.
//!
//! The compiler never touches the filesystem directly. Every view, layout and
//! include is obtained through a [`TemplateLoader`], which maps a dotted view
//! identity (`auth.login`) to its source text.
//!
//! Two loaders are provided:
//! - [`FileSystemLoader`] - `<root>/auth/login<extension>` files on disk
//! - [`MemoryLoader`] - an in-process map, for embedding and tests

mod filesystem;
mod memory;

pub use filesystem::FileSystemLoader;
pub use memory::MemoryLoader;

use std::path::PathBuf;

use crate::core::ViewError;

/// A loaded template. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    /// Dotted logical name, e.g. `auth.login`
    pub identity: String,
    /// Raw template text
    pub text: String,
    /// Where the text was loaded from
    pub path: PathBuf,
}

/// Capability for resolving view identities to source text.
///
/// Implementations must be safe to share between concurrent renders.
pub trait TemplateLoader: Send + Sync {
    /// Load the template named `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::TemplateNotFound`] when no such template exists,
    /// [`ViewError::InvalidViewName`] for malformed identities, and
    /// [`ViewError::IoError`] for any other read failure.
    fn load(&self, identity: &str) -> Result<TemplateSource, ViewError>;

    /// Whether a template named `identity` exists.
    fn exists(&self, identity: &str) -> bool;

    /// Where `identity` would be loaded from, for diagnostics.
    fn locate(&self, identity: &str) -> PathBuf;

    /// Every identity this loader can serve, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be enumerated.
    fn identities(&self) -> Result<Vec<String>, ViewError>;
}

/// Validate a dotted view identity.
///
/// Identities are one or more non-empty segments separated by `.`; segments
/// may not contain path separators, so a name can never escape the view root.
///
/// # Errors
///
/// Returns [`ViewError::InvalidViewName`] describing the first problem found.
pub fn validate_identity(name: &str) -> Result<(), ViewError> {
    let invalid = |reason: &str| ViewError::InvalidViewName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.chars().any(|c| matches!(c, '/' | '\\' | ':' | '\0')) {
        return Err(invalid("path separators are not allowed"));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(invalid("whitespace is not allowed"));
    }
    if name.split('.').any(str::is_empty) {
        return Err(invalid("empty segment (leading, trailing or doubled '.')"));
    }
    Ok(())
}
