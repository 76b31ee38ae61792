//! Loader backed by a directory of view files.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{TemplateLoader, TemplateSource, validate_identity};
use crate::core::ViewError;

/// Loads `a.b.c` from `<root>/a/b/c<extension>`.
#[derive(Debug, Clone)]
pub struct FileSystemLoader {
    root: PathBuf,
    extension: String,
}

impl FileSystemLoader {
    /// Create a loader rooted at `root`, appending `extension` (e.g. `.vlx.html`)
    /// to every resolved path.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into(),
        }
    }

    /// The view root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a dotted identity to its file path without checking existence.
    #[must_use]
    pub fn view_path(&self, identity: &str) -> PathBuf {
        let mut path = self.root.clone();
        let mut segments = identity.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_some() {
                path.push(segment);
            } else {
                path.push(format!("{segment}{}", self.extension));
            }
        }
        path
    }

    /// Map a file under the root back to its dotted identity.
    fn identity_of(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let normalized = relative.to_str()?.replace('\\', "/");
        let stem = normalized.strip_suffix(self.extension.as_str())?;
        let identity = stem.replace('/', ".");
        validate_identity(&identity).ok().map(|()| identity)
    }
}

impl TemplateLoader for FileSystemLoader {
    fn load(&self, identity: &str) -> Result<TemplateSource, ViewError> {
        validate_identity(identity)?;
        let path = self.view_path(identity);

        match fs::read_to_string(&path) {
            Ok(text) => {
                tracing::debug!("Loaded view '{}' from {}", identity, path.display());
                Ok(TemplateSource {
                    identity: identity.to_string(),
                    text,
                    path,
                })
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ViewError::TemplateNotFound {
                    identity: identity.to_string(),
                    path: path.display().to_string(),
                })
            }
            Err(e) => Err(ViewError::IoError(e)),
        }
    }

    fn exists(&self, identity: &str) -> bool {
        validate_identity(identity).is_ok() && self.view_path(identity).is_file()
    }

    fn locate(&self, identity: &str) -> PathBuf {
        self.view_path(identity)
    }

    fn identities(&self) -> Result<Vec<String>, ViewError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut identities = Vec::new();
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| ViewError::Other {
                message: format!("Failed to walk view directory {}: {e}", self.root.display()),
            })?;
            if entry.file_type().is_file()
                && let Some(identity) = self.identity_of(entry.path())
            {
                identities.push(identity);
            }
        }
        identities.sort();
        Ok(identities)
    }
}
