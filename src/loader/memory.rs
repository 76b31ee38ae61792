//! In-process template store.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::RwLock;

use super::{TemplateLoader, TemplateSource, validate_identity};
use crate::core::ViewError;

/// Loader serving templates from memory.
///
/// Templates can be replaced while the loader is shared, which makes it the
/// natural store for embedding and for exercising cache invalidation.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    templates: RwLock<BTreeMap<String, String>>,
}

impl MemoryLoader {
    /// Create an empty loader.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(self, identity: &str, text: &str) -> Self {
        self.insert(identity, text);
        self
    }

    /// Insert or replace a template.
    pub fn insert(&self, identity: &str, text: &str) {
        let mut templates = self.templates.write().unwrap_or_else(|e| e.into_inner());
        templates.insert(identity.to_string(), text.to_string());
    }

    /// Remove a template, returning whether it existed.
    pub fn remove(&self, identity: &str) -> bool {
        let mut templates = self.templates.write().unwrap_or_else(|e| e.into_inner());
        templates.remove(identity).is_some()
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&self, identity: &str) -> Result<TemplateSource, ViewError> {
        validate_identity(identity)?;
        let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
        templates
            .get(identity)
            .map(|text| TemplateSource {
                identity: identity.to_string(),
                text: text.clone(),
                path: self.locate(identity),
            })
            .ok_or_else(|| ViewError::TemplateNotFound {
                identity: identity.to_string(),
                path: self.locate(identity).display().to_string(),
            })
    }

    fn exists(&self, identity: &str) -> bool {
        let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
        templates.contains_key(identity)
    }

    fn locate(&self, identity: &str) -> PathBuf {
        PathBuf::from(format!("memory:{identity}"))
    }

    fn identities(&self) -> Result<Vec<String>, ViewError> {
        let templates = self.templates.read().unwrap_or_else(|e| e.into_inner());
        Ok(templates.keys().cloned().collect())
    }
}
