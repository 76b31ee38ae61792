//! Compiled artifacts and source-chain fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::ViewError;
use crate::loader::TemplateLoader;

/// Marker hashed in place of a source hash for a missing include target.
const MISSING: &str = "missing";

/// One template read while compiling a view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Dotted identity of the template
    pub identity: String,
    /// Hash of its text, or `None` if it was a missing include
    pub fingerprint: Option<String>,
}

/// The output of a full compile: host template text plus enough provenance to
/// decide whether it is still current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledArtifact {
    /// Identity of the view that was compiled
    pub identity: String,
    /// Host template text ready for execution
    pub compiled: String,
    /// Fingerprint of the whole source chain, see [`chain_fingerprint`]
    pub fingerprint: String,
    /// Every template read, in load order (the view itself first)
    pub dependencies: Vec<Dependency>,
    /// RFC 3339 timestamp of the compile
    pub compiled_at: String,
}

impl CompiledArtifact {
    /// Whether every dependency still has the text it was compiled from.
    ///
    /// A dependency that was present and is now missing, or that was missing
    /// and now exists, makes the artifact stale just like changed text does.
    /// Invalidation is all-or-nothing: there is no partial reuse.
    pub fn is_fresh(&self, loader: &dyn TemplateLoader) -> bool {
        let current: Result<Vec<Dependency>, ViewError> = self
            .dependencies
            .iter()
            .map(|dep| current_dependency(loader, &dep.identity))
            .collect();

        match current {
            Ok(current) => {
                current == self.dependencies && chain_fingerprint(&current) == self.fingerprint
            }
            Err(e) => {
                tracing::debug!("Treating '{}' as stale: {}", self.identity, e);
                false
            }
        }
    }
}

fn current_dependency(loader: &dyn TemplateLoader, identity: &str) -> Result<Dependency, ViewError> {
    match loader.load(identity) {
        Ok(source) => Ok(Dependency {
            identity: identity.to_string(),
            fingerprint: Some(source_hash(&source.text)),
        }),
        Err(ViewError::TemplateNotFound {
            ..
        }) => Ok(Dependency {
            identity: identity.to_string(),
            fingerprint: None,
        }),
        Err(e) => Err(e),
    }
}

/// SHA-256 of a template's text as `sha256:<hex>`.
#[must_use]
pub fn source_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Fingerprint of a resolved source chain.
///
/// Hashes `identity:hash` lines for every dependency in load order, so a change
/// to any template in the chain, or a change to which templates the chain
/// pulls in, yields a different fingerprint.
#[must_use]
pub fn chain_fingerprint(dependencies: &[Dependency]) -> String {
    let mut hasher = Sha256::new();
    for dep in dependencies {
        hasher.update(dep.identity.as_bytes());
        hasher.update(b":");
        hasher.update(dep.fingerprint.as_deref().unwrap_or(MISSING).as_bytes());
        hasher.update(b"\n");
    }
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
