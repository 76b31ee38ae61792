//! Executes compiled views with Tera.

use regex::Regex;
use std::sync::LazyLock;
use strsim::levenshtein;
use tera::Tera;

use super::filters;
use super::scope::RenderScope;
use crate::compiler::CompiledArtifact;
use crate::constants::ESCAPE_HTML;
use crate::core::ViewError;

/// Maximum allowed Levenshtein distance as a percentage of the target length
/// for a variable to be suggested.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

static VARIABLE_NOT_FOUND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Variable `([^`]+)` not found").expect("valid variable-not-found pattern")
});

/// Render a compiled artifact against a scope.
///
/// A fresh Tera instance is built per call, holding only this artifact, with
/// autoescaping off: escaping is exactly what the compiled `escape_html`
/// calls say it is.
///
/// # Errors
///
/// - [`ViewError::VariableNotFound`] when an echoed variable is undefined
/// - [`ViewError::RenderFailed`] for any other parse or render failure
pub fn execute(artifact: &CompiledArtifact, scope: &RenderScope) -> Result<String, ViewError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.register_function(ESCAPE_HTML, filters::escape_html_function);
    tera.register_filter(ESCAPE_HTML, filters::escape_html);

    tera.add_raw_template(&artifact.identity, &artifact.compiled)
        .map_err(|e| parse_tera_error(&e, &artifact.identity, scope))?;

    tracing::debug!("Rendering view '{}'", artifact.identity);
    tera.render(&artifact.identity, &scope.to_context())
        .map_err(|e| parse_tera_error(&e, &artifact.identity, scope))
}

fn parse_tera_error(error: &tera::Error, identity: &str, scope: &RenderScope) -> ViewError {
    let message = format_tera_error(error);

    if let Some(variable) = extract_variable_name(&message) {
        let suggestions = find_similar_variables(&variable, &scope.variable_paths());
        return ViewError::VariableNotFound {
            identity: identity.to_string(),
            variable,
            suggestions,
        };
    }

    ViewError::RenderFailed {
        identity: identity.to_string(),
        reason: message,
    }
}

/// Flatten a Tera error and its sources into one line.
#[must_use]
pub fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut parts = vec![error.to_string()];
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !parts.contains(&text) {
            parts.push(text);
        }
        source = cause.source();
    }
    parts.join(": ")
}

fn extract_variable_name(message: &str) -> Option<String> {
    VARIABLE_NOT_FOUND.captures(message).and_then(|caps| caps.get(1)).map(|m| m.as_str().to_string())
}

fn find_similar_variables(target: &str, available: &[String]) -> Vec<String> {
    let mut scored: Vec<_> = available.iter().map(|var| (var, levenshtein(target, var))).collect();
    scored.sort_by(|(a, da), (b, db)| da.cmp(db).then_with(|| a.cmp(b)));

    scored
        .into_iter()
        .filter(|(_, dist)| *dist <= target.len() * SIMILARITY_THRESHOLD_PERCENT / 100)
        .take(3)
        .map(|(var, _)| var.clone())
        .collect()
}
