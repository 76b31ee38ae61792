//! Render scopes.
//!
//! A [`RenderScope`] is the set of variables a view renders against: the
//! caller's data merged over the engine's ambient defaults. It is always a
//! JSON object and is owned by a single render.

use serde_json::{Map, Value};
use tera::Context as TeraContext;

use crate::core::ViewError;

/// Variables visible to one render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderScope {
    values: Map<String, Value>,
}

impl RenderScope {
    /// An empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge `data` over `ambient`.
    ///
    /// Nested objects are merged key by key; anything else in `data` replaces
    /// the ambient value outright. `null` data means "no data".
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::Other`] if either value is neither an object nor
    /// `null`.
    pub fn merged(ambient: &Value, data: &Value) -> Result<Self, ViewError> {
        let base = object_or_empty(ambient, "ambient defaults")?;
        let overrides = object_or_empty(data, "render data")?;
        match deep_merge_json(Value::Object(base), &Value::Object(overrides)) {
            Value::Object(values) => Ok(Self {
                values,
            }),
            _ => Ok(Self::new()),
        }
    }

    /// Set a top-level variable.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Look up a top-level variable.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Every variable path in the scope (`user`, `user.name`, ...), sorted.
    ///
    /// Objects are walked a few levels deep; array elements are not listed.
    #[must_use]
    pub fn variable_paths(&self) -> Vec<String> {
        fn walk(prefix: &str, value: &Value, depth: usize, out: &mut Vec<String>) {
            if depth == 0 {
                return;
            }
            if let Value::Object(map) = value {
                for (key, child) in map {
                    let path = format!("{prefix}.{key}");
                    walk(&path, child, depth - 1, out);
                    out.push(path);
                }
            }
        }

        let mut paths = Vec::new();
        for (key, value) in &self.values {
            walk(key, value, 3, &mut paths);
            paths.push(key.clone());
        }
        paths.sort();
        paths
    }

    /// Build the Tera context for this scope.
    #[must_use]
    pub fn to_context(&self) -> TeraContext {
        let mut context = TeraContext::new();
        for (key, value) in &self.values {
            context.insert(key.as_str(), value);
        }
        context
    }

    /// The scope as a JSON object.
    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.values)
    }
}

fn object_or_empty(value: &Value, what: &str) -> Result<Map<String, Value>, ViewError> {
    match value {
        Value::Object(map) => Ok(map.clone()),
        Value::Null => Ok(Map::new()),
        other => Err(ViewError::Other {
            message: format!("{what} must be a JSON object, got {}", type_name(other)),
        }),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Recursively merge `overrides` into `base`.
///
/// Objects are merged key by key; for any other pairing the override wins.
///
/// ```rust
/// use serde_json::json;
/// use vlx_view::engine::deep_merge_json;
///
/// let base = json!({ "app": { "name": "Velocix", "env": "prod" } });
/// let overrides = json!({ "app": { "env": "dev" }, "user": "ada" });
///
/// let merged = deep_merge_json(base, &overrides);
/// assert_eq!(merged, json!({ "app": { "name": "Velocix", "env": "dev" }, "user": "ada" }));
/// ```
#[must_use]
pub fn deep_merge_json(mut base: Value, overrides: &Value) -> Value {
    match (base.as_object_mut(), overrides.as_object()) {
        (Some(base_obj), Some(override_obj)) => {
            for (key, override_value) in override_obj {
                match base_obj.get_mut(key) {
                    Some(base_value) if base_value.is_object() && override_value.is_object() => {
                        let merged = deep_merge_json(base_value.take(), override_value);
                        *base_value = merged;
                    }
                    _ => {
                        base_obj.insert(key.clone(), override_value.clone());
                    }
                }
            }
            base
        }
        _ => overrides.clone(),
    }
}
