//! `vlx render` - render a view with JSON data.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use crate::config::ViewConfig;
use crate::engine::{ViewEngine, deep_merge_json};

#[derive(Args)]
pub struct RenderCommand {
    /// Dotted view name, e.g. `auth.login`
    view: String,

    /// JSON file with the render data (an object)
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// Set a value; dotted keys nest and values parse as JSON when they can
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Write the output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl RenderCommand {
    pub fn execute(self, config: &ViewConfig) -> Result<()> {
        let data = self.build_data()?;
        let engine = ViewEngine::from_config(config);
        let html = engine.render(&self.view, &data)?;

        match &self.output {
            Some(path) => {
                fs::write(path, &html).with_context(|| format!("Failed to write {}", path.display()))?;
                tracing::info!("Rendered '{}' to {}", self.view, path.display());
            }
            None => {
                let mut stdout = std::io::stdout().lock();
                stdout.write_all(html.as_bytes())?;
                stdout.flush()?;
            }
        }
        Ok(())
    }

    fn build_data(&self) -> Result<Value> {
        let mut data = match &self.data {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read data file {}", path.display()))?;
                let value: Value = serde_json::from_str(&text)
                    .with_context(|| format!("Data file {} is not valid JSON", path.display()))?;
                if !value.is_object() {
                    anyhow::bail!("Data file {} must contain a JSON object", path.display());
                }
                value
            }
            None => Value::Object(Map::new()),
        };

        for assignment in &self.set {
            data = deep_merge_json(data, &parse_assignment(assignment)?);
        }
        Ok(data)
    }
}

/// Parse `a.b=value` into `{"a": {"b": value}}`.
///
/// The value is read as JSON when it parses (`3`, `true`, `[1,2]`,
/// `"quoted"`), and as a plain string otherwise.
fn parse_assignment(assignment: &str) -> Result<Value> {
    let (key, raw) = assignment
        .split_once('=')
        .with_context(|| format!("Expected KEY=VALUE, got '{assignment}'"))?;
    let key = key.trim();
    if key.is_empty() || key.split('.').any(str::is_empty) {
        anyhow::bail!("Invalid key in '{assignment}'");
    }

    let mut value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    for segment in key.rsplit('.') {
        let mut map = Map::new();
        map.insert(segment.to_string(), value);
        value = Value::Object(map);
    }
    Ok(value)
}
