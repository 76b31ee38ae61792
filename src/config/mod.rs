//! Engine configuration.
//!
//! Settings come from a `vlx.toml` file. The first of these that exists is
//! used:
//!
//! 1. an explicit `--config <path>` (which must exist)
//! 2. `./vlx.toml` in the project directory
//! 3. the user-wide file, `<config dir>/vlx/vlx.toml` (see [`ViewConfig::global_path`])
//!
//! With none present, defaults apply. Relative paths in a project file are
//! resolved against the file's directory; everywhere else against the project
//! directory. Command-line flags are applied last through [`ConfigOverrides`].
//!
//! ```toml
//! view_path = "resources/views"
//! cache_path = "storage/framework/views"
//! extension = ".vlx.html"
//! cache_enabled = true
//! force_recompile = false
//!
//! [ambient]
//! app_name = "Velocix"
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILE_NAME, DEFAULT_CACHE_PATH, DEFAULT_VIEW_EXTENSION, DEFAULT_VIEW_PATH};
use crate::core::ViewError;

/// Settings for a [`crate::engine::ViewEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Root directory of view sources
    pub view_path: PathBuf,
    /// Directory compiled views are persisted in
    pub cache_path: PathBuf,
    /// Suffix appended to a view's path, including the leading dot
    pub extension: String,
    /// Whether compiled views are cached at all
    pub cache_enabled: bool,
    /// Recompile on every render, still refreshing the cache
    pub force_recompile: bool,
    /// Values merged under every render's data
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub ambient: Map<String, Value>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            view_path: PathBuf::from(DEFAULT_VIEW_PATH),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            extension: DEFAULT_VIEW_EXTENSION.to_string(),
            cache_enabled: true,
            force_recompile: false,
            ambient: Map::new(),
        }
    }
}

/// Command-line overrides applied on top of the loaded file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub view_path: Option<PathBuf>,
    pub cache_path: Option<PathBuf>,
    pub no_cache: bool,
    pub debug: bool,
}

impl ViewConfig {
    /// Load configuration for a project rooted at `project_dir`.
    ///
    /// # Errors
    ///
    /// Fails if `explicit` is given but missing, or if the chosen file cannot
    /// be read, parsed or validated.
    pub fn load(explicit: Option<&Path>, project_dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(ViewError::ConfigError {
                    message: format!("Config file not found: {}", path.display()),
                }
                .into());
            }
            return Ok(Self::load_from(path)?.relative_to(parent_dir(path)));
        }

        let project = project_dir.join(CONFIG_FILE_NAME);
        if project.is_file() {
            return Ok(Self::load_from(&project)?.relative_to(project_dir));
        }

        if let Ok(global) = Self::global_path()
            && global.is_file()
        {
            tracing::debug!("Using user config {}", global.display());
            return Ok(Self::load_from(&global)?.relative_to(project_dir));
        }

        Ok(Self::default().relative_to(project_dir))
    }

    /// Parse and validate one config file. Paths are returned as written.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid TOML, or holds invalid
    /// values.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// The user-wide config file location.
    ///
    /// # Errors
    ///
    /// Fails if the platform config directory cannot be determined.
    pub fn global_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("Unable to determine config directory"))?;
        Ok(dir.join("vlx").join(CONFIG_FILE_NAME))
    }

    /// Resolve relative paths against `base`.
    #[must_use]
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.view_path.is_relative() {
            self.view_path = base.join(&self.view_path);
        }
        if self.cache_path.is_relative() {
            self.cache_path = base.join(&self.cache_path);
        }
        self
    }

    /// Apply command-line overrides.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(path) = &overrides.view_path {
            self.view_path.clone_from(path);
        }
        if let Some(path) = &overrides.cache_path {
            self.cache_path.clone_from(path);
        }
        if overrides.no_cache {
            self.cache_enabled = false;
        }
        if overrides.debug {
            self.force_recompile = true;
        }
    }

    /// Serialize back to TOML.
    ///
    /// # Errors
    ///
    /// Fails if an ambient value has no TOML form (for example `null`).
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }

    fn validate(&self) -> Result<(), ViewError> {
        if !self.extension.starts_with('.') || self.extension.len() < 2 {
            return Err(ViewError::ConfigError {
                message: format!("extension must start with '.' and name a suffix, got '{}'", self.extension),
            });
        }
        if self.extension.contains(['/', '\\']) {
            return Err(ViewError::ConfigError {
                message: format!("extension may not contain path separators: '{}'", self.extension),
            });
        }
        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| Path::new("."))
}
