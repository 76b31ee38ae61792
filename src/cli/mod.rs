//! Command-line interface for the `vlx` view tool.
//!
//! # Commands
//!
//! - `render` - Render a view to stdout or a file
//! - `compile` - Compile one view, or every view with `--all`, into the cache
//! - `exists` - Check whether a view exists and show where it lives
//! - `cache` - List or clear persisted compiled views
//! - `config` - Show the effective configuration
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - Logging level (`RUST_LOG` is honored unless quiet)
//! - `--config <path>` - Use a specific config file instead of `./vlx.toml`
//! - `--views <dir>` / `--cache <dir>` - Override the view and cache roots
//! - `--no-cache` - Compile on every render without touching the cache
//! - `--debug` - Always recompile, still refreshing cached entries
//!
//! # Example
//!
//! ```bash
//! vlx render welcome --set user.name=Ada
//! vlx render users.index --data users.json --output users.html
//! vlx compile --all
//! vlx cache clear
//! ```

mod cache;
mod compile;
mod config;
mod exists;
mod render;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigOverrides, ViewConfig};

/// Settings derived from global flags, resolved before a command runs.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter to install, `None` to disable logging
    pub log_level: Option<String>,
    /// Explicit config file
    pub config_path: Option<PathBuf>,
    /// Flag overrides for the loaded config
    pub overrides: ConfigOverrides,
}

impl CliConfig {
    /// Install the tracing subscriber for this run.
    ///
    /// `RUST_LOG` takes precedence over the flag-derived level. Logs go to
    /// stderr so rendered output on stdout stays clean.
    pub fn init_logging(&self) {
        let Some(level) = &self.log_level else {
            return;
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }

    /// Load the effective view configuration for the current directory.
    ///
    /// # Errors
    ///
    /// Fails if the working directory is unavailable or the config is invalid.
    pub fn load_view_config(&self) -> Result<ViewConfig> {
        let project_dir = std::env::current_dir()?;
        let mut config = ViewConfig::load(self.config_path.as_deref(), &project_dir)?;
        config.apply(&self.overrides);
        Ok(config)
    }
}

#[derive(Parser)]
#[command(
    name = "vlx",
    about = "Compile and render Velocix views",
    version,
    long_about = "vlx compiles directive-based view templates (@extends, @section, @if, {{ }} ...) \
                  into cached Tera templates and renders them against JSON data."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Path to a config file (default: ./vlx.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// View root directory
    #[arg(long, global = true, value_name = "DIR")]
    views: Option<PathBuf>,

    /// Compiled view cache directory
    #[arg(long = "cache", global = true, value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Disable the compiled view cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Recompile on every render
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a view
    Render(render::RenderCommand),

    /// Compile views into the cache
    Compile(compile::CompileCommand),

    /// Check whether a view exists
    Exists(exists::ExistsCommand),

    /// Manage compiled views
    Cache(cache::CacheCommand),

    /// Show configuration
    Config(config::ConfigCommand),
}

impl Cli {
    /// Run the parsed command.
    ///
    /// # Errors
    ///
    /// Returns whatever the command fails with; `main` formats it.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(&config)
    }

    /// Derive the run configuration from global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            None
        } else {
            Some("warn".to_string())
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
            overrides: ConfigOverrides {
                view_path: self.views.clone(),
                cache_path: self.cache_dir.clone(),
                no_cache: self.no_cache,
                debug: self.debug,
            },
        }
    }

    /// Run the command with an already-built configuration.
    ///
    /// # Errors
    ///
    /// Propagates the command's failure.
    pub fn execute_with_config(self, config: &CliConfig) -> Result<()> {
        let view_config = config.load_view_config()?;
        tracing::debug!("Views: {}, cache: {}", view_config.view_path.display(), view_config.cache_path.display());

        match self.command {
            Commands::Render(cmd) => cmd.execute(&view_config),
            Commands::Compile(cmd) => cmd.execute(&view_config),
            Commands::Exists(cmd) => cmd.execute(&view_config),
            Commands::Cache(cmd) => cmd.execute(&view_config),
            Commands::Config(cmd) => cmd.execute(&view_config, config.config_path.as_deref()),
        }
    }
}
