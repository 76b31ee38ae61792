//! `vlx cache` - inspect and clear persisted compiled views.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use crate::cache::ViewCache;
use crate::config::ViewConfig;

#[derive(Args)]
pub struct CacheCommand {
    #[command(subcommand)]
    command: Option<CacheSubcommands>,
}

#[derive(Subcommand)]
enum CacheSubcommands {
    /// List persisted compiled views (default)
    List,

    /// Delete every persisted compiled view
    Clear,
}

impl CacheCommand {
    pub fn execute(self, config: &ViewConfig) -> Result<()> {
        let cache = ViewCache::persistent(&config.cache_path);
        match self.command.unwrap_or(CacheSubcommands::List) {
            CacheSubcommands::List => list(&cache),
            CacheSubcommands::Clear => clear(&cache),
        }
    }
}

fn list(cache: &ViewCache) -> Result<()> {
    let entries = cache.list()?;
    if entries.is_empty() {
        println!("No compiled views cached");
        return Ok(());
    }

    println!("{}", "Compiled views:".bold());
    for entry in &entries {
        let short = entry.fingerprint.strip_prefix("sha256:").unwrap_or(&entry.fingerprint);
        println!(
            "  {} {} {} {}",
            entry.identity.cyan(),
            short.get(..12).unwrap_or(short).dimmed(),
            entry.compiled_at,
            format!("({} template(s))", entry.dependencies).dimmed()
        );
    }
    Ok(())
}

fn clear(cache: &ViewCache) -> Result<()> {
    let removed = cache.clear()?;
    tracing::info!("Cleared {} compiled view(s)", removed);
    println!("{} Compiled views cleared ({removed} removed)", "✓".green());
    Ok(())
}
