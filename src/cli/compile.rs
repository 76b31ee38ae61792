//! `vlx compile` - precompile views into the cache.

use anyhow::Result;
use clap::{ArgGroup, Args};
use colored::Colorize;

use crate::config::ViewConfig;
use crate::core::user_friendly_error;
use crate::engine::ViewEngine;

#[derive(Args)]
#[command(group(ArgGroup::new("target").required(true).args(["view", "all"])))]
pub struct CompileCommand {
    /// Dotted view name to compile
    view: Option<String>,

    /// Compile every view under the view root
    #[arg(long)]
    all: bool,

    /// Print the compiled template
    #[arg(long, conflicts_with = "all")]
    show: bool,
}

impl CompileCommand {
    pub fn execute(self, config: &ViewConfig) -> Result<()> {
        let engine = ViewEngine::from_config(config);

        if let Some(view) = &self.view {
            let artifact = engine.compile(view)?;
            if self.show {
                println!("{}", artifact.compiled);
            } else {
                println!("{} {} ({})", "✓".green(), view, artifact.fingerprint.dimmed());
            }
            return Ok(());
        }

        let identities = engine.loader().identities()?;
        if identities.is_empty() {
            println!("No views found in {}", config.view_path.display());
            return Ok(());
        }

        let mut failed = 0usize;
        for identity in &identities {
            match engine.compile(identity) {
                Ok(_) => println!("{} {}", "✓".green(), identity),
                Err(e) => {
                    failed += 1;
                    println!("{} {}", "✗".red(), identity);
                    user_friendly_error(e).display();
                }
            }
        }

        tracing::info!("Compiled {} of {} view(s)", identities.len() - failed, identities.len());
        if failed > 0 {
            anyhow::bail!("{failed} of {} view(s) failed to compile", identities.len());
        }
        println!("{} Compiled {} view(s)", "✓".green().bold(), identities.len());
        Ok(())
    }
}
