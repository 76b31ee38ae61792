//! `vlx config` - show the effective configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::Path;

use crate::config::ViewConfig;
use crate::constants::CONFIG_FILE_NAME;

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Print the effective configuration as TOML (default)
    Show,

    /// Print the config file locations that are consulted
    Path,
}

impl ConfigCommand {
    pub fn execute(self, config: &ViewConfig, explicit: Option<&Path>) -> Result<()> {
        match self.command.unwrap_or(ConfigSubcommands::Show) {
            ConfigSubcommands::Show => {
                print!("{}", config.to_toml()?);
                Ok(())
            }
            ConfigSubcommands::Path => {
                if let Some(path) = explicit {
                    println!("{} {}", "explicit:".bold(), path.display());
                }
                println!("{} {}", "project:".bold(), std::env::current_dir()?.join(CONFIG_FILE_NAME).display());
                match ViewConfig::global_path() {
                    Ok(path) => println!("{} {}", "user:".bold(), path.display()),
                    Err(e) => println!("{} {}", "user:".bold(), e.to_string().dimmed()),
                }
                Ok(())
            }
        }
    }
}
