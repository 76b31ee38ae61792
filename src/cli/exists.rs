//! `vlx exists` - check for a view.

use anyhow::Result;
use clap::Args;
use colored::Colorize;

use crate::config::ViewConfig;
use crate::core::ViewError;
use crate::engine::ViewEngine;

#[derive(Args)]
pub struct ExistsCommand {
    /// Dotted view name
    view: String,
}

impl ExistsCommand {
    pub fn execute(self, config: &ViewConfig) -> Result<()> {
        let engine = ViewEngine::from_config(config);
        let path = engine.view_path(&self.view)?;

        if engine.exists(&self.view) {
            println!("{} {} -> {}", "✓".green(), self.view, path.display());
            Ok(())
        } else {
            Err(ViewError::TemplateNotFound {
                identity: self.view,
                path: path.display().to_string(),
            }
            .into())
        }
    }
}
