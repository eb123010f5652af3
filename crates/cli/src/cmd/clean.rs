//! Store maintenance commands

use anyhow::{Context, anyhow};
use clap::Args;
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use guanka_engine::{EnvironmentInstaller, HookResolver, Store};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::Result;
use crate::ui::StatusIcon;

/// Gc command arguments
#[derive(Debug, Clone, Args)]
pub struct GcCommand {}

/// Clean command arguments
#[derive(Debug, Clone, Args)]
pub struct CleanCommand {
    /// Do not ask for confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl Command for GcCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        let store = context.open_store()?;
        let keep = context.config.remote_repos();
        let installer = EnvironmentInstaller::new(&store);
        let keep_local: Vec<PathBuf> = HookResolver::resolve_local(&context.config)?
            .iter()
            .map(|hook| installer.env_dir(hook))
            .collect();
        let stats = store.gc(&keep, &keep_local)?;

        println!(
            "{} {} unused repositories removed ({} directories)",
            StatusIcon::Success,
            stats.records.style(context.theme.name),
            stats.directories
        );
        Ok(())
    }
}

impl CleanCommand {
    /// Delete the store rooted at `root` after confirmation
    ///
    /// Returns `false` when the user declined or there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns an error if confirmation is needed but stdin is not a terminal,
    /// or the directory cannot be removed
    pub fn run(&self, root: &Path) -> Result<bool> {
        if !root.exists() {
            println!("{} Nothing to clean at {}", StatusIcon::Info, root.display());
            return Ok(false);
        }

        if !self.yes {
            if !std::io::stdin().is_terminal() {
                return Err(anyhow!("Refusing to delete {} without --yes", root.display()).into());
            }
            let confirmed = Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(format!("Delete {}?", root.display()))
                .default(false)
                .interact()
                .context("Failed to read confirmation")?;
            if !confirmed {
                return Ok(false);
            }
        }

        let removed = Store::clean(root)?;
        if removed {
            println!("{} Cleaned {}", StatusIcon::Success, root.display());
        }
        Ok(removed)
    }
}
