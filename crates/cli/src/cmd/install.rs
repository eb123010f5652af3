//! Install and uninstall git hook scripts
//!
//! Installed scripts call `guanka hook-impl` for their stage. A hook script
//! that guanka did not write is moved aside to `<hook>.legacy` and run by
//! `hook-impl` before guanka's own hooks.

use anyhow::{Context, anyhow};
use clap::Args;
use guanka_config::{CONFIG_FILE_NAME, Stage};
use guanka_engine::git;
use owo_colors::OwoColorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{CommandError, Result};
use crate::ui::{StatusIcon, Theme};

/// Line identifying scripts written by guanka
pub const SCRIPT_MARKER: &str = "# guanka-hook-script";

/// Suffix of hook scripts moved aside during install
pub const LEGACY_SUFFIX: &str = "legacy";

/// Install command arguments
#[derive(Debug, Clone, Args)]
pub struct InstallCommand {
    /// Git hook types to install (repeatable)
    #[arg(short = 't', long = "hook-type", value_name = "TYPE", default_value = "pre-commit")]
    pub hook_types: Vec<Stage>,

    /// Replace existing hook scripts instead of keeping them as `.legacy`
    #[arg(short, long)]
    pub overwrite: bool,
}

/// Uninstall command arguments
#[derive(Debug, Clone, Args)]
pub struct UninstallCommand {
    /// Git hook types to uninstall (repeatable)
    #[arg(short = 't', long = "hook-type", value_name = "TYPE", default_value = "pre-commit")]
    pub hook_types: Vec<Stage>,
}

/// What happened to one hook script
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptChange {
    /// Script written, nothing was in the way
    Installed(PathBuf),
    /// Script written, the previous one kept as `.legacy`
    Migrated {
        /// Installed script
        script: PathBuf,
        /// Where the previous script went
        legacy: PathBuf,
    },
    /// Script removed
    Removed(PathBuf),
    /// Script removed and the `.legacy` one moved back
    Restored(PathBuf),
    /// Left alone because guanka did not write it
    Foreign(PathBuf),
    /// Nothing installed
    Missing(PathBuf),
}

impl ScriptChange {
    fn print(&self, theme: &Theme) {
        match self {
            Self::Installed(path) => println!(
                "{} guanka installed at {}",
                StatusIcon::Success,
                path.display().style(theme.name)
            ),
            Self::Migrated { script, legacy } => println!(
                "{} guanka installed at {} (previous hook kept as {})",
                StatusIcon::Success,
                script.display().style(theme.name),
                legacy.display().style(theme.dim)
            ),
            Self::Removed(path) => println!(
                "{} {} uninstalled",
                StatusIcon::Success,
                path.display().style(theme.name)
            ),
            Self::Restored(path) => println!(
                "{} {} uninstalled, previous hook restored",
                StatusIcon::Success,
                path.display().style(theme.name)
            ),
            Self::Foreign(path) => println!(
                "{} {} was not installed by guanka, leaving it",
                StatusIcon::Warning,
                path.display().style(theme.warning)
            ),
            Self::Missing(path) => println!(
                "{} {} is not installed",
                StatusIcon::Info,
                path.display().style(theme.dim)
            ),
        }
    }
}

/// Whether `path` is a script written by guanka
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read
pub fn is_guanka_script(path: &Path) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).contains(SCRIPT_MARKER))
}

/// Path of the `.legacy` script next to `script`
#[must_use]
pub fn legacy_path(script: &Path) -> PathBuf {
    let mut name = script.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(LEGACY_SUFFIX);
    script.with_file_name(name)
}

/// Text of the hook script for `stage`
///
/// `config` is passed through as `--config` when the repository does not use
/// the default configuration file.
#[must_use]
pub fn render_script(stage: Stage, exe: &Path, config: Option<&Path>) -> String {
    let exe = shell_words::quote(&exe.to_string_lossy()).into_owned();
    let config_arg = config
        .map(|path| format!(" --config {}", shell_words::quote(&path.to_string_lossy())))
        .unwrap_or_default();

    format!(
        r#"#!/usr/bin/env sh
{SCRIPT_MARKER}
# Generated by `guanka install`. Do not edit.

if [ -x {exe} ]; then
    GUANKA_BIN={exe}
elif command -v guanka >/dev/null 2>&1; then
    GUANKA_BIN=guanka
else
    echo "guanka not found. Install it or skip hooks with git --no-verify." >&2
    exit 1
fi

exec "$GUANKA_BIN"{config_arg} hook-impl --hook-type {stage} --skip-on-missing-config -- "$@"
"#,
        stage = stage.name(),
    )
}

fn git_hook_name(stage: Stage) -> Result<&'static str> {
    stage
        .git_hook_name()
        .ok_or_else(|| anyhow!("Stage '{stage}' has no git hook").into())
}

/// Configuration path as it should appear in hook scripts
///
/// `None` for the default file; paths inside the work tree become relative
/// since git runs hooks from the work tree root.
#[must_use]
pub fn script_config_arg(root: &Path, config_path: &Path) -> Option<PathBuf> {
    let relative = config_path.strip_prefix(root).unwrap_or(config_path);
    if relative == Path::new(CONFIG_FILE_NAME) {
        None
    } else {
        Some(relative.to_path_buf())
    }
}

impl InstallCommand {
    /// Install scripts into the hooks directory of the repository at `root`
    ///
    /// # Errors
    ///
    /// Returns an error if the hooks directory cannot be found or written
    pub fn run(&self, root: &Path, config_path: Option<&Path>, theme: &Theme) -> Result<()> {
        let hooks_dir = git::hooks_dir(root)?;
        let exe = std::env::current_exe().context("Failed to locate the guanka executable")?;
        let config = config_path.and_then(|path| script_config_arg(root, path));

        for change in self.install_into(&hooks_dir, &exe, config.as_deref())? {
            change.print(theme);
        }
        Ok(())
    }

    /// Write one script per hook type into `hooks_dir`
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::ForeignHook`] if a foreign script is in the way
    /// and a `.legacy` script already exists, or an IO error
    pub fn install_into(
        &self,
        hooks_dir: &Path,
        exe: &Path,
        config: Option<&Path>,
    ) -> Result<Vec<ScriptChange>> {
        fs::create_dir_all(hooks_dir)?;
        let mut changes = Vec::new();

        for &stage in &self.hook_types {
            let script = hooks_dir.join(git_hook_name(stage)?);
            let legacy = legacy_path(&script);

            let mut moved = None;
            if script.exists() && !is_guanka_script(&script)? && !self.overwrite {
                if legacy.exists() {
                    return Err(CommandError::ForeignHook(script));
                }
                fs::rename(&script, &legacy)?;
                info!(legacy = %legacy.display(), "Moved existing hook aside");
                moved = Some(legacy);
            }

            fs::write(&script, render_script(stage, exe, config))?;
            make_executable(&script)?;
            debug!(script = %script.display(), "Installed hook script");

            changes.push(match moved {
                Some(legacy) => ScriptChange::Migrated { script, legacy },
                None => ScriptChange::Installed(script),
            });
        }

        Ok(changes)
    }
}

impl UninstallCommand {
    /// Remove scripts from the hooks directory of the repository at `root`
    ///
    /// # Errors
    ///
    /// Returns an error if the hooks directory cannot be found or written
    pub fn run(&self, root: &Path, theme: &Theme) -> Result<()> {
        let hooks_dir = git::hooks_dir(root)?;
        for change in self.uninstall_from(&hooks_dir)? {
            change.print(theme);
        }
        Ok(())
    }

    /// Remove guanka's scripts from `hooks_dir`, restoring `.legacy` ones
    ///
    /// # Errors
    ///
    /// Returns an IO error if a script cannot be removed or restored
    pub fn uninstall_from(&self, hooks_dir: &Path) -> Result<Vec<ScriptChange>> {
        let mut changes = Vec::new();

        for &stage in &self.hook_types {
            let script = hooks_dir.join(git_hook_name(stage)?);

            if !script.exists() {
                changes.push(ScriptChange::Missing(script));
                continue;
            }
            if !is_guanka_script(&script)? {
                changes.push(ScriptChange::Foreign(script));
                continue;
            }

            fs::remove_file(&script)?;
            let legacy = legacy_path(&script);
            if legacy.exists() {
                fs::rename(&legacy, &script)?;
                changes.push(ScriptChange::Restored(script));
            } else {
                changes.push(ScriptChange::Removed(script));
            }
        }

        Ok(changes)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
