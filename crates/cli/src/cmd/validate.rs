//! Validate configuration and manifest files

use clap::Args;
use guanka_config::{CONFIG_FILE_NAME, Config, MANIFEST_FILE_NAME, Manifest};
use owo_colors::OwoColorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CommandError, Result};
use crate::ui::{StatusIcon, Theme};

/// Validate-config command arguments
#[derive(Debug, Clone, Args)]
pub struct ValidateConfigCommand {
    /// Configuration files to check
    #[arg(value_name = "FILE", default_value = CONFIG_FILE_NAME)]
    pub files: Vec<PathBuf>,
}

/// Validate-manifest command arguments
#[derive(Debug, Clone, Args)]
pub struct ValidateManifestCommand {
    /// Manifest files to check
    #[arg(value_name = "FILE", default_value = MANIFEST_FILE_NAME)]
    pub files: Vec<PathBuf>,
}

/// Check a configuration file
///
/// # Errors
///
/// Returns the first problem found in the file
pub fn check_config(path: &Path) -> guanka_core::Result<()> {
    Config::load(path)?.validate()
}

/// Check a manifest file
///
/// # Errors
///
/// Returns the first problem found in the file
pub fn check_manifest(path: &Path) -> guanka_core::Result<()> {
    let name = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|e| guanka_core::Error::Manifest {
        repo: name.clone(),
        message: format!("cannot read file: {e}"),
    })?;
    Manifest::from_toml_str(&content, &name)?.validate(&name)
}

fn report_all<F>(files: &[PathBuf], check: F, theme: &Theme) -> Result<()>
where
    F: Fn(&Path) -> guanka_core::Result<()>,
{
    let mut invalid = 0;
    for file in files {
        match check(file) {
            Ok(()) => println!(
                "{} {}",
                StatusIcon::Success,
                file.display().style(theme.name)
            ),
            Err(e) => {
                invalid += 1;
                println!(
                    "{} {}: {}",
                    StatusIcon::Error,
                    file.display().style(theme.failed),
                    e
                );
            }
        }
    }

    if invalid > 0 {
        return Err(CommandError::ValidationFailed {
            invalid,
            total: files.len(),
        });
    }
    Ok(())
}

impl ValidateConfigCommand {
    /// Check every file, printing one line per file
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::ValidationFailed`] if any file is invalid
    pub fn run(&self, theme: &Theme) -> Result<()> {
        report_all(&self.files, check_config, theme)
    }
}

impl ValidateManifestCommand {
    /// Check every file, printing one line per file
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::ValidationFailed`] if any file is invalid
    pub fn run(&self, theme: &Theme) -> Result<()> {
        report_all(&self.files, check_manifest, theme)
    }
}
