//! Guanka CLI library
//!
//! This library contains all the CLI logic for guanka, making it reusable
//! for testing and integration with other tools.

pub mod cmd;
pub mod command;
pub mod common;
pub mod error;
pub mod logging;
pub mod ui;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use guanka_engine::git;
use std::path::{Path, PathBuf};

use command::Command;
use common::RuntimeContext;
use error::CommandError;
use ui::{ColorChoice, Theme};

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("VERGEN_BUILD_DATE"),
    " with rustc ",
    env!("VERGEN_RUSTC_SEMVER"),
    ")"
);

/// Guanka - run git hooks from pinned repositories
#[derive(Parser)]
#[command(name = "guanka")]
#[command(about = "Run git hooks from pinned repositories")]
#[command(version = VERSION)]
#[command(long_about = "Run git hooks from pinned repositories

Hooks are declared in .guanka.toml, fetched at a pinned revision and run
in declaration order against the files of a commit or push.")]
pub struct Cli {
    /// Path to the config file
    #[arg(long, global = true, env = "GUANKA_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose output (shows DEBUG level logs and all hook output)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, global = true, env = "GUANKA_LOG_FILE", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t)]
    pub color: ColorChoice,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for guanka CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Run hooks
    Run(cmd::run::RunCommand),

    /// Install git hook scripts
    Install(cmd::install::InstallCommand),

    /// Remove git hook scripts
    Uninstall(cmd::install::UninstallCommand),

    /// Entry point of installed hook scripts
    #[command(hide = true)]
    HookImpl(cmd::hook_impl::HookImplCommand),

    /// List resolved hooks
    List(cmd::list::ListCommand),

    /// Show the resolved definition of a hook
    Show(cmd::list::ShowCommand),

    /// Validate configuration files
    ValidateConfig(cmd::validate::ValidateConfigCommand),

    /// Validate hook repository manifests
    ValidateManifest(cmd::validate::ValidateManifestCommand),

    /// Print a starter configuration
    SampleConfig,

    /// Remove cached repositories the configuration no longer uses
    Gc(cmd::clean::GcCommand),

    /// Delete the whole repository cache
    Clean(cmd::clean::CleanCommand),
}

/// Settings shared by every command
struct Globals {
    config: Option<PathBuf>,
    verbose: bool,
    theme: Theme,
    cwd: PathBuf,
}

impl Globals {
    fn context(&self) -> error::Result<RuntimeContext> {
        Ok(RuntimeContext::load(&self.cwd, self.config.as_deref())?
            .with_theme(self.theme)
            .with_verbose(self.verbose))
    }

    fn repo_root(&self) -> error::Result<PathBuf> {
        git::find_repo_root(&self.cwd)
            .map_err(|_| CommandError::NotAGitRepository(self.cwd.clone()))
    }
}

/// Run the guanka CLI
///
/// # Errors
///
/// Returns an error if the command fails or any hook fails
pub fn run(cli: Cli) -> Result<()> {
    let Cli {
        config,
        verbose,
        log_file,
        color,
        command,
    } = cli;

    crate::logging::init(verbose, log_file.as_deref())?;

    let globals = Globals {
        config,
        verbose,
        theme: Theme::new(color.enabled()),
        cwd: std::env::current_dir().context("Failed to get current directory")?,
    };

    execute_command(command, &globals)?;
    Ok(())
}

fn execute_command(command: Commands, globals: &Globals) -> error::Result<()> {
    let theme = &globals.theme;

    match command {
        Commands::Run(run_cmd) => {
            run_cmd.execute(&globals.context()?)?;
        }
        Commands::Install(install_cmd) => {
            let root = globals.repo_root()?;
            let config_path = globals.config.as_ref().map(|path| globals.cwd.join(path));
            install_cmd.run(&root, config_path.as_deref(), theme)?;
        }
        Commands::Uninstall(uninstall_cmd) => {
            uninstall_cmd.run(&globals.repo_root()?, theme)?;
        }
        Commands::HookImpl(hook_cmd) => {
            run_hook_impl(&hook_cmd, globals)?;
        }
        Commands::List(list_cmd) => {
            list_cmd.execute(&globals.context()?)?;
        }
        Commands::Show(show_cmd) => {
            show_cmd.execute(&globals.context()?)?;
        }
        Commands::ValidateConfig(validate_cmd) => {
            validate_cmd.run(theme)?;
        }
        Commands::ValidateManifest(validate_cmd) => {
            validate_cmd.run(theme)?;
        }
        Commands::SampleConfig => cmd::sample::run(),
        Commands::Gc(gc_cmd) => {
            gc_cmd.execute(&globals.context()?)?;
        }
        Commands::Clean(clean_cmd) => {
            let root = guanka_config::store_dir()
                .ok_or_else(|| anyhow!("Could not determine the cache directory"))?;
            clean_cmd.run(&root)?;
        }
    }

    Ok(())
}

/// Run the hooks for one git hook invocation
///
/// The `.legacy` script runs first; its failure fails the hook after
/// guanka's own hooks have run.
fn run_hook_impl(
    hook_cmd: &cmd::hook_impl::HookImplCommand,
    globals: &Globals,
) -> error::Result<()> {
    let root = globals.repo_root()?;
    let stdin = hook_cmd.read_stdin()?;
    let legacy_passed = hook_cmd.run_legacy(&git::hooks_dir(&root)?, &stdin)?;

    let context = match globals.context() {
        Ok(context) => context,
        Err(CommandError::Core(guanka_core::Error::ConfigNotFound { path }))
            if hook_cmd.skip_on_missing_config =>
        {
            println!("{} not found, skipping hooks", display_relative(&path, &root));
            return legacy_result(legacy_passed);
        }
        Err(e) => return Err(e),
    };

    if let Some(run_cmd) = hook_cmd.run_command(&stdin)? {
        run_cmd.execute(&context)?;
    }
    legacy_result(legacy_passed)
}

fn legacy_result(passed: bool) -> error::Result<()> {
    if passed {
        Ok(())
    } else {
        Err(anyhow!("The previous hook script (.legacy) failed").into())
    }
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "guanka",
            "run",
            "--all-files",
            "--color",
            "never",
            "--config",
            "ci.toml",
        ])
        .unwrap();
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.config, Some(PathBuf::from("ci.toml")));
        assert!(matches!(cli.command, Commands::Run(ref run) if run.all_files));
    }

    #[test]
    fn test_hook_impl_trailing_args() {
        let cli = Cli::try_parse_from([
            "guanka",
            "hook-impl",
            "--hook-type",
            "commit-msg",
            "--skip-on-missing-config",
            "--",
            ".git/COMMIT_EDITMSG",
        ])
        .unwrap();
        let Commands::HookImpl(hook_cmd) = cli.command else {
            panic!("expected hook-impl");
        };
        assert!(hook_cmd.skip_on_missing_config);
        assert_eq!(hook_cmd.args, vec![".git/COMMIT_EDITMSG"]);
    }

    #[test]
    fn test_install_repeated_hook_types() {
        let cli = Cli::try_parse_from(["guanka", "install", "-t", "pre-commit", "-t", "pre-push"])
            .unwrap();
        let Commands::Install(install_cmd) = cli.command else {
            panic!("expected install");
        };
        assert_eq!(
            install_cmd.hook_types,
            vec![guanka_config::Stage::PreCommit, guanka_config::Stage::PrePush]
        );
    }

    #[test]
    fn test_display_relative() {
        assert_eq!(
            display_relative(Path::new("/repo/.guanka.toml"), Path::new("/repo")),
            ".guanka.toml"
        );
    }
}
