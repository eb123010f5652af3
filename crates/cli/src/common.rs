//! Common utilities and types shared across CLI commands

use crate::error::{CommandError, Result};
use crate::ui::{Theme, with_spinner};
use anyhow::Context;
use guanka_config::{CONFIG_FILE_NAME, Config};
use guanka_engine::hooks::{FileFilter, Hook, HookResolver};
use guanka_engine::{EnvironmentInstaller, Store, git};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runtime context for CLI commands
///
/// Consolidates what most commands need: the loaded configuration, the work
/// tree it belongs to and the output settings.
#[derive(Clone)]
pub struct RuntimeContext {
    /// Shared configuration
    pub config: Arc<Config>,
    /// Root of the git work tree
    pub root: PathBuf,
    /// File the configuration was loaded from
    pub config_path: PathBuf,
    /// Console theme
    pub theme: Theme,
    /// Show hook output even on success
    pub verbose: bool,
    store_root: Option<PathBuf>,
}

impl RuntimeContext {
    /// Create a context from an already loaded configuration
    pub fn new(config: Config, root: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            config: Arc::new(config),
            root: root.into(),
            config_path: config_path.into(),
            theme: Theme::plain(),
            verbose: false,
            store_root: None,
        }
    }

    /// Locate the work tree around `cwd` and load its configuration
    ///
    /// `config_override` replaces `<root>/.guanka.toml`; a relative override
    /// is resolved against `cwd`.
    ///
    /// # Errors
    ///
    /// Returns an error outside a git work tree or if the configuration is
    /// missing or invalid
    pub fn load(cwd: &Path, config_override: Option<&Path>) -> Result<Self> {
        let root = git::find_repo_root(cwd)
            .map_err(|_| CommandError::NotAGitRepository(cwd.to_path_buf()))?;

        let config_path = config_override.map_or_else(
            || root.join(CONFIG_FILE_NAME),
            |path| cwd.join(path),
        );

        let config = Config::load(&config_path)?;
        config.validate()?;
        tracing::debug!(
            root = %root.display(),
            config = %config_path.display(),
            hooks = config.hook_count(),
            "Loaded configuration"
        );

        Ok(Self::new(config, root, config_path))
    }

    /// Use `theme` for console output
    #[must_use]
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    /// Show hook output even on success
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Keep the repository store under `root` instead of the cache directory
    #[must_use]
    pub fn with_store_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.store_root = Some(root.into());
        self
    }

    /// Open the repository store
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be opened
    pub fn open_store(&self) -> Result<Store> {
        let store = match &self.store_root {
            Some(root) => Store::open(root),
            None => Store::open_default(),
        };
        Ok(store.context("Failed to open the repository store")?)
    }

    /// Resolve every configured hook in declaration order
    ///
    /// # Errors
    ///
    /// Returns an error if a repository cannot be fetched or a hook is unknown
    pub fn resolve_hooks(&self, store: &Store) -> Result<Vec<Hook>> {
        let hooks = with_spinner("Fetching hook repositories", || {
            HookResolver::new(store).resolve(&self.config)
        })?;
        Ok(hooks)
    }

    /// Resolve every configured hook and prepare its environment
    ///
    /// # Errors
    ///
    /// Returns an error if a repository cannot be fetched, a hook is unknown,
    /// or an environment cannot be installed
    pub fn prepare_hooks(&self, store: &Store) -> Result<Vec<Hook>> {
        let mut hooks = self.resolve_hooks(store)?;

        with_spinner("Preparing hook environments", || {
            EnvironmentInstaller::new(store).install_all(&mut hooks)
        })?;

        Ok(hooks)
    }

    /// Filter built from the top-level `files` and `exclude`
    ///
    /// # Errors
    ///
    /// Returns an error if either pattern is invalid
    pub fn global_filter(&self) -> Result<FileFilter> {
        Ok(FileFilter::new(&self.config.files, &self.config.exclude)?)
    }
}
