//! Language environments
//!
//! Before any hook runs, every hook whose language needs an isolated
//! environment gets one. `system`, `script` and `fail` hooks run as they are;
//! `python` hooks run inside a virtualenv holding the hook repository and its
//! `additional_dependencies`.

pub mod python;

use crate::hooks::Hook;
use crate::store::{self, Store};
use guanka_config::Language;
use guanka_core::Result;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Directory inside a hook checkout holding its environments
pub const ENV_DIR_NAME: &str = ".guanka-env";

/// How to run a hook inside its environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HookEnvironment {
    /// Directories put in front of `PATH`
    pub path_prepend: Vec<PathBuf>,
    /// Variables set for the hook process
    pub vars: IndexMap<String, String>,
    /// Variables removed from the hook process
    pub unset: Vec<String>,
}

impl HookEnvironment {
    /// `PATH` value for the hook process
    ///
    /// Returns `None` when the environment does not change `PATH`.
    #[must_use]
    pub fn search_path(&self) -> Option<OsString> {
        if self.path_prepend.is_empty() {
            return None;
        }
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let dirs = self
            .path_prepend
            .iter()
            .cloned()
            .chain(std::env::split_paths(&inherited));
        std::env::join_paths(dirs).ok()
    }
}

/// Prepares language environments for resolved hooks
pub struct EnvironmentInstaller<'s> {
    store: &'s Store,
}

impl<'s> EnvironmentInstaller<'s> {
    /// Installer placing `local` hook environments in `store`
    #[must_use]
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Directory the environment of `hook` lives in
    ///
    /// Keyed by language, language version and the sorted dependency list, so
    /// hooks sharing all three share one environment.
    #[must_use]
    pub fn env_dir(&self, hook: &Hook) -> PathBuf {
        let def = &hook.definition;
        let language = def.language.name();
        let key = env_digest(language, &def.language_version, &def.additional_dependencies);
        let name = format!("{language}-{key}");
        match &hook.repo_dir {
            Some(dir) => dir.join(ENV_DIR_NAME).join(name),
            None => self.store.local_env_dir(&name),
        }
    }

    /// Prepare the environment of every hook
    ///
    /// # Errors
    ///
    /// Returns the first installation failure
    #[tracing::instrument(skip_all, fields(hooks = hooks.len()))]
    pub fn install_all(&self, hooks: &mut [Hook]) -> Result<()> {
        let mut prepared: HashMap<PathBuf, HookEnvironment> = HashMap::new();

        for hook in hooks.iter_mut() {
            if !hook.language().needs_environment() {
                continue;
            }

            let dir = self.env_dir(hook);
            if let Some(env) = prepared.get(&dir) {
                hook.environment = env.clone();
                continue;
            }

            self.install(hook, &dir)?;
            prepared.insert(dir, hook.environment.clone());
        }
        Ok(())
    }

    /// Prepare the environment of one hook into `dir`
    ///
    /// # Errors
    ///
    /// Returns `Error::Environment` if installation fails
    pub fn install(&self, hook: &mut Hook, dir: &Path) -> Result<()> {
        let def = &hook.definition;
        hook.environment = match def.language {
            Language::Python => python::install(
                dir,
                hook.repo_dir.as_deref(),
                &def.language_version,
                &def.additional_dependencies,
            )?,
            Language::System | Language::Script | Language::Fail => HookEnvironment::default(),
        };
        tracing::debug!(hook = %hook.id(), env = %dir.display(), "Environment ready");
        Ok(())
    }
}

/// Digest of an environment's identity, shared by all languages
pub(crate) fn env_digest(language: &str, version: &str, deps: &[String]) -> String {
    let mut sorted: Vec<&str> = deps.iter().map(String::as_str).collect();
    sorted.sort_unstable();

    let mut parts = vec![language, version];
    parts.extend(sorted);
    store::digest(&parts)
}
