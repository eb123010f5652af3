//! Resolved hook structures
//!
//! A [`Hook`] is a configuration entry merged with its manifest definition:
//! every field has its final value, regexes are compiled and the stages the
//! hook binds to are known.

use super::filter::FileFilter;
use super::meta::MetaHook;
use crate::languages::HookEnvironment;
use guanka_config::{HookDefinition, Language, Stage};
use guanka_core::Result;
use std::path::{Path, PathBuf};

/// How a hook is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// Spawn `entry` + `args` (+ filenames)
    Command,
    /// Fail immediately, listing the matched files
    Fail,
    /// Built-in check evaluated in-process
    Meta(MetaHook),
}

/// A fully resolved hook, ready to run
#[derive(Debug, Clone)]
pub struct Hook {
    /// Repository the hook comes from (`local`, `meta` or a URL)
    pub repo: String,

    /// Checkout directory for hooks from remote repositories
    pub repo_dir: Option<PathBuf>,

    /// Final definition after applying configuration overrides
    pub definition: HookDefinition,

    /// Execution strategy
    pub kind: HookKind,

    /// Stages this hook runs at
    pub stages: Vec<Stage>,

    /// Environment prepared by the language installer
    pub environment: HookEnvironment,

    /// Compiled file selection
    pub filter: FileFilter,
}

impl Hook {
    /// Build a hook from its final definition
    ///
    /// # Errors
    ///
    /// Returns an error if `files` or `exclude` is not a valid regex
    pub fn new(
        repo: impl Into<String>,
        repo_dir: Option<PathBuf>,
        definition: HookDefinition,
        kind: HookKind,
        stages: Vec<Stage>,
    ) -> Result<Self> {
        let filter = FileFilter::for_hook(&definition)?;
        Ok(Self {
            repo: repo.into(),
            repo_dir,
            definition,
            kind,
            stages,
            environment: HookEnvironment::default(),
            filter,
        })
    }

    /// Hook identifier
    #[must_use]
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Display name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// Implementation language
    #[must_use]
    pub fn language(&self) -> Language {
        self.definition.language
    }

    /// Whether the hook runs at `stage`
    #[must_use]
    pub fn runs_at(&self, stage: Stage) -> bool {
        self.stages.contains(&stage)
    }

    /// Whether this is a built-in meta hook
    #[must_use]
    pub fn is_meta(&self) -> bool {
        matches!(self.kind, HookKind::Meta(_))
    }

    /// Directory relative `script` entries are resolved against
    ///
    /// Remote hooks resolve inside their checkout, local hooks inside the
    /// project.
    #[must_use]
    pub fn script_base<'p>(&'p self, project_root: &'p Path) -> &'p Path {
        self.repo_dir.as_deref().unwrap_or(project_root)
    }
}
