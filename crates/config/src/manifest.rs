//! Hook repository manifest
//!
//! A hook repository publishes its hooks in `.guanka-hooks.toml` at its root:
//!
//! ```toml
//! [[hooks]]
//! id = "trailing-whitespace"
//! name = "Trim trailing whitespace"
//! entry = "bin/trim.sh"
//! language = "script"
//! types = ["text"]
//! ```
//!
//! A configuration entry selects a hook by `id` and may override any field
//! except `id`, `entry` and `language`.

use crate::config::HookConfig;
use crate::language::Language;
use crate::patterns::{self, MATCH_ALL, MATCH_NONE};
use crate::stage::Stage;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Name of the manifest file at the root of a hook repository
pub const MANIFEST_FILE_NAME: &str = ".guanka-hooks.toml";

/// Language version placeholder meaning "whatever is on PATH"
pub const DEFAULT_LANGUAGE_VERSION: &str = "default";

/// Hooks published by a repository
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Manifest {
    /// Hook definitions
    #[serde(default)]
    pub hooks: Vec<HookDefinition>,
}

/// Complete hook definition
///
/// Manifest entries are parsed into this type with defaults applied; local
/// hooks are built from their configuration entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookDefinition {
    /// Unique identifier within the repository
    pub id: String,

    /// Display name
    pub name: String,

    /// Command to run
    pub entry: String,

    /// Implementation language
    pub language: Language,

    /// Arguments appended after the entry
    #[serde(default)]
    pub args: Vec<String>,

    /// Include regex
    #[serde(default)]
    pub files: String,

    /// Exclude regex
    #[serde(default = "default_exclude")]
    pub exclude: String,

    /// File tags that must all match
    #[serde(default = "default_types")]
    pub types: Vec<String>,

    /// File tags of which at least one must match (empty = any)
    #[serde(default)]
    pub types_or: Vec<String>,

    /// File tags that must not match
    #[serde(default)]
    pub exclude_types: Vec<String>,

    /// Stages the hook binds to (empty = inherit)
    #[serde(default)]
    pub stages: Vec<Stage>,

    /// Run even when no file matches
    #[serde(default)]
    pub always_run: bool,

    /// Append matched filenames to the command line
    #[serde(default = "default_true")]
    pub pass_filenames: bool,

    /// Stop the run if this hook fails
    #[serde(default)]
    pub fail_fast: bool,

    /// Print output even when the hook passes
    #[serde(default)]
    pub verbose: bool,

    /// Timeout in seconds (0 = none)
    #[serde(default)]
    pub timeout: u64,

    /// Interpreter version
    #[serde(default = "default_language_version")]
    pub language_version: String,

    /// Extra packages installed into the environment
    #[serde(default)]
    pub additional_dependencies: Vec<String>,

    /// Human readable description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

fn default_exclude() -> String {
    MATCH_NONE.to_string()
}

fn default_types() -> Vec<String> {
    vec!["file".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_language_version() -> String {
    DEFAULT_LANGUAGE_VERSION.to_string()
}

impl Manifest {
    /// Load the manifest of a checked-out repository
    ///
    /// `repo` names the repository in error messages.
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` if the file is missing, unparsable or invalid
    pub fn load(repo_dir: &Path, repo: &str) -> Result<Self> {
        let path = repo_dir.join(MANIFEST_FILE_NAME);
        let content = fs::read_to_string(&path).map_err(|e| Error::Manifest {
            repo: repo.to_string(),
            message: format!("cannot read {MANIFEST_FILE_NAME}: {e}"),
        })?;

        let manifest = Self::from_toml_str(&content, repo)?;
        manifest.validate(repo)?;
        tracing::debug!(repo, hooks = manifest.hooks.len(), "Loaded manifest");
        Ok(manifest)
    }

    /// Parse a manifest from a TOML string
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` if the content does not match the schema
    pub fn from_toml_str(content: &str, repo: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Manifest {
            repo: repo.to_string(),
            message: e.to_string(),
        })
    }

    /// Look up a hook definition by id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&HookDefinition> {
        self.hooks.iter().find(|h| h.id == id)
    }

    /// Validate every definition and reject duplicate ids
    ///
    /// # Errors
    ///
    /// Returns `Error::Manifest` describing the first problem
    pub fn validate(&self, repo: &str) -> Result<()> {
        let mut seen = HashSet::new();
        for hook in &self.hooks {
            if !seen.insert(hook.id.as_str()) {
                return Err(Error::Manifest {
                    repo: repo.to_string(),
                    message: format!("duplicate hook id '{}'", hook.id),
                });
            }
            hook.validate().map_err(|e| Error::Manifest {
                repo: repo.to_string(),
                message: match e {
                    Error::Config(msg) => msg,
                    other => other.to_string(),
                },
            })?;
        }
        Ok(())
    }
}

impl HookDefinition {
    /// Build a definition for a `local` hook from its configuration entry
    ///
    /// # Errors
    ///
    /// Returns an error if `name`, `entry` or `language` is missing
    pub fn from_local(config: &HookConfig) -> Result<Self> {
        let missing = |field: &str| {
            Error::Config(format!("local hook '{}' must have a '{field}'", config.id))
        };

        let base = Self {
            id: config.id.clone(),
            name: config.name.clone().ok_or_else(|| missing("name"))?,
            entry: config.entry.clone().ok_or_else(|| missing("entry"))?,
            language: config.language.ok_or_else(|| missing("language"))?,
            ..Self::placeholder(&config.id)
        };

        let mut hook = base.with_overrides(config);
        if let Some(version) = &config.language_version {
            hook.language_version.clone_from(version);
        }
        hook.validate()?;
        Ok(hook)
    }

    /// Definition with every optional field at its default
    #[must_use]
    pub fn placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            entry: String::new(),
            language: Language::System,
            args: Vec::new(),
            files: MATCH_ALL.to_string(),
            exclude: default_exclude(),
            types: default_types(),
            types_or: Vec::new(),
            exclude_types: Vec::new(),
            stages: Vec::new(),
            always_run: false,
            pass_filenames: true,
            fail_fast: false,
            verbose: false,
            timeout: 0,
            language_version: default_language_version(),
            additional_dependencies: Vec::new(),
            description: String::new(),
        }
    }

    /// Apply configuration overrides on top of this definition
    ///
    /// `language_version` is left untouched: its precedence also involves the
    /// top-level `default_language_version` and is resolved by the caller.
    /// `additional_dependencies` from the configuration replace the manifest's
    /// only when non-empty.
    #[must_use]
    pub fn with_overrides(mut self, config: &HookConfig) -> Self {
        if let Some(name) = &config.name {
            self.name.clone_from(name);
        }
        if let Some(entry) = &config.entry {
            self.entry.clone_from(entry);
        }
        if let Some(language) = config.language {
            self.language = language;
        }
        if let Some(args) = &config.args {
            self.args.clone_from(args);
        }
        if !config.additional_dependencies.is_empty() {
            self.additional_dependencies
                .clone_from(&config.additional_dependencies);
        }
        if let Some(files) = &config.files {
            self.files.clone_from(files);
        }
        if let Some(exclude) = &config.exclude {
            self.exclude.clone_from(exclude);
        }
        if let Some(types) = &config.types {
            self.types.clone_from(types);
        }
        if let Some(types_or) = &config.types_or {
            self.types_or.clone_from(types_or);
        }
        if let Some(exclude_types) = &config.exclude_types {
            self.exclude_types.clone_from(exclude_types);
        }
        if let Some(stages) = &config.stages {
            self.stages.clone_from(stages);
        }
        if let Some(always_run) = config.always_run {
            self.always_run = always_run;
        }
        if let Some(pass_filenames) = config.pass_filenames {
            self.pass_filenames = pass_filenames;
        }
        if let Some(fail_fast) = config.fail_fast {
            self.fail_fast = fail_fast;
        }
        if let Some(verbose) = config.verbose {
            self.verbose = verbose;
        }
        if let Some(timeout) = config.timeout {
            self.timeout = timeout;
        }
        self
    }

    /// Validate this definition
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the problem
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Config("hook id cannot be empty".to_string()));
        }
        if self.entry.trim().is_empty() && self.language != Language::Fail {
            return Err(Error::Config(format!(
                "hook '{}' has an empty 'entry'",
                self.id
            )));
        }
        if shell_words_balanced(&self.entry).is_none() {
            return Err(Error::Config(format!(
                "hook '{}' has an unterminated quote in 'entry'",
                self.id
            )));
        }
        patterns::compile(&self.files, &format!("hook '{}' 'files'", self.id))?;
        patterns::compile(&self.exclude, &format!("hook '{}' 'exclude'", self.id))?;

        if !self.additional_dependencies.is_empty() && !self.language.supports_dependencies() {
            return Err(Error::Config(format!(
                "hook '{}' uses language '{}' which does not support 'additional_dependencies'",
                self.id, self.language
            )));
        }
        Ok(())
    }
}

/// Check that single and double quotes in an entry are balanced
///
/// Full splitting happens in the engine; this only catches obvious mistakes
/// at load time.
fn shell_words_balanced(entry: &str) -> Option<()> {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in entry.chars() {
        match (quote, c) {
            (_, _) if escaped => escaped = false,
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('"') | None, '\\') => escaped = true,
            (None, '\'' | '"') => quote = Some(c),
            _ => {}
        }
    }
    if quote.is_none() { Some(()) } else { None }
}
