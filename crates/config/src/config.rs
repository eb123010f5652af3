//! Repository configuration
//!
//! This module loads and validates `.guanka.toml`, the declarative list of hook
//! repositories, pinned revisions and per-hook parameters.

use crate::language::Language;
use crate::patterns::{self, MATCH_ALL, MATCH_NONE};
use crate::stage::Stage;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the configuration file at the repository root
pub const CONFIG_FILE_NAME: &str = ".guanka.toml";

/// Repository value for hooks defined inline in the configuration
pub const LOCAL_REPO: &str = "local";

/// Repository value for built-in hooks
pub const META_REPO: &str = "meta";

/// Hook ids provided by the `meta` repository
pub const META_HOOK_IDS: &[&str] = &["identity", "check-useless-excludes", "check-hooks-apply"];

/// Guanka configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Paths matching this regex are never passed to any hook
    #[serde(default = "default_exclude")]
    pub exclude: String,

    /// Only paths matching this regex are considered at all
    #[serde(default)]
    pub files: String,

    /// Stages hooks bind to unless they name their own
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_stages: Vec<Stage>,

    /// Language version used when a hook does not pin one (keyed by language)
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub default_language_version: IndexMap<String, String>,

    /// Stop running hooks after the first failure
    #[serde(default)]
    pub fail_fast: bool,

    /// Hook repositories, in execution order
    #[serde(default)]
    pub repos: Vec<RepoConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exclude: default_exclude(),
            files: MATCH_ALL.to_string(),
            default_stages: Vec::new(),
            default_language_version: IndexMap::new(),
            fail_fast: false,
            repos: Vec::new(),
        }
    }
}

/// One `[[repos]]` entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    /// Git URL or path, `local`, or `meta`
    pub repo: String,

    /// Pinned revision (tag, branch or commit); remote repositories only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Hooks selected from this repository, in execution order
    #[serde(default)]
    pub hooks: Vec<HookConfig>,
}

/// Where a repository's hook definitions come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoSource<'a> {
    /// Inline definitions in the configuration
    Local,
    /// Built-in hooks
    Meta,
    /// Definitions read from the manifest of a cloned repository
    Remote {
        /// Git URL or path
        url: &'a str,
        /// Pinned revision
        rev: &'a str,
    },
}

impl RepoConfig {
    /// Classify this repository
    ///
    /// # Errors
    ///
    /// Returns an error if a remote repository has no `rev`, or if `local`
    /// or `meta` repositories declare one
    pub fn source(&self) -> Result<RepoSource<'_>> {
        match (self.repo.as_str(), self.rev.as_deref()) {
            (LOCAL_REPO | META_REPO, Some(_)) => Err(Error::Config(format!(
                "repo '{}' must not have a 'rev'",
                self.repo
            ))),
            (LOCAL_REPO, None) => Ok(RepoSource::Local),
            (META_REPO, None) => Ok(RepoSource::Meta),
            (url, Some(rev)) if !rev.trim().is_empty() => Ok(RepoSource::Remote { url, rev }),
            (url, _) => Err(Error::Config(format!(
                "repo '{url}' is missing a pinned 'rev'"
            ))),
        }
    }
}

/// One `[[repos.hooks]]` entry
///
/// Every field but `id` is optional and overrides the manifest definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HookConfig {
    /// Hook identifier in the repository manifest
    pub id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Command to run (required for local hooks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,

    /// Language (required for local hooks)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,

    /// Arguments appended after the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,

    /// Extra packages installed into the hook environment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additional_dependencies: Vec<String>,

    /// Interpreter version for the hook environment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_version: Option<String>,

    /// Include regex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<String>,

    /// Exclude regex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,

    /// File tags that must all match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types: Option<Vec<String>>,

    /// File tags of which at least one must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub types_or: Option<Vec<String>>,

    /// File tags that must not match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_types: Option<Vec<String>>,

    /// Stages this hook binds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stages: Option<Vec<Stage>>,

    /// Run even when no file matches
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_run: Option<bool>,

    /// Append matched filenames to the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pass_filenames: Option<bool>,

    /// Stop the run if this hook fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,

    /// Print output even when the hook passes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbose: Option<bool>,

    /// Timeout in seconds (0 = none)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

fn default_exclude() -> String {
    MATCH_NONE.to_string()
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable or not valid TOML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "Loading configuration");
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), strip_prefix(&e))))
    }

    /// Parse configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML for this schema
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Stages hooks bind to when neither the hook nor its manifest names any
    #[must_use]
    pub fn effective_default_stages(&self) -> Vec<Stage> {
        if self.default_stages.is_empty() {
            Stage::defaults()
        } else {
            self.default_stages.clone()
        }
    }

    /// Iterate all hook declarations in execution order
    pub fn hooks(&self) -> impl Iterator<Item = (&RepoConfig, &HookConfig)> {
        self.repos
            .iter()
            .flat_map(|repo| repo.hooks.iter().map(move |hook| (repo, hook)))
    }

    /// Total number of hook declarations
    #[must_use]
    pub fn hook_count(&self) -> usize {
        self.repos.iter().map(|r| r.hooks.len()).sum()
    }

    /// All `(url, rev)` pairs of remote repositories
    #[must_use]
    pub fn remote_repos(&self) -> Vec<(&str, &str)> {
        self.repos
            .iter()
            .filter_map(|r| match r.source() {
                Ok(RepoSource::Remote { url, rev }) => Some((url, rev)),
                _ => None,
            })
            .collect()
    }

    /// Validate the configuration
    ///
    /// Checks for:
    /// - Valid global `files`/`exclude` regexes
    /// - Non-empty repository names, correct use of `rev`
    /// - At least one hook per repository and non-empty hook ids
    /// - Required fields of local hooks, known meta hook ids
    /// - Valid per-hook regexes
    /// - `additional_dependencies` only on languages that support them
    ///
    /// # Errors
    ///
    /// Returns the first problem found
    pub fn validate(&self) -> Result<()> {
        patterns::compile(&self.files, "top-level 'files'")?;
        patterns::compile(&self.exclude, "top-level 'exclude'")?;

        for lang in self.default_language_version.keys() {
            if !matches!(lang.as_str(), "python" | "system" | "script" | "fail") {
                tracing::warn!(
                    language = %lang,
                    "default_language_version names an unknown language"
                );
            }
        }

        for (idx, repo) in self.repos.iter().enumerate() {
            if repo.repo.trim().is_empty() {
                return Err(Error::Config(format!("repos[{idx}]: 'repo' cannot be empty")));
            }

            let source = repo.source()?;

            if repo.hooks.is_empty() {
                return Err(Error::Config(format!(
                    "repo '{}' does not declare any hooks",
                    repo.repo
                )));
            }

            for hook in &repo.hooks {
                hook.validate(&repo.repo, source)?;
            }
        }

        Ok(())
    }
}

impl HookConfig {
    /// Validate this declaration in the context of its repository
    ///
    /// # Errors
    ///
    /// Returns an error naming the repository and hook
    pub fn validate(&self, repo: &str, source: RepoSource<'_>) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::Config(format!(
                "repo '{repo}' has a hook with an empty 'id'"
            )));
        }

        let origin = |field: &str| format!("hook '{}' ({repo}) '{field}'", self.id);

        if let Some(files) = &self.files {
            patterns::compile(files, &origin("files"))?;
        }
        if let Some(exclude) = &self.exclude {
            patterns::compile(exclude, &origin("exclude"))?;
        }

        match source {
            RepoSource::Local => {
                if self.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
                    return Err(Error::Config(format!(
                        "local hook '{}' must have a 'name'",
                        self.id
                    )));
                }
                if self.entry.as_deref().is_none_or(|e| e.trim().is_empty()) {
                    return Err(Error::Config(format!(
                        "local hook '{}' must have an 'entry'",
                        self.id
                    )));
                }
                if self.language.is_none() {
                    return Err(Error::Config(format!(
                        "local hook '{}' must have a 'language'",
                        self.id
                    )));
                }
            }
            RepoSource::Meta => {
                if !META_HOOK_IDS.contains(&self.id.as_str()) {
                    return Err(Error::Config(format!(
                        "unknown meta hook '{}'. Valid meta hooks: {}",
                        self.id,
                        META_HOOK_IDS.join(", ")
                    )));
                }
                if self.entry.is_some() || self.language.is_some() {
                    return Err(Error::Config(format!(
                        "meta hook '{}' cannot override 'entry' or 'language'",
                        self.id
                    )));
                }
            }
            RepoSource::Remote { .. } => {}
        }

        if let Some(language) = self.language
            && !self.additional_dependencies.is_empty()
            && !language.supports_dependencies()
        {
            return Err(Error::Config(format!(
                "hook '{}' uses language '{}' which does not support 'additional_dependencies'",
                self.id, language
            )));
        }

        Ok(())
    }
}

/// Drop the "Invalid configuration: " prefix when re-wrapping a message
fn strip_prefix(err: &Error) -> String {
    match err {
        Error::Config(msg) => msg.clone(),
        other => other.to_string(),
    }
}
