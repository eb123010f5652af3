//! Hook resolution
//!
//! Turns configuration entries into runnable [`Hook`]s:
//! - remote repositories are checked out through the [`Store`] and their
//!   manifest is read once per repository
//! - `local` entries carry their whole definition inline
//! - `meta` entries map to built-in hooks
//!
//! Declaration order is preserved.

use super::config::{Hook, HookKind};
use super::meta::MetaHook;
use crate::store::Store;
use crate::tags;
use guanka_config::{
    Config, Error, HookConfig, HookDefinition, Language, Manifest, RepoConfig, RepoSource, Result,
    Stage,
};
use std::path::PathBuf;

/// Resolves configuration entries against their repositories
pub struct HookResolver<'s> {
    store: &'s Store,
}

impl<'s> HookResolver<'s> {
    /// Resolver fetching remote repositories into `store`
    #[must_use]
    pub fn new(store: &'s Store) -> Self {
        Self { store }
    }

    /// Resolve every hook of `config`, in declaration order
    ///
    /// # Errors
    ///
    /// Returns an error if a repository cannot be fetched, its manifest is
    /// invalid, or a declared hook id does not exist
    #[tracing::instrument(skip_all, fields(repos = config.repos.len()))]
    pub fn resolve(&self, config: &Config) -> Result<Vec<Hook>> {
        let mut hooks = Vec::with_capacity(config.hook_count());

        for repo in &config.repos {
            match repo.source()? {
                RepoSource::Local => hooks.extend(local_hooks(config, repo)?),
                RepoSource::Meta => {
                    for declared in &repo.hooks {
                        let meta = MetaHook::from_id(&declared.id).ok_or_else(|| {
                            Error::HookNotFound {
                                repo: repo.repo.clone(),
                                id: declared.id.clone(),
                            }
                        })?;
                        let definition = meta.definition().with_overrides(declared);
                        hooks.push(finish(
                            config,
                            repo,
                            None,
                            declared,
                            definition,
                            HookKind::Meta(meta),
                        )?);
                    }
                }
                RepoSource::Remote { url, rev } => {
                    let dir = self.store.checkout(url, rev)?;
                    let manifest = Manifest::load(&dir, url)?;

                    for declared in &repo.hooks {
                        let base = manifest.find(&declared.id).ok_or_else(|| {
                            Error::HookNotFound {
                                repo: url.to_string(),
                                id: declared.id.clone(),
                            }
                        })?;
                        let definition = base.clone().with_overrides(declared);
                        let kind = kind_for(definition.language);
                        hooks.push(finish(
                            config,
                            repo,
                            Some(dir.clone()),
                            declared,
                            definition,
                            kind,
                        )?);
                    }
                }
            }
        }

        tracing::debug!(hooks = hooks.len(), "Resolved hooks");
        Ok(hooks)
    }

    /// Resolve only the `local` hooks of `config`, without fetching anything
    ///
    /// # Errors
    ///
    /// Returns an error if a local definition is invalid
    pub fn resolve_local(config: &Config) -> Result<Vec<Hook>> {
        let mut hooks = Vec::new();
        for repo in &config.repos {
            if repo.source()? == RepoSource::Local {
                hooks.extend(local_hooks(config, repo)?);
            }
        }
        Ok(hooks)
    }
}

fn local_hooks(config: &Config, repo: &RepoConfig) -> Result<Vec<Hook>> {
    repo.hooks
        .iter()
        .map(|declared| {
            let definition = HookDefinition::from_local(declared)?;
            let kind = kind_for(definition.language);
            finish(config, repo, None, declared, definition, kind)
        })
        .collect()
}

fn kind_for(language: Language) -> HookKind {
    match language {
        Language::Fail => HookKind::Fail,
        Language::System | Language::Script | Language::Python => HookKind::Command,
    }
}

/// Language version precedence: the entry, `default_language_version`, then
/// the definition (manifest value or `default`)
fn language_version(config: &Config, declared: &HookConfig, def: &HookDefinition) -> String {
    declared
        .language_version
        .clone()
        .or_else(|| {
            config
                .default_language_version
                .get(def.language.name())
                .cloned()
        })
        .unwrap_or_else(|| def.language_version.clone())
}

/// Stage precedence: the entry, the manifest, `default_stages`, then every
/// stage but `manual`
///
/// Entry stages were already merged into the definition.
fn stages(config: &Config, def: &HookDefinition) -> Vec<Stage> {
    if def.stages.is_empty() {
        config.effective_default_stages()
    } else {
        def.stages.clone()
    }
}

fn finish(
    config: &Config,
    repo: &RepoConfig,
    repo_dir: Option<PathBuf>,
    declared: &HookConfig,
    mut definition: HookDefinition,
    kind: HookKind,
) -> Result<Hook> {
    definition.language_version = language_version(config, declared, &definition);

    for tag in definition
        .types
        .iter()
        .chain(&definition.types_or)
        .chain(&definition.exclude_types)
    {
        if !tags::is_known_tag(tag) {
            return Err(Error::Config(format!(
                "hook '{}' ({}) uses unknown file type '{}'",
                definition.id, repo.repo, tag
            )));
        }
    }

    if !definition.additional_dependencies.is_empty()
        && !definition.language.supports_dependencies()
    {
        return Err(Error::Config(format!(
            "hook '{}' ({}) uses language '{}' which does not support 'additional_dependencies'",
            definition.id, repo.repo, definition.language
        )));
    }

    let resolved_stages = stages(config, &definition);
    definition.stages.clone_from(&resolved_stages);

    Hook::new(repo.repo.clone(), repo_dir, definition, kind, resolved_stages)
}
