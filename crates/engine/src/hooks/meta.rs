//! Built-in hooks of the `meta` repository
//!
//! Meta hooks check the configuration itself against the files tracked in the
//! repository. They run in-process and never spawn a command.

use super::config::Hook;
use super::filter::{Classifier, FileFilter};
use guanka_config::{HookDefinition, Language};
use std::fmt::Write;

/// Files meta checks are triggered by
pub const META_FILES: &str = r"^\.guanka\.toml$";

/// A built-in hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaHook {
    /// Print the filenames received
    Identity,
    /// Fail when an exclude pattern matches nothing
    CheckUselessExcludes,
    /// Fail when a hook matches no file
    CheckHooksApply,
}

/// Outcome of a meta check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaOutcome {
    /// Whether the check passed
    pub passed: bool,
    /// Text shown to the user
    pub output: String,
}

impl MetaHook {
    /// Look up a meta hook by id
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "identity" => Some(Self::Identity),
            "check-useless-excludes" => Some(Self::CheckUselessExcludes),
            "check-hooks-apply" => Some(Self::CheckHooksApply),
            _ => None,
        }
    }

    /// Hook id
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::CheckUselessExcludes => "check-useless-excludes",
            Self::CheckHooksApply => "check-hooks-apply",
        }
    }

    /// Built-in definition, before configuration overrides
    #[must_use]
    pub fn definition(&self) -> HookDefinition {
        let mut def = HookDefinition::placeholder(self.id());
        def.entry = format!("guanka meta {}", self.id());
        def.language = Language::System;
        match self {
            Self::Identity => {
                def.name = "identity".to_string();
                def.verbose = true;
            }
            Self::CheckUselessExcludes => {
                def.name = "Check for useless excludes".to_string();
                def.files = META_FILES.to_string();
            }
            Self::CheckHooksApply => {
                def.name = "Check hooks apply to the repository".to_string();
                def.files = META_FILES.to_string();
            }
        }
        def
    }

    /// Evaluate the check
    ///
    /// `files` are the paths the hook was selected for; `all_files` is every
    /// tracked path and `hooks` the full resolved hook list.
    pub fn run(
        &self,
        files: &[String],
        all_files: &[String],
        global: &FileFilter,
        hooks: &[Hook],
        classifier: &mut Classifier,
    ) -> MetaOutcome {
        match self {
            Self::Identity => identity(files),
            Self::CheckUselessExcludes => check_useless_excludes(all_files, global, hooks, classifier),
            Self::CheckHooksApply => check_hooks_apply(all_files, global, hooks, classifier),
        }
    }
}

fn identity(files: &[String]) -> MetaOutcome {
    let mut output = String::new();
    for file in files {
        output.push_str(file);
        output.push('\n');
    }
    MetaOutcome {
        passed: true,
        output,
    }
}

fn check_useless_excludes(
    all_files: &[String],
    global: &FileFilter,
    hooks: &[Hook],
    classifier: &mut Classifier,
) -> MetaOutcome {
    let mut output = String::new();

    if global.has_exclude() && !all_files.iter().any(|f| global.excludes(f)) {
        let _ = writeln!(
            output,
            "The global exclude pattern '{}' does not match any files",
            global.exclude_pattern()
        );
    }

    let candidates = global.apply(all_files, classifier);
    for hook in hooks.iter().filter(|h| !h.is_meta() && h.filter.has_exclude()) {
        let selected = hook.filter.apply_without_exclude(&candidates, classifier);
        if !selected.iter().any(|f| hook.filter.excludes(f)) {
            let _ = writeln!(
                output,
                "The exclude pattern '{}' for {} does not match any files",
                hook.filter.exclude_pattern(),
                hook.id()
            );
        }
    }

    MetaOutcome {
        passed: output.is_empty(),
        output,
    }
}

fn check_hooks_apply(
    all_files: &[String],
    global: &FileFilter,
    hooks: &[Hook],
    classifier: &mut Classifier,
) -> MetaOutcome {
    let mut output = String::new();
    let candidates = global.apply(all_files, classifier);

    for hook in hooks
        .iter()
        .filter(|h| !h.is_meta() && !h.definition.always_run)
    {
        if hook.filter.apply(&candidates, classifier).is_empty() {
            let _ = writeln!(output, "{} does not apply to this repository", hook.id());
        }
    }

    MetaOutcome {
        passed: output.is_empty(),
        output,
    }
}
