//! List and show resolved hooks

use clap::{Args, ValueEnum};
use guanka_config::{Language, Stage};
use guanka_engine::hooks::Hook;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt::Write;

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::{CommandError, Result};
use crate::ui::Theme;

/// Output format for the list command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per hook
    #[default]
    Simple,
    /// JSON array
    Json,
}

/// List command arguments
#[derive(Debug, Clone, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Only list hooks bound to this stage
    #[arg(long, value_name = "STAGE")]
    pub hook_stage: Option<Stage>,
}

/// Show command arguments
#[derive(Debug, Clone, Args)]
pub struct ShowCommand {
    /// Hook id
    pub id: String,
}

/// Serializable view of a resolved hook
#[derive(Debug, Serialize)]
pub struct HookInfo<'a> {
    id: &'a str,
    name: &'a str,
    repo: &'a str,
    language: Language,
    language_version: &'a str,
    entry: &'a str,
    args: &'a [String],
    stages: Vec<&'static str>,
    files: &'a str,
    exclude: &'a str,
    types: &'a [String],
    types_or: &'a [String],
    exclude_types: &'a [String],
    always_run: bool,
    pass_filenames: bool,
    fail_fast: bool,
    verbose: bool,
    #[serde(skip_serializing_if = "is_zero")]
    timeout: u64,
    additional_dependencies: &'a [String],
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_zero(value: &u64) -> bool {
    *value == 0
}

impl<'a> From<&'a Hook> for HookInfo<'a> {
    fn from(hook: &'a Hook) -> Self {
        let def = &hook.definition;
        Self {
            id: &def.id,
            name: &def.name,
            repo: &hook.repo,
            language: def.language,
            language_version: &def.language_version,
            entry: &def.entry,
            args: &def.args,
            stages: hook.stages.iter().map(Stage::name).collect(),
            files: &def.files,
            exclude: &def.exclude,
            types: &def.types,
            types_or: &def.types_or,
            exclude_types: &def.exclude_types,
            always_run: def.always_run,
            pass_filenames: def.pass_filenames,
            fail_fast: def.fail_fast,
            verbose: def.verbose,
            timeout: def.timeout,
            additional_dependencies: &def.additional_dependencies,
            description: &def.description,
        }
    }
}

/// Render hooks in the given format
///
/// # Errors
///
/// Returns an error if JSON serialization fails
pub fn render_list(hooks: &[&Hook], format: OutputFormat, theme: &Theme) -> Result<String> {
    if format == OutputFormat::Json {
        let infos: Vec<HookInfo<'_>> = hooks.iter().map(|h| HookInfo::from(*h)).collect();
        let mut json = serde_json::to_string_pretty(&infos).map_err(anyhow::Error::from)?;
        json.push('\n');
        return Ok(json);
    }

    let width = hooks.iter().map(|h| h.id().len()).max().unwrap_or(0);
    let mut out = String::new();
    for hook in hooks {
        let stages: Vec<&str> = hook.stages.iter().map(Stage::name).collect();
        let _ = writeln!(
            out,
            "{}  {}  {}",
            format!("{:<width$}", hook.id()).style(theme.name),
            hook.language().style(theme.dim),
            format!("[{}] {}", stages.join(", "), hook.repo).style(theme.dim),
        );
    }
    Ok(out)
}

/// Render the details of one hook
#[must_use]
pub fn render_hook(hook: &Hook, theme: &Theme) -> String {
    let def = &hook.definition;
    let mut out = format!("{}\n", def.name.style(theme.heading));

    let mut field = |label: &str, value: &str| {
        if !value.is_empty() {
            let _ = writeln!(out, "  {:<24}{value}", format!("{label}:").style(theme.dim));
        }
    };

    let stages: Vec<&str> = hook.stages.iter().map(Stage::name).collect();
    field("id", &def.id);
    field("repo", &hook.repo);
    field("description", &def.description);
    field("language", def.language.name());
    field("language version", &def.language_version);
    field("entry", &def.entry);
    field("args", &shell_words::join(&def.args));
    field("stages", &stages.join(", "));
    field("files", &def.files);
    field("exclude", &def.exclude);
    field("types", &def.types.join(", "));
    field("types or", &def.types_or.join(", "));
    field("exclude types", &def.exclude_types.join(", "));
    field("additional dependencies", &def.additional_dependencies.join(" "));
    field("always run", &def.always_run.to_string());
    field("pass filenames", &def.pass_filenames.to_string());
    field("fail fast", &def.fail_fast.to_string());
    if def.timeout > 0 {
        field("timeout", &format!("{}s", def.timeout));
    }
    out
}

impl Command for ListCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        let store = context.open_store()?;
        let hooks = context.resolve_hooks(&store)?;
        let selected: Vec<&Hook> = hooks
            .iter()
            .filter(|h| self.hook_stage.is_none_or(|stage| h.runs_at(stage)))
            .collect();

        print!("{}", render_list(&selected, self.format, &context.theme)?);
        Ok(())
    }
}

impl Command for ShowCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        let store = context.open_store()?;
        let hooks = context.resolve_hooks(&store)?;
        let matching: Vec<&Hook> = hooks.iter().filter(|h| h.id() == self.id).collect();

        if matching.is_empty() {
            return Err(CommandError::Core(guanka_core::Error::Message(format!(
                "No hook with id '{}' in {}",
                self.id,
                context.config_path.display()
            ))));
        }

        let blocks: Vec<String> = matching
            .iter()
            .map(|h| render_hook(h, &context.theme))
            .collect();
        print!("{}", blocks.join("\n"));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use guanka_config::HookDefinition;
    use guanka_engine::hooks::HookKind;

    fn hook(id: &str, stages: Vec<Stage>) -> Hook {
        let mut def = HookDefinition::placeholder(id);
        def.entry = format!("{id} --check");
        def.args = vec!["--line-length".to_string(), "88 chars".to_string()];
        Hook::new("local", None, def, HookKind::Command, stages).unwrap()
    }

    #[test]
    fn test_simple_list_aligns_ids() {
        let a = hook("ruff", vec![Stage::PreCommit]);
        let b = hook("check-yaml", vec![Stage::PreCommit, Stage::PrePush]);
        let text = render_list(&[&a, &b], OutputFormat::Simple, &Theme::plain()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ruff        system"));
        assert!(lines[1].contains("[pre-commit, pre-push] local"));
    }

    #[test]
    fn test_json_list() {
        let a = hook("ruff", vec![Stage::Manual]);
        let text = render_list(&[&a], OutputFormat::Json, &Theme::plain()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value[0]["id"], "ruff");
        assert_eq!(value[0]["language"], "system");
        assert_eq!(value[0]["stages"][0], "manual");
        assert!(value[0].get("timeout").is_none());
    }

    #[test]
    fn test_show_quotes_args() {
        let text = render_hook(&hook("ruff", vec![Stage::PreCommit]), &Theme::plain());
        assert!(text.starts_with("ruff\n"));
        assert!(text.contains("entry:"));
        assert!(text.contains("--line-length '88 chars'"));
        assert!(!text.contains("timeout"));
    }
}
