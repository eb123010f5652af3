//! Run command implementation
//!
//! Collects the files for the requested stage and runs the configured hooks
//! against them in declaration order.

use clap::Args;
use guanka_config::Stage;
use guanka_engine::hooks::{HookRunner, RunRequest, RunSummary};
use guanka_engine::git;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::{CommandError, Result};
use crate::ui::{ConsoleReporter, StatusIcon};

/// Passed to hooks together with [`TO_REF_ENV`] when running on a ref range
pub const FROM_REF_ENV: &str = "GUANKA_FROM_REF";
/// Passed to hooks together with [`FROM_REF_ENV`] when running on a ref range
pub const TO_REF_ENV: &str = "GUANKA_TO_REF";

/// Run command arguments
#[derive(Debug, Clone, Args)]
pub struct RunCommand {
    /// Only run the hook with this id
    #[arg(value_name = "HOOK")]
    pub hook: Option<String>,

    /// Run on every tracked file instead of the staged ones
    #[arg(short, long, conflicts_with = "files")]
    pub all_files: bool,

    /// Run on these files instead of the staged ones
    #[arg(long, num_args = 1.., value_name = "FILE")]
    pub files: Vec<String>,

    /// Stage whose hooks run
    #[arg(long, default_value = "pre-commit", value_name = "STAGE")]
    pub hook_stage: Stage,

    /// Run on files changed since this ref
    #[arg(long, requires = "to_ref", value_name = "REF")]
    pub from_ref: Option<String>,

    /// Run on files changed up to this ref
    #[arg(long, requires = "from_ref", value_name = "REF")]
    pub to_ref: Option<String>,

    /// Commit message file handed to `commit-msg` hooks
    #[arg(long, value_name = "FILE")]
    pub commit_msg_filename: Option<PathBuf>,

    /// Comma separated hook ids to skip
    #[arg(long, env = "SKIP", value_delimiter = ',', hide_env_values = true)]
    pub skip: Vec<String>,
}

impl RunCommand {
    /// Run the hooks of `stage` on the staged files
    #[must_use]
    pub fn for_stage(stage: Stage) -> Self {
        Self {
            hook: None,
            all_files: false,
            files: Vec::new(),
            hook_stage: stage,
            from_ref: None,
            to_ref: None,
            commit_msg_filename: None,
            skip: Vec::new(),
        }
    }

    /// Files handed to the hooks, relative to `root`
    fn collect_files(&self, root: &Path) -> Result<Vec<String>> {
        let stage = self.hook_stage;

        if stage.takes_message_file() {
            let path = self.commit_msg_filename.as_ref().ok_or_else(|| {
                CommandError::MissingStageInput {
                    stage: stage.to_string(),
                    what: "--commit-msg-filename",
                }
            })?;
            return Ok(vec![path.to_string_lossy().into_owned()]);
        }

        if !self.files.is_empty() {
            return Ok(self.files.clone());
        }
        if self.all_files {
            return Ok(git::all_files(root)?);
        }
        if let (Some(from), Some(to)) = (&self.from_ref, &self.to_ref) {
            return Ok(git::changed_files(root, from, to)?);
        }
        if stage == Stage::PrePush {
            return Err(CommandError::MissingStageInput {
                stage: stage.to_string(),
                what: "--from-ref and --to-ref (or --all-files)",
            });
        }

        if git::has_unmerged_paths(root)? {
            return Err(CommandError::UnmergedPaths);
        }
        Ok(git::staged_files(root)?)
    }

    fn skipped_ids(&self) -> impl Iterator<Item = &str> {
        self.skip
            .iter()
            .map(|id| id.trim())
            .filter(|id| !id.is_empty())
    }
}

impl Command for RunCommand {
    type Output = RunSummary;

    fn execute(&self, context: &RuntimeContext) -> Result<RunSummary> {
        let files = self.collect_files(&context.root)?;
        debug!(stage = %self.hook_stage, files = files.len(), "Collected files");

        let store = context.open_store()?;
        let hooks = context.prepare_hooks(&store)?;

        let mut builder = HookRunner::builder(&hooks, &context.root)
            .reporter(ConsoleReporter::new(context.theme))
            .fail_fast(context.config.fail_fast)
            .global_filter(context.global_filter()?)
            .skip(self.skipped_ids())
            .verbose(context.verbose)
            .detect_modifications(!self.hook_stage.takes_message_file());

        if let (Some(from), Some(to)) = (&self.from_ref, &self.to_ref) {
            builder = builder.env(FROM_REF_ENV, from).env(TO_REF_ENV, to);
        }

        let runner = builder.build();
        let mut request = RunRequest::new(self.hook_stage, files);
        if let Some(id) = &self.hook {
            request = request.only(id);
        }

        let summary = runner.run(&request)?;

        if summary.stopped_early {
            println!(
                "{} {}",
                StatusIcon::Warning,
                "Stopped after the first failure (fail_fast)".style(context.theme.warning)
            );
        }

        if summary.is_success() {
            return Ok(summary);
        }

        Err(CommandError::HooksFailed {
            failed: summary.failed().count(),
            total: summary.results.len(),
        })
    }
}
