//! Entry point of installed git hook scripts
//!
//! Translates what git hands to a hook (arguments and stdin) into a
//! [`RunCommand`] for the matching stage.

use anyhow::Context;
use clap::Args;
use guanka_config::Stage;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::cmd::install::legacy_path;
use crate::cmd::run::RunCommand;
use crate::error::{CommandError, Result};

/// Whether `sha` is the all-zero object name git uses for "no commit"
///
/// Covers both SHA-1 and SHA-256 repositories.
fn is_null_object(sha: &str) -> bool {
    !sha.is_empty() && sha.bytes().all(|b| b == b'0')
}

/// Hook-impl command arguments
#[derive(Debug, Clone, Args)]
pub struct HookImplCommand {
    /// Git hook being run
    #[arg(long, value_name = "TYPE")]
    pub hook_type: Stage,

    /// Succeed quietly when the repository has no configuration
    #[arg(long)]
    pub skip_on_missing_config: bool,

    /// Comma separated hook ids to skip
    #[arg(long, env = "SKIP", value_delimiter = ',', hide_env_values = true)]
    pub skip: Vec<String>,

    /// Arguments git passed to the hook
    #[arg(last = true)]
    pub args: Vec<String>,
}

/// Files a push covers, read from the pre-push stdin
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushRange {
    /// Nothing but deletions
    Nothing,
    /// A new branch without a remote counterpart
    AllFiles,
    /// Commits between the remote and the local object
    Range {
        /// Remote object name
        from: String,
        /// Local object name
        to: String,
    },
}

/// Parse the `<local ref> <local sha> <remote ref> <remote sha>` lines git
/// writes to the pre-push stdin
///
/// The first line that is not a deletion decides the range.
#[must_use]
pub fn parse_push_range(input: &str) -> PushRange {
    for line in input.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [_, local_sha, _, remote_sha] = fields.as_slice() else {
            continue;
        };
        if is_null_object(local_sha) {
            continue;
        }
        if is_null_object(remote_sha) {
            return PushRange::AllFiles;
        }
        return PushRange::Range {
            from: (*remote_sha).to_string(),
            to: (*local_sha).to_string(),
        };
    }
    PushRange::Nothing
}

impl HookImplCommand {
    /// Run command for this invocation, `None` when there is nothing to check
    ///
    /// # Errors
    ///
    /// Returns an error if git did not pass what the stage needs
    pub fn run_command(&self, stdin: &str) -> Result<Option<RunCommand>> {
        let mut run = RunCommand::for_stage(self.hook_type);
        run.skip.clone_from(&self.skip);

        match self.hook_type {
            Stage::CommitMsg => {
                let file = self.args.first().ok_or(CommandError::MissingStageInput {
                    stage: self.hook_type.to_string(),
                    what: "the commit message file argument",
                })?;
                run.commit_msg_filename = Some(PathBuf::from(file));
            }
            Stage::PrePush => match parse_push_range(stdin) {
                PushRange::Nothing => return Ok(None),
                PushRange::AllFiles => run.all_files = true,
                PushRange::Range { from, to } => {
                    run.from_ref = Some(from);
                    run.to_ref = Some(to);
                }
            },
            Stage::PreCommit | Stage::Manual => {}
        }

        Ok(Some(run))
    }

    /// Read what git writes to stdin for this hook type
    ///
    /// # Errors
    ///
    /// Returns an error if stdin cannot be read
    pub fn read_stdin(&self) -> Result<String> {
        let mut input = String::new();
        if self.hook_type == Stage::PrePush {
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read the pushed refs from stdin")?;
        }
        Ok(input)
    }

    /// Run the `.legacy` script of this hook type, if any
    ///
    /// Returns `false` when the script ran and failed.
    ///
    /// # Errors
    ///
    /// Returns an error if the script exists but cannot be started
    pub fn run_legacy(&self, hooks_dir: &Path, stdin: &str) -> Result<bool> {
        let Some(name) = self.hook_type.git_hook_name() else {
            return Ok(true);
        };
        let legacy = legacy_path(&hooks_dir.join(name));
        if !legacy.is_file() {
            return Ok(true);
        }

        debug!(script = %legacy.display(), "Running legacy hook");
        let output = duct::cmd(&legacy, &self.args)
            .stdin_bytes(stdin.as_bytes().to_vec())
            .unchecked()
            .run()
            .with_context(|| format!("Failed to run {}", legacy.display()))?;

        if output.status.success() {
            Ok(true)
        } else {
            warn!(script = %legacy.display(), status = %output.status, "Legacy hook failed");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    const ZERO_SHA: &str = "0000000000000000000000000000000000000000";
    const LOCAL: &str = "1111111111111111111111111111111111111111";
    const REMOTE: &str = "2222222222222222222222222222222222222222";

    fn command(stage: Stage, args: &[&str]) -> HookImplCommand {
        HookImplCommand {
            hook_type: stage,
            skip_on_missing_config: true,
            skip: vec!["slow".to_string()],
            args: args.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_push_range_existing_branch() {
        let input = format!("refs/heads/main {LOCAL} refs/heads/main {REMOTE}\n");
        assert_eq!(
            parse_push_range(&input),
            PushRange::Range {
                from: REMOTE.to_string(),
                to: LOCAL.to_string()
            }
        );
    }

    #[test]
    fn test_push_range_new_branch() {
        let input = format!("refs/heads/topic {LOCAL} refs/heads/topic {ZERO_SHA}\n");
        assert_eq!(parse_push_range(&input), PushRange::AllFiles);
    }

    #[test]
    fn test_push_range_skips_deletions() {
        let input = format!(
            "(delete) {ZERO_SHA} refs/heads/old {REMOTE}\nrefs/heads/main {LOCAL} refs/heads/main {REMOTE}\n"
        );
        assert!(matches!(parse_push_range(&input), PushRange::Range { .. }));

        let only_delete = format!("(delete) {ZERO_SHA} refs/heads/old {REMOTE}\n");
        assert_eq!(parse_push_range(&only_delete), PushRange::Nothing);
        assert_eq!(parse_push_range(""), PushRange::Nothing);
    }

    #[test]
    fn test_push_range_sha256_repository() {
        let zero = "0".repeat(64);
        let local = "1".repeat(64);
        let input = format!("refs/heads/topic {local} refs/heads/topic {zero}\n");
        assert_eq!(parse_push_range(&input), PushRange::AllFiles);

        let delete = format!("(delete) {zero} refs/heads/old {local}\n");
        assert_eq!(parse_push_range(&delete), PushRange::Nothing);
    }

    #[test]
    fn test_commit_msg_uses_first_argument() {
        let run = command(Stage::CommitMsg, &[".git/COMMIT_EDITMSG"])
            .run_command("")
            .unwrap()
            .unwrap();
        assert_eq!(run.hook_stage, Stage::CommitMsg);
        assert_eq!(
            run.commit_msg_filename,
            Some(PathBuf::from(".git/COMMIT_EDITMSG"))
        );
        assert_eq!(run.skip, vec!["slow"]);
    }

    #[test]
    fn test_commit_msg_without_argument() {
        let err = command(Stage::CommitMsg, &[]).run_command("").unwrap_err();
        assert!(matches!(err, CommandError::MissingStageInput { .. }));
    }

    #[test]
    fn test_pre_push_new_branch_runs_all_files() {
        let input = format!("refs/heads/topic {LOCAL} refs/heads/topic {ZERO_SHA}\n");
        let run = command(Stage::PrePush, &["origin", "git@host:repo"])
            .run_command(&input)
            .unwrap()
            .unwrap();
        assert!(run.all_files);
        assert!(run.from_ref.is_none());
    }

    #[test]
    fn test_pre_push_nothing_to_check() {
        let run = command(Stage::PrePush, &["origin", "url"])
            .run_command("")
            .unwrap();
        assert!(run.is_none());
    }

    #[test]
    fn test_missing_legacy_counts_as_success() {
        let temp = tempfile::TempDir::new().unwrap();
        assert!(
            command(Stage::PreCommit, &[])
                .run_legacy(temp.path(), "")
                .unwrap()
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_legacy_is_reported() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::TempDir::new().unwrap();
        let legacy = temp.path().join("pre-commit.legacy");
        std::fs::write(&legacy, "#!/bin/sh\nexit 3\n").unwrap();
        std::fs::set_permissions(&legacy, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(
            !command(Stage::PreCommit, &[])
                .run_legacy(temp.path(), "")
                .unwrap()
        );
    }
}
