//! Hook execution engine
//!
//! Runs resolved hooks one after another, in declaration order, against a list
//! of candidate files. A hook that exits non-zero produces a failed
//! [`HookResult`]; only infrastructure problems surface as errors.

use super::config::{Hook, HookKind};
use super::filter::{Classifier, FileFilter};
use crate::git;
use guanka_config::{Language, Stage};
use guanka_core::{Error, Result};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Upper bound for the length of one hook command line
///
/// Filenames beyond it are passed to further invocations of the same command.
pub const MAX_COMMAND_LENGTH: usize = 1 << 17;

/// Receives hook progress as the run advances
pub trait ResultReporter {
    /// Called right before a hook is executed
    fn hook_started(&self, _hook: &Hook) {}

    /// Called once per hook, as soon as its result is known
    fn report(&self, result: &HookResult);
}

/// Reporter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpReporter;

impl ResultReporter for NoOpReporter {
    fn report(&self, _result: &HookResult) {}
}

/// Implement `ResultReporter` for closures
impl<F> ResultReporter for F
where
    F: Fn(&HookResult),
{
    fn report(&self, result: &HookResult) {
        self(result);
    }
}

/// Why a hook did not run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No candidate file matched the hook's filter
    NoFiles,
    /// Listed in `SKIP`
    Disabled,
}

impl SkipReason {
    /// Text shown next to the skipped hook
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::NoFiles => "(no files to check)",
            Self::Disabled => "",
        }
    }
}

/// Final state of a hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookStatus {
    /// Exited zero without touching the work tree
    Passed,
    /// Non-zero exit, timeout, or modified files
    Failed,
    /// Not executed
    Skipped(SkipReason),
}

/// Outcome of one hook
#[derive(Debug, Clone)]
pub struct HookResult {
    /// Hook id
    pub id: String,
    /// Display name
    pub name: String,
    /// Final state
    pub status: HookStatus,
    /// Exit code of the failing (or last) invocation, if the hook ran
    pub exit_code: Option<i32>,
    /// Combined stdout and stderr, verbatim
    pub output: String,
    /// Whether the work tree changed while the hook ran
    pub files_modified: bool,
    /// Wall-clock time spent
    pub duration: Duration,
    /// Whether the output should be shown on success too
    pub verbose: bool,
    /// Whether the hook was killed after its timeout
    pub timed_out: bool,
}

impl HookResult {
    fn skipped(hook: &Hook, reason: SkipReason) -> Self {
        Self {
            id: hook.id().to_string(),
            name: hook.name().to_string(),
            status: HookStatus::Skipped(reason),
            exit_code: None,
            output: String::new(),
            files_modified: false,
            duration: Duration::ZERO,
            verbose: false,
            timed_out: false,
        }
    }

    /// Whether the hook failed
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.status == HookStatus::Failed
    }
}

/// What to run
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Stage being run; hooks not bound to it are ignored
    pub stage: Stage,
    /// Candidate paths relative to the project root
    ///
    /// For stages taking a message file this is the message file alone.
    pub files: Vec<String>,
    /// Only run the hook with this id
    pub hook_filter: Option<String>,
}

impl RunRequest {
    /// Run every hook of `stage` against `files`
    #[must_use]
    pub fn new(stage: Stage, files: Vec<String>) -> Self {
        Self {
            stage,
            files,
            hook_filter: None,
        }
    }

    /// Restrict the run to a single hook id
    #[must_use]
    pub fn only(mut self, id: impl Into<String>) -> Self {
        self.hook_filter = Some(id.into());
        self
    }
}

/// Results of a run, in execution order
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// One result per selected hook that was reached
    pub results: Vec<HookResult>,
    /// Whether fail-fast stopped the run before every hook was reached
    pub stopped_early: bool,
}

impl RunSummary {
    /// Failed results
    pub fn failed(&self) -> impl Iterator<Item = &HookResult> {
        self.results.iter().filter(|r| r.is_failed())
    }

    /// Whether no hook failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Result of spawning a hook, before the modification check
#[derive(Debug, Default)]
struct Execution {
    exit_code: Option<i32>,
    output: String,
    timed_out: bool,
}

impl Execution {
    fn error(message: impl Into<String>) -> Self {
        Self {
            exit_code: Some(1),
            output: message.into(),
            timed_out: false,
        }
    }

    fn passed(&self) -> bool {
        self.exit_code == Some(0) && !self.timed_out
    }

    /// Fold the result of the next batch into this one
    fn absorb(&mut self, next: Execution) {
        self.output.push_str(&next.output);
        self.timed_out |= next.timed_out;
        if self.exit_code == Some(0) {
            self.exit_code = next.exit_code;
        }
    }
}

/// Sequential hook runner
///
/// ```ignore
/// let summary = HookRunner::builder(&hooks, root)
///     .fail_fast(config.fail_fast)
///     .global_filter(FileFilter::new(&config.files, &config.exclude)?)
///     .reporter(|result: &HookResult| println!("{}", result.name))
///     .build()
///     .run(&RunRequest::new(Stage::PreCommit, staged))?;
/// ```
pub struct HookRunner<'a, R = NoOpReporter>
where
    R: ResultReporter,
{
    hooks: &'a [Hook],
    root: &'a Path,
    fail_fast: bool,
    global_filter: FileFilter,
    skip: HashSet<String>,
    verbose: bool,
    detect_modifications: bool,
    env_vars: IndexMap<String, String>,
    reporter: R,
}

impl<'a> HookRunner<'a, NoOpReporter> {
    /// Runner with default settings
    ///
    /// For custom configuration, use [`HookRunner::builder`].
    #[must_use]
    pub fn new(hooks: &'a [Hook], root: &'a Path) -> Self {
        Self::builder(hooks, root).build()
    }

    /// Create a builder for configuring a `HookRunner`
    #[must_use]
    pub fn builder(hooks: &'a [Hook], root: &'a Path) -> HookRunnerBuilder<'a, NoOpReporter> {
        HookRunnerBuilder::new(hooks, root)
    }
}

impl<R> HookRunner<'_, R>
where
    R: ResultReporter,
{
    /// Run the hooks selected by `request`
    ///
    /// # Errors
    ///
    /// Returns an error if `hook_filter` names no hook of the stage, or if the
    /// repository cannot be inspected
    #[tracing::instrument(skip_all, fields(stage = %request.stage, files = request.files.len()))]
    pub fn run(&self, request: &RunRequest) -> Result<RunSummary> {
        let selected: Vec<&Hook> = self
            .hooks
            .iter()
            .filter(|hook| hook.runs_at(request.stage))
            .filter(|hook| {
                request
                    .hook_filter
                    .as_deref()
                    .is_none_or(|id| hook.id() == id)
            })
            .collect();

        if let Some(id) = &request.hook_filter
            && selected.is_empty()
        {
            return Err(Error::Message(format!(
                "No hook with id '{id}' in stage '{}'",
                request.stage
            )));
        }

        let mut classifier = Classifier::new(self.root);
        let takes_message = request.stage.takes_message_file();
        let candidates = if takes_message {
            request.files.clone()
        } else {
            self.global_filter.apply(&request.files, &mut classifier)
        };
        tracing::debug!(
            hooks = selected.len(),
            candidates = candidates.len(),
            "Running hooks"
        );

        let mut all_files: Option<Vec<String>> = None;
        let mut summary = RunSummary::default();

        for hook in selected {
            let span = tracing::info_span!("hook", id = %hook.id());
            let _guard = span.enter();

            let result = if self.skip.contains(hook.id()) {
                tracing::debug!("Skipping hook (SKIP)");
                HookResult::skipped(hook, SkipReason::Disabled)
            } else {
                let files = if takes_message {
                    candidates.clone()
                } else {
                    hook.filter.apply(&candidates, &mut classifier)
                };

                if files.is_empty() && !hook.definition.always_run {
                    tracing::debug!("Skipping hook (no files)");
                    HookResult::skipped(hook, SkipReason::NoFiles)
                } else {
                    self.reporter.hook_started(hook);
                    self.run_hook(hook, &files, request.stage, &mut classifier, &mut all_files)?
                }
            };

            let stop = result.is_failed() && (self.fail_fast || hook.definition.fail_fast);
            self.reporter.report(&result);
            summary.results.push(result);

            if stop {
                tracing::debug!("Stopping after failure (fail_fast)");
                summary.stopped_early = true;
                break;
            }
        }

        Ok(summary)
    }

    fn run_hook(
        &self,
        hook: &Hook,
        files: &[String],
        stage: Stage,
        classifier: &mut Classifier,
        all_files: &mut Option<Vec<String>>,
    ) -> Result<HookResult> {
        let watch = self.detect_modifications && hook.kind == HookKind::Command;
        let before = if watch {
            Some(git::worktree_fingerprint(self.root)?)
        } else {
            None
        };

        let start = Instant::now();
        let execution = match hook.kind {
            HookKind::Command => self.execute(hook, files, stage),
            HookKind::Fail => fail_output(&hook.definition.entry, files),
            HookKind::Meta(meta) => {
                if all_files.is_none() {
                    *all_files = Some(git::all_files(self.root)?);
                }
                let all = all_files.as_deref().unwrap_or_default();
                let outcome = meta.run(files, all, &self.global_filter, self.hooks, classifier);
                Execution {
                    exit_code: Some(i32::from(!outcome.passed)),
                    output: outcome.output,
                    timed_out: false,
                }
            }
        };
        let duration = start.elapsed();

        let files_modified = match before {
            Some(before) => git::worktree_fingerprint(self.root)? != before,
            None => false,
        };

        let status = if execution.passed() && !files_modified {
            HookStatus::Passed
        } else {
            HookStatus::Failed
        };

        match status {
            HookStatus::Failed => tracing::warn!(
                exit_code = ?execution.exit_code,
                files_modified,
                timed_out = execution.timed_out,
                elapsed_ms = duration.as_millis(),
                "Hook failed"
            ),
            _ => tracing::debug!(elapsed_ms = duration.as_millis(), "Hook passed"),
        }

        Ok(HookResult {
            id: hook.id().to_string(),
            name: hook.name().to_string(),
            status,
            exit_code: execution.exit_code,
            output: execution.output,
            files_modified,
            duration,
            verbose: self.verbose || hook.definition.verbose,
            timed_out: execution.timed_out,
        })
    }

    /// Spawn `entry` + `args` (+ filenames, in batches)
    fn execute(&self, hook: &Hook, files: &[String], stage: Stage) -> Execution {
        let def = &hook.definition;

        let parts = match shell_words::split(&def.entry) {
            Ok(parts) => parts,
            Err(e) => return Execution::error(format!("Failed to parse entry '{}': {e}\n", def.entry)),
        };
        let Some((name, entry_args)) = parts.split_first() else {
            return Execution::error("Hook has an empty entry\n");
        };

        let program = match self.resolve_program(hook, name) {
            Ok(program) => program,
            Err(message) => return Execution::error(message),
        };

        let mut base_args: Vec<String> = entry_args.to_vec();
        base_args.extend(def.args.iter().cloned());

        let batches = if def.pass_filenames {
            partition(&program, &base_args, files, MAX_COMMAND_LENGTH)
        } else {
            vec![Vec::new()]
        };

        let mut total: Option<Execution> = None;
        for batch in batches {
            let mut args = base_args.clone();
            args.extend(batch.iter().map(|f| (*f).to_string()));

            let step = self.spawn(hook, &program, &args, stage);
            let timed_out = step.timed_out;
            match total.as_mut() {
                Some(total) => total.absorb(step),
                None => total = Some(step),
            }
            if timed_out {
                break;
            }
        }
        total.unwrap_or_default()
    }

    /// Locate the executable for `name`
    ///
    /// `script` entries are relative to the hook repository; other languages
    /// search the hook environment's `PATH`.
    fn resolve_program(&self, hook: &Hook, name: &str) -> std::result::Result<PathBuf, String> {
        if hook.language() == Language::Script {
            let path = hook.script_base(self.root).join(name);
            return if path.is_file() {
                Ok(path)
            } else {
                Err(format!("Executable `{}` not found\n", path.display()))
            };
        }

        if Path::new(name).components().count() > 1 {
            let path = self.root.join(name);
            return if path.is_file() {
                Ok(path)
            } else {
                Err(format!("Executable `{name}` not found\n"))
            };
        }

        let search: Option<OsString> = hook
            .environment
            .search_path()
            .or_else(|| std::env::var_os("PATH"));
        which::which_in(name, search, self.root)
            .map_err(|_| format!("Executable `{name}` not found\n"))
    }

    #[tracing::instrument(skip(self, hook, args), fields(program = %program.display(), args = args.len()))]
    fn spawn(&self, hook: &Hook, program: &Path, args: &[String], stage: Stage) -> Execution {
        let mut expr = duct::cmd(program, args)
            .dir(self.root)
            .stdin_null()
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked();

        for (key, value) in &self.env_vars {
            expr = expr.env(key, value);
        }
        expr = expr.env("GUANKA_HOOK_STAGE", stage.name());
        for (key, value) in &hook.environment.vars {
            expr = expr.env(key, value);
        }
        if let Some(path) = hook.environment.search_path() {
            expr = expr.env("PATH", path);
        }
        for key in &hook.environment.unset {
            expr = expr.env_remove(key);
        }

        let handle = match expr.start() {
            Ok(handle) => handle,
            Err(e) => {
                return Execution::error(format!(
                    "Failed to start '{}': {e}\n",
                    program.display()
                ));
            }
        };

        let timeout = hook.definition.timeout;
        let waited = if timeout > 0 {
            handle.wait_timeout(Duration::from_secs(timeout))
        } else {
            handle.wait().map(Some)
        };

        match waited {
            Ok(Some(output)) => Execution {
                exit_code: output.status.code(),
                output: String::from_utf8_lossy(&output.stdout).into_owned(),
                timed_out: false,
            },
            Ok(None) => {
                if let Err(e) = handle.kill() {
                    tracing::warn!(error = %e, "Failed to kill timed out hook");
                }
                Execution {
                    exit_code: None,
                    output: format!("Timed out after {timeout} seconds\n"),
                    timed_out: true,
                }
            }
            Err(e) => Execution::error(format!("Failed to wait for '{}': {e}\n", program.display())),
        }
    }
}

/// Output of a `fail` hook: the entry, a blank line, then the files
fn fail_output(entry: &str, files: &[String]) -> Execution {
    let mut output = format!("{entry}\n\n");
    for file in files {
        output.push_str(file);
        output.push('\n');
    }
    Execution {
        exit_code: Some(1),
        output,
        timed_out: false,
    }
}

/// Split `files` into batches whose command lines stay under `limit`
///
/// Each batch holds at least one file, so a single oversized path still runs.
/// An empty file list yields a single empty batch.
fn partition<'f>(
    program: &Path,
    args: &[String],
    files: &'f [String],
    limit: usize,
) -> Vec<Vec<&'f str>> {
    let base = program.as_os_str().len() + args.iter().map(|a| a.len() + 1).sum::<usize>();

    let mut batches: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut length = base;

    for file in files {
        let cost = file.len() + 1;
        if !current.is_empty() && length + cost > limit {
            batches.push(std::mem::take(&mut current));
            length = base;
        }
        current.push(file);
        length += cost;
    }

    if !current.is_empty() || batches.is_empty() {
        batches.push(current);
    }
    batches
}

// ======================================================================
// HookRunnerBuilder
// ======================================================================

/// Builder for creating a `HookRunner`
pub struct HookRunnerBuilder<'a, R = NoOpReporter>
where
    R: ResultReporter,
{
    hooks: &'a [Hook],
    root: &'a Path,
    fail_fast: bool,
    global_filter: FileFilter,
    skip: HashSet<String>,
    verbose: bool,
    detect_modifications: bool,
    env_vars: IndexMap<String, String>,
    reporter: R,
}

impl<'a> HookRunnerBuilder<'a, NoOpReporter> {
    /// Create a new builder with required parameters
    ///
    /// This is typically called via [`HookRunner::builder`].
    #[must_use]
    pub fn new(hooks: &'a [Hook], root: &'a Path) -> Self {
        let mut env_vars = IndexMap::new();
        env_vars.insert("GUANKA".to_string(), "1".to_string());

        Self {
            hooks,
            root,
            fail_fast: false,
            global_filter: FileFilter::default(),
            skip: HashSet::new(),
            verbose: false,
            detect_modifications: false,
            env_vars,
            reporter: NoOpReporter,
        }
    }

    /// Set the reporter receiving results as hooks finish
    pub fn reporter<F>(self, reporter: F) -> HookRunnerBuilder<'a, F>
    where
        F: ResultReporter,
    {
        HookRunnerBuilder {
            hooks: self.hooks,
            root: self.root,
            fail_fast: self.fail_fast,
            global_filter: self.global_filter,
            skip: self.skip,
            verbose: self.verbose,
            detect_modifications: self.detect_modifications,
            env_vars: self.env_vars,
            reporter,
        }
    }
}

impl<'a, R> HookRunnerBuilder<'a, R>
where
    R: ResultReporter,
{
    /// Stop after the first failing hook
    #[must_use]
    pub fn fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Filter applied to the candidate files before any hook sees them
    #[must_use]
    pub fn global_filter(mut self, filter: FileFilter) -> Self {
        self.global_filter = filter;
        self
    }

    /// Hook ids to skip
    #[must_use]
    pub fn skip<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(ids.into_iter().map(Into::into));
        self
    }

    /// Mark every result verbose
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Fail hooks that modify the work tree
    ///
    /// Requires `root` to be a git work tree.
    #[must_use]
    pub fn detect_modifications(mut self, detect: bool) -> Self {
        self.detect_modifications = detect;
        self
    }

    /// Add an environment variable passed to every hook
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(key.into(), value.into());
        self
    }

    /// Build the `HookRunner`
    #[must_use]
    pub fn build(self) -> HookRunner<'a, R> {
        HookRunner {
            hooks: self.hooks,
            root: self.root,
            fail_fast: self.fail_fast,
            global_filter: self.global_filter,
            skip: self.skip,
            verbose: self.verbose,
            detect_modifications: self.detect_modifications,
            env_vars: self.env_vars,
            reporter: self.reporter,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use guanka_config::HookDefinition;
    use tempfile::TempDir;

    fn hook(id: &str, entry: &str) -> Hook {
        let mut def = HookDefinition::placeholder(id);
        def.entry = entry.to_string();
        def.types = Vec::new();
        Hook::new("local", None, def, HookKind::Command, Stage::defaults()).unwrap()
    }

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn ids(summary: &RunSummary) -> Vec<&str> {
        summary.results.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_partition_respects_limit() {
        let files = paths(&["aaaa", "bbbb", "cccc"]);
        let batches = partition(Path::new("x"), &[], &files, 12);
        assert_eq!(batches, vec![vec!["aaaa", "bbbb"], vec!["cccc"]]);
    }

    #[test]
    fn test_partition_oversized_and_empty() {
        let files = paths(&["a-very-long-file-name"]);
        assert_eq!(
            partition(Path::new("x"), &[], &files, 4),
            vec![vec!["a-very-long-file-name"]]
        );
        assert_eq!(partition(Path::new("x"), &[], &[], 4), vec![Vec::<&str>::new()]);
    }

    #[test]
    fn test_absorb_keeps_first_failure() {
        let mut total = Execution {
            exit_code: Some(0),
            output: "a\n".to_string(),
            timed_out: false,
        };
        total.absorb(Execution {
            exit_code: Some(2),
            output: "b\n".to_string(),
            timed_out: false,
        });
        total.absorb(Execution {
            exit_code: Some(0),
            output: "c\n".to_string(),
            timed_out: false,
        });
        assert_eq!(total.exit_code, Some(2));
        assert_eq!(total.output, "a\nb\nc\n");
        assert!(!total.passed());
    }

    #[test]
    fn test_fail_output() {
        let execution = fail_output("no tabs allowed", &paths(&["a.txt", "b.txt"]));
        assert_eq!(execution.exit_code, Some(1));
        assert_eq!(execution.output, "no tabs allowed\n\na.txt\nb.txt\n");
    }

    #[test]
    fn test_summary_helpers() {
        let temp = TempDir::new().unwrap();
        let hooks = vec![hook("a", "true")];
        let summary = HookRunner::new(&hooks, temp.path())
            .run(&RunRequest::new(Stage::PreCommit, Vec::new()))
            .unwrap();
        assert!(summary.is_success());
        assert_eq!(
            summary.results[0].status,
            HookStatus::Skipped(SkipReason::NoFiles)
        );
    }

    #[test]
    fn test_unknown_hook_filter() {
        let temp = TempDir::new().unwrap();
        let hooks = vec![hook("a", "true")];
        let err = HookRunner::new(&hooks, temp.path())
            .run(&RunRequest::new(Stage::PreCommit, paths(&["x"])).only("nope"))
            .unwrap_err();
        assert!(err.to_string().contains("No hook with id 'nope'"));
    }

    #[test]
    fn test_stage_binding() {
        let temp = TempDir::new().unwrap();
        let mut push_only = hook("push", "true");
        push_only.stages = vec![Stage::PrePush];
        let hooks = vec![hook("commit", "true"), push_only];

        let summary = HookRunner::new(&hooks, temp.path())
            .run(&RunRequest::new(Stage::PreCommit, paths(&["a"])))
            .unwrap();
        assert_eq!(ids(&summary), vec!["commit"]);
    }

    #[test]
    fn test_skip_list() {
        let temp = TempDir::new().unwrap();
        let hooks = vec![hook("a", "true"), hook("b", "true")];
        let summary = HookRunner::builder(&hooks, temp.path())
            .skip(["a"])
            .build()
            .run(&RunRequest::new(Stage::PreCommit, paths(&["x"])))
            .unwrap();
        assert_eq!(
            summary.results[0].status,
            HookStatus::Skipped(SkipReason::Disabled)
        );
    }

    #[test]
    fn test_missing_executable_fails() {
        let temp = TempDir::new().unwrap();
        let hooks = vec![hook("ghost", "no-such-binary-for-guanka --flag")];
        let summary = HookRunner::new(&hooks, temp.path())
            .run(&RunRequest::new(Stage::PreCommit, paths(&["x"])))
            .unwrap();
        let result = &summary.results[0];
        assert!(result.is_failed());
        assert!(result.output.contains("no-such-binary-for-guanka"));
    }

    #[test]
    fn test_fail_language_lists_files() {
        let temp = TempDir::new().unwrap();
        let mut def = HookDefinition::placeholder("forbid");
        def.entry = "forbidden files".to_string();
        def.language = Language::Fail;
        def.types = Vec::new();
        let hooks = vec![Hook::new("local", None, def, HookKind::Fail, Stage::defaults()).unwrap()];

        let summary = HookRunner::new(&hooks, temp.path())
            .run(&RunRequest::new(Stage::PreCommit, paths(&["a.bin"])))
            .unwrap();
        assert!(!summary.is_success());
        assert_eq!(summary.results[0].output, "forbidden files\n\na.bin\n");
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use std::cell::RefCell;
        use std::fs;

        #[test]
        fn test_runs_in_declaration_order() {
            let temp = TempDir::new().unwrap();
            let hooks = vec![
                hook("third", "sh -c 'echo 3 >> order.log' --"),
                hook("first", "sh -c 'echo 1 >> order.log' --"),
                hook("second", "sh -c 'echo 2 >> order.log' --"),
            ];

            let seen = RefCell::new(Vec::new());
            let summary = HookRunner::builder(&hooks, temp.path())
                .reporter(|r: &HookResult| seen.borrow_mut().push(r.id.clone()))
                .build()
                .run(&RunRequest::new(Stage::PreCommit, paths(&["a.txt"])))
                .unwrap();

            assert!(summary.is_success());
            assert_eq!(ids(&summary), vec!["third", "first", "second"]);
            assert_eq!(*seen.borrow(), vec!["third", "first", "second"]);
            let log = fs::read_to_string(temp.path().join("order.log")).unwrap();
            assert_eq!(log, "3\n1\n2\n");
        }

        #[test]
        fn test_fail_fast_stops_run() {
            let temp = TempDir::new().unwrap();
            let hooks = vec![
                hook("ok", "true"),
                hook("bad", "sh -c 'echo broken; exit 3' --"),
                hook("after", "sh -c 'touch ran' --"),
            ];

            let summary = HookRunner::builder(&hooks, temp.path())
                .fail_fast(true)
                .build()
                .run(&RunRequest::new(Stage::PreCommit, paths(&["a.txt"])))
                .unwrap();

            assert!(summary.stopped_early);
            assert_eq!(ids(&summary), vec!["ok", "bad"]);
            let failed: Vec<_> = summary.failed().collect();
            assert_eq!(failed[0].exit_code, Some(3));
            assert_eq!(failed[0].output, "broken\n");
            assert!(!temp.path().join("ran").exists());
        }

        #[test]
        fn test_hook_fail_fast() {
            let temp = TempDir::new().unwrap();
            let mut bad = hook("bad", "false");
            bad.definition.fail_fast = true;
            let hooks = vec![hook("soft", "false"), bad, hook("after", "true")];

            let summary = HookRunner::new(&hooks, temp.path())
                .run(&RunRequest::new(Stage::PreCommit, paths(&["a.txt"])))
                .unwrap();
            assert!(summary.stopped_early);
            assert_eq!(ids(&summary), vec!["soft", "bad"]);
        }

        #[test]
        fn test_without_fail_fast_all_hooks_run() {
            let temp = TempDir::new().unwrap();
            let hooks = vec![hook("bad", "false"), hook("after", "true")];
            let summary = HookRunner::new(&hooks, temp.path())
                .run(&RunRequest::new(Stage::PreCommit, paths(&["a.txt"])))
                .unwrap();
            assert!(!summary.stopped_early);
            assert_eq!(ids(&summary), vec!["bad", "after"]);
            assert_eq!(summary.failed().count(), 1);
        }

        #[test]
        fn test_excluded_files_never_reach_hooks() {
            let temp = TempDir::new().unwrap();
            let mut always = hook("always", "sh -c 'echo \"$@\" >> always.log' --");
            always.definition.always_run = true;
            let hooks = vec![hook("args", "sh -c 'echo \"$@\" >> args.log' --"), always];

            HookRunner::builder(&hooks, temp.path())
                .global_filter(FileFilter::new("", "^vendor/").unwrap())
                .build()
                .run(&RunRequest::new(
                    Stage::PreCommit,
                    paths(&["src/a.rs", "vendor/b.rs", "vendor/c.rs"]),
                ))
                .unwrap();

            let args = fs::read_to_string(temp.path().join("args.log")).unwrap();
            assert_eq!(args, "src/a.rs\n");
            let always = fs::read_to_string(temp.path().join("always.log")).unwrap();
            assert_eq!(always, "src/a.rs\n");
        }

        #[test]
        fn test_zero_files_only_always_run_hooks_execute() {
            let temp = TempDir::new().unwrap();
            let mut always = hook("always", "true");
            always.definition.always_run = true;
            let hooks = vec![hook("lint", "false"), always];

            let summary = HookRunner::new(&hooks, temp.path())
                .run(&RunRequest::new(Stage::PreCommit, Vec::new()))
                .unwrap();
            assert!(summary.is_success());
            assert_eq!(
                summary.results[0].status,
                HookStatus::Skipped(SkipReason::NoFiles)
            );
            assert_eq!(summary.results[1].status, HookStatus::Passed);
        }

        #[test]
        fn test_args_then_filenames() {
            let temp = TempDir::new().unwrap();
            let mut h = hook("echo", "sh -c 'echo \"$@\"' --");
            h.definition.args = vec!["--check".to_string()];
            h.definition.verbose = true;
            let hooks = vec![h];

            let summary = HookRunner::new(&hooks, temp.path())
                .run(&RunRequest::new(Stage::PreCommit, paths(&["a", "b"])))
                .unwrap();
            assert_eq!(summary.results[0].output, "--check a b\n");
            assert!(summary.results[0].verbose);
        }

        #[test]
        fn test_pass_filenames_false() {
            let temp = TempDir::new().unwrap();
            let mut h = hook("count", "sh -c 'echo $#' --");
            h.definition.pass_filenames = false;
            let hooks = vec![h];

            let summary = HookRunner::new(&hooks, temp.path())
                .run(&RunRequest::new(Stage::PreCommit, paths(&["a", "b"])))
                .unwrap();
            assert_eq!(summary.results[0].output, "0\n");
        }

        #[test]
        fn test_hook_environment_variables() {
            let temp = TempDir::new().unwrap();
            let mut h = hook("env", "sh -c 'echo $GUANKA $GUANKA_HOOK_STAGE $EXTRA' --");
            h.definition.pass_filenames = false;
            h.stages = vec![Stage::PrePush];
            let hooks = vec![h];

            let summary = HookRunner::builder(&hooks, temp.path())
                .env("EXTRA", "yes")
                .build()
                .run(&RunRequest::new(Stage::PrePush, paths(&["a"])))
                .unwrap();
            assert_eq!(summary.results[0].output, "1 pre-push yes\n");
        }

        #[test]
        fn test_commit_msg_receives_message_file() {
            let temp = TempDir::new().unwrap();
            let mut h = hook("msg", "sh -c 'grep -q ticket \"$1\"' --");
            h.filter = FileFilter::new(r"\.py$", "^$").unwrap();
            h.stages = vec![Stage::CommitMsg];
            let hooks = vec![h];
            fs::write(temp.path().join("MSG"), "fix: no reference\n").unwrap();

            let summary = HookRunner::builder(&hooks, temp.path())
                .global_filter(FileFilter::new("", "MSG").unwrap())
                .build()
                .run(&RunRequest::new(Stage::CommitMsg, paths(&["MSG"])))
                .unwrap();
            assert!(!summary.is_success());
        }

        #[test]
        fn test_script_language_resolves_in_project() {
            let temp = TempDir::new().unwrap();
            fs::create_dir(temp.path().join("bin")).unwrap();
            let script = temp.path().join("bin/check.sh");
            fs::write(&script, "#!/bin/sh\necho checked \"$@\"\n").unwrap();
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
            }

            let mut h = hook("check", "bin/check.sh");
            h.definition.language = Language::Script;
            let hooks = vec![h];

            let summary = HookRunner::new(&hooks, temp.path())
                .run(&RunRequest::new(Stage::PreCommit, paths(&["x"])))
                .unwrap();
            assert_eq!(summary.results[0].status, HookStatus::Passed);
            assert_eq!(summary.results[0].output, "checked x\n");
        }

        #[test]
        fn test_timeout_kills_hook() {
            let temp = TempDir::new().unwrap();
            let mut h = hook("slow", "sleep 5");
            h.definition.pass_filenames = false;
            h.definition.timeout = 1;
            let hooks = vec![h];

            let summary = HookRunner::new(&hooks, temp.path())
                .run(&RunRequest::new(Stage::PreCommit, paths(&["x"])))
                .unwrap();
            let result = &summary.results[0];
            assert!(result.is_failed());
            assert!(result.timed_out);
            assert!(result.duration < Duration::from_secs(5));
        }
    }
}
