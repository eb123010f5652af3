//! Python virtualenv environments
//!
//! An environment is created with `<interpreter> -m venv <dir>`, then the hook
//! repository (when it is a Python project) and the additional dependencies
//! are installed with pip. A marker file written last makes installs
//! idempotent: a directory without a valid marker is rebuilt from scratch.

use super::HookEnvironment;
use guanka_config::manifest::DEFAULT_LANGUAGE_VERSION;
use guanka_core::platform::CURRENT_PLATFORM;
use guanka_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Marker written once an environment is complete
pub const INSTALLED_MARKER: &str = ".installed";

/// Contents of the marker file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallInfo {
    /// Requested language version
    pub language_version: String,
    /// Interpreter the environment was created with
    pub interpreter: String,
    /// Installed additional dependencies
    pub dependencies: Vec<String>,
}

fn env_error(message: impl Into<String>) -> Error {
    Error::Environment {
        language: "python".to_string(),
        message: message.into(),
    }
}

/// Locate the interpreter for a language version
///
/// - `default`: `python3`, then `python` on `PATH`
/// - an existing path: used as is
/// - `python3.11`: looked up on `PATH`
/// - `3.11`: looked up on `PATH` as `python3.11`
///
/// # Errors
///
/// Returns `Error::Environment` if no interpreter is found
pub fn find_interpreter(version: &str) -> Result<PathBuf> {
    if version == DEFAULT_LANGUAGE_VERSION {
        return which::which("python3")
            .or_else(|_| which::which("python"))
            .map_err(|_| env_error("no python3 or python found on PATH"));
    }

    let as_path = Path::new(version);
    if as_path.components().count() > 1 && as_path.is_file() {
        return Ok(as_path.to_path_buf());
    }

    which::which(version)
        .or_else(|_| which::which(format!("python{version}")))
        .map_err(|_| env_error(format!("interpreter for language_version '{version}' not found")))
}

/// Environment variables and `PATH` for an existing virtualenv
#[must_use]
pub fn environment(env_dir: &Path) -> HookEnvironment {
    let mut env = HookEnvironment {
        path_prepend: vec![env_dir.join(CURRENT_PLATFORM.venv_bin_dir())],
        ..HookEnvironment::default()
    };
    env.vars.insert(
        "VIRTUAL_ENV".to_string(),
        env_dir.to_string_lossy().into_owned(),
    );
    env.unset.push("PYTHONHOME".to_string());
    env
}

/// Read the marker of a complete environment
#[must_use]
pub fn installed(env_dir: &Path) -> Option<InstallInfo> {
    let content = fs::read_to_string(env_dir.join(INSTALLED_MARKER)).ok()?;
    serde_json::from_str(&content).ok()
}

fn is_python_project(dir: &Path) -> bool {
    dir.join("pyproject.toml").is_file() || dir.join("setup.py").is_file()
}

fn run_step(program: &Path, args: &[String], dir: &Path, what: &str) -> Result<()> {
    tracing::debug!(program = %program.display(), ?args, "{what}");
    let output = duct::cmd(program, args)
        .dir(dir)
        .env_remove("PYTHONHOME")
        .stdin_null()
        .stderr_to_stdout()
        .stdout_capture()
        .unchecked()
        .run()
        .map_err(|e| env_error(format!("{what}: failed to start {}: {e}", program.display())))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(env_error(format!(
            "{what} failed ({}):\n{}",
            output.status,
            String::from_utf8_lossy(&output.stdout).trim_end()
        )))
    }
}

/// Create (or reuse) the virtualenv at `env_dir`
///
/// `repo_dir` is installed into the environment when it contains a Python
/// project; `local` hooks pass `None`.
///
/// # Errors
///
/// Returns `Error::Environment` if any step fails; the partial environment is
/// removed
#[tracing::instrument(skip(deps), fields(env = %env_dir.display()))]
pub fn install(
    env_dir: &Path,
    repo_dir: Option<&Path>,
    version: &str,
    deps: &[String],
) -> Result<HookEnvironment> {
    if installed(env_dir).is_some() {
        tracing::debug!("Reusing installed environment");
        return Ok(environment(env_dir));
    }

    let interpreter = find_interpreter(version)?;

    if env_dir.exists() {
        fs::remove_dir_all(env_dir)?;
    }
    if let Some(parent) = env_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    tracing::info!(interpreter = %interpreter.display(), "Creating python environment");
    let result = build(env_dir, repo_dir, &interpreter, deps).and_then(|()| {
        let info = InstallInfo {
            language_version: version.to_string(),
            interpreter: interpreter.to_string_lossy().into_owned(),
            dependencies: deps.to_vec(),
        };
        let json = serde_json::to_string_pretty(&info)
            .map_err(|e| env_error(format!("cannot encode marker: {e}")))?;
        fs::write(env_dir.join(INSTALLED_MARKER), json)?;
        Ok(())
    });

    if let Err(e) = result {
        let _ = fs::remove_dir_all(env_dir);
        return Err(e);
    }
    Ok(environment(env_dir))
}

fn build(env_dir: &Path, repo_dir: Option<&Path>, interpreter: &Path, deps: &[String]) -> Result<()> {
    let work_dir = repo_dir.unwrap_or(env_dir.parent().unwrap_or(env_dir));

    run_step(
        interpreter,
        &[
            "-m".to_string(),
            "venv".to_string(),
            env_dir.to_string_lossy().into_owned(),
        ],
        work_dir,
        "creating virtualenv",
    )?;

    let mut targets: Vec<String> = Vec::new();
    if let Some(repo) = repo_dir
        && is_python_project(repo)
    {
        targets.push(".".to_string());
    }
    targets.extend(deps.iter().cloned());

    if targets.is_empty() {
        return Ok(());
    }

    let venv_python = env_dir.join(CURRENT_PLATFORM.venv_bin_dir()).join("python");
    let mut args = vec![
        "-m".to_string(),
        "pip".to_string(),
        "install".to_string(),
        "--disable-pip-version-check".to_string(),
    ];
    args.extend(targets);
    run_step(&venv_python, &args, work_dir, "installing dependencies")
}
