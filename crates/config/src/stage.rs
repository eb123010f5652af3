//! Hook stages
//!
//! A stage is the git lifecycle point a set of hooks is bound to.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Git lifecycle stage a hook runs at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    /// Before a commit is recorded
    #[serde(alias = "commit")]
    PreCommit,
    /// Before refs are pushed to a remote
    #[serde(alias = "push")]
    PrePush,
    /// After the commit message is written, receives the message file
    CommitMsg,
    /// Only when requested explicitly with `--hook-stage manual`
    Manual,
}

impl Stage {
    /// Every known stage
    pub const ALL: [Stage; 4] = [
        Stage::PreCommit,
        Stage::PrePush,
        Stage::CommitMsg,
        Stage::Manual,
    ];

    /// Stages a hook binds to when nothing narrows it down
    ///
    /// Manual hooks must opt in explicitly.
    #[must_use]
    pub fn defaults() -> Vec<Stage> {
        Self::ALL
            .into_iter()
            .filter(|s| *s != Stage::Manual)
            .collect()
    }

    /// Canonical name of this stage
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::PreCommit => "pre-commit",
            Stage::PrePush => "pre-push",
            Stage::CommitMsg => "commit-msg",
            Stage::Manual => "manual",
        }
    }

    /// Name of the git hook script that triggers this stage
    #[must_use]
    pub fn git_hook_name(&self) -> Option<&'static str> {
        match self {
            Stage::Manual => None,
            other => Some(other.name()),
        }
    }

    /// Whether hooks at this stage receive the commit message file instead of
    /// the changed files
    #[must_use]
    pub fn takes_message_file(&self) -> bool {
        matches!(self, Stage::CommitMsg)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre-commit" | "commit" => Ok(Stage::PreCommit),
            "pre-push" | "push" => Ok(Stage::PrePush),
            "commit-msg" => Ok(Stage::CommitMsg),
            "manual" => Ok(Stage::Manual),
            other => Err(format!(
                "unknown stage '{other}' (expected one of: pre-commit, pre-push, commit-msg, manual)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;

    #[test]
    fn test_stage_aliases_parse() {
        assert_eq!("commit".parse::<Stage>().unwrap(), Stage::PreCommit);
        assert_eq!("pre-commit".parse::<Stage>().unwrap(), Stage::PreCommit);
        assert_eq!("push".parse::<Stage>().unwrap(), Stage::PrePush);
        assert_eq!("commit-msg".parse::<Stage>().unwrap(), Stage::CommitMsg);
        assert!("merge".parse::<Stage>().is_err());
    }

    #[test]
    fn test_stage_serde_aliases() {
        #[derive(Deserialize)]
        struct Wrapper {
            stages: Vec<Stage>,
        }
        let w: Wrapper = toml::from_str(r#"stages = ["commit", "pre-push", "manual"]"#).unwrap();
        assert_eq!(w.stages, vec![Stage::PreCommit, Stage::PrePush, Stage::Manual]);
    }

    #[test]
    fn test_stage_serializes_canonical_name() {
        assert_eq!(
            serde_json::to_value(Stage::PreCommit).unwrap(),
            serde_json::json!("pre-commit")
        );
    }

    #[test]
    fn test_defaults_exclude_manual() {
        let defaults = Stage::defaults();
        assert!(defaults.contains(&Stage::PreCommit));
        assert!(!defaults.contains(&Stage::Manual));
    }

    #[test]
    fn test_git_hook_name() {
        assert_eq!(Stage::PrePush.git_hook_name(), Some("pre-push"));
        assert_eq!(Stage::Manual.git_hook_name(), None);
    }
}
