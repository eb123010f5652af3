//! File selection
//!
//! Candidate paths go through two filters: the global one from the top of the
//! configuration, then the hook's own. A path rejected by the global filter is
//! never seen by any hook.

use crate::tags::{self, Tags};
use guanka_config::HookDefinition;
use guanka_config::patterns::{self, MATCH_ALL, MATCH_NONE};
use guanka_core::Result;
use regex::Regex;
use std::collections::HashMap;
use std::path::PathBuf;

/// Include/exclude regexes plus tag constraints
///
/// The default patterns (match everything, exclude nothing) are not compiled.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    files: Option<Regex>,
    exclude: Option<Regex>,
    types: Vec<String>,
    types_or: Vec<String>,
    exclude_types: Vec<String>,
}

fn compile_unless(pattern: &str, trivial: &str, origin: &str) -> Result<Option<Regex>> {
    if pattern == trivial {
        Ok(None)
    } else {
        patterns::compile(pattern, origin).map(Some)
    }
}

impl FileFilter {
    /// Filter on paths only
    ///
    /// # Errors
    ///
    /// Returns an error if either pattern is not a valid regex
    pub fn new(files: &str, exclude: &str) -> Result<Self> {
        Ok(Self {
            files: compile_unless(files, MATCH_ALL, "files")?,
            exclude: compile_unless(exclude, MATCH_NONE, "exclude")?,
            ..Self::default()
        })
    }

    /// Filter described by a hook definition
    ///
    /// # Errors
    ///
    /// Returns an error naming the hook if a pattern is invalid
    pub fn for_hook(def: &HookDefinition) -> Result<Self> {
        Ok(Self {
            files: compile_unless(&def.files, MATCH_ALL, &format!("hook '{}' 'files'", def.id))?,
            exclude: compile_unless(
                &def.exclude,
                MATCH_NONE,
                &format!("hook '{}' 'exclude'", def.id),
            )?,
            types: def.types.clone(),
            types_or: def.types_or.clone(),
            exclude_types: def.exclude_types.clone(),
        })
    }

    /// Include pattern source
    #[must_use]
    pub fn files_pattern(&self) -> &str {
        self.files.as_ref().map_or(MATCH_ALL, Regex::as_str)
    }

    /// Exclude pattern source
    #[must_use]
    pub fn exclude_pattern(&self) -> &str {
        self.exclude.as_ref().map_or(MATCH_NONE, Regex::as_str)
    }

    /// Whether an exclude pattern other than the default is set
    #[must_use]
    pub fn has_exclude(&self) -> bool {
        self.exclude.is_some()
    }

    fn includes(&self, path: &str) -> bool {
        self.files.as_ref().is_none_or(|re| re.is_match(path))
    }

    /// Whether the path passes `files` and `exclude`
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        self.includes(path) && !self.excludes(path)
    }

    /// Whether the exclude pattern matches the path
    #[must_use]
    pub fn excludes(&self, path: &str) -> bool {
        self.exclude.as_ref().is_some_and(|re| re.is_match(path))
    }

    /// Whether a path's tags satisfy `types`, `types_or` and `exclude_types`
    #[must_use]
    pub fn matches_tags(&self, tags: &Tags) -> bool {
        self.types.iter().all(|t| tags.contains(t.as_str()))
            && (self.types_or.is_empty() || self.types_or.iter().any(|t| tags.contains(t.as_str())))
            && !self.exclude_types.iter().any(|t| tags.contains(t.as_str()))
    }

    fn needs_tags(&self) -> bool {
        !(self.types.is_empty() && self.types_or.is_empty() && self.exclude_types.is_empty())
    }

    /// Keep the paths accepted by this filter, preserving order
    pub fn apply(&self, paths: &[String], classifier: &mut Classifier) -> Vec<String> {
        paths
            .iter()
            .filter(|path| self.matches_path(path))
            .filter(|path| !self.needs_tags() || self.matches_tags(classifier.tags(path)))
            .cloned()
            .collect()
    }

    /// Keep the paths matching `files` and the tag constraints, ignoring
    /// `exclude`
    pub fn apply_without_exclude(
        &self,
        paths: &[String],
        classifier: &mut Classifier,
    ) -> Vec<String> {
        paths
            .iter()
            .filter(|path| self.includes(path))
            .filter(|path| !self.needs_tags() || self.matches_tags(classifier.tags(path)))
            .cloned()
            .collect()
    }
}

/// Caches tags per path for the duration of a run
#[derive(Debug)]
pub struct Classifier {
    root: PathBuf,
    cache: HashMap<String, Tags>,
}

impl Classifier {
    /// Classifier for paths relative to `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    /// Tags of a path relative to the root
    pub fn tags(&mut self, path: &str) -> &Tags {
        self.cache
            .entry(path.to_string())
            .or_insert_with(|| tags::tags_from_path(&self.root.join(path)))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_default_filter_accepts_everything() {
        let filter = FileFilter::default();
        assert!(filter.matches_path("anything/at/all.txt"));
        assert_eq!(filter.files_pattern(), "");
        assert_eq!(filter.exclude_pattern(), "^$");
        assert!(!filter.has_exclude());
    }

    #[test]
    fn test_exclude_wins_over_files() {
        let filter = FileFilter::new(r"\.py$", "^migrations/").unwrap();
        assert!(filter.matches_path("app/models.py"));
        assert!(!filter.matches_path("migrations/0001.py"));
        assert!(!filter.matches_path("README.md"));
    }

    #[test]
    fn test_apply_preserves_order() {
        let temp = TempDir::new().unwrap();
        let mut classifier = Classifier::new(temp.path());
        let filter = FileFilter::new("", "^vendor/").unwrap();

        let kept = filter.apply(
            &paths(&["z.txt", "vendor/a.txt", "a.txt"]),
            &mut classifier,
        );
        assert_eq!(kept, paths(&["z.txt", "a.txt"]));
    }

    #[test]
    fn test_types_all_must_match() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(temp.path().join("b.md"), "# b\n").unwrap();

        let mut def = HookDefinition::placeholder("py");
        def.entry = "true".to_string();
        def.types = vec!["file".to_string(), "python".to_string()];
        let filter = FileFilter::for_hook(&def).unwrap();

        let mut classifier = Classifier::new(temp.path());
        let kept = filter.apply(&paths(&["a.py", "b.md", "missing.py"]), &mut classifier);
        assert_eq!(kept, paths(&["a.py"]));
    }

    #[test]
    fn test_types_or_and_exclude_types() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(temp.path().join("b.sh"), "echo\n").unwrap();
        fs::write(temp.path().join("c.md"), "# c\n").unwrap();

        let mut def = HookDefinition::placeholder("scripts");
        def.entry = "true".to_string();
        def.types_or = vec!["python".to_string(), "shell".to_string()];
        def.exclude_types = vec!["shell".to_string()];
        let filter = FileFilter::for_hook(&def).unwrap();

        let mut classifier = Classifier::new(temp.path());
        let kept = filter.apply(&paths(&["a.py", "b.sh", "c.md"]), &mut classifier);
        assert_eq!(kept, paths(&["a.py"]));
    }

    #[test]
    fn test_apply_without_exclude() {
        let temp = TempDir::new().unwrap();
        let mut classifier = Classifier::new(temp.path());
        let filter = FileFilter::new(r"\.txt$", "^a").unwrap();

        let all = paths(&["a.txt", "b.txt", "c.md"]);
        assert_eq!(
            filter.apply_without_exclude(&all, &mut classifier),
            paths(&["a.txt", "b.txt"])
        );
        assert!(filter.excludes("a.txt"));
    }
}
