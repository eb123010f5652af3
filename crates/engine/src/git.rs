//! Git operations
//!
//! Everything guanka needs from git goes through `git2` (libgit2):
//! - Locating the work tree and its hooks directory
//! - Listing staged, tracked and changed paths
//! - Fingerprinting unstaged changes to detect hooks that modify files
//! - Checking out hook repositories at a pinned revision
//!
//! Paths are returned relative to the work tree root with `/` separators.

use guanka_core::{Error, Result};
use git2::{
    AutotagOption, Commit, Delta, DiffFindOptions, DiffOptions, ErrorCode, FetchOptions, Object, Oid,
    Repository, Status, StatusOptions, build::CheckoutBuilder,
};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Helper function to convert git2 errors to `guanka_core` errors
#[inline]
#[allow(clippy::needless_pass_by_value)]
fn git_err(e: git2::Error) -> Error {
    Error::Git(e.message().to_string())
}

fn open(root: &Path) -> Result<Repository> {
    Repository::open(root)
        .map_err(|e| Error::Git(format!("{} is not a git repository: {}", root.display(), e.message())))
}

/// Path as `/` separated UTF-8, `None` (with a warning) when it is not UTF-8
fn path_string(path: &Path) -> Option<String> {
    let Some(text) = path.to_str() else {
        tracing::warn!(path = %path.display(), "Skipping path that is not valid UTF-8");
        return None;
    };
    Some(text.replace('\\', "/"))
}

/// Find the root of the work tree containing `start`
///
/// # Errors
///
/// Returns an error if `start` is not inside a git work tree
pub fn find_repo_root(start: &Path) -> Result<PathBuf> {
    let repo = Repository::discover(start).map_err(|_| {
        Error::Git(format!(
            "{} is not inside a git repository",
            start.display()
        ))
    })?;

    repo.workdir()
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::Git("bare repositories are not supported".to_string()))
}

/// Paths added, copied, modified or renamed in the index relative to `HEAD`
///
/// Deleted paths are excluded. A repository without commits compares the
/// index against an empty tree.
///
/// # Errors
///
/// Returns an error if the repository or its index cannot be read
#[tracing::instrument(fields(root = %root.display()))]
pub fn staged_files(root: &Path) -> Result<Vec<String>> {
    let repo = open(root)?;

    let head_tree = match repo.head() {
        Ok(head) => Some(head.peel_to_tree().map_err(git_err)?),
        Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => None,
        Err(e) => return Err(git_err(e)),
    };

    let index = repo.index().map_err(git_err)?;
    let mut opts = DiffOptions::new();
    opts.include_typechange(true);

    let mut diff = repo
        .diff_tree_to_index(head_tree.as_ref(), Some(&index), Some(&mut opts))
        .map_err(git_err)?;
    diff.find_similar(Some(DiffFindOptions::new().renames(true)))
        .map_err(git_err)?;

    let files = collect_new_paths(&diff);
    tracing::debug!(count = files.len(), "Collected staged files");
    Ok(files)
}

/// Every path tracked in the index
///
/// # Errors
///
/// Returns an error if the index cannot be read
pub fn all_files(root: &Path) -> Result<Vec<String>> {
    let repo = open(root)?;
    let index = repo.index().map_err(git_err)?;

    let mut files: Vec<String> = index
        .iter()
        .filter_map(|entry| match String::from_utf8(entry.path) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(
                    path = %String::from_utf8_lossy(e.as_bytes()),
                    "Skipping path that is not valid UTF-8"
                );
                None
            }
        })
        .collect();
    // Conflicted paths appear once per stage
    files.dedup();
    Ok(files)
}

/// Paths changed between the merge base of `from` and `to`, and `to`
///
/// When `from` is not in the local repository (a force-pushed or unfetched
/// remote head), the commits reachable from `to` but from no
/// `refs/remotes/*` ref are checked instead.
///
/// # Errors
///
/// Returns an error if `to` cannot be resolved
#[tracing::instrument(fields(root = %root.display()))]
pub fn changed_files(root: &Path, from: &str, to: &str) -> Result<Vec<String>> {
    let repo = open(root)?;

    let to_commit = resolve_commit(&repo, to)?;
    let from_commit = match resolve_commit(&repo, from) {
        Ok(commit) => commit,
        Err(e) => {
            tracing::warn!(error = %e, "Remote revision is unknown, checking unpushed commits");
            return unpushed_files(&repo, &to_commit);
        }
    };

    let base = repo
        .merge_base(from_commit.id(), to_commit.id())
        .unwrap_or_else(|_| from_commit.id());
    let base_tree = repo
        .find_commit(base)
        .and_then(|c| c.tree())
        .map_err(git_err)?;
    let to_tree = to_commit.tree().map_err(git_err)?;

    let mut diff = repo
        .diff_tree_to_tree(Some(&base_tree), Some(&to_tree), None)
        .map_err(git_err)?;
    diff.find_similar(Some(DiffFindOptions::new().renames(true)))
        .map_err(git_err)?;

    Ok(collect_new_paths(&diff))
}

fn resolve_commit<'r>(repo: &'r Repository, rev: &str) -> Result<Commit<'r>> {
    repo.revparse_single(rev)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|e| Error::Git(format!("cannot resolve '{rev}': {}", e.message())))
}

/// Paths touched by commits reachable from `tip` but from no remote-tracking
/// ref, limited to those still present in `tip`
fn unpushed_files(repo: &Repository, tip: &Commit<'_>) -> Result<Vec<String>> {
    let mut walk = repo.revwalk().map_err(git_err)?;
    walk.push(tip.id()).map_err(git_err)?;
    walk.hide_glob("refs/remotes/*").map_err(git_err)?;

    let mut files = BTreeSet::new();
    for oid in walk {
        let commit = repo.find_commit(oid.map_err(git_err)?).map_err(git_err)?;
        let parent_tree = match commit.parent(0) {
            Ok(parent) => Some(parent.tree().map_err(git_err)?),
            Err(_) => None,
        };
        let tree = commit.tree().map_err(git_err)?;

        let mut diff = repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .map_err(git_err)?;
        diff.find_similar(Some(DiffFindOptions::new().renames(true)))
            .map_err(git_err)?;
        files.extend(collect_new_paths(&diff));
    }

    let tip_tree = tip.tree().map_err(git_err)?;
    Ok(files
        .into_iter()
        .filter(|path| tip_tree.get_path(Path::new(path)).is_ok())
        .collect())
}

fn collect_new_paths(diff: &git2::Diff<'_>) -> Vec<String> {
    diff.deltas()
        .filter(|delta| {
            matches!(
                delta.status(),
                Delta::Added
                    | Delta::Copied
                    | Delta::Modified
                    | Delta::Renamed
                    | Delta::Typechange
                    | Delta::Conflicted
            )
        })
        .filter_map(|delta| delta.new_file().path().and_then(path_string))
        .collect()
}

/// Whether the index has unresolved merge conflicts
///
/// # Errors
///
/// Returns an error if the index cannot be read
pub fn has_unmerged_paths(root: &Path) -> Result<bool> {
    let repo = open(root)?;
    let index = repo.index().map_err(git_err)?;
    Ok(index.has_conflicts())
}

/// SHA-256 over every tracked file with unstaged changes and its content
///
/// Two equal fingerprints taken around a hook mean it left the work tree
/// untouched.
///
/// # Errors
///
/// Returns an error if the status cannot be computed
pub fn worktree_fingerprint(root: &Path) -> Result<Vec<u8>> {
    let repo = open(root)?;
    let mut opts = StatusOptions::new();
    opts.include_untracked(false)
        .include_ignored(false)
        .exclude_submodules(true);

    let statuses = repo.statuses(Some(&mut opts)).map_err(git_err)?;
    let unstaged =
        Status::WT_MODIFIED | Status::WT_DELETED | Status::WT_TYPECHANGE | Status::WT_RENAMED;

    let mut changed: Vec<String> = statuses
        .iter()
        .filter(|entry| entry.status().intersects(unstaged))
        .filter_map(|entry| entry.path().map(str::to_string))
        .collect();
    changed.sort();

    let mut hasher = Sha256::new();
    for path in &changed {
        hasher.update(path.as_bytes());
        hasher.update([0]);
        if let Ok(content) = fs::read(root.join(path)) {
            hasher.update(&content);
        }
        hasher.update([0]);
    }
    Ok(hasher.finalize().to_vec())
}

/// Directory git runs hooks from
///
/// Honors `core.hooksPath` (relative values are resolved against the work
/// tree), otherwise `<common git dir>/hooks`.
///
/// # Errors
///
/// Returns an error if the repository cannot be opened
pub fn hooks_dir(root: &Path) -> Result<PathBuf> {
    let repo = open(root)?;

    if let Ok(config) = repo.config()
        && let Ok(custom) = config.get_path("core.hooksPath")
    {
        return Ok(if custom.is_absolute() {
            custom
        } else {
            root.join(custom)
        });
    }

    Ok(repo.commondir().join("hooks"))
}

/// Fetch `url` into a fresh repository at `target` and check out `rev`
///
/// All branches and tags are fetched. `rev` may be a tag, a branch or a
/// commit reachable from either. Returns the checked out commit id.
///
/// # Errors
///
/// Returns an error if fetching fails or `rev` cannot be resolved
#[tracing::instrument(fields(target = %target.display()))]
pub fn checkout_rev(url: &str, rev: &str, target: &Path) -> Result<String> {
    let repo = Repository::init(target).map_err(git_err)?;

    {
        let mut remote = repo.remote("origin", url).map_err(git_err)?;
        let mut fetch_options = FetchOptions::new();
        fetch_options.download_tags(AutotagOption::All);
        remote
            .fetch(
                &[
                    "+refs/heads/*:refs/remotes/origin/*",
                    "+refs/tags/*:refs/tags/*",
                ],
                Some(&mut fetch_options),
                None,
            )
            .map_err(|e| {
                Error::Git(format!(
                    "Failed to fetch {url}. Check the URL and your network connection. Error: {}",
                    e.message()
                ))
            })?;
    }

    let object = resolve_rev(&repo, rev)
        .ok_or_else(|| Error::Git(format!("revision '{rev}' not found in {url}")))?;
    let commit = object.peel_to_commit().map_err(git_err)?;

    repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))
        .map_err(git_err)?;
    repo.set_head_detached(commit.id()).map_err(git_err)?;

    tracing::debug!(rev, commit = %commit.id(), "Checked out revision");
    Ok(commit.id().to_string())
}

fn resolve_rev<'r>(repo: &'r Repository, rev: &str) -> Option<Object<'r>> {
    if let Ok(oid) = Oid::from_str(rev)
        && let Ok(object) = repo.find_object(oid, None)
    {
        return Some(object);
    }

    [
        format!("refs/tags/{rev}"),
        format!("refs/remotes/origin/{rev}"),
        rev.to_string(),
    ]
    .iter()
    .find_map(|candidate| repo.revparse_single(candidate).ok())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use git2::Signature;
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        (temp, repo)
    }

    fn stage(repo: &Repository, root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&full, content).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
    }

    fn commit(repo: &Repository, message: &str) -> Oid {
        let mut index = repo.index().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let parents: Vec<git2::Commit<'_>> = repo
            .head()
            .ok()
            .and_then(|h| h.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    #[test]
    fn test_find_repo_root_from_subdir() {
        let (temp, _repo) = init_repo();
        let sub = temp.path().join("a/b");
        fs::create_dir_all(&sub).unwrap();

        let root = find_repo_root(&sub).unwrap();
        assert_eq!(
            root.canonicalize().unwrap(),
            temp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_find_repo_root_outside_repo() {
        let temp = TempDir::new().unwrap();
        assert!(find_repo_root(temp.path()).is_err());
    }

    #[test]
    fn test_staged_files_unborn_head() {
        let (temp, repo) = init_repo();
        stage(&repo, temp.path(), "src/lib.rs", "fn main() {}\n");
        stage(&repo, temp.path(), "README.md", "# hi\n");

        let mut files = staged_files(temp.path()).unwrap();
        files.sort();
        assert_eq!(files, vec!["README.md", "src/lib.rs"]);
    }

    #[test]
    fn test_staged_files_excludes_deleted_and_unstaged() {
        let (temp, repo) = init_repo();
        stage(&repo, temp.path(), "keep.txt", "a\n");
        stage(&repo, temp.path(), "gone.txt", "b\n");
        commit(&repo, "initial");

        let mut index = repo.index().unwrap();
        index.remove_path(Path::new("gone.txt")).unwrap();
        index.write().unwrap();
        stage(&repo, temp.path(), "new.txt", "c\n");
        fs::write(temp.path().join("keep.txt"), "changed but not staged\n").unwrap();

        assert_eq!(staged_files(temp.path()).unwrap(), vec!["new.txt"]);
    }

    #[test]
    fn test_all_files_lists_index() {
        let (temp, repo) = init_repo();
        stage(&repo, temp.path(), "a.txt", "a\n");
        stage(&repo, temp.path(), "dir/b.txt", "b\n");
        fs::write(temp.path().join("untracked.txt"), "x").unwrap();

        assert_eq!(all_files(temp.path()).unwrap(), vec!["a.txt", "dir/b.txt"]);
    }

    #[test]
    fn test_changed_files_between_commits() {
        let (temp, repo) = init_repo();
        stage(&repo, temp.path(), "a.txt", "a\n");
        let first = commit(&repo, "first");
        stage(&repo, temp.path(), "b.txt", "b\n");
        stage(&repo, temp.path(), "a.txt", "a2\n");
        let second = commit(&repo, "second");

        let mut files =
            changed_files(temp.path(), &first.to_string(), &second.to_string()).unwrap();
        files.sort();
        assert_eq!(files, vec!["a.txt", "b.txt"]);
    }

    #[test]
    fn test_changed_files_unknown_remote_uses_unpushed_commits() {
        let (temp, repo) = init_repo();
        stage(&repo, temp.path(), "a.txt", "a\n");
        let first = commit(&repo, "first");
        stage(&repo, temp.path(), "b.txt", "b\n");
        stage(&repo, temp.path(), "tmp.txt", "t\n");
        commit(&repo, "second");
        let mut index = repo.index().unwrap();
        index.remove_path(Path::new("tmp.txt")).unwrap();
        index.write().unwrap();
        let third = commit(&repo, "third");

        let unknown = "2222222222222222222222222222222222222222";
        let mut files = changed_files(temp.path(), unknown, &third.to_string()).unwrap();
        files.sort();
        assert_eq!(files, vec!["a.txt", "b.txt"]);

        repo.reference("refs/remotes/origin/main", first, false, "fetched")
            .unwrap();
        assert_eq!(
            changed_files(temp.path(), unknown, &third.to_string()).unwrap(),
            vec!["b.txt"]
        );
    }

    #[test]
    fn test_changed_files_unknown_local_revision() {
        let (temp, repo) = init_repo();
        stage(&repo, temp.path(), "a.txt", "a\n");
        let first = commit(&repo, "first");
        assert!(changed_files(temp.path(), &first.to_string(), "no-such-rev").is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_paths_are_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let (temp, repo) = init_repo();
        stage(&repo, temp.path(), "ok.txt", "a\n");
        let odd = Path::new(OsStr::from_bytes(b"odd-\xff.txt"));
        fs::write(temp.path().join(odd), "b\n").unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(odd).unwrap();
        index.write().unwrap();

        assert_eq!(all_files(temp.path()).unwrap(), vec!["ok.txt"]);
        assert_eq!(staged_files(temp.path()).unwrap(), vec!["ok.txt"]);
    }

    #[test]
    fn test_has_unmerged_paths_clean() {
        let (temp, repo) = init_repo();
        stage(&repo, temp.path(), "a.txt", "a\n");
        assert!(!has_unmerged_paths(temp.path()).unwrap());
    }

    #[test]
    fn test_worktree_fingerprint_detects_changes() {
        let (temp, repo) = init_repo();
        stage(&repo, temp.path(), "a.txt", "a\n");
        commit(&repo, "initial");

        let before = worktree_fingerprint(temp.path()).unwrap();
        assert_eq!(before, worktree_fingerprint(temp.path()).unwrap());

        fs::write(temp.path().join("a.txt"), "modified\n").unwrap();
        let after = worktree_fingerprint(temp.path()).unwrap();
        assert_ne!(before, after);

        fs::write(temp.path().join("a.txt"), "modified again\n").unwrap();
        assert_ne!(after, worktree_fingerprint(temp.path()).unwrap());
    }

    #[test]
    fn test_hooks_dir_default_and_custom() {
        let (temp, repo) = init_repo();
        let default = hooks_dir(temp.path()).unwrap();
        assert!(default.ends_with("hooks"));
        assert!(default.to_string_lossy().contains(".git"));

        repo.config()
            .unwrap()
            .set_str("core.hooksPath", ".githooks")
            .unwrap();
        assert_eq!(hooks_dir(temp.path()).unwrap(), temp.path().join(".githooks"));
    }

    #[test]
    fn test_checkout_rev_tag_and_branch() {
        let (source, repo) = init_repo();
        stage(&repo, source.path(), "hook.sh", "v1\n");
        let v1 = commit(&repo, "v1");
        repo.tag_lightweight("v1.0.0", &repo.find_object(v1, None).unwrap(), false)
            .unwrap();
        stage(&repo, source.path(), "hook.sh", "v2\n");
        commit(&repo, "v2");

        let url = source.path().to_string_lossy().to_string();

        let target = TempDir::new().unwrap();
        let id = checkout_rev(&url, "v1.0.0", &target.path().join("clone")).unwrap();
        assert_eq!(id, v1.to_string());
        assert_eq!(
            fs::read_to_string(target.path().join("clone/hook.sh")).unwrap(),
            "v1\n"
        );

        let head = repo.head().unwrap().shorthand().unwrap().to_string();
        checkout_rev(&url, &head, &target.path().join("branch")).unwrap();
        assert_eq!(
            fs::read_to_string(target.path().join("branch/hook.sh")).unwrap(),
            "v2\n"
        );

        checkout_rev(&url, &v1.to_string(), &target.path().join("sha")).unwrap();
        assert_eq!(
            fs::read_to_string(target.path().join("sha/hook.sh")).unwrap(),
            "v1\n"
        );
    }

    #[test]
    fn test_checkout_rev_unknown() {
        let (source, repo) = init_repo();
        stage(&repo, source.path(), "hook.sh", "v1\n");
        commit(&repo, "v1");

        let target = TempDir::new().unwrap();
        let err = checkout_rev(
            &source.path().to_string_lossy(),
            "does-not-exist",
            &target.path().join("clone"),
        )
        .unwrap_err();
        assert!(err.to_string().contains("does-not-exist"));
    }
}
