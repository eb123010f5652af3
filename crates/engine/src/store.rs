//! Repository store
//!
//! Hook repositories are checked out once per `url@rev` under the cache
//! directory and reused across runs:
//!
//! ```text
//! <root>/
//!   store.db          redb index of checkouts
//!   repos/<digest>/   one checkout per url@rev
//!   local/<digest>/   environments of `local` hooks
//! ```
//!
//! A checkout is first fetched into a temporary directory next to its final
//! location and renamed into place, so an interrupted fetch never leaves a
//! half-populated repository behind.

use crate::git;
use crate::state::{PersistentState, REPOS_BUCKET, RedbPersistentState, RepoRecord};
use guanka_config::dirs;
use guanka_core::{Error, Result};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Database file name inside the store root
pub const DB_FILE_NAME: &str = "store.db";

const REPOS_DIR: &str = "repos";
const LOCAL_DIR: &str = "local";

/// Hex digest of the given parts, shortened to 16 characters
///
/// Parts are separated by a NUL byte so `("ab", "c")` and `("a", "bc")` differ.
#[must_use]
pub fn digest(parts: &[&str]) -> String {
    use std::fmt::Write;

    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update([0]);
    }
    hasher
        .finalize()
        .iter()
        .take(8)
        .fold(String::with_capacity(16), |mut out, byte| {
            let _ = write!(out, "{byte:02x}");
            out
        })
}

/// What [`Store::gc`] removed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GcStats {
    /// Records dropped from the index
    pub records: usize,
    /// Directories deleted from disk
    pub directories: usize,
}

/// Cache of checked out hook repositories
pub struct Store {
    root: PathBuf,
    db: RedbPersistentState,
}

impl Store {
    /// Open (or create) a store rooted at `root`
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created, for
    /// example when another guanka process holds the database
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join(REPOS_DIR)).map_err(|e| {
            Error::Store(format!(
                "Failed to create store directory {}: {}",
                root.display(),
                e
            ))
        })?;

        let db_path = root.join(DB_FILE_NAME);
        let db = RedbPersistentState::new(&db_path).map_err(|e| {
            Error::Store(format!(
                "Failed to open store database {}: {}",
                db_path.display(),
                e
            ))
        })?;

        tracing::debug!(root = %root.display(), "Opened repository store");
        Ok(Self { root, db })
    }

    /// Open the store at the default location
    ///
    /// # Errors
    ///
    /// Returns an error if no cache directory can be determined
    pub fn open_default() -> Result<Self> {
        let root = dirs::store_dir().ok_or_else(|| {
            Error::Store(format!(
                "Cannot determine cache directory; set {}",
                dirs::HOME_ENV
            ))
        })?;
        Self::open(root)
    }

    /// Root directory of this store
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn repos_dir(&self) -> PathBuf {
        self.root.join(REPOS_DIR)
    }

    /// Checkout of `url` at `rev`, fetching it on first use
    ///
    /// # Errors
    ///
    /// Returns an error if fetching or checking out fails
    #[tracing::instrument(skip(self))]
    pub fn checkout(&self, url: &str, rev: &str) -> Result<PathBuf> {
        let key = RepoRecord::key(url, rev);

        if let Some(record) = self
            .db
            .get(REPOS_BUCKET, &key)?
            .and_then(|bytes| RepoRecord::from_bytes(&bytes))
        {
            let path = PathBuf::from(&record.path);
            if path.is_dir() {
                tracing::debug!(path = %path.display(), "Using cached checkout");
                return Ok(path);
            }
            tracing::warn!(path = %path.display(), "Cached checkout is missing, fetching again");
        }

        let dest = self.repos_dir().join(digest(&[url, rev]));
        if dest.exists() {
            fs::remove_dir_all(&dest)?;
        }

        let staging = tempfile::Builder::new()
            .prefix(".fetch-")
            .tempdir_in(self.repos_dir())
            .map_err(|e| Error::Store(format!("Failed to create staging directory: {e}")))?;
        let staged = staging.path().join("repo");

        tracing::info!(url, rev, "Fetching hook repository");
        let commit = git::checkout_rev(url, rev, &staged)?;

        fs::rename(&staged, &dest).map_err(|e| {
            Error::Store(format!(
                "Failed to move checkout into {}: {}",
                dest.display(),
                e
            ))
        })?;

        let record = RepoRecord::new(url, rev, &dest, commit);
        self.db.set(REPOS_BUCKET, &key, &record.to_bytes()?)?;
        Ok(dest)
    }

    /// Directory holding environments of `local` hooks identified by `digest`
    #[must_use]
    pub fn local_env_dir(&self, digest: &str) -> PathBuf {
        self.root.join(LOCAL_DIR).join(digest)
    }

    /// Every checkout recorded in the index
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be read
    pub fn records(&self) -> Result<Vec<RepoRecord>> {
        let mut records = Vec::new();
        self.db.for_each(REPOS_BUCKET, |_, value| {
            if let Some(record) = RepoRecord::from_bytes(value) {
                records.push(record);
            }
            Ok(())
        })?;
        Ok(records)
    }

    /// Delete checkouts not listed in `keep` and `local` hook environments
    /// not listed in `keep_local`
    ///
    /// Directories under `repos/` that no remaining record points to (such as
    /// leftovers of interrupted fetches) are deleted as well.
    ///
    /// # Errors
    ///
    /// Returns an error if the index or the file system cannot be updated
    #[tracing::instrument(skip_all, fields(keep = keep.len(), keep_local = keep_local.len()))]
    pub fn gc(&self, keep: &[(&str, &str)], keep_local: &[PathBuf]) -> Result<GcStats> {
        let keep: HashSet<Vec<u8>> = keep
            .iter()
            .map(|(url, rev)| RepoRecord::key(url, rev))
            .collect();

        let mut stats = GcStats::default();
        let mut live = HashSet::new();

        for record in self.records()? {
            let key = RepoRecord::key(&record.url, &record.rev);
            if keep.contains(&key) {
                live.insert(PathBuf::from(&record.path));
            } else {
                tracing::debug!(url = %record.url, rev = %record.rev, "Removing unused checkout");
                self.db.delete(REPOS_BUCKET, &key)?;
                stats.records += 1;
            }
        }

        stats.directories += remove_unlisted(&self.repos_dir(), &live)?;

        let local_dir = self.root.join(LOCAL_DIR);
        if local_dir.is_dir() {
            let live_local: HashSet<PathBuf> = keep_local.iter().cloned().collect();
            stats.directories += remove_unlisted(&local_dir, &live_local)?;
        }

        Ok(stats)
    }

    /// Delete the store rooted at `root`
    ///
    /// Returns `false` when there was nothing to delete.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be removed
    pub fn clean(root: &Path) -> Result<bool> {
        if !root.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(root).map_err(|e| {
            Error::Store(format!("Failed to remove {}: {}", root.display(), e))
        })?;
        Ok(true)
    }
}

/// Delete every entry of `dir` not in `live`, returning how many went
fn remove_unlisted(dir: &Path, live: &HashSet<PathBuf>) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if live.contains(&path) {
            continue;
        }
        tracing::debug!(path = %path.display(), "Removing unused store entry");
        if path.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        removed += 1;
    }
    Ok(removed)
}
