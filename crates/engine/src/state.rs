//! Persistent store state
//!
//! The repository store keeps an index of checked out hook repositories in a
//! small `redb` database. Values are `bincode` encoded records.

use guanka_core::{Error, Result};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Bucket holding one [`RepoRecord`] per `url@rev`
pub const REPOS_BUCKET: &str = "repos";

const REPOS_TABLE: TableDefinition<'static, &'static [u8], &'static [u8]> =
    TableDefinition::new(REPOS_BUCKET);

/// Trait for persistent state storage
pub trait PersistentState: Send + Sync {
    /// Get a value from a bucket
    fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Set a value in a bucket
    fn set(&self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key from a bucket
    fn delete(&self, bucket: &str, key: &[u8]) -> Result<()>;

    /// Iterate over all key-value pairs in a bucket
    fn for_each<F>(&self, bucket: &str, f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>;
}

/// Persistent state implementation using redb
pub struct RedbPersistentState {
    db: Database,
}

// Static assertions to ensure thread safety
const _: () = {
    const fn assert_send<T: Send>() {}
    const fn assert_sync<T: Sync>() {}

    let _ = assert_send::<RedbPersistentState>;
    let _ = assert_sync::<RedbPersistentState>;
};

impl RedbPersistentState {
    /// Create or open a persistent state database
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or is not a redb database
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = Database::create(path)
            .map_err(|e| Error::State(format!("Failed to create database: {e}")))?;
        Ok(Self { db })
    }

    fn table_def(
        bucket: &str,
    ) -> Result<TableDefinition<'static, &'static [u8], &'static [u8]>> {
        match bucket {
            REPOS_BUCKET => Ok(REPOS_TABLE),
            other => Err(Error::State(format!("Unknown bucket '{other}'"))),
        }
    }
}

impl PersistentState for RedbPersistentState {
    fn get(&self, bucket: &str, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let table_def = Self::table_def(bucket)?;
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| Error::State(format!("Failed to begin read transaction: {e}")))?;

        let Ok(table) = read_txn.open_table(table_def) else {
            // Table doesn't exist yet
            return Ok(None);
        };

        match table.get(key) {
            Ok(Some(value)) => Ok(Some(value.value().to_vec())),
            Ok(None) => Ok(None),
            Err(e) => Err(Error::State(format!("Failed to get value: {e}"))),
        }
    }

    fn set(&self, bucket: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let table_def = Self::table_def(bucket)?;
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| Error::State(format!("Failed to begin write transaction: {e}")))?;
        {
            let mut table = write_txn
                .open_table(table_def)
                .map_err(|e| Error::State(format!("Failed to open table: {e}")))?;
            table
                .insert(key, value)
                .map_err(|e| Error::State(format!("Failed to insert value: {e}")))?;
        }
        write_txn
            .commit()
            .map_err(|e| Error::State(format!("Failed to commit transaction: {e}")))?;
        Ok(())
    }

    fn delete(&self, bucket: &str, key: &[u8]) -> Result<()> {
        let table_def = Self::table_def(bucket)?;
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| Error::State(format!("Failed to begin write transaction: {e}")))?;
        {
            let mut table = write_txn
                .open_table(table_def)
                .map_err(|e| Error::State(format!("Failed to open table: {e}")))?;
            table
                .remove(key)
                .map_err(|e| Error::State(format!("Failed to remove value: {e}")))?;
        }
        write_txn
            .commit()
            .map_err(|e| Error::State(format!("Failed to commit transaction: {e}")))?;
        Ok(())
    }

    fn for_each<F>(&self, bucket: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        let table_def = Self::table_def(bucket)?;
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| Error::State(format!("Failed to begin read transaction: {e}")))?;

        let Ok(table) = read_txn.open_table(table_def) else {
            // No bucket yet
            return Ok(());
        };

        let iter = table
            .iter()
            .map_err(|e| Error::State(format!("Failed to iterate table: {e}")))?;

        for item in iter {
            let (key, value) =
                item.map_err(|e| Error::State(format!("Failed to read item: {e}")))?;
            f(key.value(), value.value())?;
        }

        Ok(())
    }
}

/// A checked out hook repository
#[derive(Debug, Clone, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct RepoRecord {
    /// Repository URL as written in the configuration
    pub url: String,
    /// Pinned revision as written in the configuration
    pub rev: String,
    /// Checkout directory
    pub path: String,
    /// Commit the revision resolved to
    pub commit: String,
    /// Seconds since the Unix epoch
    pub fetched_at: u64,
}

impl RepoRecord {
    /// Create a record stamped with the current time
    #[must_use]
    pub fn new(url: &str, rev: &str, path: &Path, commit: String) -> Self {
        let fetched_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs());
        Self {
            url: url.to_string(),
            rev: rev.to_string(),
            path: path.to_string_lossy().into_owned(),
            commit,
            fetched_at,
        }
    }

    /// Database key of a repository at a revision
    #[must_use]
    pub fn key(url: &str, rev: &str) -> Vec<u8> {
        format!("{url}@{rev}").into_bytes()
    }

    /// Serialize to bytes using bincode
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| Error::State(format!("Failed to encode repo record: {e}")))
    }

    /// Deserialize from bytes using bincode
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        bincode::decode_from_slice(bytes, bincode::config::standard())
            .ok()
            .map(|(record, _len)| record)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use super::*;
    use tempfile::TempDir;

    fn test_db_setup() -> (TempDir, RedbPersistentState) {
        let temp = TempDir::new().unwrap();
        let db = RedbPersistentState::new(temp.path().join("test.db")).unwrap();
        (temp, db)
    }

    #[test]
    fn test_get_missing_table() {
        let (_temp, db) = test_db_setup();
        assert_eq!(db.get(REPOS_BUCKET, b"nope").unwrap(), None);
    }

    #[test]
    fn test_set_get_delete() {
        let (_temp, db) = test_db_setup();
        db.set(REPOS_BUCKET, b"key", b"value").unwrap();
        assert_eq!(db.get(REPOS_BUCKET, b"key").unwrap(), Some(b"value".to_vec()));

        db.delete(REPOS_BUCKET, b"key").unwrap();
        assert_eq!(db.get(REPOS_BUCKET, b"key").unwrap(), None);
    }

    #[test]
    fn test_for_each_visits_all() {
        let (_temp, db) = test_db_setup();
        db.for_each(REPOS_BUCKET, |_, _| panic!("empty table")).unwrap();

        db.set(REPOS_BUCKET, b"a", b"1").unwrap();
        db.set(REPOS_BUCKET, b"b", b"2").unwrap();

        let mut seen = Vec::new();
        db.for_each(REPOS_BUCKET, |k, v| {
            seen.push((k.to_vec(), v.to_vec()));
            Ok(())
        })
        .unwrap();
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_unknown_bucket() {
        let (_temp, db) = test_db_setup();
        assert!(db.get("other", b"k").is_err());
    }

    #[test]
    fn test_repo_record_bytes() {
        let record = RepoRecord::new(
            "https://example.com/hooks",
            "v1.0.0",
            Path::new("/cache/repos/abc"),
            "0123abcd".to_string(),
        );
        let decoded = RepoRecord::from_bytes(&record.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, record);
        assert!(decoded.fetched_at > 0);
        assert!(RepoRecord::from_bytes(b"\xff").is_none());
    }

    #[test]
    fn test_repo_record_key() {
        assert_eq!(
            RepoRecord::key("https://example.com/hooks", "v1"),
            b"https://example.com/hooks@v1".to_vec()
        );
    }
}
