//! File-backed response cache with a fixed freshness window.
//!
//! Each key maps to one JSON file under the cache root. A record is served
//! only while its modification time is within [`FRESHNESS_WINDOW`] of the
//! current time, which keeps polling under the platform's read quota
//! (10 requests per minute for the methods this cache fronts).
//!
//! The cache is an optimization only. Writes report failures through
//! [`CacheError`] so call sites can log them, but no engine operation ever
//! fails because of the cache; reads degrade every failure to a miss.
//!
//! # Concurrency
//!
//! There is no locking. Records are written to a temporary file and renamed
//! into place, so a reader sees either the old or the new payload, never a
//! partial one. Concurrent writers to the same key race with last write
//! wins; the worst outcome is one redundant remote call.

use crate::clock::{Clock, SystemClock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::trace;

/// How long a record stays valid after it was written.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(6);

/// Why a cache write failed or a cache read missed.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("invalid cache key {0:?}")]
    InvalidKey(String),

    #[error("no cached record")]
    Missing,

    #[error("cached record expired {age:?} ago")]
    Expired { age: Duration },

    #[error("cache io error: {0}")]
    Io(#[from] io::Error),

    #[error("cache payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A directory of JSON records keyed by name.
///
/// Construct one per process and share it (e.g. behind an `Arc`).
pub struct CacheStore {
    root: PathBuf,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Create a store rooted at `root`, using the system clock.
    ///
    /// The directory is created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_clock(root, Arc::new(SystemClock))
    }

    /// Create a store that reads "now" from `clock`.
    pub fn with_clock(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            clock,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Serialize `value` and store it under `key`, replacing any prior record.
    pub fn put<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let path = self.record_path(key)?;
        let payload = serde_json::to_vec(value)?;

        self.ensure_root()?;

        let mut tmp = NamedTempFile::new_in(&self.root)?;
        tmp.write_all(&payload)?;
        tmp.as_file().sync_data()?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o644))?;
        }
        tmp.persist(&path).map_err(|e| CacheError::Io(e.error))?;

        trace!(key, bytes = payload.len(), "cache write");
        Ok(())
    }

    /// Look up a fresh record, treating every failure as a miss.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.load(key) {
            Ok(value) => {
                trace!(key, "cache hit");
                Some(value)
            }
            Err(reason) => {
                trace!(key, %reason, "cache miss");
                None
            }
        }
    }

    /// Look up a fresh record, reporting why it could not be served.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<T, CacheError> {
        let path = self.record_path(key)?;

        let metadata = match fs::metadata(&path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(CacheError::Missing),
            Err(e) => return Err(e.into()),
        };
        let modified = metadata.modified()?;

        let now = self.clock.now();
        if is_expired(modified, now) {
            let age = now.duration_since(modified).unwrap_or_default();
            return Err(CacheError::Expired { age });
        }

        let bytes = fs::read(&path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Drop the record under `key`. Removing an absent record succeeds.
    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        let path = self.record_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                trace!(key, "cache evict");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Check that records can be written, creating the root if needed.
    pub fn check_writable(&self) -> Result<(), CacheError> {
        self.ensure_root()?;
        NamedTempFile::new_in(&self.root)?;
        Ok(())
    }

    fn ensure_root(&self) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o755);
        }
        builder.create(&self.root)
    }

    fn record_path(&self, key: &str) -> Result<PathBuf, CacheError> {
        if !is_valid_key(key) {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

/// A record is stale once `now` is strictly after `modified + FRESHNESS_WINDOW`.
fn is_expired(modified: SystemTime, now: SystemTime) -> bool {
    match modified.checked_add(FRESHNESS_WINDOW) {
        Some(deadline) => now > deadline,
        None => false,
    }
}

/// Keys become file names directly, so they must stay inside the root.
fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(&['/', '\\', '\0'][..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::fs::OpenOptions;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Member {
        id: String,
        name: String,
        deleted: bool,
    }

    fn member(id: &str) -> Member {
        Member {
            id: id.to_string(),
            name: format!("user {id}"),
            deleted: false,
        }
    }

    fn store_with_clock() -> (TempDir, CacheStore, Arc<ManualClock>) {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::starting_now());
        let store = CacheStore::with_clock(dir.path().join("cache"), clock.clone());
        (dir, store, clock)
    }

    fn set_mtime(path: &Path, at: SystemTime) {
        let file = OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(at).unwrap();
    }

    #[test]
    fn put_then_get_hits() {
        let (_dir, store, _clock) = store_with_clock();
        let members = vec![member("U1"), member("U2")];

        store.put("users", &members).unwrap();

        let cached: Option<Vec<Member>> = store.get("users");
        assert_eq!(cached, Some(members));
    }

    #[test]
    fn get_unwritten_key_misses() {
        let (_dir, store, _clock) = store_with_clock();
        assert_eq!(store.get::<Member>("never-written"), None);
        assert!(matches!(
            store.load::<Member>("never-written"),
            Err(CacheError::Missing)
        ));
    }

    #[test]
    fn get_misses_after_window() {
        let (_dir, store, clock) = store_with_clock();
        store.put("user.U1", &member("U1")).unwrap();

        clock.advance(Duration::from_secs(3));
        assert!(store.get::<Member>("user.U1").is_some());

        clock.advance(Duration::from_secs(4));
        assert_eq!(store.get::<Member>("user.U1"), None);
        assert!(matches!(
            store.load::<Member>("user.U1"),
            Err(CacheError::Expired { .. })
        ));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let (_dir, store, clock) = store_with_clock();
        store.put("user.U1", &member("U1")).unwrap();

        let written = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        set_mtime(&store.root().join("user.U1"), written);

        clock.set(written + FRESHNESS_WINDOW);
        assert!(store.get::<Member>("user.U1").is_some());

        clock.set(written + FRESHNESS_WINDOW + Duration::from_millis(1));
        assert_eq!(store.get::<Member>("user.U1"), None);
    }

    #[test]
    fn record_from_the_future_is_fresh() {
        let (_dir, store, clock) = store_with_clock();
        store.put("k", &member("U1")).unwrap();
        clock.set(SystemTime::UNIX_EPOCH);
        assert!(store.get::<Member>("k").is_some());
    }

    #[test]
    fn expired_record_is_left_on_disk_and_overwritten() {
        let (_dir, store, clock) = store_with_clock();
        store.put("k", &member("U1")).unwrap();
        clock.advance(Duration::from_secs(60));

        assert_eq!(store.get::<Member>("k"), None);
        assert!(store.root().join("k").exists());

        store.put("k", &member("U2")).unwrap();
        clock.set(SystemTime::now());
        assert_eq!(store.get::<Member>("k"), Some(member("U2")));
    }

    #[test]
    fn remove_evicts_fresh_record() {
        let (dir, store, _clock) = store_with_clock();
        store.put("k", &member("U1")).unwrap();

        store.remove("k").unwrap();
        assert_eq!(store.get::<Member>("k"), None);
        assert!(!store.root().join("k").exists());

        // Absent records and a missing root are fine too.
        store.remove("k").unwrap();
        CacheStore::new(dir.path().join("nowhere")).remove("k").unwrap();
        assert!(matches!(store.remove("../k"), Err(CacheError::InvalidKey(_))));
    }

    #[test]
    fn truncated_record_misses() {
        let (_dir, store, _clock) = store_with_clock();
        store.put("k", &member("U1")).unwrap();

        let path = store.root().join("k");
        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert_eq!(store.get::<Member>("k"), None);
        assert!(matches!(
            store.load::<Member>("k"),
            Err(CacheError::Payload(_))
        ));
    }

    #[test]
    fn wrong_shape_misses() {
        let (_dir, store, _clock) = store_with_clock();
        store.put("k", &vec![1, 2, 3]).unwrap();
        assert_eq!(store.get::<Member>("k"), None);
    }

    #[test]
    fn put_creates_nested_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("a").join("b").join("c");
        let store = CacheStore::new(&root);
        assert!(!root.exists());

        store.put("k", &member("U1")).unwrap();
        assert!(root.join("k").is_file());
    }

    #[cfg(unix)]
    #[test]
    fn record_is_world_readable_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store, _clock) = store_with_clock();
        store.put("k", &member("U1")).unwrap();

        let mode = fs::metadata(store.root().join("k"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn put_failure_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let store = CacheStore::new(blocker.join("cache"));
        assert!(store.put("k", &member("U1")).is_err());
        assert_eq!(store.get::<Member>("k"), None);
    }

    #[test]
    fn writability_follows_the_root() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::new(dir.path().join("fresh"));
        store.check_writable().unwrap();
        assert!(store.root().is_dir());

        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();
        assert!(CacheStore::new(blocker.join("cache")).check_writable().is_err());
    }

    #[test]
    fn keys_cannot_escape_root() {
        let (_dir, store, _clock) = store_with_clock();
        for key in ["", ".", "..", "../outside", "a/b", "a\\b", "nul\0"] {
            assert!(
                matches!(store.put(key, &1), Err(CacheError::InvalidKey(_))),
                "key {key:?} accepted"
            );
            assert_eq!(store.get::<i32>(key), None);
        }
    }

    #[test]
    fn concurrent_writers_leave_a_whole_record() {
        let (_dir, store, _clock) = store_with_clock();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..20 {
                        let _ = store.put("shared", &member(&format!("U{i}")));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let cached: Member = store.load("shared").unwrap();
        assert!(cached.id.starts_with('U'));
    }

    proptest! {
        #[test]
        fn any_value_is_served_while_fresh(
            key in "[a-z0-9_-][a-z0-9._-]{0,31}",
            name in any::<String>(),
            deleted in any::<bool>(),
        ) {
            let (_dir, store, _clock) = store_with_clock();
            let value = Member { id: key.clone(), name, deleted };

            store.put(&key, &value).unwrap();
            prop_assert_eq!(store.get::<Member>(&key), Some(value));
        }
    }
}
