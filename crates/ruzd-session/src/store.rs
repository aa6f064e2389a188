//! Session record persistence.
//!
//! One seam, two implementations chosen once at startup: a JSON file for
//! platforms with a durable data directory, and an in-memory store for
//! platforms without one (and for tests). Write failures are logged, never
//! fatal — the in-memory record stays authoritative for the process lifetime.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, warn};

use crate::record::SessionRecord;

/// Internal persistence failure detail, surfaced only in logs.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem failure.
    #[error("session store io error: {0}")]
    Io(#[from] std::io::Error),
    /// The stored record did not decode.
    #[error("session store decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Durable store for the session record.
///
/// `read` returning `None` covers both "nothing persisted yet" and "the
/// persisted record is unreadable" — the caller starts continuity fresh
/// either way.
pub trait SessionStore: Send + Sync {
    /// Load the persisted record, if any.
    fn read(&self) -> Option<SessionRecord>;

    /// Persist the record. Returns whether the write stuck.
    fn write(&self, record: &SessionRecord) -> bool;

    /// Short label of the mechanism, carried in the session context.
    fn mechanism(&self) -> &'static str;
}

/// JSON-file-backed store with atomic rewrite (temp file + rename).
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store the record at `path` (conventionally `ruzd_session.json` inside
    /// the game's persistent data directory).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_inner(&self) -> Result<SessionRecord, StoreError> {
        let raw = std::fs::read(&self.path)?;
        Ok(serde_json::from_slice(&raw)?)
    }

    fn write_inner(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(record)?;
        // Write-then-rename so a crash mid-write never leaves a torn record.
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(&encoded)?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn read(&self) -> Option<SessionRecord> {
        match self.read_inner() {
            Ok(record) => Some(record),
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable session record, starting fresh");
                None
            }
        }
    }

    fn write(&self, record: &SessionRecord) -> bool {
        match self.write_inner(record) {
            Ok(()) => {
                debug!(path = %self.path.display(), index = record.session_index, "session record persisted");
                true
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to persist session record");
                false
            }
        }
    }

    fn mechanism(&self) -> &'static str {
        "file"
    }
}

/// Process-lifetime key-value store for platforms without durable files.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<SessionRecord>>,
}

impl MemorySessionStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn read(&self) -> Option<SessionRecord> {
        self.slot.lock().ok().and_then(|guard| guard.clone())
    }

    fn write(&self, record: &SessionRecord) -> bool {
        match self.slot.lock() {
            Ok(mut guard) => {
                *guard = Some(record.clone());
                true
            }
            Err(_) => false,
        }
    }

    fn mechanism(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ruzd_core::ids::PlayerId;

    #[test]
    fn file_store_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("ruzd_session.json"));
        assert!(store.read().is_none());

        let record = SessionRecord::initial(PlayerId::from("p1"));
        assert!(store.write(&record));
        assert_eq!(store.read().unwrap(), record);
    }

    #[test]
    fn file_store_overwrites_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("ruzd_session.json"));
        let mut record = SessionRecord::initial(PlayerId::from("p1"));
        assert!(store.write(&record));
        record.rotate();
        assert!(store.write(&record));
        assert_eq!(store.read().unwrap().session_index, 1);
        // No leftover temp file after the rename.
        assert!(!dir.path().join("ruzd_session.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ruzd_session.json");
        std::fs::write(&path, b"{not json").unwrap();
        let store = FileSessionStore::new(path);
        assert!(store.read().is_none());
    }

    #[test]
    fn unwritable_path_reports_false() {
        let store = FileSessionStore::new("/nonexistent-dir/ruzd_session.json");
        let record = SessionRecord::initial(PlayerId::from("p1"));
        assert!(!store.write(&record));
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemorySessionStore::new();
        assert!(store.read().is_none());
        let record = SessionRecord::initial(PlayerId::from("p1"));
        assert!(store.write(&record));
        assert_eq!(store.read().unwrap(), record);
        assert_eq!(store.mechanism(), "memory");
    }
}
