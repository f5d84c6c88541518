//! # JSON File Signal Store
//!
//! Persists signals as a single pretty-printed JSON array, newest-first, the
//! same layout the relay originally kept in `signals.json`. The whole file is
//! loaded on every read and rewritten on every mutation; at the capacity bound
//! (1000 records) that is a few hundred kilobytes, which keeps the
//! implementation trivial and the file inspectable by hand.
//!
//! A missing or corrupt file reads as an empty store rather than an error, so
//! a fresh deployment or a truncated write never blocks ingestion.
//!
//! This backend is a best-effort mirror. It serializes its own
//! load-modify-save cycles through an internal lock, but it makes no
//! cross-process guarantees; the in-memory buffer in front of it remains the
//! concurrency authority.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::signals::record::SignalRecord;
use crate::signals::store::{SignalStore, StoreError};

/// # JSON File Store
///
/// File-backed [`SignalStore`] with the same newest-first, capacity-bounded
/// semantics as the in-memory buffer.
pub struct JsonFileStore {
    /// Location of the JSON array file.
    path: PathBuf,
    /// Maximum number of records retained in the file.
    capacity: usize,
    /// Serializes load-modify-save cycles within this process.
    file_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store writing to `path`, truncating to `capacity` records.
    pub fn new(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
            file_lock: Mutex::new(()),
        }
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the full signal list. Missing or unreadable content is an empty
    /// list, matching the original file-store behavior.
    fn load(&self) -> Vec<SignalRecord> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                log::warn!(
                    "Signal file {} is not a valid signal array ({}); treating as empty",
                    self.path.display(),
                    e
                );
                Vec::new()
            }),
            Err(_) => Vec::new(),
        }
    }

    /// Rewrites the file with `records`, pretty-printed.
    fn save(&self, records: &[SignalRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(records)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SignalStore for JsonFileStore {
    fn push(&self, record: &SignalRecord) -> Result<(), StoreError> {
        let _guard = self.file_lock.lock().expect("Signal file lock poisoned");
        let mut records = self.load();
        records.insert(0, record.clone());
        records.truncate(self.capacity);
        self.save(&records)
    }

    fn take_front(&self, count: usize) -> Result<Vec<SignalRecord>, StoreError> {
        let _guard = self.file_lock.lock().expect("Signal file lock poisoned");
        let mut records = self.load();
        let take = count.min(records.len());
        let taken: Vec<SignalRecord> = records.drain(..take).collect();
        if !taken.is_empty() {
            self.save(&records)?;
        }
        Ok(taken)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let _guard = self.file_lock.lock().expect("Signal file lock poisoned");
        Ok(self.load().len())
    }
}
