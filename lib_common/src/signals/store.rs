//! # Signal Store Contract
//!
//! The pluggable-backend seam. Every storage collaborator in the relay, the
//! in-memory [`BoundedSignalBuffer`] and the optional persistence backends
//! alike, speaks the same push / take-front / len contract. Handlers depend on
//! the trait, so a backend can be swapped without touching the HTTP layer.
//!
//! Only the in-memory buffer carries the relay's concurrency guarantees; the
//! persistence backends are best-effort collaborators whose failures are
//! logged and never surfaced to the webhook sender.

use thiserror::Error;

use crate::signals::buffer::BoundedSignalBuffer;
use crate::signals::record::SignalRecord;

/// Errors a storage backend may report. The in-memory buffer never produces
/// any of these; they exist for the file and Redis collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error occurred: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[cfg(feature = "connections")]
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// # Signal Store
///
/// The storage contract behind the webhook relay: append-with-eviction and
/// take-batch-with-removal, plus an advisory size for health reporting.
pub trait SignalStore: Send + Sync {
    /// Inserts `record` as the most recent entry, evicting the oldest entry
    /// once the backend's capacity bound is exceeded.
    fn push(&self, record: &SignalRecord) -> Result<(), StoreError>;

    /// Returns up to `count` records, most recent first, removing the
    /// returned records from the backend.
    fn take_front(&self, count: usize) -> Result<Vec<SignalRecord>, StoreError>;

    /// Current number of stored records.
    fn len(&self) -> Result<usize, StoreError>;
}

impl SignalStore for BoundedSignalBuffer {
    fn push(&self, record: &SignalRecord) -> Result<(), StoreError> {
        BoundedSignalBuffer::push(self, record.clone());
        Ok(())
    }

    fn take_front(&self, count: usize) -> Result<Vec<SignalRecord>, StoreError> {
        Ok(BoundedSignalBuffer::take_front(self, count))
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(BoundedSignalBuffer::len(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn buffer_satisfies_the_store_contract() {
        let store: &dyn SignalStore = &BoundedSignalBuffer::with_capacity(2);

        store
            .push(&SignalRecord::from_payload(json!({"seq": 1})))
            .unwrap();
        store
            .push(&SignalRecord::from_payload(json!({"seq": 2})))
            .unwrap();
        store
            .push(&SignalRecord::from_payload(json!({"seq": 3})))
            .unwrap();

        assert_eq!(store.len().unwrap(), 2);
        let taken = store.take_front(10).unwrap();
        assert_eq!(taken[0].get("seq"), Some(&json!(3)));
        assert_eq!(store.len().unwrap(), 0);
    }
}
