//! # Bounded Signal Buffer
//!
//! The single source of truth for buffered signals, and the only component in
//! the relay with any concurrency concern. It is a capacity-bounded, ordered,
//! newest-first container shared between the ingest path (webhook handler) and
//! the retrieval path (downstream bot polling `/signals`).
//!
//! ## Core Design Principles:
//!
//! 1.  **One Lock, Short Critical Sections**: Every access goes through a
//!     single `std::sync::Mutex` held for the full read-modify-write. Only
//!     pure in-memory operations happen under the lock (no I/O, no logging),
//!     so hold time is bounded by O(count) per drain and O(capacity) per
//!     eviction.
//!
//! 2.  **Destructive Reads**: `take_front` removes the records it returns in
//!     the same critical section. Two concurrent drains can never hand out
//!     overlapping records, and a record is consumed exactly once. A
//!     peek-then-delete split would admit a lost-update race between the read
//!     and the removal, which is precisely what this design rules out.
//!
//! 3.  **Strict FIFO Eviction**: When a push exceeds capacity, the oldest
//!     (tail) records are discarded, never before capacity is exceeded and
//!     never out of order. The buffer behaves as a multi-producer work queue
//!     for a single downstream consumer, bounded so a slow or absent consumer
//!     cannot grow memory without limit.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::signals::record::SignalRecord;

/// Maximum number of records retained by a default-constructed buffer.
pub const SIGNAL_CAPACITY: usize = 1000;

/// # Bounded Signal Buffer
///
/// Thread-safe, capacity-bounded, newest-first sequence of [`SignalRecord`].
///
/// Constructed once at process start, owned by the application state, and
/// passed by reference into request handlers. Lifecycle equals process
/// lifetime; it is emptied only by explicit drains or a restart.
pub struct BoundedSignalBuffer {
    /// Hard cap on the number of retained records.
    capacity: usize,
    /// Newest-first record storage. Index 0 is the most recent signal.
    records: Mutex<VecDeque<SignalRecord>>,
}

impl BoundedSignalBuffer {
    /// Creates a buffer with the default [`SIGNAL_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(SIGNAL_CAPACITY)
    }

    /// Creates a buffer retaining at most `capacity` records.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            records: Mutex::new(VecDeque::with_capacity(capacity.min(SIGNAL_CAPACITY))),
        }
    }

    /// # Push
    ///
    /// Inserts `record` at the front of the sequence, then truncates the tail
    /// back to capacity if the insertion exceeded it. Eviction is strict
    /// oldest-first and happens only when the bound is actually exceeded.
    ///
    /// Never fails; safe to call concurrently with itself and with
    /// [`take_front`](Self::take_front).
    pub fn push(&self, record: SignalRecord) {
        let mut records = self.records.lock().expect("Signal buffer lock poisoned");
        records.push_front(record);
        records.truncate(self.capacity);
        debug_assert!(records.len() <= self.capacity);
    }

    /// # Take Front
    ///
    /// Returns up to `count` records from the front (most recent first) and
    /// removes exactly the returned records in the same critical section.
    ///
    /// - `count >= len` drains the whole buffer.
    /// - `count == 0` or an empty buffer returns an empty vec and mutates
    ///   nothing.
    ///
    /// A record is returned by at most one `take_front` call, ever.
    pub fn take_front(&self, count: usize) -> Vec<SignalRecord> {
        let mut records = self.records.lock().expect("Signal buffer lock poisoned");
        let take = count.min(records.len());
        records.drain(..take).collect()
    }

    /// Current record count. Advisory only: under concurrent mutation the
    /// value may be stale the instant it is returned.
    pub fn len(&self) -> usize {
        self.records.lock().expect("Signal buffer lock poisoned").len()
    }

    /// Returns `true` when no records are buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured capacity bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BoundedSignalBuffer {
    fn default() -> Self {
        Self::new()
    }
}
