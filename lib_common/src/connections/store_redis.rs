//! # Redis Signal Store
//!
//! Persists signals in a Redis list, newest-first, under `signals:list`. Each
//! record is one JSON-encoded list element: `LPUSH` + `LTRIM` on ingest keeps
//! the list capacity-bounded, and the destructive read runs `LRANGE` + `LTRIM`
//! inside a `MULTI`/`EXEC` pipeline so a concurrent writer cannot slip a
//! record between the read and the removal.
//!
//! Uses the synchronous `redis` client; every operation opens its work on a
//! fresh connection from the shared client handle.

use redis::{Client, Commands, RedisResult};

use crate::signals::record::SignalRecord;
use crate::signals::store::{SignalStore, StoreError};

/// Redis key holding the signal list.
const REDIS_SIGNALS_KEY: &str = "signals:list";

/// # Redis Store
///
/// Redis-list-backed [`SignalStore`] with the same newest-first,
/// capacity-bounded semantics as the in-memory buffer.
pub struct RedisSignalStore {
    /// The internal Redis client instance.
    client: Client,
    /// List key, `signals:list` unless overridden.
    key: String,
    /// Maximum number of records retained in the list.
    capacity: usize,
}

impl RedisSignalStore {
    /// Creates a new store from a connection string.
    ///
    /// # Arguments
    /// * `url` - The redis URL (e.g., "redis://127.0.0.1/").
    /// * `capacity` - Maximum list length before oldest-first eviction.
    pub fn new(url: &str, capacity: usize) -> RedisResult<Self> {
        // Open the connection to the redis server
        let client = Client::open(url)?;
        Ok(Self {
            client,
            key: REDIS_SIGNALS_KEY.to_string(),
            capacity,
        })
    }

    /// Overrides the list key, mainly for test isolation.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Deletes the signal list entirely.
    pub fn clear(&self) -> RedisResult<()> {
        let mut conn = self.client.get_connection()?;
        let _: () = conn.del(&self.key)?;
        Ok(())
    }
}

impl SignalStore for RedisSignalStore {
    fn push(&self, record: &SignalRecord) -> Result<(), StoreError> {
        let json = serde_json::to_string(record)?;
        let mut conn = self.client.get_connection()?;
        // LPUSH then LTRIM, atomically, so the list never observably exceeds
        // its capacity bound.
        let _: () = redis::pipe()
            .atomic()
            .lpush(&self.key, json)
            .ltrim(&self.key, 0, self.capacity.saturating_sub(1) as isize)
            .query(&mut conn)?;
        Ok(())
    }

    fn take_front(&self, count: usize) -> Result<Vec<SignalRecord>, StoreError> {
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.client.get_connection()?;
        // Read the head and drop it in one transaction: the drain contract.
        let (raw, _): (Vec<String>, ()) = redis::pipe()
            .atomic()
            .lrange(&self.key, 0, count as isize - 1)
            .ltrim(&self.key, count as isize, -1)
            .query(&mut conn)?;

        let mut records = Vec::with_capacity(raw.len());
        for entry in raw {
            records.push(serde_json::from_str(&entry)?);
        }
        Ok(records)
    }

    fn len(&self) -> Result<usize, StoreError> {
        let mut conn = self.client.get_connection()?;
        let len: usize = conn.llen(&self.key)?;
        Ok(len)
    }
}
