//! In-memory log store.
//!
//! Keeps every entry in insertion order behind a single lock. Ids are handed
//! out under that same lock, so insertion order and id order always agree.

use async_trait::async_trait;
use loghub_proto::{LogEntry, LogId, QueryFilter};
use parking_lot::RwLock;

use crate::error::StoreResult;
use crate::traits::{LogStore, QUERY_LIMIT};

#[derive(Debug, Default)]
struct Inner {
    entries: Vec<LogEntry>,
    last_id: i64,
}

/// Thread-safe in-memory implementation of [`LogStore`].
#[derive(Debug, Default)]
pub struct MemoryLogStore {
    inner: RwLock<Inner>,
}

impl MemoryLogStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Returns true if nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Returns every stored entry, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.inner.read().entries.clone()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert(&self, entry: &LogEntry) -> StoreResult<LogId> {
        let mut inner = self.inner.write();
        inner.last_id += 1;
        let id = LogId(inner.last_id);
        inner.entries.push(entry.clone().with_id(id));
        Ok(id)
    }

    async fn query(&self, filter: &QueryFilter) -> StoreResult<Vec<LogEntry>> {
        let inner = self.inner.read();
        Ok(inner
            .entries
            .iter()
            .rev()
            .filter(|e| filter.matches(e))
            .take(QUERY_LIMIT)
            .cloned()
            .collect())
    }
}
