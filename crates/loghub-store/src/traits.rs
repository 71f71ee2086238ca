//! The persistence port.
//!
//! The service only ever talks to storage through [`LogStore`]. Every call is
//! an independent unit of work; implementations must accept concurrent calls
//! from many connection tasks without the caller holding a lock.

use std::sync::Arc;

use async_trait::async_trait;
use loghub_proto::{LogEntry, LogId, QueryFilter, MAX_RESPONSE_ENTRIES};

use crate::error::StoreResult;

/// Maximum number of entries returned by [`LogStore::query`].
pub const QUERY_LIMIT: usize = MAX_RESPONSE_ENTRIES;

/// Storage backend for log entries.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Appends one entry and returns the id assigned to it.
    ///
    /// Any `id` already present on `entry` is ignored. A failed insert leaves
    /// previously stored entries untouched.
    async fn insert(&self, entry: &LogEntry) -> StoreResult<LogId>;

    /// Returns at most [`QUERY_LIMIT`] entries matching `filter`, highest id
    /// first. No match is an empty vector, not an error.
    async fn query(&self, filter: &QueryFilter) -> StoreResult<Vec<LogEntry>>;
}

/// A store shared between connection tasks.
pub type SharedLogStore = Arc<dyn LogStore>;

