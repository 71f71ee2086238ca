//! # loghub-store
//!
//! Persistence port of the loghub service.
//!
//! This crate provides:
//!
//! - [`LogStore`] — The insert/query contract the service depends on
//! - [`SqliteLogStore`] — Pooled SQLite implementation (one `logs` table)
//! - [`MemoryLogStore`] — In-process implementation with identical semantics
//! - [`QUERY_LIMIT`] — Maximum number of entries a query returns
//!
//! ## Example
//!
//! ```rust,no_run
//! use loghub_proto::{LogEntry, QueryFilter};
//! use loghub_store::{LogStore, SqliteLogStore};
//!
//! # async fn example() -> loghub_store::StoreResult<()> {
//! let store = SqliteLogStore::open("loghub.db").await?;
//! let entry = LogEntry::new("INFO", "service started", "(10.0.0.5)");
//! let day = entry.date();
//! store.insert(&entry).await?;
//!
//! let recent = store.query(&QueryFilter::on(day)).await?;
//! assert!(!recent.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryLogStore;
pub use sqlite::{select_entries, SqliteLogStore};
pub use traits::{LogStore, SharedLogStore, QUERY_LIMIT};
