//! SQLite-backed log store.
//!
//! Entries live in a single append-only `logs` table. The store owns a
//! connection pool; every insert or query checks out its own connection, so
//! concurrent connection tasks never share a handle.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use loghub_proto::{parse_timestamp, LogEntry, LogId, LogLevel, QueryFilter, TIMESTAMP_FORMAT};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::traits::{LogStore, QUERY_LIMIT};

/// Default number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// How long a connection waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Log store backed by SQLite via a connection pool.
#[derive(Debug, Clone)]
pub struct SqliteLogStore {
    pool: SqlitePool,
}

impl SqliteLogStore {
    /// Connects using a database URL such as `sqlite://loghub.db`.
    ///
    /// The database file is created if missing.
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        info!(url = %url, "Log store opened");
        Ok(store)
    }

    /// Opens or creates a database file at `path`.
    pub async fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        info!(path = %path.display(), "Log store opened");
        Ok(store)
    }

    /// Creates a private in-memory database.
    ///
    /// An in-memory SQLite database belongs to a single connection, so the
    /// pool is pinned to exactly one connection that is never recycled.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                level TEXT NOT NULL,
                message TEXT NOT NULL,
                source TEXT NOT NULL,
                timestamp TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        debug!("Log store schema initialized");
        Ok(())
    }

    /// Returns the total number of stored entries.
    pub async fn count(&self) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM logs")
            .fetch_one(&self.pool)
            .await?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// Closes the pool, waiting for checked-out connections to return.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Builds the SELECT for `filter`: date part of `timestamp` within the
/// inclusive range, exact level unless `ALL`, newest id first, capped at
/// [`QUERY_LIMIT`].
#[must_use]
pub fn select_entries(filter: &QueryFilter) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::new(
        "SELECT id, timestamp, level, message, source FROM logs WHERE date(timestamp) BETWEEN ",
    );
    builder.push_bind(filter.from.format(DATE_FORMAT).to_string());
    builder.push(" AND ");
    builder.push_bind(filter.to.format(DATE_FORMAT).to_string());

    if let Some(level) = filter.level.level() {
        builder.push(" AND level = ");
        builder.push_bind(level.as_str().to_string());
    }

    builder.push(" ORDER BY id DESC LIMIT ");
    builder.push_bind(QUERY_LIMIT as i64);
    builder
}

fn entry_from_row(row: &SqliteRow) -> StoreResult<LogEntry> {
    let id: i64 = row.try_get("id")?;
    let raw_timestamp: String = row.try_get("timestamp")?;
    let timestamp = parse_timestamp(&raw_timestamp)
        .map_err(|e| StoreError::Corrupt(format!("row {id}: timestamp {raw_timestamp:?}: {e}")))?;
    let level: String = row.try_get("level")?;

    Ok(LogEntry {
        id: Some(LogId(id)),
        timestamp,
        level: LogLevel::from(level),
        message: row.try_get("message")?,
        source: row.try_get("source")?,
    })
}

#[async_trait]
impl LogStore for SqliteLogStore {
    async fn insert(&self, entry: &LogEntry) -> StoreResult<LogId> {
        let result = sqlx::query(
            "INSERT INTO logs (level, message, source, timestamp) VALUES (?, ?, ?, ?)",
        )
        .bind(entry.level.as_str())
        .bind(entry.message.as_str())
        .bind(entry.source.as_str())
        .bind(entry.timestamp.format(TIMESTAMP_FORMAT).to_string())
        .execute(&self.pool)
        .await?;

        Ok(LogId(result.last_insert_rowid()))
    }

    async fn query(&self, filter: &QueryFilter) -> StoreResult<Vec<LogEntry>> {
        let mut builder = select_entries(filter);
        let rows = builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(entry_from_row).collect()
    }
}
