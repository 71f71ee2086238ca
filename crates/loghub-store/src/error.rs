//! Error types for log persistence.

use thiserror::Error;

/// Errors that can occur in a log store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row could not be turned back into a log entry.
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// The store is not reachable or refuses work.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An I/O error occurred while preparing storage.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = StoreError::Corrupt("row 3: bad timestamp".to_string());
        assert_eq!(err.to_string(), "corrupt row: row 3: bad timestamp");

        let err = StoreError::Unavailable("pool closed".to_string());
        assert_eq!(err.to_string(), "store unavailable: pool closed");

        let err = StoreError::from(sqlx::Error::PoolClosed);
        assert!(err.to_string().starts_with("database error"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StoreError>();
    }
}
