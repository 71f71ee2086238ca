//! # loghub-proto
//!
//! Log entry model and wire protocol shared by the loghub service and its clients.
//!
//! This crate provides:
//!
//! - [`LogEntry`] — One log record: level, message, source and timestamp
//! - [`LogLevel`] — Severity, case-normalized and permissive on input
//! - [`Request`] — `SUBMIT` and `QUERY` requests
//! - [`QueryResponse`] — The answer to a `QUERY`
//! - [`framing`] — Half-close terminated frames over a byte stream
//!
//! ## Example
//!
//! ```rust
//! use loghub_proto::{LogEntry, LogLevel, Request};
//!
//! let entry = LogEntry::new("error", "disk full", "(192.168.1.12)");
//! assert_eq!(entry.level, LogLevel::Error);
//!
//! let bytes = Request::submit(entry).to_bytes().unwrap();
//! let decoded = Request::from_bytes(&bytes).unwrap();
//! assert!(matches!(decoded, Request::Submit { .. }));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod framing;
pub mod messages;
pub mod types;

pub use error::{ProtoError, Result};
pub use framing::{
    read_frame, read_frame_with_timeout, write_frame, MAX_FRAME_SIZE, MAX_RESPONSE_ENTRIES,
    MAX_RESPONSE_SIZE,
};
pub use messages::{LevelFilter, QueryFilter, QueryResponse, Request, ResponseStatus};
pub use types::{parse_timestamp, LogEntry, LogId, LogLevel, TIMESTAMP_FORMAT};
