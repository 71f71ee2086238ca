//! Core types for log records.
//!
//! This module provides:
//! - [`LogLevel`] — Severity levels, normalized to uppercase
//! - [`LogEntry`] — One log record as produced, transmitted and stored
//! - [`LogId`] — Identifier assigned by the store on insert

use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Wire and storage format of [`LogEntry::timestamp`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Identifier assigned to a log entry by the persistence layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogId(pub i64);

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Log severity.
///
/// Producers are heterogeneous, so unrecognized level names are kept as
/// [`LogLevel::Other`] instead of being rejected. Every level is uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LogLevel {
    /// General information
    Info,
    /// Something unexpected that did not stop the producer
    Warning,
    /// An operation failed
    Error,
    /// The producer is in serious trouble
    Critical,
    /// Any other level name, uppercased
    Other(String),
}

impl LogLevel {
    /// The four levels every viewer knows how to filter by.
    pub const KNOWN: [Self; 4] = [Self::Info, Self::Warning, Self::Error, Self::Critical];

    /// Parses a level name, ignoring case.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        let upper = name.to_uppercase();
        match upper.as_str() {
            "INFO" => Self::Info,
            "WARNING" => Self::Warning,
            "ERROR" => Self::Error,
            "CRITICAL" => Self::Critical,
            _ => Self::Other(upper),
        }
    }

    /// Returns the uppercase name of this level.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Other(name) => name,
        }
    }

    /// Returns true for the four well-known levels.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<&str> for LogLevel {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for LogLevel {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log record.
///
/// `id` is only present on entries read back from a store; entries in flight
/// from a producer carry none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Identifier assigned by the store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LogId>,
    /// When the producer created the entry, second resolution
    #[serde(with = "timestamp_format")]
    pub timestamp: NaiveDateTime,
    /// Severity level
    pub level: LogLevel,
    /// The log message
    pub message: String,
    /// Producer identifier (hostname/address or a device label)
    pub source: String,
}

impl LogEntry {
    /// Creates an entry stamped with the current local time.
    #[must_use]
    pub fn new(
        level: impl Into<LogLevel>,
        message: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            timestamp: truncate_to_seconds(Local::now().naive_local()),
            level: level.into(),
            message: message.into(),
            source: source.into(),
        }
    }

    /// Replaces the timestamp, dropping sub-second precision.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: NaiveDateTime) -> Self {
        self.timestamp = truncate_to_seconds(timestamp);
        self
    }

    /// Attaches a store-assigned identifier.
    #[must_use]
    pub const fn with_id(mut self, id: LogId) -> Self {
        self.id = Some(id);
        self
    }

    /// Calendar date of the timestamp, used for range filtering.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

/// Parses a timestamp in [`TIMESTAMP_FORMAT`], also accepting the ISO `T`
/// separator and fractional seconds (which are dropped).
///
/// # Errors
///
/// Returns an error if `raw` matches neither layout.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .map(truncate_to_seconds)
}

fn truncate_to_seconds(ts: NaiveDateTime) -> NaiveDateTime {
    ts.with_nanosecond(0).unwrap_or(ts)
}

mod timestamp_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&ts.format(super::TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}
