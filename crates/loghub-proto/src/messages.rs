//! Request and response documents exchanged with the log service.
//!
//! Every exchange uses its own connection: one request, at most one response.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{ProtoError, Result};
use crate::types::{LogEntry, LogLevel};

/// Requests sent to the log service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "UPPERCASE")]
pub enum Request {
    /// Store one entry. Fire-and-forget: the service never answers.
    Submit {
        /// The entry to persist.
        entry: LogEntry,
    },
    /// Fetch the most recent entries matching a filter.
    Query {
        /// Level and date range to match.
        filter: QueryFilter,
    },
}

impl Request {
    /// Creates a `SUBMIT` request.
    #[must_use]
    pub const fn submit(entry: LogEntry) -> Self {
        Self::Submit { entry }
    }

    /// Creates a `QUERY` request.
    #[must_use]
    pub const fn query(filter: QueryFilter) -> Self {
        Self::Query { filter }
    }

    /// Returns the wire name of the action.
    #[must_use]
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Submit { .. } => "SUBMIT",
            Self::Query { .. } => "QUERY",
        }
    }

    /// Encodes the request as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Decodes a request. Unknown or missing actions and missing fields are
    /// decode errors.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid request document.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}

/// Level selector of a query: every level, or exactly one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LevelFilter {
    /// No level filtering (`ALL` on the wire).
    #[default]
    All,
    /// Only entries with exactly this level.
    Only(LogLevel),
}

impl LevelFilter {
    /// Returns true if an entry with `level` passes this filter.
    #[must_use]
    pub fn accepts(&self, level: &LogLevel) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == level,
        }
    }

    /// Returns the level to match, or `None` for `ALL`.
    #[must_use]
    pub const fn level(&self) -> Option<&LogLevel> {
        match self {
            Self::All => None,
            Self::Only(level) => Some(level),
        }
    }
}

impl From<&str> for LevelFilter {
    fn from(name: &str) -> Self {
        if name.eq_ignore_ascii_case("ALL") {
            Self::All
        } else {
            Self::Only(LogLevel::parse(name))
        }
    }
}

impl From<String> for LevelFilter {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        Self::Only(level)
    }
}

impl From<LevelFilter> for String {
    fn from(filter: LevelFilter) -> Self {
        match filter {
            LevelFilter::All => "ALL".to_string(),
            LevelFilter::Only(level) => level.into(),
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("ALL"),
            Self::Only(level) => level.fmt(f),
        }
    }
}

/// Filter of a `QUERY`: an inclusive date range plus an optional level.
///
/// Dates are compared against the date part of the entry timestamp; the time
/// of day plays no role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilter {
    /// Level selector, `ALL` when omitted.
    #[serde(default)]
    pub level: LevelFilter,
    /// First day included.
    pub from: NaiveDate,
    /// Last day included.
    pub to: NaiveDate,
}

impl QueryFilter {
    /// Creates a filter over `from..=to` for every level.
    #[must_use]
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            level: LevelFilter::All,
            from,
            to,
        }
    }

    /// Creates a filter covering a single day.
    #[must_use]
    pub fn on(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    /// Restricts the filter to one level (or `ALL`).
    #[must_use]
    pub fn with_level(mut self, level: impl Into<LevelFilter>) -> Self {
        self.level = level.into();
        self
    }

    /// Checks if an entry matches this filter.
    #[must_use]
    pub fn matches(&self, entry: &LogEntry) -> bool {
        let day = entry.date();
        self.level.accepts(&entry.level) && self.from <= day && day <= self.to
    }
}

/// Outcome marker of a query response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseStatus {
    /// The store answered; `entries` holds the result (possibly empty).
    Ok,
    /// The store failed; `entries` is empty.
    Error,
}

/// Answer to a `QUERY`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Whether the store answered.
    pub status: ResponseStatus,
    /// Matching entries, newest id first.
    #[serde(default)]
    pub entries: Vec<LogEntry>,
}

impl QueryResponse {
    /// A successful response.
    #[must_use]
    pub const fn ok(entries: Vec<LogEntry>) -> Self {
        Self {
            status: ResponseStatus::Ok,
            entries,
        }
    }

    /// A response reporting a store failure.
    #[must_use]
    pub const fn failed() -> Self {
        Self {
            status: ResponseStatus::Error,
            entries: Vec::new(),
        }
    }

    /// Encodes the response as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| ProtoError::Encoding(e.to_string()))
    }

    /// Decodes a response document.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not a valid response.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| ProtoError::Decoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{parse_timestamp, LogId};
    use test_case::test_case;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn entry_at(level: &str, raw: &str) -> LogEntry {
        LogEntry::new(level, "msg", "src").with_timestamp(parse_timestamp(raw).expect("timestamp"))
    }

    // ==================== Request Decoding Tests ====================

    #[test]
    fn decode_submit() {
        let raw = br#"{
            "action": "SUBMIT",
            "entry": {
                "level": "error",
                "message": "disk full",
                "source": "(192.168.1.12)",
                "timestamp": "2024-03-01 10:15:30"
            }
        }"#;

        let request = Request::from_bytes(raw).expect("decode");
        let Request::Submit { entry } = request else {
            panic!("expected submit");
        };
        assert_eq!(entry.level, LogLevel::Error);
        assert_eq!(entry.message, "disk full");
        assert_eq!(entry.id, None);
    }

    #[test]
    fn decode_query_defaults_level_to_all() {
        let raw = br#"{"action":"QUERY","filter":{"from":"2024-03-01","to":"2024-03-02"}}"#;

        let request = Request::from_bytes(raw).expect("decode");
        assert_eq!(
            request,
            Request::query(QueryFilter::new(day(2024, 3, 1), day(2024, 3, 2)))
        );
    }

    #[test_case(br#"{"entry":{}}"# ; "missing action")]
    #[test_case(br#"{"action":"DELETE"}"# ; "unknown action")]
    #[test_case(br#"{"action":"submit","entry":{}}"# ; "action is case sensitive")]
    #[test_case(br#"{"action":"SUBMIT"}"# ; "submit without entry")]
    #[test_case(br#"{"action":"SUBMIT","entry":{"level":"INFO","message":"m","timestamp":"2024-03-01 10:00:00"}}"# ; "entry without source")]
    #[test_case(br#"{"action":"QUERY","filter":{"level":"ALL","from":"2024-03-01"}}"# ; "filter without to")]
    #[test_case(br#"{"action":"QUERY"}"# ; "query without filter")]
    #[test_case(br#"{"action":"QUERY","filter":{"from":"03/01/2024","to":"2024-03-01"}}"# ; "bad date")]
    #[test_case(br#"{"action":"SUBMIT","entry":"#                ; "truncated")]
    #[test_case(b"\xff\xfe"                                      ; "not utf8")]
    fn decode_rejects(raw: &[u8]) {
        let err = Request::from_bytes(raw).expect_err("must not decode");
        assert!(err.is_malformed());
    }

    #[test]
    fn encode_uses_exact_field_names() {
        let request = Request::query(
            QueryFilter::on(day(2024, 3, 1)).with_level(LogLevel::Warning),
        );
        let value: serde_json::Value =
            serde_json::from_slice(&request.to_bytes().expect("encode")).expect("json");

        assert_eq!(
            value,
            serde_json::json!({
                "action": "QUERY",
                "filter": { "level": "WARNING", "from": "2024-03-01", "to": "2024-03-01" }
            })
        );
    }

    #[test]
    fn request_action_names() {
        let entry = LogEntry::new("info", "m", "s");
        assert_eq!(Request::submit(entry).action(), "SUBMIT");
        assert_eq!(Request::query(QueryFilter::on(day(2024, 1, 1))).action(), "QUERY");
    }

    // ==================== LevelFilter Tests ====================

    #[test_case("ALL", LevelFilter::All ; "all")]
    #[test_case("all", LevelFilter::All ; "all lowercase")]
    #[test_case("info", LevelFilter::Only(LogLevel::Info) ; "info")]
    #[test_case("CRITICAL", LevelFilter::Only(LogLevel::Critical) ; "critical")]
    fn level_filter_from_name(name: &str, expected: LevelFilter) {
        assert_eq!(LevelFilter::from(name), expected);
    }

    #[test]
    fn level_filter_accepts() {
        assert!(LevelFilter::All.accepts(&LogLevel::Critical));
        assert!(LevelFilter::Only(LogLevel::Info).accepts(&LogLevel::Info));
        assert!(!LevelFilter::Only(LogLevel::Info).accepts(&LogLevel::Error));
    }

    // ==================== QueryFilter Tests ====================

    #[test]
    fn filter_range_is_inclusive_on_dates() {
        let filter = QueryFilter::new(day(2024, 3, 1), day(2024, 3, 2));

        assert!(filter.matches(&entry_at("INFO", "2024-03-01 00:00:00")));
        assert!(filter.matches(&entry_at("INFO", "2024-03-02 23:59:59")));
        assert!(!filter.matches(&entry_at("INFO", "2024-02-29 23:59:59")));
        assert!(!filter.matches(&entry_at("INFO", "2024-03-03 00:00:00")));
    }

    #[test]
    fn filter_by_level() {
        let filter = QueryFilter::on(day(2024, 3, 1)).with_level("error");

        assert!(filter.matches(&entry_at("ERROR", "2024-03-01 12:00:00")));
        assert!(!filter.matches(&entry_at("CRITICAL", "2024-03-01 12:00:00")));
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let filter = QueryFilter::new(day(2024, 3, 2), day(2024, 3, 1));
        assert!(!filter.matches(&entry_at("INFO", "2024-03-01 12:00:00")));
        assert!(!filter.matches(&entry_at("INFO", "2024-03-02 12:00:00")));
    }

    // ==================== QueryResponse Tests ====================

    #[test]
    fn empty_ok_response_layout() {
        let bytes = QueryResponse::ok(Vec::new()).to_bytes().expect("encode");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(value, serde_json::json!({ "status": "OK", "entries": [] }));
    }

    #[test]
    fn failed_response_layout() {
        let bytes = QueryResponse::failed().to_bytes().expect("encode");
        let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(value, serde_json::json!({ "status": "ERROR", "entries": [] }));
    }

    #[test]
    fn response_entries_carry_ids() {
        let entry = entry_at("INFO", "2024-03-01 10:00:00").with_id(LogId(41));
        let bytes = QueryResponse::ok(vec![entry.clone()]).to_bytes().expect("encode");

        let decoded = QueryResponse::from_bytes(&bytes).expect("decode");
        assert_eq!(decoded.status, ResponseStatus::Ok);
        assert_eq!(decoded.entries, vec![entry]);
        assert_eq!(decoded.entries[0].id, Some(LogId(41)));
    }
}
