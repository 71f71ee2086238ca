//! Per-connection request handling.
//!
//! A connection carries exactly one request. The handler reads it to
//! end-of-stream, decodes it, and dispatches on its action:
//!
//! - `SUBMIT`: one insert attempt, no response either way
//! - `QUERY`: one read attempt, one response; a store failure is answered
//!   with an empty `ERROR` response instead of an error on the wire

use std::time::Duration;

use loghub_proto::{
    read_frame_with_timeout, write_frame, LogId, QueryFilter, QueryResponse, Request,
    ResponseStatus,
};
use loghub_store::LogStore;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{trace, warn};

use crate::config::ServerConfig;
use crate::error::{HandlerError, HandlerResult};

/// Lifecycle of one accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Waiting for the full request.
    Reading,
    /// Request decoded, talking to the store.
    Dispatching,
    /// Sending the response.
    Writing,
    /// Nothing to send; about to close.
    Closing,
    /// Connection closed.
    Closed,
}

/// Per-connection limits taken from [`ServerConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerLimits {
    /// Largest accepted request in bytes.
    pub max_frame_size: usize,
    /// Time allowed for the whole request to arrive.
    pub read_timeout: Duration,
    /// Time allowed for the client to take the whole response.
    pub write_timeout: Duration,
}

impl From<&ServerConfig> for HandlerLimits {
    fn from(config: &ServerConfig) -> Self {
        Self {
            max_frame_size: config.max_frame_size,
            read_timeout: config.read_timeout(),
            write_timeout: config.write_timeout(),
        }
    }
}

/// What a dispatched request produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// A `SUBMIT` was stored; nothing is sent back.
    Silent(LogId),
    /// A `QUERY` answer to write back.
    Respond(QueryResponse),
}

/// How a connection that completed its exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The submitted entry was stored under this id.
    Submitted(LogId),
    /// A query response was written.
    Answered {
        /// Status sent to the client.
        status: ResponseStatus,
        /// Number of entries sent.
        entries: usize,
    },
}

/// Executes one decoded request against the store.
///
/// # Errors
///
/// Returns an error only when a `SUBMIT` insert fails.
pub async fn dispatch(store: &dyn LogStore, request: Request) -> HandlerResult<Reply> {
    match request {
        Request::Submit { entry } => {
            let id = store.insert(&entry).await?;
            Ok(Reply::Silent(id))
        }
        Request::Query { filter } => Ok(Reply::Respond(run_query(store, &filter).await)),
    }
}

async fn run_query(store: &dyn LogStore, filter: &QueryFilter) -> QueryResponse {
    match store.query(filter).await {
        Ok(entries) => QueryResponse::ok(entries),
        Err(e) => {
            warn!(error = %e, level = %filter.level, from = %filter.from, to = %filter.to, "Query failed");
            QueryResponse::failed()
        }
    }
}

/// Serves one connection: read, decode, dispatch, and answer if needed.
///
/// The caller closes the stream afterwards, whatever the result.
///
/// # Errors
///
/// Returns an error if the request times out, is too large or malformed,
/// the insert of a `SUBMIT` fails, or the connection breaks.
pub async fn handle_connection<S>(
    stream: &mut S,
    store: &dyn LogStore,
    limits: HandlerLimits,
) -> HandlerResult<Outcome>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    trace!(state = ?ConnectionState::Reading);
    let frame = read_frame_with_timeout(stream, limits.max_frame_size, limits.read_timeout).await?;
    let request = Request::from_bytes(&frame)?;

    trace!(state = ?ConnectionState::Dispatching, action = request.action());
    match dispatch(store, request).await? {
        Reply::Silent(id) => {
            trace!(state = ?ConnectionState::Closing);
            Ok(Outcome::Submitted(id))
        }
        Reply::Respond(response) => {
            trace!(state = ?ConnectionState::Writing, entries = response.entries.len());
            let body = response.to_bytes()?;
            tokio::time::timeout(limits.write_timeout, write_frame(stream, &body))
                .await
                .map_err(|_| HandlerError::Timeout(limits.write_timeout))??;
            Ok(Outcome::Answered {
                status: response.status,
                entries: response.entries.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use loghub_proto::{read_frame, LogEntry, LogLevel, MAX_FRAME_SIZE};
    use loghub_store::{MemoryLogStore, StoreError, StoreResult};
    use tokio::io::{duplex, AsyncWriteExt, DuplexStream};

    // ==================== Helper Functions ====================

    /// Store whose every call fails.
    struct BrokenStore;

    #[async_trait]
    impl LogStore for BrokenStore {
        async fn insert(&self, _entry: &LogEntry) -> StoreResult<LogId> {
            Err(StoreError::Unavailable("disk unplugged".to_string()))
        }

        async fn query(&self, _filter: &QueryFilter) -> StoreResult<Vec<LogEntry>> {
            Err(StoreError::Unavailable("disk unplugged".to_string()))
        }
    }

    fn limits() -> HandlerLimits {
        HandlerLimits {
            max_frame_size: MAX_FRAME_SIZE,
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }

    fn today_entry(level: &str, message: &str) -> LogEntry {
        LogEntry::new(level, message, "(192.168.1.12)")
    }

    /// Sends `payload` as a client would and returns the server-side result
    /// together with whatever the server wrote back.
    async fn exchange(store: &dyn LogStore, payload: &[u8]) -> (HandlerResult<Outcome>, Vec<u8>) {
        let (mut client, mut server): (DuplexStream, DuplexStream) = duplex(256);

        let payload = payload.to_vec();
        let client_task = tokio::spawn(async move {
            client.write_all(&payload).await.expect("write request");
            client.shutdown().await.expect("half-close");
            read_frame(&mut client, MAX_FRAME_SIZE).await.unwrap_or_default()
        });

        let result = handle_connection(&mut server, store, limits()).await;
        drop(server);
        let response = client_task.await.expect("client task");
        (result, response)
    }

    // ==================== Dispatch Tests ====================

    #[tokio::test]
    async fn dispatch_submit_is_silent() {
        let store = MemoryLogStore::new();
        let reply = dispatch(&store, Request::submit(today_entry("info", "hello")))
            .await
            .expect("dispatch");

        assert_eq!(reply, Reply::Silent(LogId(1)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn dispatch_query_failure_degrades_to_error_status() {
        let filter = QueryFilter::on(NaiveDate::from_ymd_opt(2024, 3, 1).expect("date"));
        let reply = dispatch(&BrokenStore, Request::query(filter)).await.expect("dispatch");

        assert_eq!(reply, Reply::Respond(QueryResponse::failed()));
    }

    #[tokio::test]
    async fn dispatch_submit_failure_is_error() {
        let result = dispatch(&BrokenStore, Request::submit(today_entry("error", "lost"))).await;
        assert!(matches!(result, Err(HandlerError::Store(_))));
    }

    // ==================== Connection Tests ====================

    #[tokio::test]
    async fn submit_stores_and_sends_nothing() {
        let store = MemoryLogStore::new();
        let entry = today_entry("error", "disk full");
        let payload = Request::submit(entry.clone()).to_bytes().expect("encode");

        let (result, response) = exchange(&store, &payload).await;

        assert!(matches!(result, Ok(Outcome::Submitted(LogId(1)))));
        assert!(response.is_empty());
        assert_eq!(store.entries(), vec![entry.with_id(LogId(1))]);
    }

    #[tokio::test]
    async fn query_round_trip() {
        let store = MemoryLogStore::new();
        let entry = today_entry("warning", "CPU fan speed high");
        store.insert(&entry).await.expect("insert");

        let request = Request::query(QueryFilter::on(entry.date()).with_level(LogLevel::Warning));
        let (result, response) = exchange(&store, &request.to_bytes().expect("encode")).await;

        assert!(matches!(
            result,
            Ok(Outcome::Answered { status: ResponseStatus::Ok, entries: 1 })
        ));
        let response = QueryResponse::from_bytes(&response).expect("decode response");
        assert_eq!(response.entries.len(), 1);
        assert_eq!(response.entries[0].message, "CPU fan speed high");
        assert_eq!(response.entries[0].id, Some(LogId(1)));
    }

    #[tokio::test]
    async fn query_on_empty_store() {
        let store = MemoryLogStore::new();
        let request = Request::query(QueryFilter::on(today_entry("info", "x").date()));

        let (_, response) = exchange(&store, &request.to_bytes().expect("encode")).await;
        let value: serde_json::Value = serde_json::from_slice(&response).expect("json");
        assert_eq!(value, serde_json::json!({ "status": "OK", "entries": [] }));
    }

    #[tokio::test]
    async fn submit_missing_field_stores_nothing() {
        let store = MemoryLogStore::new();
        let payload = br#"{"action":"SUBMIT","entry":{"level":"INFO","message":"no source","timestamp":"2024-03-01 10:00:00"}}"#;

        let (result, response) = exchange(&store, payload).await;

        assert!(matches!(result, Err(HandlerError::Decode(_))));
        assert!(response.is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unknown_action_is_dropped() {
        let store = MemoryLogStore::new();
        let (result, response) = exchange(&store, br#"{"action":"PURGE"}"#).await;

        assert!(matches!(result, Err(HandlerError::Decode(_))));
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn empty_request_is_dropped() {
        let store = MemoryLogStore::new();
        let (result, response) = exchange(&store, b"").await;

        assert!(matches!(result, Err(HandlerError::Decode(_))));
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn store_failure_on_submit_sends_nothing() {
        let payload = Request::submit(today_entry("critical", "Service failure!"))
            .to_bytes()
            .expect("encode");

        let (result, response) = exchange(&BrokenStore, &payload).await;

        assert!(matches!(result, Err(HandlerError::Store(_))));
        assert!(response.is_empty());
    }

    #[tokio::test]
    async fn store_failure_on_query_answers_empty() {
        let request = Request::query(QueryFilter::on(today_entry("info", "x").date()));
        let (result, response) = exchange(&BrokenStore, &request.to_bytes().expect("encode")).await;

        assert!(matches!(
            result,
            Ok(Outcome::Answered { status: ResponseStatus::Error, entries: 0 })
        ));
        let response = QueryResponse::from_bytes(&response).expect("decode response");
        assert!(response.entries.is_empty());
    }

    #[tokio::test]
    async fn oversized_request_is_dropped() {
        let store = MemoryLogStore::new();
        let (mut client, mut server) = duplex(64);
        tokio::spawn(async move {
            let _ = client.write_all(&[b' '; 200]).await;
            let _ = client.shutdown().await;
        });

        let tight = HandlerLimits {
            max_frame_size: 100,
            ..limits()
        };
        let result = handle_connection(&mut server, &store, tight).await;
        assert!(matches!(result, Err(HandlerError::FrameTooLarge(100))));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_client_times_out() {
        let store = MemoryLogStore::new();
        let (_client, mut server) = duplex(64);

        let result = handle_connection(&mut server, &store, limits()).await;
        assert!(matches!(result, Err(HandlerError::Timeout(_))));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn client_that_never_reads_times_out() {
        let store = MemoryLogStore::new();
        for _ in 0..4 {
            store
                .insert(&today_entry("INFO", &"x".repeat(1000)))
                .await
                .expect("insert");
        }

        let (mut client, mut server) = duplex(256);
        let request = Request::query(QueryFilter::on(chrono::Local::now().date_naive()))
            .to_bytes()
            .expect("encode");
        client.write_all(&request).await.expect("write request");
        client.shutdown().await.expect("half-close");

        let slow = HandlerLimits {
            write_timeout: Duration::from_millis(750),
            ..limits()
        };
        let result = handle_connection(&mut server, &store, slow).await;
        assert!(matches!(result, Err(HandlerError::Timeout(d)) if d == Duration::from_millis(750)));
        drop(client);
    }

    #[test]
    fn limits_from_config() {
        let config = ServerConfig::default()
            .with_max_frame_size(2048)
            .with_read_timeout(Duration::from_millis(1500))
            .with_write_timeout(Duration::from_millis(2500));
        let limits = HandlerLimits::from(&config);

        assert_eq!(limits.max_frame_size, 2048);
        assert_eq!(limits.read_timeout, Duration::from_millis(1500));
        assert_eq!(limits.write_timeout, Duration::from_millis(2500));
    }
}
