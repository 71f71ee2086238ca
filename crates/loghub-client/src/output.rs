//! Output formatting for the `loghub` tool.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use loghub_proto::{LogEntry, TIMESTAMP_FORMAT};
use serde::Serialize;

use crate::cli::Format;
use crate::error::ClientError;
use crate::simulate::SimulationReport;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), ClientError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| ClientError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), ClientError>;
}

/// Entries returned by a query, newest first.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct EntryTable {
    /// The entries.
    pub entries: Vec<LogEntry>,
}

impl TableDisplay for EntryTable {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), ClientError> {
        if self.entries.is_empty() {
            writeln!(writer, "No log entries")?;
            return Ok(());
        }

        writeln!(
            writer,
            "{:>6}  {:<19}  {:<8}  {:<48}  {:<24}",
            "ID", "DATE & TIME", "LEVEL", "MESSAGE", "SOURCE"
        )?;
        writeln!(writer, "{}", "─".repeat(113))?;

        for entry in &self.entries {
            let id = entry.id.map_or_else(|| "-".to_string(), |id| id.to_string());
            writeln!(
                writer,
                "{:>6}  {:<19}  {:<8}  {:<48}  {:<24}",
                id,
                entry.timestamp.format(TIMESTAMP_FORMAT),
                truncate(entry.level.as_str(), 8),
                truncate(&entry.message, 48),
                truncate(&entry.source, 24),
            )?;
        }

        writeln!(writer)?;
        writeln!(writer, "Entries: {}", self.entries.len())?;
        Ok(())
    }
}

/// An entry that was handed to the service.
#[derive(Debug, Clone, Serialize)]
pub struct SentEntry {
    /// The entry as sent.
    pub entry: LogEntry,
    /// Service address.
    pub server: String,
}

impl TableDisplay for SentEntry {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), ClientError> {
        writeln!(
            writer,
            "Sent {} entry to {} at {} from {}",
            self.entry.level,
            self.server,
            self.entry.timestamp.format(TIMESTAMP_FORMAT),
            self.entry.source
        )?;
        Ok(())
    }
}

impl TableDisplay for SimulationReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), ClientError> {
        writeln!(writer, "Simulation finished: {} sent, {} failed", self.sent, self.failed)?;
        Ok(())
    }
}

/// Shortens `s` to at most `max_len` characters, marking the cut with `...`.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len > 3 {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    } else {
        s.chars().take(max_len).collect()
    }
}
