//! Command-line argument parsing with clap.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use loghub_proto::{LevelFilter, LogLevel};

use crate::transport::DEFAULT_SERVER_ADDR;

/// loghub - send log entries to and read them from a loghub service.
#[derive(Parser, Debug, Clone)]
#[command(name = "loghub")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Service address (host:port).
    #[arg(short, long, global = true, env = "LOGHUB_ADDR", default_value = DEFAULT_SERVER_ADDR)]
    pub addr: String,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Send one log entry.
    Log(LogArgs),

    /// Show stored entries.
    Query(QueryArgs),

    /// Simulate many devices sending entries.
    Simulate(SimulateArgs),
}

/// Arguments for the log command.
#[derive(Args, Debug, Clone)]
pub struct LogArgs {
    /// Severity level (INFO, WARNING, ERROR, CRITICAL or any other label).
    pub level: String,

    /// The message.
    pub message: String,

    /// Source label; defaults to "<hostname> (<ip>)".
    #[arg(short, long)]
    pub source: Option<String>,
}

impl LogArgs {
    /// The level as it will be sent.
    #[must_use]
    pub fn log_level(&self) -> LogLevel {
        LogLevel::parse(&self.level)
    }
}

/// Level choices of the query command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum LevelArg {
    /// Every level.
    #[default]
    All,
    /// INFO only.
    Info,
    /// WARNING only.
    Warning,
    /// ERROR only.
    Error,
    /// CRITICAL only.
    Critical,
}

impl From<LevelArg> for LevelFilter {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::All => Self::All,
            LevelArg::Info => Self::Only(LogLevel::Info),
            LevelArg::Warning => Self::Only(LogLevel::Warning),
            LevelArg::Error => Self::Only(LogLevel::Error),
            LevelArg::Critical => Self::Only(LogLevel::Critical),
        }
    }
}

/// Arguments for the query command.
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// Level to show.
    #[arg(short, long, value_enum, ignore_case = true, default_value_t = LevelArg::All)]
    pub level: LevelArg,

    /// First day to include (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD); defaults to today.
    #[arg(long)]
    pub to: Option<NaiveDate>,

    /// Re-run the query every SECS seconds until interrupted.
    #[arg(short, long, value_name = "SECS")]
    pub watch: Option<u64>,
}

/// Arguments for the simulate command.
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Number of simulated devices.
    #[arg(short, long, default_value_t = 5)]
    pub devices: usize,

    /// Messages per device; runs until interrupted when omitted.
    #[arg(short, long)]
    pub count: Option<u64>,

    /// Shortest pause between messages of one device, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    pub min_delay_ms: u64,

    /// Longest pause between messages of one device, in milliseconds.
    #[arg(long, default_value_t = 5000)]
    pub max_delay_ms: u64,
}
