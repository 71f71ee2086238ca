//! Implementations of the `loghub` subcommands.

use std::io::Write;
use std::time::Duration;

use chrono::{Local, NaiveDate};
use loghub_proto::QueryFilter;
use tracing::{info, warn};

use crate::cli::{LogArgs, QueryArgs, SimulateArgs};
use crate::error::{ClientError, ClientResult};
use crate::output::{EntryTable, OutputFormat, SentEntry};
use crate::producer::LogClient;
use crate::query::QueryClient;
use crate::simulate::{Simulator, SimulatorConfig};

/// Sends one entry and prints what was sent.
///
/// # Errors
///
/// Returns an error if the entry could not be delivered or printed.
pub async fn log<W: Write>(
    out: &mut W,
    format: &OutputFormat,
    addr: &str,
    args: &LogArgs,
) -> ClientResult<()> {
    let client = LogClient::discover(addr).await;
    let entry = client
        .try_log(args.log_level(), args.message.clone(), args.source.as_deref())
        .await?;

    format.write(
        out,
        &SentEntry {
            entry,
            server: addr.to_string(),
        },
    )
}

/// Builds the filter of a query command; missing dates mean `today`.
///
/// # Errors
///
/// Returns an error if the range ends before it starts.
pub fn query_filter(args: &QueryArgs, today: NaiveDate) -> ClientResult<QueryFilter> {
    let from = args.from.unwrap_or(today);
    let to = args.to.unwrap_or(today);
    if to < from {
        return Err(ClientError::InvalidArgument(format!(
            "--to ({to}) is before --from ({from})"
        )));
    }
    Ok(QueryFilter::new(from, to).with_level(args.level))
}

/// Runs a query once, or on a fixed cadence with `--watch`.
///
/// In watch mode a failed poll is reported and the next one still runs.
///
/// # Errors
///
/// Returns an error if a single query fails or output cannot be written.
pub async fn query<W: Write>(
    out: &mut W,
    format: &OutputFormat,
    addr: &str,
    args: &QueryArgs,
) -> ClientResult<()> {
    let client = QueryClient::new(addr);

    let Some(secs) = args.watch else {
        let filter = query_filter(args, Local::now().date_naive())?;
        let entries = client.query(&filter).await?;
        return format.write(out, &EntryTable { entries });
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
    loop {
        ticker.tick().await;
        // Re-evaluated every poll so a viewer left open past midnight follows.
        let filter = query_filter(args, Local::now().date_naive())?;
        match client.query(&filter).await {
            Ok(entries) => {
                if !format.is_json() {
                    writeln!(out, "Last sync: {}", Local::now().format("%H:%M:%S"))?;
                }
                format.write(out, &EntryTable { entries })?;
                out.flush()?;
            }
            Err(e) => warn!(addr, error = %e, "Server offline"),
        }
    }
}

/// Runs the device simulator and prints the totals.
pub async fn simulate<W: Write>(
    out: &mut W,
    format: &OutputFormat,
    addr: &str,
    args: &SimulateArgs,
) -> ClientResult<()> {
    let config = SimulatorConfig {
        devices: args.devices,
        messages_per_device: args.count,
        min_delay: Duration::from_millis(args.min_delay_ms),
        max_delay: Duration::from_millis(args.max_delay_ms),
    };
    if config.devices == 0 {
        return Err(ClientError::InvalidArgument("--devices must be at least 1".to_string()));
    }

    info!(addr, devices = config.devices, "Simulating devices");
    let report = Simulator::new(LogClient::discover(addr).await, config).run().await;
    format.write(out, &report)
}
