//! loghub command-line tool.
//!
//! Sends entries to, queries, and load-tests a loghub service.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use loghub_client::cli::{Cli, Commands};
use loghub_client::commands;
use loghub_client::output::OutputFormat;

fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), loghub_client::ClientError> {
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout();

    let work = async {
        match &cli.command {
            Commands::Log(args) => commands::log(&mut stdout, &format, &cli.addr, args).await,
            Commands::Query(args) => commands::query(&mut stdout, &format, &cli.addr, args).await,
            Commands::Simulate(args) => commands::simulate(&mut stdout, &format, &cli.addr, args).await,
        }
    };

    tokio::select! {
        result = work => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    }
}
