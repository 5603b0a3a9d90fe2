//! Fundingwatch CLI
//!
//! Command-line interface for inspecting and maintaining a Fundingwatch log
//! directory without a running server.
//!
//! # Usage
//!
//! ```bash
//! fundingwatch --help
//! fundingwatch files
//! fundingwatch show BTCUSDT --date 2024-01-15
//! fundingwatch history BTCUSDT --exchange binance
//! fundingwatch purge --older-than-days 30 --dry-run
//! ```

#![deny(unsafe_code)]

use anyhow::Context;
use chrono::{DateTime, Days, Utc};
use clap::{Parser, Subcommand};
use shared::clock::{Clock, SystemClock};
use shared::storage::{LogFormat, TimeSeriesLog};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

/// Fundingwatch CLI - funding rate log inspection
#[derive(Parser)]
#[command(name = "fundingwatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Root directory of the funding rate log
    #[arg(long, env = "FUNDINGWATCH_LOG_DIR", default_value = "funding_logs")]
    log_dir: PathBuf,

    /// Day-file encoding (text or jsonl)
    #[arg(long, env = "FUNDINGWATCH_LOG_FORMAT", default_value = "text")]
    format: LogFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every day-file
    Files,
    /// Print one day-file as written
    Show {
        /// Instrument, e.g. BTCUSDT
        symbol: String,
        /// Day as YYYY-MM-DD or DD-MM-YYYY (default: today, UTC)
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Reconstruct one exchange's funding rate history for an instrument
    History {
        /// Instrument, e.g. BTCUSDT
        symbol: String,
        /// Exchange name
        #[arg(short, long)]
        exchange: String,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete day-files older than a number of days
    Purge {
        /// Keep this many most recent days
        #[arg(long)]
        older_than_days: u64,
        /// Only list what would be deleted
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    run(cli, Arc::new(SystemClock), &mut stdout.lock())
}

fn run(cli: Cli, clock: Arc<dyn Clock>, out: &mut impl Write) -> anyhow::Result<()> {
    let now = clock.now();
    let log = TimeSeriesLog::new(&cli.log_dir, clock, cli.format.codec());

    match cli.command {
        Some(Commands::Files) => list_files(&log, out),
        Some(Commands::Show { symbol, date }) => {
            let day = date.unwrap_or_else(|| log.today());
            let raw = log
                .read_raw(&symbol, &day)
                .with_context(|| format!("Cannot show {symbol}"))?;
            out.write_all(&raw)?;
            Ok(())
        }
        Some(Commands::History {
            symbol,
            exchange,
            json,
        }) => print_history(&log, &symbol, &exchange, json, out),
        Some(Commands::Purge {
            older_than_days,
            dry_run,
        }) => purge(&log, now, older_than_days, dry_run, out),
        None => {
            writeln!(out, "Fundingwatch CLI v{}", env!("CARGO_PKG_VERSION"))?;
            writeln!(out, "Use --help for usage information")?;
            Ok(())
        }
    }
}

fn list_files(log: &TimeSeriesLog, out: &mut impl Write) -> anyhow::Result<()> {
    let files = log.enumerate()?;
    if files.is_empty() {
        writeln!(out, "No log files in {}", log.root().display())?;
        return Ok(());
    }

    writeln!(out, "{:<20} {:<12} {:>10}  MODIFIED", "SYMBOL", "DATE", "SIZE")?;
    for file in &files {
        writeln!(
            out,
            "{:<20} {:<12} {:>10}  {}",
            file.instrument,
            file.day,
            file.size,
            file.modified.format("%Y-%m-%d %H:%M:%S")
        )?;
    }
    writeln!(out, "{} file(s)", files.len())?;
    Ok(())
}

fn print_history(
    log: &TimeSeriesLog,
    symbol: &str,
    exchange: &str,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut points = log.reconstruct_history(symbol, exchange)?;
    points.sort_by_key(|p| p.timestamp);

    if json {
        serde_json::to_writer_pretty(&mut *out, &points)?;
        writeln!(out)?;
        return Ok(());
    }

    for point in &points {
        let at = DateTime::from_timestamp(point.timestamp, 0).unwrap_or_default();
        writeln!(
            out,
            "{}  {:>12.6}",
            at.format("%Y-%m-%d %H:%M:%S"),
            point.funding_rate
        )?;
    }
    writeln!(out, "{} point(s) for {symbol} on {exchange}", points.len())?;
    Ok(())
}

fn purge(
    log: &TimeSeriesLog,
    now: DateTime<Utc>,
    older_than_days: u64,
    dry_run: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let cutoff = now
        .date_naive()
        .checked_sub_days(Days::new(older_than_days))
        .context("Cutoff date out of range")?;

    let files = log.purge_before(cutoff, dry_run)?;
    let verb = if dry_run { "Would delete" } else { "Deleted" };
    for file in &files {
        writeln!(out, "{verb} {}", file.path)?;
    }
    writeln!(out, "{verb} {} file(s) older than {cutoff}", files.len())?;
    Ok(())
}
