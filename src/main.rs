mod config;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::FixedOffset;
use clap::Parser;
use futures::StreamExt;
use tracing::{debug, warn};

use journalscope_gateway::{DEFAULT_GATEWAY_URL, EntriesRange, EntriesRequest, GatewayClient};
use journalscope_logs::{LineFormatter, LogFormatter};
use journalscope_types::{FIELD_SYSLOG_IDENTIFIER, FIELD_SYSTEMD_UNIT};

use config::Config;

/// Journalscope - Read systemd journal entries from journal-gatewayd
#[derive(Parser, Debug)]
#[command(name = "journalscope")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Gateway URL [default: http://localhost:19531]
    #[arg(long)]
    url: Option<String>,

    /// TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of most recent entries to fetch
    #[arg(short = 'n', long, default_value = "100")]
    lines: u64,

    /// Read entries after this cursor instead of the most recent ones
    #[arg(long)]
    cursor: Option<String>,

    /// Keep streaming new entries
    #[arg(short, long)]
    follow: bool,

    /// Only show entries from the current boot
    #[arg(short, long)]
    boot: bool,

    /// Only show entries for this systemd unit
    #[arg(short, long)]
    unit: Option<String>,

    /// Only show entries with this syslog identifier
    #[arg(short = 't', long)]
    identifier: Option<String>,

    /// Prefix lines with timestamp, host, identifier and pid
    #[arg(short, long)]
    verbose: bool,

    /// Render timestamps in this offset (e.g. +02:00) instead of UTC
    #[arg(long, value_name = "OFFSET", allow_hyphen_values = true)]
    utc_offset: Option<String>,

    /// Stop after printing this many lines
    #[arg(long)]
    max: Option<usize>,

    /// Request timeout in seconds (ignored with --follow)
    #[arg(long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = run(args).await;

    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

async fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let formatter = build_formatter(&args, &config)?;
    let request = build_request(&args, config.timeout_secs);
    let url = args
        .url
        .clone()
        .or(config.gateway_url)
        .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string());

    let client = GatewayClient::new(url)?;
    let mut reader = client.logs(&request, formatter).await?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut printed = 0usize;

    loop {
        if args.max.is_some_and(|max| printed >= max) {
            // Dropping the reader closes the connection
            debug!(printed, "line limit reached");
            break;
        }

        match reader.next().await {
            Some(Ok(line)) => {
                writeln!(out, "{}", line)?;
                printed += 1;
            }
            Some(Err(err)) => {
                if let Some(cursor) = reader.last_cursor() {
                    warn!(cursor, "journal stream interrupted, resume with --cursor");
                }
                return Err(err).context("Failed to read journal entries");
            }
            None => break,
        }
    }

    out.flush()?;
    Ok(())
}

fn build_formatter(args: &Args, config: &Config) -> Result<LineFormatter> {
    let mode = if args.verbose {
        LogFormatter::Verbose
    } else {
        config.format.unwrap_or_default()
    };

    let mut formatter = LineFormatter::new(mode);
    if let Some(offset) = args.utc_offset.as_deref().or(config.utc_offset.as_deref()) {
        let offset: FixedOffset = offset
            .parse()
            .context(format!("Invalid UTC offset '{}'", offset))?;
        formatter = formatter.with_offset(offset);
    }
    Ok(formatter)
}

fn build_request(args: &Args, timeout_secs: Option<u64>) -> EntriesRequest {
    let mut request = EntriesRequest::new();

    if let Some(unit) = &args.unit {
        request = request.matching(FIELD_SYSTEMD_UNIT, unit.clone());
    }
    if let Some(identifier) = &args.identifier {
        request = request.matching(FIELD_SYSLOG_IDENTIFIER, identifier.clone());
    }
    if args.boot {
        request = request.boot();
    }

    let range = match &args.cursor {
        Some(cursor) => EntriesRange::after_cursor(cursor.clone()),
        None => EntriesRange::tail(args.lines),
    };

    if args.follow {
        request.follow().range(range.unbounded())
    } else {
        let request = request.range(range);
        match args.timeout.or(timeout_secs) {
            Some(secs) => request.timeout(Duration::from_secs(secs)),
            None => request,
        }
    }
}
