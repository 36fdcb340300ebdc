use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{stdin, stdout, Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::{analyze, AnalysisResult, AppError};
use crate::config::{RelayConfig, DEFAULT_CAPTURE_PATH, DEFAULT_ENDPOINT};
use crate::domain::{format_inr, Totals, WindowKind, WindowReport};
use crate::io::{read_payload, Exporter};
use crate::relay::{
    Clock, ConsumerEvent, FixedClock, HttpTransport, InpageAgent, MessageBus, Notice,
    OrdersConsumer, ReqwestTransport, SystemClock,
};

const REPORT_FORMATS: &str = "table, json, csv";
const EXPORT_FORMATS: &str = "csv, json";

/// Gyftr Ledger - past voucher orders by brand, current month and last 365 days (IST)
#[derive(Parser)]
#[command(name = "gyftr-ledger")]
#[command(about = "Fetch past voucher orders and aggregate them by brand over IST reporting windows")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a saved past-orders payload
    Analyze {
        /// Payload file: API response or relay message JSON (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Evaluation instant (RFC 3339, defaults to now)
        #[arg(long)]
        now: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Fetch past orders through the relay and analyze them
    Fetch {
        /// Past-orders endpoint
        #[arg(long, env = "GYFTR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// URL fragment that marks a request as a past-orders call
        #[arg(long, default_value = DEFAULT_CAPTURE_PATH)]
        capture_path: String,

        /// Session cookie string ("name=value; name2=value2")
        #[arg(long, env = "GYFTR_COOKIE", default_value = "", hide_env_values = true)]
        cookie: String,

        /// Issue the request as the host page would and rely on ambient capture
        #[arg(long)]
        ambient: bool,

        /// Keep listening this long after the first delivery; later deliveries replace it
        #[arg(long, default_value = "0")]
        settle_ms: u64,

        /// Evaluation instant (RFC 3339, defaults to now)
        #[arg(long)]
        now: Option<String>,

        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export the analysis of a saved payload to CSV or JSON
    Export {
        /// Payload file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Evaluation instant (RFC 3339, defaults to now)
        #[arg(long)]
        now: Option<String>,

        /// Format: csv, json
        #[arg(short, long, default_value = "csv")]
        format: String,
    },
}

/// Initialize tracing from GYFTR_LOG, falling back to `debug` when verbose
/// and `warn` otherwise. Logs go to stderr; stdout carries the report.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("GYFTR_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Analyze { input, now, format } => {
                let analysis = analyze_input(input.as_deref(), now.as_deref())?;
                write_report(stdout(), &analysis, &format)?;
            }
            Commands::Fetch {
                endpoint,
                capture_path,
                cookie,
                ambient,
                settle_ms,
                now,
                format,
            } => {
                let config = RelayConfig::default()
                    .with_endpoint(endpoint)
                    .with_capture_path(capture_path)
                    .with_cookies(cookie);
                let clock = clock_for(now.as_deref())?;
                let network: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);

                let delivered = fetch_analysis(
                    network,
                    config,
                    clock,
                    ambient,
                    Duration::from_millis(settle_ms),
                )
                .await?;

                match delivered {
                    Some(analysis) => write_report(stdout(), &analysis, &format)?,
                    None => eprintln!("{}", Notice::NoOrders),
                }
            }
            Commands::Export {
                input,
                output,
                now,
                format,
            } => {
                let analysis = analyze_input(input.as_deref(), now.as_deref())?;
                run_export_command(&analysis, output.as_deref(), &format)?;
            }
        }

        Ok(())
    }
}

/// Parse an RFC 3339 evaluation instant.
pub fn parse_instant(s: &str) -> Result<DateTime<Utc>, AppError> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidInstant(s.to_string()))
}

fn clock_for(now: Option<&str>) -> Result<Arc<dyn Clock>, AppError> {
    Ok(match now {
        Some(s) => Arc::new(FixedClock(parse_instant(s)?)),
        None => Arc::new(SystemClock),
    })
}

fn analyze_input(input: Option<&str>, now: Option<&str>) -> Result<AnalysisResult> {
    let reader: Box<dyn Read> = match input {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("Failed to open input file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdin()),
    };

    let payload = read_payload(reader)?;
    let now = clock_for(now)?.now();
    Ok(analyze(&payload, now))
}

/// Run one relay cycle: start the in-page agent and the consumer on a fresh
/// bus, trigger a fetch, and return the most recent analysis delivered.
///
/// `None` means the delivery carried no order data. In ambient mode a failed
/// host page request is an error, since capture has nothing to relay. There
/// is no timeout on the request itself.
pub async fn fetch_analysis(
    network: Arc<dyn HttpTransport>,
    config: RelayConfig,
    clock: Arc<dyn Clock>,
    ambient: bool,
    settle: Duration,
) -> Result<Option<AnalysisResult>, AppError> {
    let bus = MessageBus::new();
    let agent = InpageAgent::new(network, bus.clone(), config);
    let page = agent.clone();
    let agent_task = agent.spawn();
    let (consumer, mut events, consumer_task) = OrdersConsumer::new(bus, clock).spawn();

    let delivered = if ambient {
        // The host page's own call; its response reaches us only through capture
        match page.transport().send(page.build_request()).await {
            Ok(_) => wait_for_analysis(&mut events, settle).await,
            Err(e) => {
                warn!(error = %e, "Host page request failed, nothing to capture");
                Err(AppError::HostRequest(e))
            }
        }
    } else {
        consumer.request_analysis();
        wait_for_analysis(&mut events, settle).await
    };

    agent_task.abort();
    consumer_task.abort();
    delivered
}

async fn wait_for_analysis(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<ConsumerEvent>,
    settle: Duration,
) -> Result<Option<AnalysisResult>, AppError> {
    let mut latest = loop {
        match events.recv().await.ok_or(AppError::BusClosed)? {
            ConsumerEvent::Render(analysis) => break *analysis,
            ConsumerEvent::Notice(Notice::NoOrders) => return Ok(None),
            ConsumerEvent::Notice(notice) => info!(%notice, "Waiting for past orders"),
        }
    };

    if !settle.is_zero() {
        let deadline = tokio::time::Instant::now() + settle;
        while let Ok(Some(event)) = tokio::time::timeout_at(deadline, events.recv()).await {
            if let ConsumerEvent::Render(analysis) = event {
                debug!("Later delivery replaces earlier analysis");
                latest = *analysis;
            }
        }
    }

    Ok(Some(latest))
}

/// Write an analysis to `out` as a table, JSON or CSV.
pub fn write_report<W: Write>(mut out: W, analysis: &AnalysisResult, format: &str) -> Result<()> {
    match format {
        "table" => write_table(&mut out, analysis)?,
        "json" => Exporter::new(analysis).export_json(out)?,
        "csv" => {
            Exporter::new(analysis).export_csv(out)?;
        }
        _ => {
            return Err(AppError::InvalidFormat {
                format: format.to_string(),
                valid: REPORT_FORMATS,
            }
            .into());
        }
    }
    Ok(())
}

fn write_table<W: Write>(out: &mut W, analysis: &AnalysisResult) -> Result<()> {
    writeln!(
        out,
        "Status considered: C (Complete) only. Timezone: Asia/Kolkata (IST)."
    )?;
    writeln!(
        out,
        "Values aggregate face_value x quantity and cash as reported by the API."
    )?;
    writeln!(out)?;

    for window in analysis.windows() {
        let title = match window.scope {
            WindowKind::CurrentMonth => {
                format!("{}: {}", window.scope.title(), analysis.month_label())
            }
            WindowKind::Last365Days => window.scope.title().to_string(),
        };
        write_window_table(out, &title, window)?;
        writeln!(out)?;
    }

    writeln!(
        out,
        "Brand names are reported as-is; \"Amazon\" and \"Amazon Shopping Voucher\" are kept separate."
    )?;
    Ok(())
}

fn write_window_table<W: Write>(out: &mut W, title: &str, window: &WindowReport) -> Result<()> {
    writeln!(out, "{}", title)?;
    writeln!(
        out,
        "{:<28} {:>7} {:>7} {:>18} {:>18}",
        "VOUCHER (BRAND)", "ORDERS", "QTY", "TOTAL FACE VALUE", "TOTAL CASH PAID"
    )?;
    writeln!(out, "{}", "-".repeat(82))?;

    if window.is_empty() {
        writeln!(out, "No data")?;
    }
    for bucket in &window.buckets {
        write_row(out, &truncate(&bucket.brand, 28), &bucket.totals)?;
    }

    writeln!(out, "{}", "-".repeat(82))?;
    write_row(out, "Total", &window.totals)?;
    Ok(())
}

fn write_row<W: Write>(out: &mut W, label: &str, totals: &Totals) -> Result<()> {
    writeln!(
        out,
        "{:<28} {:>7} {:>7} {:>18} {:>18}",
        label,
        totals.orders,
        totals.qty,
        format_inr(totals.face),
        format_inr(totals.cash)
    )?;
    Ok(())
}

fn run_export_command(analysis: &AnalysisResult, output: Option<&str>, format: &str) -> Result<()> {
    // Reject the format before the output file is created (and truncated)
    if !matches!(format, "csv" | "json") {
        return Err(AppError::InvalidFormat {
            format: format.to_string(),
            valid: EXPORT_FORMATS,
        }
        .into());
    }

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    if format == "csv" {
        let count = Exporter::new(analysis).export_csv(writer)?;
        if output.is_some() {
            eprintln!("Exported {} rows", count);
        }
    } else {
        Exporter::new(analysis).export_json(writer)?;
        if output.is_some() {
            eprintln!("Exported analysis as JSON");
        }
    }

    Ok(())
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
