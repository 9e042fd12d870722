use analytics::{AnalyticsEngine, EquitySeriesBuilder};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use configuration::{Config, LogFormat};
use core_types::VerifiedSnapshot;
use gateway::{BulkClient, GatewayFetcher};
use indicatif::ProgressStyle;
use loader::{LoadOutcome, SnapshotLoader, StaticRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;
use tracing_indicatif::span_ext::IndicatifSpanExt;

mod render;
mod telemetry;

/// The main entry point for the Navproof application.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The .env file is optional; overrides may come from the real environment.
    dotenvy::dotenv().ok();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => configuration::load_config_from(path)?,
        None => configuration::load_config()?,
    };
    let _log_guard = telemetry::init_tracing(&config.logging, cli.log_format)?;

    // Execute the appropriate command
    match cli.command {
        Commands::Verify(args) => handle_verify(args, &config).await,
        Commands::History(args) => handle_history(args, &config).await,
        Commands::Bulk(args) => handle_bulk(args, &config).await,
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// Verified account snapshots and the performance they add up to.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path of the configuration file (defaults to ./config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `logging.format` from the configuration.
    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch and verify one snapshot from the registry.
    Verify(VerifyArgs),
    /// Load a range of registry snapshots and report performance.
    History(HistoryArgs),
    /// Read every snapshot from the bulk API and report performance.
    Bulk(ReportArgs),
}

#[derive(Args)]
struct VerifyArgs {
    /// Registry index to verify; the latest snapshot when omitted.
    #[arg(long)]
    index: Option<u64>,
}

#[derive(Args)]
struct HistoryArgs {
    /// First registry index to load (inclusive).
    #[arg(long)]
    from: Option<u64>,

    /// Last registry index to load (inclusive); the latest when omitted.
    #[arg(long)]
    to: Option<u64>,

    #[command(flatten)]
    report: ReportArgs,
}

#[derive(Args)]
struct ReportArgs {
    /// Leave snapshots that failed verification out of the equity curve.
    #[arg(long)]
    verified_only: bool,

    /// Print the full report as JSON instead of tables.
    #[arg(long)]
    json: bool,
}

// ==============================================================================
// Command Logic
// ==============================================================================

fn build_loader(config: &Config) -> anyhow::Result<SnapshotLoader> {
    let manifest = config
        .registry
        .manifest_path
        .as_ref()
        .context("registry.manifest_path is not configured")?;

    let registry = Arc::new(StaticRegistry::from_manifest(manifest)?);
    let fetcher = Arc::new(GatewayFetcher::new(&config.gateway)?);
    Ok(SnapshotLoader::new(registry, fetcher, &config.loader))
}

/// Handles verification of a single snapshot.
async fn handle_verify(args: VerifyArgs, config: &Config) -> anyhow::Result<()> {
    let loader = build_loader(config)?;

    let outcome = match args.index {
        Some(index) => loader.load_with_outcome(index).await,
        None => loader.load_latest_with_outcome().await,
    };

    match outcome {
        LoadOutcome::Success {
            snapshot,
            verification,
            attempts,
        } => {
            render::print_verification(&snapshot, &verification, attempts);
            render::print_record(&snapshot.record());
        }
        LoadOutcome::Exhausted { attempts, failures } => {
            println!("Snapshot unavailable after {} attempt(s).", attempts);
            for failure in &failures {
                println!("  - {}", failure);
            }
        }
    }

    Ok(())
}

/// Handles loading a registry range, one snapshot at a time.
async fn handle_history(args: HistoryArgs, config: &Config) -> anyhow::Result<()> {
    let loader = build_loader(config)?;

    let count = loader.registry().count().await?;
    if count == 0 {
        println!("The registry holds no snapshots.");
        return Ok(());
    }

    let from = args.from.unwrap_or(0);
    let to = args.to.unwrap_or(count - 1).min(count - 1);
    if from > to {
        anyhow::bail!("empty range: --from {} is after --to {}", from, to);
    }

    let span = tracing::info_span!("history");
    span.pb_set_style(
        &ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
            .progress_chars("#>-"),
    );
    span.pb_set_length(to - from + 1);

    let snapshots = async {
        let mut snapshots = Vec::new();
        for index in from..=to {
            tracing::Span::current().pb_set_message(&format!("index {}", index));
            if let Some(snapshot) = loader.load(index).await {
                snapshots.push(snapshot);
            }
            tracing::Span::current().pb_inc(1);
        }
        snapshots
    }
    .instrument(span)
    .await;

    tracing::info!(requested = to - from + 1, loaded = snapshots.len(), "History loaded");
    summarize(&snapshots, &args.report, config)
}

/// Handles reading the whole history from the bulk API.
async fn handle_bulk(args: ReportArgs, config: &Config) -> anyhow::Result<()> {
    let url = config
        .bulk
        .url
        .as_deref()
        .context("bulk.url is not configured")?;

    let client = BulkClient::new(url, Duration::from_secs(config.gateway.timeout_secs));
    let snapshots = client.fetch_snapshots().await;
    if snapshots.is_empty() {
        println!("The bulk API returned no snapshots.");
    }

    summarize(&snapshots, &args, config)
}

/// Builds the equity curve from a batch of snapshots and prints its analytics.
fn summarize(snapshots: &[VerifiedSnapshot], args: &ReportArgs, config: &Config) -> anyhow::Result<()> {
    let timezone = config
        .reporting
        .tz()
        .with_context(|| format!("unknown reporting time zone '{}'", config.reporting.timezone))?;

    let series = EquitySeriesBuilder::new(timezone)
        .verified_only(args.verified_only)
        .build(snapshots);
    let report = AnalyticsEngine::new(timezone).compute(&series);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let unverified = snapshots.iter().filter(|s| !s.is_verified()).count();
        render::print_report(&report, snapshots.len(), unverified);
    }

    Ok(())
}
