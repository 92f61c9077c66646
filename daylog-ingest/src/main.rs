//! daylog-ingest - Media reconciliation command line
//!
//! - `ingest`: parse hash-list manifests under one or more source paths into
//!   a persistent clip store
//! - `report`: merge saved production days and print their totals and
//!   per-clip view as JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use daylog_common::config::load_config;
use daylog_ingest::models::{DailyLog, IngestKind, MergedClip};
use daylog_ingest::services::{AggregateCalculator, ClipIdentityResolver, SectionSummary};
use daylog_ingest::ClipStore;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for daylog-ingest
#[derive(Parser, Debug)]
#[command(name = "daylog-ingest")]
#[command(about = "Reconcile camera and sound offload manifests into daily reports")]
#[command(version)]
struct Args {
    /// Config file (overrides DAYLOG_CONFIG and the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ingest manifests from one or more source paths
    Ingest {
        /// Media kind to keep: ocf or sound
        #[arg(long)]
        kind: IngestKind,

        /// Clip store JSON file (created if missing)
        #[arg(long)]
        store: PathBuf,

        /// Source paths, the first also supplies camera metadata
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Merge saved days and print the report data
    Report {
        /// Collapse consecutive reels into ranges
        #[arg(long)]
        group_reels: bool,

        /// Daily log JSON files
        #[arg(required = true)]
        logs: Vec<PathBuf>,
    },
}

/// JSON printed by `report`
#[derive(Debug, Serialize)]
struct ReportOutput {
    days: Vec<u32>,
    date: String,
    units: Vec<String>,
    ocf: SectionSummary,
    proxy: SectionSummary,
    sound: SectionSummary,
    clips: Vec<MergedClip>,
}

fn read_daily_log(path: &Path) -> Result<DailyLog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let log: DailyLog = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    log.validate().map_err(anyhow::Error::msg)?;
    Ok(log)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing; RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting daylog-ingest");

    match args.command {
        Command::Ingest { kind, store, paths } => {
            let mut clip_store = ClipStore::load(&store)
                .with_context(|| format!("Failed to load clip store {}", store.display()))?;

            let resolver = ClipIdentityResolver::new(config);
            let report = resolver.ingest(&mut clip_store, kind, &paths).await?;

            clip_store
                .save(&store)
                .with_context(|| format!("Failed to save clip store {}", store.display()))?;

            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Report { group_reels, logs } => {
            let days = logs
                .iter()
                .map(|path| read_daily_log(path))
                .collect::<Result<Vec<_>>>()?;

            let calculator = AggregateCalculator::from_config(&config);
            let selection = calculator.merge_days(&days)?;

            let output = ReportOutput {
                ocf: calculator.ocf_summary(&selection.ocf, group_reels),
                proxy: calculator.proxy_summary(&selection.proxy),
                sound: calculator.sound_summary(&selection.sound),
                clips: selection.merged_clips()?,
                days: selection.days,
                date: selection.date,
                units: selection.units,
            };

            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
