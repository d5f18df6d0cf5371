//! Anime collector CLI application.

use anime_collector::{Collector, CsvExporter, JikanClient};
use anyhow::{Context, Result};
use clap::Parser;
use shared::{Config, ExportPaths};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Override the output directory for the CSV tables
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Override how many top-ranked entries to fetch
    #[arg(long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_file(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if let Some(output_dir) = &args.output_dir {
        config.collector.output_dir = output_dir.to_string_lossy().to_string();
    }
    if let Some(limit) = args.limit {
        config.collector.top_anime_limit = limit;
    }

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    shared::logging::init(shared::LogConfig {
        log_dir: config.log_dir().to_string_lossy().to_string(),
        component: "anime-collector".to_string(),
        default_level: log_level,
        console: config.logging.console,
        file: config.logging.file,
        json_format: config.logging.json_format,
    })?;

    info!("Anime collector starting");
    info!(config_file = %args.config.display(), "Loaded configuration");

    let export_dir = config.export_dir();
    info!(output_dir = %export_dir.display(), "Writing tables to output directory");

    let client = JikanClient::new(
        config.collector.base_url.clone(),
        config.collector.max_retries,
        config.retry_delay(),
        config.rate_limit_delay(),
    )
    .context("Failed to create Jikan client")?;

    let exporter = CsvExporter::new(ExportPaths::new(&export_dir));
    let collector = Collector::new(client, exporter, config.collector.clone());

    let started = std::time::Instant::now();
    let stats = collector.run().await.context("Collection run failed")?;

    info!("=== Collection Complete ===");
    info!("Entries fetched: {}", stats.entries_fetched);
    info!("Genre links: {}", stats.genre_rows);
    info!("Studio links: {}", stats.studio_rows);
    info!(
        "Details enriched: {} ({} failed)",
        stats.details_enriched, stats.detail_failures
    );
    info!("Statistics rows: {}", stats.statistics_rows);
    info!(
        "Reviews collected: {} ({} entries failed)",
        stats.reviews_fetched, stats.review_failures
    );
    info!(
        elapsed = format!("{:.1?}", started.elapsed()),
        "Anime collector finished successfully"
    );

    Ok(())
}
