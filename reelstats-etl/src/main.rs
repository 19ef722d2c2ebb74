//! reelstats - movie metadata ETL
//!
//! Fetches movie details from the TMDB catalog, builds the cleaned movie
//! table and KPI/analytics reports, and writes them to the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use reelstats_etl::config::{self, CliOverrides, PipelineConfig};
use reelstats_etl::Pipeline;
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "reelstats")]
#[command(about = "Movie metadata ETL and KPI reports", long_about = None)]
#[command(version)]
struct Args {
    /// Path to the TOML config file
    #[arg(short, long, env = "REELSTATS_CONFIG")]
    config: Option<PathBuf>,

    /// TMDB API key (overrides TMDB_API_KEY and the config file)
    #[arg(long)]
    api_key: Option<String>,

    /// API root (overrides TMDB_BASE_URL and the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Directory receiving every artifact (overrides REELSTATS_OUTPUT_DIR)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Comma-separated movie ids, e.g. 299534,19995
    #[arg(long)]
    ids: Option<String>,

    /// Cast names kept per movie
    #[arg(long)]
    cast_limit: Option<usize>,

    /// Transform a saved movies_raw.jsonl instead of fetching
    #[arg(long)]
    raw_input: Option<PathBuf>,

    /// Log level or filter directive (RUST_LOG takes precedence)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Before any config resolution so .env values act as environment
    let dotenv = config::load_dotenv();

    let (toml_config, config_source) = config::load_toml(args.config.as_deref())
        .context("Failed to load configuration")?;

    let log_level = config::resolve_log_level(args.log_level.as_deref(), &toml_config);
    reelstats_common::logging::init_tracing(&log_level, toml_config.logging.file.as_deref())
        .context("Failed to initialize logging")?;

    info!(
        "Starting reelstats v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    config_source.log();
    if let Some(path) = dotenv {
        debug!("Loaded environment from {}", path.display());
    }

    let ids = args
        .ids
        .as_deref()
        .map(config::parse_id_list)
        .transpose()
        .context("Invalid --ids")?;

    let overrides = CliOverrides {
        api_key: args.api_key,
        base_url: args.base_url,
        output_dir: args.output_dir,
        ids,
        cast_limit: args.cast_limit,
    };
    let pipeline_config = PipelineConfig::resolve(&overrides, &toml_config);

    let mut pipeline = Pipeline::new(pipeline_config);
    if let Some(path) = args.raw_input {
        pipeline = pipeline.with_raw_input(path);
    }

    let report = pipeline.run().await.context("Pipeline failed")?;

    info!(
        "Wrote {} artifacts to {}",
        report.artifacts.len(),
        pipeline.config().output_dir.display()
    );
    for path in &report.artifacts {
        debug!("  {}", path.display());
    }

    Ok(())
}
