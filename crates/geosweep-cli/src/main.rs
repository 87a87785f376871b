mod output;
mod survey;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use geosweep_core::Coordinate;
use geosweep_scraper::CancelToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "geosweep")]
#[command(about = "Exhaustive area survey over a paginated map search service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Survey a grid laid over the box around a centre point
    Area {
        #[command(flatten)]
        common: CommonArgs,
        /// Centre as "lon;lat" (a comma also works)
        #[arg(long, value_parser = parse_center, allow_hyphen_values = true)]
        center: Coordinate,
        #[arg(long)]
        radius_km: f64,
        /// Grid is divisions x divisions tiles
        #[arg(long, default_value_t = 4)]
        divisions: u32,
    },
    /// Survey one tile per named region centroid
    Regions {
        #[command(flatten)]
        common: CommonArgs,
        /// Defaults to GEOSWEEP_REGIONS_PATH
        #[arg(long)]
        regions_file: Option<PathBuf>,
        /// Overrides every region's own radius
        #[arg(long)]
        radius_km: Option<f64>,
        /// Comma-separated region names to keep
        #[arg(long, value_delimiter = ',')]
        only: Vec<String>,
    },
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// Free-text search query
    #[arg(long, short)]
    query: String,
    /// Maximum pages per tile
    #[arg(long)]
    page_limit: Option<u32>,
    /// Courtesy delay between pages, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,
    /// Tiles fetched at once
    #[arg(long)]
    concurrency: Option<usize>,
    /// Levels of 2x2 refinement for tiles that hit the page limit
    #[arg(long, default_value_t = 0)]
    refine_depth: u32,
    /// Drop all records of a tile whose pagination failed
    #[arg(long)]
    discard_failed_tiles: bool,
    /// Write the JSON report here instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,
    /// Earlier JSON report to diff against
    #[arg(long)]
    previous: Option<PathBuf>,
}

fn parse_center(input: &str) -> Result<Coordinate, String> {
    Coordinate::parse(input).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = geosweep_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cancel = CancelToken::new();
    cancel_on_ctrl_c(cancel.clone());

    match cli.command {
        Commands::Area {
            common,
            center,
            radius_km,
            divisions,
        } => survey::run_area(&config, &common, center, radius_km, divisions, &cancel).await,
        Commands::Regions {
            common,
            regions_file,
            radius_km,
            only,
        } => {
            survey::run_regions(
                &config,
                &common,
                regions_file.as_deref(),
                radius_km,
                &only,
                &cancel,
            )
            .await
        }
    }
}

/// First Ctrl-C stops the survey after the pages in flight; the partial
/// report is still written.
fn cancel_on_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::warn!("received ctrl-c, stopping survey");
                cancel.cancel();
            }
            Err(error) => tracing::error!(error = %error, "failed to listen for ctrl-c"),
        }
    });
}

#[cfg(test)]
mod tests;
