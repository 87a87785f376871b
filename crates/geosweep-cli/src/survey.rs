//! Survey command handlers.
//!
//! Flags override the environment config per invocation. Tile failures
//! never fail the command; they show up as warnings in the report.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use geosweep_core::{load_regions, AppConfig, Coordinate};
use geosweep_scraper::{
    CancelToken, FailurePolicy, NaverMapClient, SurveyOptions, Surveyor, TileSource,
};

use crate::output;
use crate::CommonArgs;

pub(crate) async fn run_area(
    config: &AppConfig,
    common: &CommonArgs,
    center: Coordinate,
    radius_km: f64,
    divisions: u32,
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    let source = TileSource::around(center, radius_km, divisions)
        .with_context(|| format!("invalid survey area around {center}"))?;
    execute(config, common, &source, cancel).await
}

pub(crate) async fn run_regions(
    config: &AppConfig,
    common: &CommonArgs,
    regions_file: Option<&Path>,
    radius_km: Option<f64>,
    only: &[String],
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    let path = regions_file.unwrap_or(config.regions_path.as_path());
    let file = load_regions(path)?;
    let regions = if only.is_empty() {
        file.regions
    } else {
        file.select(only)?
    };
    tracing::info!(regions = regions.len(), path = %path.display(), "loaded regions");

    let source = TileSource::from_regions(&regions, radius_km);
    execute(config, common, &source, cancel).await
}

pub(crate) fn survey_options(config: &AppConfig, common: &CommonArgs) -> SurveyOptions {
    let mut options = SurveyOptions::from_config(config);
    if let Some(page_limit) = common.page_limit {
        options.fetch.page_limit = page_limit;
    }
    if let Some(delay_ms) = common.delay_ms {
        options.fetch.courtesy_delay = Duration::from_millis(delay_ms);
    }
    if let Some(concurrency) = common.concurrency {
        options.concurrency = concurrency;
    }
    if common.discard_failed_tiles {
        options.fetch.failure_policy = FailurePolicy::DiscardTile;
    }
    options.refine_depth = common.refine_depth;
    options
}

async fn execute(
    config: &AppConfig,
    common: &CommonArgs,
    source: &TileSource,
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    // read up front so a bad path fails before any request
    let previous = common
        .previous
        .as_deref()
        .map(output::read_report)
        .transpose()?;

    let client = NaverMapClient::from_config(config).context("failed to build search client")?;
    let surveyor = Surveyor::new(&client, survey_options(config, common));
    let report = surveyor
        .run(&common.query, source, cancel, output::print_progress)
        .await?;

    output::write_report(&report, common.output.as_deref())?;
    eprint!("{}", output::format_summary(&report));
    if let Some(previous) = previous {
        eprint!("{}", output::format_diff(&report.compare(&previous)));
    }
    Ok(())
}
