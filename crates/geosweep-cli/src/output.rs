//! Report I/O and the human-readable summaries printed to stderr.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::Context;
use geosweep_scraper::{SurveyDiff, SurveyProgress, SurveyReport};

pub(crate) fn read_report(path: &Path) -> anyhow::Result<SurveyReport> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read report {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse report {}", path.display()))
}

/// Pretty JSON to `path`, or to stdout when `path` is `None`.
pub(crate) fn write_report(report: &SurveyReport, path: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("failed to serialize report")?;
    match path {
        Some(path) => {
            std::fs::write(path, format!("{json}\n"))
                .with_context(|| format!("failed to write report {}", path.display()))?;
            tracing::info!(path = %path.display(), records = report.records.len(), "report written");
        }
        None => println!("{json}"),
    }
    Ok(())
}

pub(crate) fn print_progress(progress: &SurveyProgress) {
    eprintln!(
        "{}/{} ({:.0}%) records={} pages={}",
        progress.tiles_completed,
        progress.total_tiles,
        progress.fraction() * 100.0,
        progress.records,
        progress.total_pages
    );
}

pub(crate) fn format_summary(report: &SurveyReport) -> String {
    let mut out = String::new();
    let tiles = &report.tiles;

    let _ = writeln!(
        out,
        "query \"{}\": {} records from {} pages",
        report.query,
        report.records.len(),
        report.total_pages
    );
    let _ = writeln!(
        out,
        "tiles: {}/{} completed, {} exhausted, {} hit page limit, {} failed, {} refined",
        tiles.completed,
        tiles.total,
        tiles.exhausted,
        tiles.limit_reached,
        tiles.failed,
        tiles.refined
    );
    if report.cancelled {
        out.push_str("survey was cancelled; results are partial\n");
    }

    if !report.status_counts.is_empty() {
        out.push_str("status:\n");
        for (status, count) in &report.status_counts {
            let _ = writeln!(out, "  {status}: {count}");
        }
    }
    if !report.top_categories.is_empty() {
        out.push_str("top categories:\n");
        for entry in &report.top_categories {
            let _ = writeln!(out, "  {}: {}", entry.category, entry.count);
        }
    }
    for warning in &report.tile_warnings {
        let _ = writeln!(
            out,
            "warning: tile {} ({}): {}",
            warning.tile_index,
            warning.label.as_deref().unwrap_or("-"),
            warning.reason
        );
    }
    out
}

pub(crate) fn format_diff(diff: &SurveyDiff) -> String {
    if diff.is_empty() {
        return "no changes since previous report\n".to_string();
    }

    let mut out = format!(
        "since previous report: {} added, {} removed, {} changed\n",
        diff.added.len(),
        diff.removed.len(),
        diff.changed.len()
    );
    for record in &diff.added {
        let _ = writeln!(out, "  + {} | {}", record.name, record.address);
    }
    for record in &diff.removed {
        let _ = writeln!(out, "  - {} | {}", record.name, record.address);
    }
    for change in &diff.changed {
        let _ = writeln!(
            out,
            "  ~ {} | {} ({} -> {})",
            change.after.name,
            change.after.address,
            change.before.business_status,
            change.after.business_status
        );
    }
    out
}
