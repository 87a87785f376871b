use std::collections::BTreeMap;
use std::path::Path;

use geosweep_core::{AppConfig, BusinessStatus, StoreRecord};
use geosweep_scraper::{
    CategoryCount, FailurePolicy, RecordChange, SurveyDiff, SurveyReport, TileStats, TileWarning,
};

use super::*;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("expected valid cli args")
}

fn config() -> AppConfig {
    AppConfig {
        log_level: "info".to_string(),
        regions_path: PathBuf::from("./config/regions.yaml"),
        search_base_url: "https://map.naver.com".to_string(),
        search_user_agent: "ua".to_string(),
        search_request_timeout_secs: 30,
        search_inter_request_delay_ms: 500,
        search_max_retries: 2,
        search_retry_backoff_base_ms: 1000,
        survey_page_limit: 20,
        survey_max_concurrent_tiles: 1,
    }
}

#[test]
fn parses_area_command() {
    let cli = parse(&[
        "geosweep",
        "area",
        "--query",
        "휴대폰 대리점",
        "--center",
        "126.978;37.5665",
        "--radius-km",
        "5",
        "--divisions",
        "2",
    ]);
    match cli.command {
        Commands::Area {
            common,
            center,
            radius_km,
            divisions,
        } => {
            assert_eq!(common.query, "휴대폰 대리점");
            assert_eq!(center, Coordinate::new(126.978, 37.5665));
            assert!((radius_km - 5.0).abs() < f64::EPSILON);
            assert_eq!(divisions, 2);
            assert_eq!(common.refine_depth, 0);
            assert!(common.page_limit.is_none());
        }
        Commands::Regions { .. } => panic!("expected area"),
    }
}

#[test]
fn area_divisions_default_to_four() {
    let cli = parse(&[
        "geosweep", "area", "-q", "x", "--center", "127,37", "--radius-km", "1",
    ]);
    assert!(matches!(cli.command, Commands::Area { divisions: 4, .. }));
}

#[test]
fn area_accepts_negative_longitude() {
    let cli = parse(&[
        "geosweep",
        "area",
        "-q",
        "x",
        "--center",
        "-73.98;40.75",
        "--radius-km",
        "1",
    ]);
    assert!(matches!(
        cli.command,
        Commands::Area { center, .. } if center == Coordinate::new(-73.98, 40.75)
    ));
}

#[test]
fn area_rejects_malformed_center() {
    let result = Cli::try_parse_from([
        "geosweep", "area", "-q", "x", "--center", "somewhere", "--radius-km", "1",
    ]);
    assert!(result.is_err());
}

#[test]
fn area_requires_query() {
    let result = Cli::try_parse_from([
        "geosweep", "area", "--center", "127;37", "--radius-km", "1",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_regions_command_with_filter() {
    let cli = parse(&[
        "geosweep",
        "regions",
        "-q",
        "x",
        "--only",
        "Seoul,Busan",
        "--radius-km",
        "8",
        "--discard-failed-tiles",
    ]);
    match cli.command {
        Commands::Regions {
            common,
            regions_file,
            radius_km,
            only,
        } => {
            assert_eq!(only, vec!["Seoul".to_string(), "Busan".to_string()]);
            assert_eq!(radius_km, Some(8.0));
            assert!(regions_file.is_none());
            assert!(common.discard_failed_tiles);
        }
        Commands::Area { .. } => panic!("expected regions"),
    }
}

#[test]
fn missing_subcommand_is_an_error() {
    assert!(Cli::try_parse_from(["geosweep"]).is_err());
}

#[test]
fn flags_override_config() {
    let cli = parse(&[
        "geosweep",
        "regions",
        "-q",
        "x",
        "--page-limit",
        "5",
        "--delay-ms",
        "0",
        "--concurrency",
        "3",
        "--refine-depth",
        "2",
        "--discard-failed-tiles",
    ]);
    let Commands::Regions { common, .. } = cli.command else {
        panic!("expected regions");
    };
    let options = survey::survey_options(&config(), &common);
    assert_eq!(options.fetch.page_limit, 5);
    assert!(options.fetch.courtesy_delay.is_zero());
    assert_eq!(options.concurrency, 3);
    assert_eq!(options.refine_depth, 2);
    assert_eq!(options.fetch.failure_policy, FailurePolicy::DiscardTile);
}

#[test]
fn config_applies_without_flags() {
    let cli = parse(&["geosweep", "regions", "-q", "x"]);
    let Commands::Regions { common, .. } = cli.command else {
        panic!("expected regions");
    };
    let options = survey::survey_options(&config(), &common);
    assert_eq!(options.fetch.page_limit, 20);
    assert_eq!(options.fetch.courtesy_delay.as_millis(), 500);
    assert_eq!(options.concurrency, 1);
    assert_eq!(options.fetch.failure_policy, FailurePolicy::EndOfData);
}

fn record(name: &str, status: BusinessStatus) -> StoreRecord {
    StoreRecord {
        name: name.to_string(),
        address: format!("{name} address"),
        business_status: status,
        ..StoreRecord::default()
    }
}

fn sample_report() -> SurveyReport {
    SurveyReport {
        run_id: uuid::Uuid::nil(),
        query: "폰".to_string(),
        generated_at: chrono::Utc::now(),
        records: vec![record("a", BusinessStatus::Open)],
        status_counts: BTreeMap::from([("OPEN".to_string(), 1)]),
        top_categories: vec![CategoryCount {
            category: "휴대폰".to_string(),
            count: 1,
        }],
        tile_warnings: vec![TileWarning {
            tile_index: 3,
            label: Some("Busan".to_string()),
            reason: "page 2: search request timed out after 50 ms".to_string(),
        }],
        tiles: TileStats {
            total: 4,
            completed: 4,
            exhausted: 3,
            failed: 1,
            ..TileStats::default()
        },
        total_pages: 9,
        cancelled: true,
    }
}

#[test]
fn summary_lists_counts_and_warnings() {
    let summary = output::format_summary(&sample_report());
    assert!(summary.contains("1 records from 9 pages"));
    assert!(summary.contains("4/4 completed"));
    assert!(summary.contains("  OPEN: 1"));
    assert!(summary.contains("  휴대폰: 1"));
    assert!(summary.contains("warning: tile 3 (Busan)"));
    assert!(summary.contains("partial"));
}

#[test]
fn diff_lists_each_change() {
    let diff = SurveyDiff {
        added: vec![record("new", BusinessStatus::Open)],
        removed: vec![record("gone", BusinessStatus::Open)],
        changed: vec![RecordChange {
            before: record("same", BusinessStatus::Open),
            after: record("same", BusinessStatus::Closed),
        }],
    };
    let text = output::format_diff(&diff);
    assert!(text.contains("1 added, 1 removed, 1 changed"));
    assert!(text.contains("  + new | new address"));
    assert!(text.contains("  - gone | gone address"));
    assert!(text.contains("  ~ same | same address (OPEN -> CLOSED)"));
    assert_eq!(
        output::format_diff(&SurveyDiff::default()),
        "no changes since previous report\n"
    );
}

#[test]
fn report_written_to_file_reads_back() {
    let path = std::env::temp_dir().join(format!("geosweep-report-{}.json", std::process::id()));
    let report = sample_report();
    output::write_report(&report, Some(&path)).unwrap();
    let back = output::read_report(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(back, report);
}

#[test]
fn reading_missing_report_fails_with_path() {
    let err = output::read_report(Path::new("/nonexistent/geosweep.json")).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/geosweep.json"));
}
