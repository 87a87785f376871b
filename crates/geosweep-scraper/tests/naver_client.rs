//! Integration tests for `NaverMapClient` using wiremock HTTP mocks.

use std::time::Duration;

use geosweep_core::{BoundingBox, Coordinate, Tile};
use geosweep_scraper::{
    CancelToken, FailurePolicy, FetchOptions, NaverMapClient, PlaceSearch, ScraperError,
    SurveyOptions, Surveyor, TileSource,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PATH: &str = "/p/api/search/allSearch";

fn test_client(base_url: &str, max_retries: u32) -> NaverMapClient {
    NaverMapClient::new(base_url, 5, "geosweep-test/0.1", max_retries, 0)
        .expect("client construction should not fail")
}

fn page_body(names: &[(&str, f64, f64)]) -> serde_json::Value {
    let list: Vec<serde_json::Value> = names
        .iter()
        .map(|(name, lon, lat)| {
            serde_json::json!({
                "name": name,
                "tel": "02-000-0000",
                "category": ["휴대폰"],
                "address": format!("{name} 주소"),
                "roadAddress": "",
                "businessStatus": { "status": { "text": "영업 중" }, "businessHours": "" },
                "x": lon.to_string(),
                "y": lat.to_string()
            })
        })
        .collect();
    serde_json::json!({ "result": { "place": { "list": list } } })
}

#[tokio::test]
async fn search_sends_query_coordinate_and_page() {
    let server = MockServer::start().await;
    let body = page_body(&[("폰마트", 126.9, 37.5)]);

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("query", "휴대폰 대리점"))
        .and(query_param("type", "all"))
        .and(query_param("searchCoord", "126.9;37.5"))
        .and(query_param("page", "2"))
        .and(header("referer", format!("{}/", server.uri()).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let raw = client
        .search("휴대폰 대리점", Coordinate::new(126.9, 37.5), 2)
        .await
        .expect("search should succeed");

    assert_eq!(raw, body);
    let records = geosweep_scraper::extract(&raw);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "폰마트");
}

#[tokio::test]
async fn rate_limited_request_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2);
    let raw = client
        .search("q", Coordinate::new(127.0, 37.0), 1)
        .await
        .expect("retry should recover");
    assert!(geosweep_scraper::extract(&raw).is_empty());
}

#[tokio::test]
async fn server_error_without_retries_is_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let err = client
        .search("q", Coordinate::new(127.0, 37.0), 1)
        .await
        .expect_err("500 should fail");
    assert!(
        matches!(err, ScraperError::UnexpectedStatus { status: 500, .. }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 3);
    let err = client
        .search("q", Coordinate::new(127.0, 37.0), 1)
        .await
        .expect_err("403 should fail");
    assert!(matches!(
        err,
        ScraperError::UnexpectedStatus { status: 403, .. }
    ));
}

#[tokio::test]
async fn non_json_body_is_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>blocked</html>"))
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 2);
    let err = client
        .search("q", Coordinate::new(127.0, 37.0), 4)
        .await
        .expect_err("html should fail");
    match err {
        ScraperError::Deserialize { context, .. } => assert_eq!(context, "search page 4"),
        other => panic!("expected Deserialize, got {other:?}"),
    }
}

#[tokio::test]
async fn survey_over_http_paginates_until_empty_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_body(&[
            ("A", 126.95, 37.55),
            ("B", 126.96, 37.56),
            ("outside", 128.0, 36.0),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(SEARCH_PATH))
        .and(query_param("page", "2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": {} })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri(), 0);
    let options = SurveyOptions {
        fetch: FetchOptions {
            page_limit: 20,
            courtesy_delay: Duration::ZERO,
            request_timeout: Duration::from_secs(5),
            failure_policy: FailurePolicy::EndOfData,
        },
        ..SurveyOptions::default()
    };
    let area = BoundingBox::new(37.5, 37.6, 126.9, 127.0).expect("valid box");
    let report = Surveyor::new(&client, options)
        .run(
            "휴대폰",
            &TileSource::Grid { area, divisions: 1 },
            &CancelToken::new(),
            |_| {},
        )
        .await
        .expect("survey should run");

    let names: Vec<&str> = report.records.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(report.total_pages, 2);
    assert_eq!(report.tiles.exhausted, 1);
    assert_eq!(report.status_counts.get("OPEN"), Some(&2));
    assert_eq!(report.top_categories[0].category, "휴대폰");
    assert_eq!(report.top_categories[0].count, 2);
}

#[tokio::test]
async fn unreachable_service_becomes_tile_warning() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let client = test_client(&uri, 0);
    let tile = Tile::unbounded(Coordinate::new(127.0, 37.0)).with_label("Seoul");
    let report = Surveyor::new(
        &client,
        SurveyOptions {
            fetch: FetchOptions {
                courtesy_delay: Duration::ZERO,
                ..FetchOptions::default()
            },
            ..SurveyOptions::default()
        },
    )
    .run_tiles("q", vec![tile], &CancelToken::new(), |_| {})
    .await
    .expect("tile failures are not survey errors");

    assert!(report.records.is_empty());
    assert_eq!(report.tile_warnings.len(), 1);
    assert_eq!(report.tile_warnings[0].label.as_deref(), Some("Seoul"));
}
