use super::*;

fn client(base: &str) -> NaverMapClient {
    NaverMapClient::new(base, 5, "geosweep-test/0.1", 0, 0).unwrap()
}

#[test]
fn search_url_carries_query_coordinate_and_page() {
    let c = client("https://map.naver.com");
    let url = c.search_url("휴대폰 대리점", Coordinate::new(126.921_051, 37.634_983), 3);

    assert_eq!(url.path(), "/p/api/search/allSearch");
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("query".to_string(), "휴대폰 대리점".to_string()),
            ("type".to_string(), "all".to_string()),
            ("searchCoord".to_string(), "126.921051;37.634983".to_string()),
            ("page".to_string(), "3".to_string()),
        ]
    );
}

#[test]
fn search_url_replaces_base_path() {
    let c = client("http://127.0.0.1:9999/some/prefix");
    let url = c.search_url("q", Coordinate::new(1.0, 2.0), 1);
    assert_eq!(url.path(), "/p/api/search/allSearch");
    assert_eq!(url.host_str(), Some("127.0.0.1"));
}

#[test]
fn referer_is_service_origin() {
    let c = client("https://map.naver.com/p/search");
    assert_eq!(c.referer(), "https://map.naver.com/");
}

#[test]
fn new_rejects_unparseable_base_url() {
    let result = NaverMapClient::new("not a url", 5, "ua", 0, 0);
    assert!(
        matches!(result, Err(ScraperError::InvalidBaseUrl { .. })),
        "expected InvalidBaseUrl"
    );
}
