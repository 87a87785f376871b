//! The remote search primitive and its HTTP implementation.

use std::future::Future;
use std::time::Duration;

use geosweep_core::{AppConfig, Coordinate};
use reqwest::{Client, Url};

use crate::error::ScraperError;
use crate::retry::retry_with_backoff;

const SEARCH_PATH: &str = "/p/api/search/allSearch";

/// A coordinate-biased, paginated place search.
///
/// `Ok` carries the raw page body, whatever its shape; interpreting it is
/// the extractor's job. `Err` means the call itself failed. Calls must be
/// safe to repeat.
pub trait PlaceSearch {
    fn search(
        &self,
        query: &str,
        coordinate: Coordinate,
        page: u32,
    ) -> impl Future<Output = Result<serde_json::Value, ScraperError>> + Send;
}

/// HTTP client for the map service's `allSearch` endpoint.
///
/// Transient errors (429, timeouts, 5xx) are retried with jittered
/// exponential back-off up to `max_retries` additional attempts.
pub struct NaverMapClient {
    client: Client,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl NaverMapClient {
    /// # Errors
    ///
    /// - [`ScraperError::InvalidBaseUrl`] if `base_url` does not parse.
    /// - [`ScraperError::Http`] if the underlying `reqwest::Client` cannot be built.
    pub fn new(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, ScraperError> {
        let base_url = Url::parse(base_url).map_err(|e| ScraperError::InvalidBaseUrl {
            base_url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url,
            max_retries,
            backoff_base_ms,
        })
    }

    /// # Errors
    ///
    /// See [`NaverMapClient::new`].
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        Self::new(
            &config.search_base_url,
            config.search_request_timeout_secs,
            &config.search_user_agent,
            config.search_max_retries,
            config.search_retry_backoff_base_ms,
        )
    }

    fn search_url(&self, query: &str, coordinate: Coordinate, page: u32) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(SEARCH_PATH);
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("type", "all")
            .append_pair("searchCoord", &coordinate.to_search_coord())
            .append_pair("page", &page.to_string());
        url
    }

    fn referer(&self) -> String {
        let mut origin = self.base_url.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.to_string()
    }

    async fn search_once(&self, url: &Url, page: u32) -> Result<serde_json::Value, ScraperError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json, text/plain, */*")
            .header(
                reqwest::header::ACCEPT_LANGUAGE,
                "ko-KR,ko;q=0.9,en-US;q=0.8,en;q=0.7",
            )
            .header(reqwest::header::REFERER, self.referer())
            .send()
            .await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(5);
            return Err(ScraperError::RateLimited { retry_after_secs });
        }

        if !status.is_success() {
            return Err(ScraperError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str::<serde_json::Value>(&body).map_err(|e| ScraperError::Deserialize {
            context: format!("search page {page}"),
            source: e,
        })
    }
}

impl PlaceSearch for NaverMapClient {
    async fn search(
        &self,
        query: &str,
        coordinate: Coordinate,
        page: u32,
    ) -> Result<serde_json::Value, ScraperError> {
        let url = self.search_url(query, coordinate, page);
        tracing::debug!(query, page, coord = %coordinate.to_search_coord(), "search request");
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.search_once(&url, page)
        })
        .await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
