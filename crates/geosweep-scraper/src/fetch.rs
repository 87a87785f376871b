//! Per-tile pagination against the search primitive.
//!
//! A tile is queried at its centre, page after page, until the service runs
//! dry, the page cap is hit, a call fails, or the survey is cancelled.
//! Results outside the tile's box are dropped; results without a usable
//! coordinate are kept.

use std::time::Duration;

use geosweep_core::{distance_km, AppConfig, StoreRecord, Tile};
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::client::PlaceSearch;
use crate::error::ScraperError;
use crate::extract::extract;

/// What to do with a tile's records when a page request fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop paginating and keep what earlier pages returned.
    #[default]
    EndOfData,
    /// Drop every record the tile produced.
    DiscardTile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    /// Maximum pages requested per tile. Must be at least 1.
    pub page_limit: u32,
    /// Pause before every page after the first. Zero disables it.
    pub courtesy_delay: Duration,
    /// Upper bound on a single search call, retries included.
    pub request_timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_limit: 20,
            courtesy_delay: Duration::from_millis(500),
            request_timeout: Duration::from_secs(30),
            failure_policy: FailurePolicy::EndOfData,
        }
    }
}

impl FetchOptions {
    /// Per-call timeout covers the client's retries, so it scales with them.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        let attempts = u64::from(config.search_max_retries) + 1;
        Self {
            page_limit: config.survey_page_limit,
            courtesy_delay: Duration::from_millis(config.search_inter_request_delay_ms),
            request_timeout: Duration::from_secs(
                config.search_request_timeout_secs.saturating_mul(attempts),
            ),
            failure_policy: FailurePolicy::EndOfData,
        }
    }
}

/// Why pagination of a tile stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileTermination {
    /// The service returned a page with no places.
    Exhausted,
    /// `page_limit` pages were fetched and the last one was still full.
    LimitReached,
    Cancelled,
    Failed { page: u32, reason: String },
}

#[derive(Debug, Clone)]
pub struct TileFetch {
    pub records: Vec<StoreRecord>,
    pub pages_fetched: u32,
    /// Records dropped because their coordinate lay outside the tile.
    pub filtered_out: usize,
    pub termination: TileTermination,
}

pub struct TileFetcher<'a, S> {
    source: &'a S,
    options: FetchOptions,
}

impl<'a, S: PlaceSearch> TileFetcher<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, options: FetchOptions) -> Self {
        Self { source, options }
    }

    #[must_use]
    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Paginate one tile to exhaustion.
    ///
    /// Never returns an error: failures end up in
    /// [`TileTermination::Failed`] and are handled per [`FailurePolicy`].
    pub async fn fetch_tile(&self, query: &str, tile: &Tile, cancel: &CancelToken) -> TileFetch {
        let mut records = Vec::new();
        let mut filtered_out = 0usize;
        let mut pages_fetched = 0u32;
        let mut page = 1u32;

        let termination = loop {
            if page > 1 && !self.options.courtesy_delay.is_zero() {
                tokio::time::sleep(self.options.courtesy_delay).await;
            }
            if cancel.is_cancelled() {
                break TileTermination::Cancelled;
            }

            let raw = match self.search_page(query, tile, page).await {
                Ok(raw) => raw,
                Err(error) => {
                    tracing::warn!(
                        page,
                        center = %tile.center,
                        error = %error,
                        "search page failed; ending tile"
                    );
                    break TileTermination::Failed {
                        page,
                        reason: error.to_string(),
                    };
                }
            };
            pages_fetched += 1;

            let extracted = extract(&raw);
            if extracted.is_empty() {
                break TileTermination::Exhausted;
            }

            let returned = extracted.len();
            let (kept, dropped) = filter_to_tile(extracted, tile);
            filtered_out += dropped;
            tracing::debug!(
                page,
                returned,
                kept = kept.len(),
                dropped,
                "search page extracted"
            );
            records.extend(kept);

            if page >= self.options.page_limit {
                break TileTermination::LimitReached;
            }
            page += 1;
        };

        if matches!(termination, TileTermination::Failed { .. })
            && self.options.failure_policy == FailurePolicy::DiscardTile
        {
            records.clear();
        }

        TileFetch {
            records,
            pages_fetched,
            filtered_out,
            termination,
        }
    }

    async fn search_page(
        &self,
        query: &str,
        tile: &Tile,
        page: u32,
    ) -> Result<serde_json::Value, ScraperError> {
        let timeout = self.options.request_timeout;
        match tokio::time::timeout(timeout, self.source.search(query, tile.center, page)).await {
            Ok(result) => result,
            Err(_) => Err(ScraperError::Timeout {
                timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}

/// Split `records` into those inside `tile` (or without a coordinate) and a
/// count of those outside it.
fn filter_to_tile(records: Vec<StoreRecord>, tile: &Tile) -> (Vec<StoreRecord>, usize) {
    let mut kept = Vec::with_capacity(records.len());
    let mut dropped = 0usize;
    let mut farthest_km = 0.0_f64;

    for record in records {
        match record.coordinate {
            Some(point) if !tile.bounds.contains(&point) => {
                dropped += 1;
                farthest_km = farthest_km.max(distance_km(tile.center, point));
            }
            _ => kept.push(record),
        }
    }

    if dropped > 0 {
        tracing::trace!(dropped, farthest_km, "dropped results outside tile");
    }
    (kept, dropped)
}

#[cfg(test)]
#[path = "fetch_test.rs"]
mod tests;
