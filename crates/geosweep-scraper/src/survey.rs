//! Crawl orchestration: turn a tile set into one deduplicated report.
//!
//! Tiles run through a bounded pool (`buffered`), but their results are
//! consumed in tile order by the single loop that owns [`CrawlState`]. Merge
//! order, warnings and progress are therefore the same for any concurrency.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use futures::stream::{self, StreamExt};
use geosweep_core::{
    bounds_from_radius, subdivide, AppConfig, BoundingBox, Coordinate, GeometryError, RecordKey,
    RegionConfig, StoreRecord, Tile,
};
use serde::{Deserialize, Serialize};

use crate::cancel::CancelToken;
use crate::client::PlaceSearch;
use crate::error::SurveyError;
use crate::fetch::{FetchOptions, TileFetch, TileFetcher, TileTermination};
use crate::report::{SurveyReport, TileStats, TileWarning};

/// A query point for fixed-list surveys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPoint {
    pub label: Option<String>,
    pub coordinate: Coordinate,
    /// Results farther than this (as a box) are dropped. `None` keeps all.
    pub radius_km: Option<f64>,
}

impl NamedPoint {
    #[must_use]
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            label: None,
            coordinate,
            radius_km: None,
        }
    }
}

/// Where a survey's tiles come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileSource {
    /// An `divisions x divisions` grid over `area`.
    Grid { area: BoundingBox, divisions: u32 },
    /// One tile per point. `radius_km`, when set, overrides every point's own.
    FixedList {
        points: Vec<NamedPoint>,
        radius_km: Option<f64>,
    },
}

impl TileSource {
    /// Grid over the box of `radius_km` around `center`.
    ///
    /// # Errors
    ///
    /// Propagates [`bounds_from_radius`] errors.
    pub fn around(center: Coordinate, radius_km: f64, divisions: u32) -> Result<Self, GeometryError> {
        Ok(Self::Grid {
            area: bounds_from_radius(center, radius_km)?,
            divisions,
        })
    }

    #[must_use]
    pub fn from_regions(regions: &[RegionConfig], radius_km: Option<f64>) -> Self {
        let points = regions
            .iter()
            .map(|r| NamedPoint {
                label: Some(r.name.clone()),
                coordinate: r.coordinate(),
                radius_km: r.radius_km,
            })
            .collect();
        Self::FixedList { points, radius_km }
    }

    /// Materialise the tiles in visiting order.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] for an invalid subdivision count, radius
    /// or point.
    pub fn tiles(&self) -> Result<Vec<Tile>, GeometryError> {
        match self {
            Self::Grid { area, divisions } => subdivide(area, *divisions),
            Self::FixedList { points, radius_km } => points
                .iter()
                .map(|point| {
                    let tile = match radius_km.or(point.radius_km) {
                        Some(radius) => Tile {
                            bounds: bounds_from_radius(point.coordinate, radius)?,
                            center: point.coordinate,
                            label: None,
                        },
                        None => {
                            if !point.coordinate.is_valid() {
                                return Err(GeometryError::InvalidCoordinate {
                                    input: point.coordinate.to_string(),
                                    reason: "out of range".to_string(),
                                });
                            }
                            Tile::unbounded(point.coordinate)
                        }
                    };
                    Ok(match &point.label {
                        Some(label) => tile.with_label(label.clone()),
                        None => tile,
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurveyOptions {
    pub fetch: FetchOptions,
    /// Tiles fetched at once. 1 is strictly sequential.
    pub concurrency: usize,
    /// Levels of 2x2 refinement applied to tiles that hit the page limit.
    pub refine_depth: u32,
}

impl Default for SurveyOptions {
    fn default() -> Self {
        Self {
            fetch: FetchOptions::default(),
            concurrency: 1,
            refine_depth: 0,
        }
    }
}

impl SurveyOptions {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            fetch: FetchOptions::from_config(config),
            concurrency: config.survey_max_concurrent_tiles,
            refine_depth: 0,
        }
    }
}

/// Snapshot passed to the progress callback after each completed tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurveyProgress {
    /// Index of the tile that just completed.
    pub tile_index: usize,
    pub tiles_completed: usize,
    /// Grows when refinement queues children.
    pub total_tiles: usize,
    pub total_pages: u64,
    /// Distinct records merged so far.
    pub records: usize,
}

impl SurveyProgress {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self) -> f64 {
        if self.total_tiles == 0 {
            return 0.0;
        }
        self.tiles_completed as f64 / self.total_tiles as f64
    }
}

/// Accumulator for one run. Owned by the merge loop only.
#[derive(Default)]
struct CrawlState {
    index: HashMap<RecordKey, usize>,
    records: Vec<StoreRecord>,
    warnings: Vec<TileWarning>,
    stats: TileStats,
    total_pages: u64,
}

impl CrawlState {
    /// Last write wins; the record keeps the slot of its first sighting.
    fn merge(&mut self, records: Vec<StoreRecord>) {
        for record in records {
            match self.index.entry(record.key()) {
                Entry::Occupied(slot) => self.records[*slot.get()] = record,
                Entry::Vacant(slot) => {
                    slot.insert(self.records.len());
                    self.records.push(record);
                }
            }
        }
    }

    fn progress(&self, tile_index: usize) -> SurveyProgress {
        SurveyProgress {
            tile_index,
            tiles_completed: self.stats.completed,
            total_tiles: self.stats.total,
            total_pages: self.total_pages,
            records: self.records.len(),
        }
    }

    fn into_report(self, query: &str, cancelled: bool) -> SurveyReport {
        SurveyReport::new(
            query,
            self.records,
            self.warnings,
            self.stats,
            self.total_pages,
            cancelled,
        )
    }
}

struct QueuedTile {
    index: usize,
    tile: Tile,
    depth: u32,
}

pub struct Surveyor<'a, S> {
    fetcher: TileFetcher<'a, S>,
    concurrency: usize,
    refine_depth: u32,
}

impl<'a, S: PlaceSearch> Surveyor<'a, S> {
    #[must_use]
    pub fn new(source: &'a S, options: SurveyOptions) -> Self {
        Self {
            fetcher: TileFetcher::new(source, options.fetch),
            concurrency: options.concurrency,
            refine_depth: options.refine_depth,
        }
    }

    /// Survey every tile of `tiles` for `query`.
    ///
    /// # Errors
    ///
    /// Only configuration errors, all raised before the first request. Tile
    /// failures become [`TileWarning`]s in the returned report.
    pub async fn run<F>(
        &self,
        query: &str,
        tiles: &TileSource,
        cancel: &CancelToken,
        progress: F,
    ) -> Result<SurveyReport, SurveyError>
    where
        F: FnMut(&SurveyProgress),
    {
        self.validate(query)?;
        let tiles = tiles.tiles()?;
        self.run_tiles(query, tiles, cancel, progress).await
    }

    /// Like [`Surveyor::run`] with tiles supplied directly.
    ///
    /// # Errors
    ///
    /// See [`Surveyor::run`]. An empty `tiles` is [`SurveyError::EmptyTileSet`].
    pub async fn run_tiles<F>(
        &self,
        query: &str,
        tiles: Vec<Tile>,
        cancel: &CancelToken,
        mut progress: F,
    ) -> Result<SurveyReport, SurveyError>
    where
        F: FnMut(&SurveyProgress),
    {
        self.validate(query)?;
        if tiles.is_empty() {
            return Err(SurveyError::EmptyTileSet);
        }

        let mut state = CrawlState::default();
        state.stats.total = tiles.len();
        let mut wave: Vec<QueuedTile> = tiles
            .into_iter()
            .enumerate()
            .map(|(index, tile)| QueuedTile {
                index,
                tile,
                depth: 0,
            })
            .collect();
        let mut cancelled = false;

        tracing::info!(
            query,
            tiles = state.stats.total,
            concurrency = self.concurrency,
            page_limit = self.fetcher.options().page_limit,
            "survey started"
        );

        while !wave.is_empty() && !cancelled {
            let mut next_wave = Vec::new();
            {
                let results = stream::iter(wave.iter())
                    .map(|queued| async move {
                        if cancel.is_cancelled() {
                            return (queued, None);
                        }
                        let fetched = self.fetcher.fetch_tile(query, &queued.tile, cancel).await;
                        (queued, Some(fetched))
                    })
                    .buffered(self.concurrency);
                let mut results = std::pin::pin!(results);

                while let Some((queued, fetched)) = results.next().await {
                    let Some(fetched) = fetched else {
                        cancelled = true;
                        continue;
                    };
                    if self.absorb(&mut state, queued, fetched, &mut next_wave) {
                        progress(&state.progress(queued.index));
                    } else {
                        cancelled = true;
                    }
                }
            }
            wave = next_wave;
        }

        if cancelled {
            tracing::warn!(
                completed = state.stats.completed,
                total = state.stats.total,
                records = state.records.len(),
                "survey cancelled; returning partial report"
            );
        } else {
            tracing::info!(
                records = state.records.len(),
                pages = state.total_pages,
                failed_tiles = state.stats.failed,
                "survey complete"
            );
        }

        Ok(state.into_report(query, cancelled))
    }

    fn validate(&self, query: &str) -> Result<(), SurveyError> {
        let page_limit = self.fetcher.options().page_limit;
        if page_limit < 1 {
            return Err(SurveyError::InvalidPageLimit(page_limit));
        }
        if self.concurrency < 1 {
            return Err(SurveyError::InvalidConcurrency(self.concurrency));
        }
        if query.trim().is_empty() {
            return Err(SurveyError::EmptyQuery);
        }
        Ok(())
    }

    /// Fold one tile's outcome into `state`. Returns `false` when the tile
    /// was cut short by cancellation and so does not count as completed.
    fn absorb(
        &self,
        state: &mut CrawlState,
        queued: &QueuedTile,
        fetched: TileFetch,
        next_wave: &mut Vec<QueuedTile>,
    ) -> bool {
        state.total_pages += u64::from(fetched.pages_fetched);
        let kept = fetched.records.len();
        state.merge(fetched.records);

        match fetched.termination {
            TileTermination::Cancelled => return false,
            TileTermination::Exhausted => state.stats.exhausted += 1,
            TileTermination::LimitReached => {
                state.stats.limit_reached += 1;
                if queued.depth < self.refine_depth {
                    refine(state, queued, next_wave);
                }
            }
            TileTermination::Failed { page, reason } => {
                state.stats.failed += 1;
                state.warnings.push(TileWarning {
                    tile_index: queued.index,
                    label: queued.tile.label.clone(),
                    reason: format!("page {page}: {reason}"),
                });
            }
        }
        state.stats.completed += 1;

        tracing::info!(
            tile_index = queued.index,
            label = queued.tile.label.as_deref().unwrap_or(""),
            pages = fetched.pages_fetched,
            records = kept,
            filtered_out = fetched.filtered_out,
            merged = state.records.len(),
            completed = state.stats.completed,
            total = state.stats.total,
            "tile complete"
        );
        true
    }
}

/// Queue the 2x2 children of a tile that hit the page limit. Unbounded
/// tiles cannot be split.
fn refine(state: &mut CrawlState, queued: &QueuedTile, next_wave: &mut Vec<QueuedTile>) {
    if queued.tile.bounds == BoundingBox::world() {
        return;
    }
    let children = match subdivide(&queued.tile.bounds, 2) {
        Ok(children) => children,
        Err(error) => {
            tracing::warn!(tile_index = queued.index, error = %error, "cannot refine tile");
            return;
        }
    };

    let parent = queued
        .tile
        .label
        .clone()
        .unwrap_or_else(|| queued.index.to_string());
    tracing::debug!(
        tile_index = queued.index,
        depth = queued.depth + 1,
        "page limit reached; refining tile"
    );
    state.stats.refined += 1;
    for (i, child) in children.into_iter().enumerate() {
        next_wave.push(QueuedTile {
            index: state.stats.total,
            tile: child.with_label(format!("{parent}/{i}")),
            depth: queued.depth + 1,
        });
        state.stats.total += 1;
    }
}

#[cfg(test)]
#[path = "survey_test.rs"]
mod tests;
