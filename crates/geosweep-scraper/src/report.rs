//! The result of one survey, and comparison against an earlier one.
//!
//! A [`SurveyReport`] is the only thing handed to rendering and export
//! code. It serialises to JSON as-is, which is also how a previous run is
//! read back for [`SurveyReport::compare`].

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use geosweep_core::{RecordKey, StoreRecord};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of categories kept in [`SurveyReport::top_categories`].
pub const TOP_CATEGORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

/// A tile that failed to fetch. The survey carried on without it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileWarning {
    pub tile_index: usize,
    pub label: Option<String>,
    pub reason: String,
}

/// Per-termination tile counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileStats {
    /// Tiles scheduled, including refinement children.
    pub total: usize,
    /// Tiles whose pagination finished, whatever the outcome.
    pub completed: usize,
    pub exhausted: usize,
    pub limit_reached: usize,
    pub failed: usize,
    /// Tiles split into children after hitting the page limit.
    pub refined: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyReport {
    pub run_id: Uuid,
    pub query: String,
    pub generated_at: DateTime<Utc>,
    /// Deduplicated by `(name, address)`, in order of first sighting.
    pub records: Vec<StoreRecord>,
    /// Keyed by [`geosweep_core::BusinessStatus::label`].
    pub status_counts: BTreeMap<String, usize>,
    pub top_categories: Vec<CategoryCount>,
    pub tile_warnings: Vec<TileWarning>,
    pub tiles: TileStats,
    pub total_pages: u64,
    /// `true` when the run stopped early; the records are partial.
    pub cancelled: bool,
}

impl SurveyReport {
    pub(crate) fn new(
        query: &str,
        records: Vec<StoreRecord>,
        tile_warnings: Vec<TileWarning>,
        tiles: TileStats,
        total_pages: u64,
        cancelled: bool,
    ) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            query: query.to_owned(),
            generated_at: Utc::now(),
            status_counts: status_counts(&records),
            top_categories: top_categories(&records, TOP_CATEGORY_LIMIT),
            records,
            tile_warnings,
            tiles,
            total_pages,
            cancelled,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Diff this report against `previous`, matching records by identity key.
    ///
    /// `added` follows this report's order, `removed` the previous one's.
    #[must_use]
    pub fn compare(&self, previous: &SurveyReport) -> SurveyDiff {
        let before: HashMap<RecordKey, &StoreRecord> =
            previous.records.iter().map(|r| (r.key(), r)).collect();
        let current_keys: HashSet<RecordKey> = self.records.iter().map(StoreRecord::key).collect();

        let mut diff = SurveyDiff::default();
        for record in &self.records {
            match before.get(&record.key()) {
                None => diff.added.push(record.clone()),
                Some(old) if *old != record => diff.changed.push(RecordChange {
                    before: (*old).clone(),
                    after: record.clone(),
                }),
                Some(_) => {}
            }
        }
        diff.removed = previous
            .records
            .iter()
            .filter(|r| !current_keys.contains(&r.key()))
            .cloned()
            .collect();
        diff
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordChange {
    pub before: StoreRecord,
    pub after: StoreRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurveyDiff {
    pub added: Vec<StoreRecord>,
    pub removed: Vec<StoreRecord>,
    pub changed: Vec<RecordChange>,
}

impl SurveyDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }
}

#[must_use]
pub fn status_counts(records: &[StoreRecord]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts
            .entry(record.business_status.label().to_owned())
            .or_insert(0) += 1;
    }
    counts
}

/// Most frequent individual categories, highest first.
///
/// A record counts once per distinct category it carries. Equal counts keep
/// the order in which the category was first seen across `records`.
#[must_use]
pub fn top_categories(records: &[StoreRecord], limit: usize) -> Vec<CategoryCount> {
    let mut counts: Vec<CategoryCount> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let mut seen: HashSet<&str> = HashSet::new();
        for category in &record.categories {
            if !seen.insert(category.as_str()) {
                continue;
            }
            if let Some(&i) = index.get(category.as_str()) {
                counts[i].count += 1;
            } else {
                index.insert(category.as_str(), counts.len());
                counts.push(CategoryCount {
                    category: category.clone(),
                    count: 1,
                });
            }
        }
    }

    // stable: ties stay in first-seen order
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(limit);
    counts
}
