pub mod cancel;
pub mod client;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod report;
pub(crate) mod retry;
pub mod survey;

#[cfg(test)]
pub(crate) mod test_support;

pub use cancel::CancelToken;
pub use client::{NaverMapClient, PlaceSearch};
pub use error::{ScraperError, SurveyError};
pub use extract::{extract, PageResult};
pub use fetch::{FailurePolicy, FetchOptions, TileFetch, TileFetcher, TileTermination};
pub use report::{
    CategoryCount, RecordChange, SurveyDiff, SurveyReport, TileStats, TileWarning,
    TOP_CATEGORY_LIMIT,
};
pub use survey::{NamedPoint, SurveyOptions, SurveyProgress, Surveyor, TileSource};
