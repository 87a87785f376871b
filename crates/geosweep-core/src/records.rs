//! Store records produced by a survey.

use serde::{Deserialize, Serialize};

use crate::geometry::Coordinate;

/// Text the search service uses when it has no operating status for a place.
pub const SERVICE_UNKNOWN_STATUS_TEXT: &str = "영업 상태 미상";

/// Operating status of a place at crawl time.
///
/// Serialises as `"OPEN"`, `"CLOSED"`, `"UNKNOWN"` or the raw service text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BusinessStatus {
    Open,
    Closed,
    #[default]
    Unknown,
    Other(String),
}

impl BusinessStatus {
    /// Map the service's free-text status onto the closed set, keeping
    /// unrecognised text verbatim.
    #[must_use]
    pub fn from_service_text(text: &str) -> Self {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed == SERVICE_UNKNOWN_STATUS_TEXT {
            return Self::Unknown;
        }
        match trimmed.to_lowercase().as_str() {
            "영업 중" | "영업중" | "open" => Self::Open,
            "영업 종료" | "영업종료" | "휴무" | "closed" => Self::Closed,
            "unknown" => Self::Unknown,
            _ => Self::Other(trimmed.to_owned()),
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Unknown => "UNKNOWN",
            Self::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for BusinessStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for BusinessStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "OPEN" => Self::Open,
            "CLOSED" => Self::Closed,
            "UNKNOWN" => Self::Unknown,
            _ => Self::from_service_text(&value),
        }
    }
}

impl From<BusinessStatus> for String {
    fn from(value: BusinessStatus) -> Self {
        match value {
            BusinessStatus::Other(raw) => raw,
            other => other.label().to_owned(),
        }
    }
}

/// Deduplication identity of a record: the `(name, address)` pair, compared
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    pub name: String,
    pub address: String,
}

/// One place returned by the search service, normalised.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreRecord {
    pub name: String,
    pub phone: String,
    /// Ordered as the service returned them; treated as a set.
    pub categories: Vec<String>,
    pub address: String,
    pub road_address: String,
    pub business_status: BusinessStatus,
    pub business_hours: String,
    pub coordinate: Option<Coordinate>,
}

impl StoreRecord {
    #[must_use]
    pub fn key(&self) -> RecordKey {
        RecordKey {
            name: self.name.clone(),
            address: self.address.clone(),
        }
    }

    /// Categories joined with `,` for display.
    #[must_use]
    pub fn display_categories(&self) -> String {
        self.categories.join(",")
    }
}
