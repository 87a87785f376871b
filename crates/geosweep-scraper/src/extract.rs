//! Normalise one raw search page into [`StoreRecord`]s.
//!
//! Never fails: missing, null or wrongly typed fields fall back to empty
//! strings, `UNKNOWN` status and no coordinate. A page without a place list
//! yields an empty result, which pagination reads as exhaustion.

use geosweep_core::{BusinessStatus, Coordinate, StoreRecord};
use serde_json::Value;

/// Records from one page, in service order.
pub type PageResult = Vec<StoreRecord>;

const PLACE_LIST_POINTER: &str = "/result/place/list";

#[must_use]
pub fn extract(page: &Value) -> PageResult {
    let Some(entries) = page.pointer(PLACE_LIST_POINTER).and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let record = extract_record(entry);
            if record.is_none() {
                tracing::debug!(entry = %entry, "skipping non-object place entry");
            }
            record
        })
        .collect()
}

fn extract_record(entry: &Value) -> Option<StoreRecord> {
    let obj = entry.as_object()?;
    let status = obj.get("businessStatus");

    Some(StoreRecord {
        name: text(obj.get("name")),
        phone: text(obj.get("tel")),
        categories: categories(obj.get("category")),
        address: text(obj.get("address")),
        road_address: text(obj.get("roadAddress")),
        business_status: BusinessStatus::from_service_text(&text(
            status.and_then(|s| s.pointer("/status/text")),
        )),
        business_hours: text(status.and_then(|s| s.get("businessHours"))),
        coordinate: coordinate(obj.get("x"), obj.get("y")),
    })
}

/// Trimmed string, or `""` for anything that is not a string.
fn text(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_owned())
        .unwrap_or_default()
}

fn categories(value: Option<&Value>) -> Vec<String> {
    let raw: Vec<&str> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(s)) => s.split(',').collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
        .collect()
}

fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn coordinate(x: Option<&Value>, y: Option<&Value>) -> Option<Coordinate> {
    let coord = Coordinate::new(number(x)?, number(y)?);
    coord.is_valid().then_some(coord)
}
