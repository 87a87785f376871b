//! Scripted search primitive for fetcher and survey tests.

use std::sync::Mutex;
use std::time::Duration;

use geosweep_core::Coordinate;
use serde_json::{json, Value};

use crate::client::PlaceSearch;
use crate::error::ScraperError;

type Responder = dyn Fn(Coordinate, u32) -> Result<Value, ScraperError> + Send + Sync;

pub(crate) struct ScriptedSearch {
    responder: Box<Responder>,
    calls: Mutex<Vec<(Coordinate, u32)>>,
    delay: Option<Duration>,
}

impl ScriptedSearch {
    pub(crate) fn new(
        responder: impl Fn(Coordinate, u32) -> Result<Value, ScraperError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls(&self) -> Vec<(Coordinate, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl PlaceSearch for ScriptedSearch {
    async fn search(
        &self,
        _query: &str,
        coordinate: Coordinate,
        page: u32,
    ) -> Result<Value, ScraperError> {
        self.calls.lock().unwrap().push((coordinate, page));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.responder)(coordinate, page)
    }
}

pub(crate) fn place(name: &str, address: &str, lon: f64, lat: f64) -> Value {
    json!({
        "name": name,
        "tel": "",
        "category": ["휴대폰"],
        "address": address,
        "roadAddress": "",
        "businessStatus": { "status": { "text": "영업 중" }, "businessHours": "" },
        "x": lon.to_string(),
        "y": lat.to_string()
    })
}

pub(crate) fn place_page(entries: Vec<Value>) -> Value {
    json!({ "result": { "place": { "list": entries } } })
}

pub(crate) fn empty_page() -> Value {
    place_page(Vec::new())
}

pub(crate) fn transport_error() -> ScraperError {
    ScraperError::UnexpectedStatus {
        status: 502,
        url: "http://search.test/p/api/search/allSearch".to_string(),
    }
}
