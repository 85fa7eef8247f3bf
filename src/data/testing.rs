//! In-memory stand-ins for the World Bank API.
//!
//! `ScriptedTransport` records every request and answers from a closure;
//! `FakeWorld` builds such a closure that serves indicator rows the way the
//! real API does (filtered by `date`, each country newest-first).

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::data::cache::DatasetCache;
use crate::data::error::FetchError;
use crate::data::transport::{HttpResponse, Transport};
use crate::data::worldbank::WorldBankClient;
use crate::domain::Year;

pub const TEST_BASE_URL: &str = "http://wb.test/v2";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

type Responder = dyn Fn(&RecordedRequest) -> Result<HttpResponse, FetchError> + Send + Sync;

pub struct ScriptedTransport {
    responder: Box<Responder>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new(
        responder: impl Fn(&RecordedRequest) -> Result<HttpResponse, FetchError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same status and body.
    pub fn always(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |_| {
            Ok(HttpResponse {
                status,
                body: body.clone(),
            })
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, url: &str, query: &[(&str, String)]) -> Result<HttpResponse, FetchError> {
        let request = RecordedRequest {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        };
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }
        (self.responder)(&request)
    }
}

pub fn scripted_client(transport: ScriptedTransport) -> WorldBankClient<ScriptedTransport> {
    WorldBankClient::new(transport, TEST_BASE_URL, DatasetCache::default())
}

pub fn observation_json(country: &str, code: &str, date: &str, value: Option<f64>) -> Value {
    json!({
        "indicator": {"id": "X", "value": "Test indicator"},
        "country": {"id": &code[..code.len().min(2)], "value": country},
        "countryiso3code": code,
        "date": date,
        "value": value,
        "unit": "",
        "obs_status": "",
        "decimal": 0
    })
}

/// A single-page response body.
pub fn envelope(rows: Vec<Value>) -> String {
    let total = rows.len();
    json!([
        {"page": 1, "pages": 1, "per_page": 1000, "total": total},
        rows
    ])
    .to_string()
}

/// Indicator data served by a fake API, keyed by indicator code.
#[derive(Debug, Clone, Default)]
pub struct FakeWorld {
    series: HashMap<String, Vec<(String, String, u32, Option<f64>)>>,
    locations: Vec<(String, String, f64, f64)>,
}

impl FakeWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `values[i]` for `first_year + i`.
    pub fn with_series(
        mut self,
        indicator_code: &str,
        country: &str,
        iso3: &str,
        first_year: u32,
        values: &[Option<f64>],
    ) -> Self {
        let rows = self.series.entry(indicator_code.to_string()).or_default();
        for (i, v) in values.iter().enumerate() {
            rows.push((country.to_string(), iso3.to_string(), first_year + i as u32, *v));
        }
        self
    }

    /// Serve `iso3` from the country endpoint at the given coordinates.
    pub fn with_location(mut self, iso3: &str, name: &str, latitude: f64, longitude: f64) -> Self {
        self.locations
            .push((iso3.to_string(), name.to_string(), latitude, longitude));
        self
    }

    pub fn into_transport(self) -> ScriptedTransport {
        ScriptedTransport::new(move |req| Ok(self.respond(req)))
    }

    fn respond(&self, req: &RecordedRequest) -> HttpResponse {
        let code = req.url.rsplit('/').next().unwrap_or_default();
        if code == "country" && !self.locations.is_empty() {
            let rows = self
                .locations
                .iter()
                .map(|(iso3, name, lat, lon)| {
                    json!({"id": iso3, "name": name, "latitude": lat.to_string(), "longitude": lon.to_string()})
                })
                .collect();
            return HttpResponse {
                status: 200,
                body: envelope(rows),
            };
        }
        let Some(rows) = self.series.get(code) else {
            return HttpResponse {
                status: 200,
                body: json!([{"message": [{"id": "120", "key": "Invalid value"}]}]).to_string(),
            };
        };

        let (start, end) = req
            .param("date")
            .and_then(|d| d.split_once(':'))
            .and_then(|(s, e)| Some((Year::parse_field(s)?, Year::parse_field(e)?)))
            .unwrap_or((Year::new(0), Year::new(u32::MAX)));

        let mut selected: Vec<&(String, String, u32, Option<f64>)> = rows
            .iter()
            .filter(|(_, _, year, _)| start.get() <= *year && *year <= end.get())
            .collect();
        // Countries keep insertion order; years newest-first within a country.
        let order: Vec<&str> = {
            let mut seen = Vec::new();
            for (country, _, _, _) in rows {
                if !seen.contains(&country.as_str()) {
                    seen.push(country.as_str());
                }
            }
            seen
        };
        selected.sort_by_key(|(country, _, year, _)| {
            let rank = order
                .iter()
                .position(|c| *c == country.as_str())
                .unwrap_or(usize::MAX);
            (rank, std::cmp::Reverse(*year))
        });

        let json_rows = selected
            .into_iter()
            .map(|(country, iso3, year, value)| observation_json(country, iso3, &year.to_string(), *value))
            .collect();

        HttpResponse {
            status: 200,
            body: envelope(json_rows),
        }
    }
}
