//! World Bank API integration for indicator observations.
//!
//! One request per `RequestKey`:
//!
//! ```text
//! GET {base}/country/all/indicator/{code}?format=json&date={start}:{end}&per_page=1000
//! ```
//!
//! The body is a two-element array `[page_meta, observations]`. Only the first
//! page is read; when the API reports more pages the extra rows are missing
//! from the dataset and a warning is logged.

use std::sync::RwLock;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::data::cache::DatasetCache;
use crate::data::countries::CountryAtlas;
use crate::data::error::FetchError;
use crate::data::transport::{ReqwestTransport, Transport};
use crate::domain::{Indicator, IndicatorDataset, Observation, RequestKey, Year, YearSpan};

pub const DEFAULT_BASE_URL: &str = "https://api.worldbank.org/v2";

/// Page size requested from the API.
pub const PER_PAGE: u32 = 1000;

pub struct WorldBankClient<T: Transport = ReqwestTransport> {
    transport: T,
    base_url: String,
    cache: DatasetCache,
    pub(crate) atlas: RwLock<Option<CountryAtlas>>,
}

impl WorldBankClient<ReqwestTransport> {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            ReqwestTransport::new(),
            settings.api_base.clone(),
            DatasetCache::new(settings.cache),
        )
    }
}

impl<T: Transport> WorldBankClient<T> {
    pub fn new(transport: T, base_url: impl Into<String>, cache: DatasetCache) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            cache,
            atlas: RwLock::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn cache(&self) -> &DatasetCache {
        &self.cache
    }

    /// Fetch observations for `indicator_code` over `start..=end`.
    ///
    /// Never fails: any upstream problem yields an empty dataset, which callers
    /// treat as "no data". Results (empty ones included) are memoized per key
    /// until the cache drops them.
    pub fn fetch(&self, indicator_code: &str, start: Year, end: Year) -> IndicatorDataset {
        let key = RequestKey::new(indicator_code, start, end);
        self.cache.get_or_load(&key, || match self.try_fetch(&key) {
            Ok(dataset) => dataset,
            Err(err) => {
                warn!(%key, error = %err, "indicator fetch failed; treating as no data");
                IndicatorDataset::empty(key.clone())
            }
        })
    }

    pub fn fetch_indicator(&self, indicator: Indicator, span: YearSpan) -> IndicatorDataset {
        self.fetch(indicator.code(), span.start, span.end)
    }

    /// Uncached fetch that keeps the failure reason.
    pub fn try_fetch(&self, key: &RequestKey) -> Result<IndicatorDataset, FetchError> {
        if !key.span().is_ordered() {
            return Err(FetchError::ReversedRange {
                start: key.start,
                end: key.end,
            });
        }

        let url = format!("{}/country/all/indicator/{}", self.base_url, key.indicator_code);
        let query = [
            ("format", "json".to_string()),
            ("date", key.date_param()),
            ("per_page", PER_PAGE.to_string()),
        ];

        info!(%key, "fetching indicator");
        let resp = self.transport.get(&url, &query)?;
        if !resp.is_ok() {
            return Err(FetchError::Status {
                url,
                status: resp.status,
            });
        }

        let rows = parse_observations(&url, &resp.body)?;
        info!(%key, rows = rows.len(), "indicator fetched");
        Ok(IndicatorDataset::new(key.clone(), rows))
    }

    pub(crate) fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<Value>, FetchError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let resp = self.transport.get(&url, query)?;
        if !resp.is_ok() {
            return Err(FetchError::Status {
                url,
                status: resp.status,
            });
        }
        parse_envelope(&url, &resp.body)
    }
}

#[derive(Debug, Deserialize)]
struct RawObservation {
    country: NamedRef,
    #[serde(default)]
    countryiso3code: String,
    date: String,
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    value: String,
}

/// Parse the top-level `[meta, rows]` array and log pagination/API messages.
pub(crate) fn parse_envelope(url: &str, body: &str) -> Result<Vec<Value>, FetchError> {
    let envelope: Vec<Value> = serde_json::from_str(body).map_err(|source| FetchError::Payload {
        url: url.to_string(),
        source,
    })?;

    if let Some(meta) = envelope.first() {
        if let Some(message) = meta.get("message") {
            warn!(%url, %message, "API returned a message instead of data");
        }
        let pages = meta.get("pages").and_then(lenient_u64).unwrap_or(1);
        if pages > 1 {
            let total = meta.get("total").and_then(lenient_u64).unwrap_or(0);
            warn!(%url, pages, total, "response spans several pages; only the first page is used");
        }
    }

    Ok(envelope)
}

fn parse_observations(url: &str, body: &str) -> Result<Vec<Observation>, FetchError> {
    let envelope = parse_envelope(url, body)?;
    let items = match envelope.get(1) {
        Some(Value::Array(items)) => items,
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(other) => {
            warn!(%url, kind = value_kind(other), "unexpected observation list; treating as empty");
            return Ok(Vec::new());
        }
    };

    let mut out = Vec::with_capacity(items.len());
    let (mut null_values, mut bad_dates, mut malformed) = (0usize, 0usize, 0usize);

    for item in items {
        let raw = match RawObservation::deserialize(item) {
            Ok(raw) => raw,
            Err(err) => {
                malformed += 1;
                debug!(%url, error = %err, "skipping malformed observation");
                continue;
            }
        };
        let Some(value) = raw.value.filter(|v| v.is_finite()) else {
            null_values += 1;
            continue;
        };
        let Some(year) = Year::from_api_date(&raw.date) else {
            bad_dates += 1;
            continue;
        };
        out.push(Observation {
            country: raw.country.value,
            country_code: raw.countryiso3code,
            year,
            value,
        });
    }

    if malformed > 0 || bad_dates > 0 {
        warn!(%url, malformed, bad_dates, "dropped unusable observations");
    }
    debug!(%url, kept = out.len(), null_values, "observations parsed");

    Ok(out)
}

/// The API has served numeric metadata both as numbers and as strings.
fn lenient_u64(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
