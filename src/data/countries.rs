//! Country coordinates from the World Bank country endpoint.
//!
//! ```text
//! GET {base}/country?format=json&per_page=400
//! ```
//!
//! Each country row carries its capital's latitude/longitude as strings.
//! Aggregates (regions, income groups) have empty coordinates and are left out,
//! so they never get a map marker.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::data::error::FetchError;
use crate::data::transport::Transport;
use crate::data::worldbank::WorldBankClient;

/// Page size for the country listing (the API has ~300 entries).
const COUNTRY_PAGE_SIZE: u32 = 400;

#[derive(Debug, Clone, PartialEq)]
pub struct CountryLocation {
    pub iso3: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// ISO3 code → location lookup. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct CountryAtlas {
    by_code: Arc<HashMap<String, CountryLocation>>,
}

impl CountryAtlas {
    pub fn from_locations(locations: impl IntoIterator<Item = CountryLocation>) -> Self {
        let by_code = locations
            .into_iter()
            .map(|loc| (loc.iso3.clone(), loc))
            .collect();
        Self {
            by_code: Arc::new(by_code),
        }
    }

    pub fn get(&self, iso3: &str) -> Option<&CountryLocation> {
        self.by_code.get(iso3)
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawCountry {
    id: String,
    name: String,
    #[serde(default)]
    latitude: String,
    #[serde(default)]
    longitude: String,
}

impl<T: Transport> WorldBankClient<T> {
    /// Country coordinates, loaded once and kept until [`forget_locations`].
    ///
    /// A failed or empty load returns an empty atlas and is retried on the
    /// next call.
    ///
    /// [`forget_locations`]: WorldBankClient::forget_locations
    pub fn locations(&self) -> CountryAtlas {
        if let Some(atlas) = self.atlas.read().ok().and_then(|a| a.clone()) {
            return atlas;
        }
        match self.try_locations() {
            Ok(atlas) => {
                debug!(countries = atlas.len(), "country atlas loaded");
                if let Ok(mut slot) = self.atlas.write() {
                    *slot = Some(atlas.clone());
                }
                atlas
            }
            Err(err) => {
                warn!(error = %err, "country atlas unavailable; map markers disabled");
                CountryAtlas::default()
            }
        }
    }

    /// Drop the stored atlas so the next [`locations`](WorldBankClient::locations) refetches it.
    pub fn forget_locations(&self) {
        if let Ok(mut slot) = self.atlas.write() {
            *slot = None;
        }
    }

    /// Uncached atlas load. An envelope without a country list, or one with
    /// no located country, is an error.
    pub fn try_locations(&self) -> Result<CountryAtlas, FetchError> {
        let query = [
            ("format", "json".to_string()),
            ("per_page", COUNTRY_PAGE_SIZE.to_string()),
        ];
        let envelope = self.get_json("country", &query)?;
        let atlas = parse_countries(envelope.get(1));
        if atlas.is_empty() {
            return Err(FetchError::Empty {
                url: format!("{}/country", self.base_url()),
            });
        }
        Ok(atlas)
    }
}

fn parse_countries(items: Option<&Value>) -> CountryAtlas {
    let Some(Value::Array(items)) = items else {
        return CountryAtlas::default();
    };

    let locations = items.iter().filter_map(|item| {
        let raw = RawCountry::deserialize(item).ok()?;
        let latitude = parse_coordinate(&raw.latitude, 90.0)?;
        let longitude = parse_coordinate(&raw.longitude, 180.0)?;
        Some(CountryLocation {
            iso3: raw.id,
            name: raw.name,
            latitude,
            longitude,
        })
    });

    CountryAtlas::from_locations(locations)
}

fn parse_coordinate(raw: &str, limit: f64) -> Option<f64> {
    let v = raw.trim().parse::<f64>().ok()?;
    (v.is_finite() && v.abs() <= limit).then_some(v)
}
