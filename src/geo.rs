//! Map markers for a regional snapshot.
//!
//! Snapshot rows are joined with the country atlas by ISO3 code. Rows without
//! a known location (aggregates, unknown codes) stay in the snapshot but get no
//! marker.

use serde::{Deserialize, Serialize};

use crate::data::CountryAtlas;
use crate::domain::RegionalSnapshot;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub country: String,
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapLayer {
    pub markers: Vec<MapMarker>,
    /// Snapshot rows left off the map for lack of coordinates.
    pub unlocated: usize,
}

impl MapLayer {
    /// Smallest and largest marker value, if any.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut it = self.markers.iter().map(|m| m.value);
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

pub fn markers(snapshot: &RegionalSnapshot, atlas: &CountryAtlas) -> MapLayer {
    let mut layer = MapLayer::default();
    for row in &snapshot.rows {
        match atlas.get(&row.country_code) {
            Some(loc) => layer.markers.push(MapMarker {
                country: row.country.clone(),
                country_code: row.country_code.clone(),
                latitude: loc.latitude,
                longitude: loc.longitude,
                value: row.value,
            }),
            None => layer.unlocated += 1,
        }
    }
    layer
}
