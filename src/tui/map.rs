//! World map with one marker per country of the regional snapshot.
//!
//! Markers are colored by value tercile (low, mid, high) across the layer.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::{
        Block, Borders, Widget,
        canvas::{Canvas, Map, MapResolution, Points},
    },
};

use crate::geo::MapLayer;

const BUCKET_COLORS: [Color; 3] = [Color::Blue, Color::Yellow, Color::Red];

pub struct MarkerMap<'a> {
    pub layer: Option<&'a MapLayer>,
    /// ISO3 code of the selected country, drawn on top in white.
    pub highlight: Option<&'a str>,
    pub title: String,
}

impl<'a> Widget for MarkerMap<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut buckets: [Vec<(f64, f64)>; 3] = Default::default();
        let mut selected = Vec::new();

        if let Some(layer) = self.layer {
            let range = layer.value_range();
            for m in &layer.markers {
                let coord = (m.longitude, m.latitude);
                if self.highlight == Some(m.country_code.as_str()) {
                    selected.push(coord);
                } else if let Some((lo, hi)) = range {
                    buckets[value_bucket(m.value, lo, hi)].push(coord);
                }
            }
        }

        Canvas::default()
            .block(Block::default().title(self.title).borders(Borders::ALL))
            .marker(Marker::Braille)
            .x_bounds([-180.0, 180.0])
            .y_bounds([-90.0, 90.0])
            .paint(|ctx| {
                ctx.draw(&Map {
                    color: Color::DarkGray,
                    resolution: MapResolution::High,
                });
                ctx.layer();
                for (coords, color) in buckets.iter().zip(BUCKET_COLORS) {
                    ctx.draw(&Points { coords, color });
                }
                ctx.draw(&Points {
                    coords: &selected,
                    color: Color::White,
                });
            })
            .render(area, buf);
    }
}

/// Tercile of `value` within `[lo, hi]`: 0 (low), 1 (mid) or 2 (high).
pub fn value_bucket(value: f64, lo: f64, hi: f64) -> usize {
    if !(hi > lo) {
        return 1;
    }
    let u = ((value - lo) / (hi - lo)).clamp(0.0, 1.0);
    ((u * 3.0) as usize).min(2)
}
