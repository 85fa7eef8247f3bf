//! Export series and regional snapshots to CSV.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::data::CountryAtlas;
use crate::domain::{IndicatorSeries, RegionalSnapshot};
use crate::error::AppError;
use crate::forecast::Forecast;

type CsvWriter = csv::Writer<BufWriter<File>>;

/// Write the country series to CSV, followed by forecast rows when present.
///
/// Observed rows leave the band columns empty; forecast rows leave `value`
/// empty and set `is_forecast`.
pub fn write_series_csv(
    path: &Path,
    series: &IndicatorSeries,
    forecast: Option<&Forecast>,
) -> Result<(), AppError> {
    let mut wtr = create(path)?;

    wtr.write_record([
        "country",
        "indicator_code",
        "year",
        "value",
        "yhat",
        "yhat_lower",
        "yhat_upper",
        "is_forecast",
    ])
    .map_err(write_err)?;

    for p in &series.points {
        wtr.write_record([
            series.country.as_str(),
            series.indicator_code.as_str(),
            p.year.to_string().as_str(),
            p.value.to_string().as_str(),
            "",
            "",
            "",
            "false",
        ])
        .map_err(write_err)?;
    }

    for p in forecast.into_iter().flat_map(Forecast::future) {
        wtr.write_record([
            series.country.as_str(),
            series.indicator_code.as_str(),
            p.year().to_string().as_str(),
            "",
            format!("{:.6}", p.yhat).as_str(),
            format!("{:.6}", p.yhat_lower).as_str(),
            format!("{:.6}", p.yhat_upper).as_str(),
            "true",
        ])
        .map_err(write_err)?;
    }

    finish(wtr)
}

/// Write the regional snapshot to CSV, with coordinates when the atlas knows them.
pub fn write_regional_csv(
    path: &Path,
    snapshot: &RegionalSnapshot,
    atlas: &CountryAtlas,
) -> Result<(), AppError> {
    let mut wtr = create(path)?;

    wtr.write_record(["country", "iso3", "year", "value", "latitude", "longitude"])
        .map_err(write_err)?;

    for r in &snapshot.rows {
        let (lat, lon) = atlas
            .get(&r.country_code)
            .map(|loc| (loc.latitude.to_string(), loc.longitude.to_string()))
            .unwrap_or_default();
        wtr.write_record([
            r.country.as_str(),
            r.country_code.as_str(),
            r.year.to_string().as_str(),
            r.value.to_string().as_str(),
            lat.as_str(),
            lon.as_str(),
        ])
        .map_err(write_err)?;
    }

    finish(wtr)
}

fn create(path: &Path) -> Result<CsvWriter, AppError> {
    File::create(path)
        .map(|f| csv::Writer::from_writer(BufWriter::new(f)))
        .map_err(|e| AppError::new(4, format!("Failed to create export CSV '{}': {e}", path.display())))
}

fn finish(mut wtr: CsvWriter) -> Result<(), AppError> {
    wtr.flush()
        .map_err(|e| AppError::new(4, format!("Failed to write export CSV: {e}")))
}

fn write_err(e: csv::Error) -> AppError {
    AppError::new(4, format!("Failed to write export CSV: {e}"))
}
