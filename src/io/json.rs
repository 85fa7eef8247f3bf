//! Write a whole render outcome as JSON.
//!
//! The file wraps the [`RenderOutcome`] with the map layer (when computed) and
//! the messages a user would have seen, so scripted runs can inspect halts
//! without parsing terminal output.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use crate::app::pipeline::RenderOutcome;
use crate::error::AppError;
use crate::geo::MapLayer;

#[derive(Debug, Serialize)]
pub struct OutcomeFile<'a> {
    pub tool: &'static str,
    pub indicator_code: &'static str,
    pub outcome: &'a RenderOutcome,
    pub map: Option<&'a MapLayer>,
    pub messages: Vec<String>,
}

impl<'a> OutcomeFile<'a> {
    pub fn new(outcome: &'a RenderOutcome, map: Option<&'a MapLayer>) -> Self {
        Self {
            tool: "wdi",
            indicator_code: outcome.indicator.code(),
            outcome,
            map,
            messages: outcome.messages(),
        }
    }
}

pub fn write_outcome_json(path: &Path, outcome: &RenderOutcome, map: Option<&MapLayer>) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create JSON export '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(BufWriter::new(file), &OutcomeFile::new(outcome, map))
        .map_err(|e| AppError::new(4, format!("Failed to write JSON export: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::app::pipeline::{ForecastOutcome, Halt};
    use crate::domain::{Indicator, IndicatorSeries, SeriesPoint, Year, YearSpan};

    #[test]
    fn halted_outcome_keeps_partial_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outcome.json");
        let outcome = RenderOutcome {
            indicator: Indicator::Population,
            country: "Brazil".to_string(),
            span: Some(YearSpan::new(Year::new(2010), Year::new(2011))),
            series: Some(IndicatorSeries {
                country: "Brazil".to_string(),
                indicator_code: "SP.POP.TOTL".to_string(),
                points: vec![SeriesPoint { year: Year::new(2010), value: 1.0 }],
            }),
            forecast: ForecastOutcome::Skipped { points: 1 },
            regional: None,
            halt: Some(Halt::InvalidComparisonYear),
        };

        write_outcome_json(&path, &outcome, None).unwrap();
        let v: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert_eq!(v["tool"], "wdi");
        assert_eq!(v["indicator_code"], "SP.POP.TOTL");
        assert_eq!(v["outcome"]["indicator"], "population");
        assert_eq!(v["outcome"]["halt"], "invalid_comparison_year");
        assert_eq!(v["outcome"]["forecast"]["status"], "skipped");
        assert_eq!(v["outcome"]["series"]["points"][0]["year"], 2010);
        assert!(v["map"].is_null());
        assert_eq!(
            v["messages"],
            serde_json::json!([
                "Not enough data to produce a forecast.",
                "Please enter a valid year for the map."
            ])
        );
    }
}
