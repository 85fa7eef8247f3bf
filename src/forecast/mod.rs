//! Forecasting collaborator.
//!
//! The view pipeline hands a country series over as generic
//! `(timestamp, value)` pairs plus a horizon, and gets back predictions for the
//! historical timestamps and the future periods. The model behind the
//! [`Forecaster`] trait is swappable; [`LinearTrend`] is the built-in one.

pub mod linear;

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

pub use linear::LinearTrend;

/// Spacing of forecast periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Yearly,
}

impl Frequency {
    /// The timestamp `n` periods after `from`.
    pub fn step(self, from: NaiveDate, n: u32) -> Option<NaiveDate> {
        match self {
            Frequency::Yearly => from.checked_add_months(Months::new(n.checked_mul(12)?)),
        }
    }
}

/// How far past the last observation to predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastHorizon {
    pub periods: u32,
    pub frequency: Frequency,
}

/// Five yearly periods.
pub const DEFAULT_HORIZON: ForecastHorizon = ForecastHorizon {
    periods: 5,
    frequency: Frequency::Yearly,
};

/// One predicted value with its uncertainty band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDate,
    pub yhat: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    /// `false` for timestamps that were part of the history.
    pub is_future: bool,
}

impl ForecastPoint {
    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub model: String,
    pub horizon: ForecastHorizon,
    pub history: Vec<(NaiveDate, f64)>,
    pub points: Vec<ForecastPoint>,
}

impl Forecast {
    pub fn future(&self) -> impl Iterator<Item = &ForecastPoint> {
        self.points.iter().filter(|p| p.is_future)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ForecastError {
    #[error("need at least {needed} observations to forecast, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("the {model} regression could not be solved for this series")]
    Unsolvable { model: String },
    #[error("forecast timestamps overflow the calendar")]
    TimestampOverflow,
}

pub trait Forecaster {
    fn name(&self) -> &str;

    fn forecast(
        &self,
        history: &[(NaiveDate, f64)],
        horizon: ForecastHorizon,
    ) -> Result<Forecast, ForecastError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yearly_steps_keep_the_day() {
        let d = NaiveDate::from_ymd_opt(2015, 1, 1).unwrap();
        assert_eq!(
            Frequency::Yearly.step(d, 3),
            NaiveDate::from_ymd_opt(2018, 1, 1)
        );
    }

    #[test]
    fn default_horizon_is_five_years() {
        assert_eq!(DEFAULT_HORIZON.periods, 5);
        assert_eq!(DEFAULT_HORIZON.frequency, Frequency::Yearly);
    }
}
