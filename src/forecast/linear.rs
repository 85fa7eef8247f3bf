//! Linear-trend forecaster.
//!
//! Fits `y = b0 + b1 * t` by least squares, where `t` is the time in years
//! since the first observation, and extrapolates the line over the horizon.
//!
//! The band around each prediction is `yhat ± z * σ`, with `σ` the residual
//! standard error (`sqrt(SSE / (n - 2))`) and `z` chosen for an 80% interval.

use chrono::NaiveDate;
use nalgebra::{DMatrix, DVector};

use super::{Forecast, ForecastError, ForecastHorizon, ForecastPoint, Forecaster};
use crate::math::solve_least_squares;

/// Two-sided 80% normal quantile.
const INTERVAL_Z: f64 = 1.281_551_565_545;

const DAYS_PER_YEAR: f64 = 365.25;

#[derive(Debug, Clone, Copy, Default)]
pub struct LinearTrend;

impl LinearTrend {
    pub fn new() -> Self {
        Self
    }
}

impl Forecaster for LinearTrend {
    fn name(&self) -> &str {
        "linear trend"
    }

    fn forecast(
        &self,
        history: &[(NaiveDate, f64)],
        horizon: ForecastHorizon,
    ) -> Result<Forecast, ForecastError> {
        let n = history.len();
        if n < 2 {
            return Err(ForecastError::TooFewPoints { needed: 2, got: n });
        }

        let origin = history.iter().map(|(d, _)| *d).min().unwrap_or(history[0].0);
        let years_since = |d: NaiveDate| (d - origin).num_days() as f64 / DAYS_PER_YEAR;

        let mut x = DMatrix::<f64>::zeros(n, 2);
        let mut y = DVector::<f64>::zeros(n);
        for (i, &(date, value)) in history.iter().enumerate() {
            x[(i, 0)] = 1.0;
            x[(i, 1)] = years_since(date);
            y[i] = value;
        }

        let unsolvable = || ForecastError::Unsolvable {
            model: self.name().to_string(),
        };
        let beta = solve_least_squares(&x, &y).ok_or_else(unsolvable)?;
        let (b0, b1) = (beta[0], beta[1]);
        let predict = |d: NaiveDate| b0 + b1 * years_since(d);

        let sse: f64 = history
            .iter()
            .map(|&(d, v)| (v - predict(d)).powi(2))
            .sum();
        let sigma = if n > 2 { (sse / (n - 2) as f64).sqrt() } else { 0.0 };
        if !sigma.is_finite() {
            return Err(unsolvable());
        }
        let half_width = INTERVAL_Z * sigma;

        let point = |timestamp: NaiveDate, is_future: bool| {
            let yhat = predict(timestamp);
            ForecastPoint {
                timestamp,
                yhat,
                yhat_lower: yhat - half_width,
                yhat_upper: yhat + half_width,
                is_future,
            }
        };

        let mut points: Vec<ForecastPoint> = history.iter().map(|&(d, _)| point(d, false)).collect();

        let last = history.iter().map(|(d, _)| *d).max().unwrap_or(origin);
        for k in 1..=horizon.periods {
            let ts = horizon
                .frequency
                .step(last, k)
                .ok_or(ForecastError::TimestampOverflow)?;
            points.push(point(ts, true));
        }

        if points.iter().any(|p| !p.yhat.is_finite()) {
            return Err(unsolvable());
        }

        Ok(Forecast {
            model: self.name().to_string(),
            horizon,
            history: history.to_vec(),
            points,
        })
    }
}
