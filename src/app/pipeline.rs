//! Shared view pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//!
//! ```text
//! preload (all indicators) -> validate start/end -> fetch + country filter
//!     -> forecast gate -> validate comparison year -> regional snapshot
//! ```
//!
//! Every gate either passes or stops the pass with a [`Halt`] carrying a fixed
//! user-facing message. The forecast gate is the exception: too little data
//! only skips the forecast. Passes are stateless; the only thing shared
//! between them is the client's dataset cache.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::data::{Transport, WorldBankClient};
use crate::domain::{
    CountryUniverse, Indicator, IndicatorDataset, IndicatorSeries, RegionalSnapshot, ViewInputs,
    Year, YearSpan,
};
use crate::forecast::{DEFAULT_HORIZON, Forecast, Forecaster};
use crate::geo::{self, MapLayer};

/// A series needs strictly more points than this to be forecast.
pub const FORECAST_MIN_POINTS: usize = 5;

pub const NOT_ENOUGH_DATA: &str = "Not enough data to produce a forecast.";

/// Why a pipeline pass stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Halt {
    /// The API returned nothing (unavailable upstream or no rows).
    NoData,
    /// Start or end year is not a non-negative integer.
    InvalidYears,
    /// Start year is after end year.
    ReversedYears,
    /// Comparison year is not a non-negative integer.
    InvalidComparisonYear,
}

impl Halt {
    pub fn message(self) -> &'static str {
        match self {
            Halt::NoData => "No data available. Please try another option.",
            Halt::InvalidYears => "Please enter valid years.",
            Halt::ReversedYears => "The start year must not be after the end year.",
            Halt::InvalidComparisonYear => "Please enter a valid year for the map.",
        }
    }
}

impl fmt::Display for Halt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Datasets loaded at startup and the country list derived from them.
#[derive(Debug, Clone)]
pub struct Preload {
    pub span: YearSpan,
    pub datasets: BTreeMap<Indicator, IndicatorDataset>,
    pub countries: CountryUniverse,
}

impl Preload {
    pub fn dataset(&self, indicator: Indicator) -> Option<&IndicatorDataset> {
        self.datasets.get(&indicator)
    }
}

/// Fetch every indicator over `span`.
///
/// Any empty dataset stops the dashboard: without all of them there is no
/// trustworthy country list.
pub fn preload<T: Transport>(client: &WorldBankClient<T>, span: YearSpan) -> Result<Preload, Halt> {
    let datasets: BTreeMap<Indicator, IndicatorDataset> = Indicator::ALL
        .iter()
        .map(|&indicator| (indicator, client.fetch_indicator(indicator, span)))
        .collect();

    let missing: Vec<&str> = datasets
        .iter()
        .filter(|(_, ds)| ds.is_empty())
        .map(|(indicator, _)| indicator.code())
        .collect();
    if !missing.is_empty() {
        warn!(?missing, "preload incomplete");
        return Err(Halt::NoData);
    }

    let countries = datasets
        .get(&Indicator::PRIMARY)
        .map(CountryUniverse::from_dataset)
        .unwrap_or_default();
    info!(countries = countries.len(), "preload complete");

    Ok(Preload {
        span,
        datasets,
        countries,
    })
}

/// Validate the start/end free-text fields.
pub fn parse_year_range(start: &str, end: &str) -> Result<YearSpan, Halt> {
    let (Some(start), Some(end)) = (Year::parse_field(start), Year::parse_field(end)) else {
        return Err(Halt::InvalidYears);
    };
    let span = YearSpan::new(start, end);
    if !span.is_ordered() {
        return Err(Halt::ReversedYears);
    }
    Ok(span)
}

pub fn parse_comparison_year(raw: &str) -> Result<Year, Halt> {
    Year::parse_field(raw).ok_or(Halt::InvalidComparisonYear)
}

/// What happened to the optional forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    /// The user did not ask for one.
    Disabled,
    /// Too few points; the forecaster was not called.
    Skipped { points: usize },
    Ready(Forecast),
    /// The forecaster ran but could not fit the series.
    Failed { reason: String },
}

impl ForecastOutcome {
    /// Message to show next to the chart, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            ForecastOutcome::Disabled | ForecastOutcome::Ready(_) => None,
            ForecastOutcome::Skipped { .. } => Some(NOT_ENOUGH_DATA.to_string()),
            ForecastOutcome::Failed { reason } => Some(format!("Forecast failed: {reason}")),
        }
    }

    pub fn forecast(&self) -> Option<&Forecast> {
        match self {
            ForecastOutcome::Ready(fc) => Some(fc),
            _ => None,
        }
    }
}

/// Run the forecaster when enabled and the series is long enough.
pub fn forecast_gate<F: Forecaster + ?Sized>(
    forecaster: &F,
    series: &IndicatorSeries,
    enabled: bool,
) -> ForecastOutcome {
    if !enabled {
        return ForecastOutcome::Disabled;
    }

    let history = series.timestamped();
    if history.len() <= FORECAST_MIN_POINTS {
        debug!(points = history.len(), "forecast skipped");
        return ForecastOutcome::Skipped {
            points: history.len(),
        };
    }

    match forecaster.forecast(&history, DEFAULT_HORIZON) {
        Ok(fc) => ForecastOutcome::Ready(fc),
        Err(err) => {
            warn!(model = forecaster.name(), error = %err, "forecast failed");
            ForecastOutcome::Failed {
                reason: err.to_string(),
            }
        }
    }
}

/// Everything one pass produced, up to the point where it stopped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutcome {
    pub indicator: Indicator,
    pub country: String,
    pub span: Option<YearSpan>,
    pub series: Option<IndicatorSeries>,
    pub forecast: ForecastOutcome,
    pub regional: Option<RegionalSnapshot>,
    pub halt: Option<Halt>,
}

impl RenderOutcome {
    fn new(inputs: &ViewInputs) -> Self {
        Self {
            indicator: inputs.indicator,
            country: inputs.country.clone(),
            span: None,
            series: None,
            forecast: ForecastOutcome::Disabled,
            regional: None,
            halt: None,
        }
    }

    fn halted(mut self, halt: Halt) -> Self {
        debug!(?halt, "pipeline halted");
        self.halt = Some(halt);
        self
    }

    /// Every user-facing message of this pass, in display order.
    pub fn messages(&self) -> Vec<String> {
        let mut out = Vec::new();
        if let Some(msg) = self.forecast.message() {
            out.push(msg);
        }
        if let Some(halt) = self.halt {
            out.push(halt.message().to_string());
        }
        out
    }
}

/// One pass of the view pipeline (steps 3 to 7; preload happens once).
pub fn render<T: Transport, F: Forecaster + ?Sized>(
    client: &WorldBankClient<T>,
    forecaster: &F,
    inputs: &ViewInputs,
) -> RenderOutcome {
    let mut out = RenderOutcome::new(inputs);

    let span = match parse_year_range(&inputs.start_year, &inputs.end_year) {
        Ok(span) => span,
        Err(halt) => return out.halted(halt),
    };
    out.span = Some(span);

    let dataset = client.fetch_indicator(inputs.indicator, span);
    if dataset.is_empty() {
        return out.halted(Halt::NoData);
    }

    let series = dataset.for_country(&inputs.country);
    out.forecast = forecast_gate(forecaster, &series, inputs.forecast);
    out.series = Some(series);

    let year = match parse_comparison_year(&inputs.comparison_year) {
        Ok(year) => year,
        Err(halt) => return out.halted(halt),
    };

    // The full dataset, not the country series.
    out.regional = Some(RegionalSnapshot {
        year,
        rows: dataset.for_year(year),
    });

    out
}

/// Place the regional snapshot on the map (no-op when the pass halted earlier).
pub fn map_layer<T: Transport>(client: &WorldBankClient<T>, outcome: &RenderOutcome) -> Option<MapLayer> {
    let snapshot = outcome.regional.as_ref()?;
    Some(geo::markers(snapshot, &client.locations()))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use chrono::NaiveDate;

    use super::*;
    use crate::data::testing::{scripted_client, FakeWorld, ScriptedTransport};
    use crate::forecast::{ForecastError, ForecastHorizon, LinearTrend};

    /// Records calls and returns an empty forecast.
    #[derive(Default)]
    struct RecordingForecaster {
        calls: RefCell<Vec<(usize, ForecastHorizon)>>,
        fail: bool,
    }

    impl Forecaster for RecordingForecaster {
        fn name(&self) -> &str {
            "recording"
        }

        fn forecast(
            &self,
            history: &[(NaiveDate, f64)],
            horizon: ForecastHorizon,
        ) -> Result<Forecast, ForecastError> {
            self.calls.borrow_mut().push((history.len(), horizon));
            if self.fail {
                return Err(ForecastError::Unsolvable {
                    model: "recording".to_string(),
                });
            }
            Ok(Forecast {
                model: "recording".to_string(),
                horizon,
                history: history.to_vec(),
                points: Vec::new(),
            })
        }
    }

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|v| Some(*v)).collect()
    }

    /// Brazil and Chile for every indicator, 2005..=2020.
    fn world() -> FakeWorld {
        let mut world = FakeWorld::new();
        for (i, indicator) in Indicator::ALL.iter().enumerate() {
            let base = (i as f64 + 1.0) * 100.0;
            let brazil: Vec<f64> = (0..16).map(|k| base + k as f64).collect();
            let chile: Vec<f64> = (0..16).map(|k| base / 2.0 + k as f64).collect();
            world = world
                .with_series(indicator.code(), "Brazil", "BRA", 2005, &some(&brazil))
                .with_series(indicator.code(), "Chile", "CHL", 2005, &some(&chile));
        }
        world
    }

    fn inputs(indicator: Indicator, country: &str, start: &str, end: &str, compare: &str) -> ViewInputs {
        ViewInputs {
            country: country.to_string(),
            indicator,
            forecast: true,
            start_year: start.to_string(),
            end_year: end.to_string(),
            comparison_year: compare.to_string(),
        }
    }

    #[test]
    fn preload_derives_countries_from_the_primary_indicator() {
        let client = scripted_client(world().into_transport());
        let pre = preload(&client, YearSpan::new(Year::new(1960), Year::new(2020))).unwrap();

        assert_eq!(pre.datasets.len(), 4);
        assert_eq!(pre.countries.names(), ["Brazil", "Chile"]);
        assert_eq!(client.transport().calls(), 4);
        let dates: Vec<String> = client
            .transport()
            .requests()
            .iter()
            .filter_map(|r| r.param("date").map(str::to_string))
            .collect();
        assert!(dates.iter().all(|d| d == "1960:2020"));
    }

    #[test]
    fn preload_stops_when_any_indicator_is_empty() {
        let mut world = FakeWorld::new();
        for indicator in &Indicator::ALL[..3] {
            world = world.with_series(indicator.code(), "Brazil", "BRA", 2000, &some(&[1.0]));
        }
        let client = scripted_client(world.into_transport());
        let err = preload(&client, YearSpan::new(Year::new(1960), Year::new(2020))).unwrap_err();
        assert_eq!(err, Halt::NoData);
        // Every indicator is still attempted.
        assert_eq!(client.transport().calls(), 4);
    }

    #[test]
    fn preload_stops_when_the_api_is_down() {
        let client = scripted_client(ScriptedTransport::always(500, "down"));
        let err = preload(&client, YearSpan::new(Year::new(1960), Year::new(2020))).unwrap_err();
        assert_eq!(err.message(), "No data available. Please try another option.");
    }

    #[test]
    fn end_to_end_population_for_brazil() {
        let client = scripted_client(world().into_transport());
        let fc = RecordingForecaster::default();
        let out = render(
            &client,
            &fc,
            &inputs(Indicator::Population, "Brazil", "2010", "2015", "2015"),
        );

        assert_eq!(out.halt, None);
        let series = out.series.as_ref().unwrap();
        assert_eq!(series.country, "Brazil");
        assert_eq!(series.indicator_code, "SP.POP.TOTL");
        let years: Vec<u32> = series.points.iter().map(|p| p.year.get()).collect();
        assert_eq!(years, vec![2010, 2011, 2012, 2013, 2014, 2015]);
        assert_eq!(series.points[0].value, 305.0);

        let req = client.transport().requests().pop().unwrap();
        assert_eq!(req.param("date"), Some("2010:2015"));
        assert!(req.url.ends_with("/indicator/SP.POP.TOTL"));
    }

    #[test]
    fn five_points_skip_the_forecast() {
        let client = scripted_client(world().into_transport());
        let fc = RecordingForecaster::default();
        let out = render(
            &client,
            &fc,
            &inputs(Indicator::GdpPerCapita, "Brazil", "2010", "2014", "2014"),
        );

        assert_eq!(out.forecast, ForecastOutcome::Skipped { points: 5 });
        assert!(fc.calls.borrow().is_empty());
        assert_eq!(out.messages(), vec![NOT_ENOUGH_DATA.to_string()]);
        // Soft failure: the rest of the pass still runs.
        assert!(out.regional.is_some());
    }

    #[test]
    fn six_points_request_five_yearly_periods() {
        let client = scripted_client(world().into_transport());
        let fc = RecordingForecaster::default();
        let out = render(
            &client,
            &fc,
            &inputs(Indicator::GdpPerCapita, "Brazil", "2010", "2015", "2015"),
        );

        assert!(matches!(out.forecast, ForecastOutcome::Ready(_)));
        assert_eq!(*fc.calls.borrow(), vec![(6, DEFAULT_HORIZON)]);
    }

    #[test]
    fn forecast_toggle_off_never_calls_the_forecaster() {
        let client = scripted_client(world().into_transport());
        let fc = RecordingForecaster::default();
        let mut view = inputs(Indicator::GdpPerCapita, "Brazil", "2005", "2020", "2020");
        view.forecast = false;
        let out = render(&client, &fc, &view);
        assert_eq!(out.forecast, ForecastOutcome::Disabled);
        assert!(fc.calls.borrow().is_empty());
    }

    #[test]
    fn forecaster_failure_is_soft() {
        let client = scripted_client(world().into_transport());
        let fc = RecordingForecaster {
            fail: true,
            ..Default::default()
        };
        let out = render(
            &client,
            &fc,
            &inputs(Indicator::GdpPerCapita, "Brazil", "2005", "2020", "2020"),
        );
        assert!(matches!(out.forecast, ForecastOutcome::Failed { .. }));
        assert_eq!(out.halt, None);
        assert!(out.regional.is_some());
    }

    #[test]
    fn built_in_forecaster_extends_a_real_series() {
        let client = scripted_client(world().into_transport());
        let out = render(
            &client,
            &LinearTrend::new(),
            &inputs(Indicator::LifeExpectancy, "Chile", "2005", "2020", "2020"),
        );
        let fc = out.forecast.forecast().unwrap();
        let future: Vec<i32> = fc.future().map(|p| p.year()).collect();
        assert_eq!(future, vec![2021, 2022, 2023, 2024, 2025]);
    }

    #[test]
    fn regional_snapshot_keeps_only_the_comparison_year() {
        let world = FakeWorld::new()
            .with_series("SP.POP.TOTL", "Brazil", "BRA", 2018, &some(&[1.0, 2.0, 3.0]))
            .with_series("SP.POP.TOTL", "Chile", "CHL", 2018, &[Some(4.0), Some(5.0), None])
            .with_series("SP.POP.TOTL", "Peru", "PER", 2018, &some(&[6.0, 7.0, 8.0]));
        let client = scripted_client(world.into_transport());
        let out = render(
            &client,
            &RecordingForecaster::default(),
            &inputs(Indicator::Population, "Brazil", "2018", "2020", "2020"),
        );

        let snapshot = out.regional.unwrap();
        assert_eq!(snapshot.year, Year::new(2020));
        let rows: Vec<(&str, f64)> = snapshot
            .rows
            .iter()
            .map(|r| (r.country.as_str(), r.value))
            .collect();
        assert_eq!(rows, vec![("Brazil", 3.0), ("Peru", 8.0)]);
        assert!(snapshot.rows.iter().all(|r| r.year == Year::new(2020)));
    }

    #[test]
    fn non_numeric_years_halt_before_fetching() {
        let client = scripted_client(world().into_transport());
        let fc = RecordingForecaster::default();

        for (start, end) in [("abcd", "2020"), ("2000", "abcd"), ("", "2020"), ("20 00", "2020")] {
            let out = render(&client, &fc, &inputs(Indicator::Population, "Brazil", start, end, "2020"));
            assert_eq!(out.halt, Some(Halt::InvalidYears));
            assert_eq!(out.messages(), vec!["Please enter valid years.".to_string()]);
            assert!(out.series.is_none());
            assert!(out.regional.is_none());
        }
        assert_eq!(client.transport().calls(), 0);
        assert!(fc.calls.borrow().is_empty());
    }

    #[test]
    fn reversed_years_halt_before_fetching() {
        let client = scripted_client(world().into_transport());
        let out = render(
            &client,
            &RecordingForecaster::default(),
            &inputs(Indicator::Population, "Brazil", "2020", "2010", "2020"),
        );
        assert_eq!(out.halt, Some(Halt::ReversedYears));
        assert_eq!(client.transport().calls(), 0);
    }

    #[test]
    fn non_numeric_comparison_year_keeps_the_chart() {
        let client = scripted_client(world().into_transport());
        let out = render(
            &client,
            &RecordingForecaster::default(),
            &inputs(Indicator::Population, "Brazil", "2010", "2015", "abcd"),
        );
        assert_eq!(out.halt, Some(Halt::InvalidComparisonYear));
        assert!(out.series.is_some());
        assert!(out.regional.is_none());
        assert!(map_layer(&client, &out).is_none());
    }

    #[test]
    fn empty_selected_dataset_halts() {
        let client = scripted_client(world().into_transport());
        let out = render(
            &client,
            &RecordingForecaster::default(),
            &inputs(Indicator::Population, "Brazil", "1900", "1910", "1905"),
        );
        assert_eq!(out.halt, Some(Halt::NoData));
        assert!(out.series.is_none());
    }

    #[test]
    fn repeated_passes_are_served_from_cache() {
        let client = scripted_client(world().into_transport());
        let fc = RecordingForecaster::default();
        let view = inputs(Indicator::Population, "Brazil", "2010", "2015", "2015");
        let first = render(&client, &fc, &view);
        let second = render(&client, &fc, &view);
        assert_eq!(first, second);
        assert_eq!(client.transport().calls(), 1);
    }
}
