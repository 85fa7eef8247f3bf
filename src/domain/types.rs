//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - shared between the fetcher, the view pipeline and both front-ends
//! - exported to JSON/CSV
//! - compared cheaply in tests

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A calendar year.
///
/// This is the only year representation used inside the crate. The World Bank
/// API returns years as strings and users type them into free-text fields; both
/// are coerced to `Year` at the boundary so comparisons never happen on text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Year(u32);

impl Year {
    pub const fn new(year: u32) -> Self {
        Self(year)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Parse a user-entered year field.
    ///
    /// Accepts only a non-empty run of ASCII digits (no sign, no whitespace).
    /// Values that do not fit a `u32` are rejected rather than clamped.
    pub fn parse_field(raw: &str) -> Option<Year> {
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        raw.parse::<u32>().ok().map(Year)
    }

    /// Coerce the `date` field of an API observation.
    ///
    /// Annual indicators report plain years (`"2020"`); anything else
    /// (quarterly `"2020Q1"`, monthly `"2020M01"`) is not a year.
    pub fn from_api_date(raw: &str) -> Option<Year> {
        Self::parse_field(raw.trim())
    }

    /// January 1st of this year, used as the forecast timestamp.
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(i32::try_from(self.0).ok()?, 1, 1)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive year range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearSpan {
    pub start: Year,
    pub end: Year,
}

impl YearSpan {
    pub const fn new(start: Year, end: Year) -> Self {
        Self { start, end }
    }

    pub fn is_ordered(&self) -> bool {
        self.start <= self.end
    }

    pub fn contains(&self, year: Year) -> bool {
        self.start <= year && year <= self.end
    }
}

/// Year span fetched for every indicator when the dashboard starts.
pub const DEFAULT_PRELOAD_SPAN: YearSpan = YearSpan::new(Year::new(1960), Year::new(2020));

/// The fixed set of indicators offered by the dashboard.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum Indicator {
    /// GDP per capita (current US$).
    GdpPerCapita,
    /// Life expectancy at birth, total (years).
    LifeExpectancy,
    /// Population, total.
    Population,
    /// Literacy rate, adult total (% of people ages 15 and above).
    Literacy,
}

impl Indicator {
    pub const ALL: [Indicator; 4] = [
        Indicator::GdpPerCapita,
        Indicator::LifeExpectancy,
        Indicator::Population,
        Indicator::Literacy,
    ];

    /// The indicator whose preloaded dataset defines the country universe.
    pub const PRIMARY: Indicator = Indicator::GdpPerCapita;

    /// World Bank indicator code.
    pub fn code(self) -> &'static str {
        match self {
            Indicator::GdpPerCapita => "NY.GDP.PCAP.CD",
            Indicator::LifeExpectancy => "SP.DYN.LE00.IN",
            Indicator::Population => "SP.POP.TOTL",
            Indicator::Literacy => "SE.ADT.LITR.ZS",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            Indicator::GdpPerCapita => "GDP per capita",
            Indicator::LifeExpectancy => "Life expectancy",
            Indicator::Population => "Total population",
            Indicator::Literacy => "Literacy rate",
        }
    }

    /// Unit label for chart axes.
    pub fn unit_label(self) -> &'static str {
        match self {
            Indicator::GdpPerCapita => "current US$",
            Indicator::LifeExpectancy => "years",
            Indicator::Population => "people",
            Indicator::Literacy => "% ages 15+",
        }
    }

    pub fn next(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = self.index();
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|i| *i == self).unwrap_or(0)
    }
}

/// One data point: a country's value for an indicator in a year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub country: String,
    pub country_code: String,
    pub year: Year,
    pub value: f64,
}

/// Cache key for a fetched dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub indicator_code: String,
    pub start: Year,
    pub end: Year,
}

impl RequestKey {
    pub fn new(indicator_code: impl Into<String>, start: Year, end: Year) -> Self {
        Self {
            indicator_code: indicator_code.into(),
            start,
            end,
        }
    }

    pub fn span(&self) -> YearSpan {
        YearSpan::new(self.start, self.end)
    }

    /// Value of the API's `date` query parameter.
    pub fn date_param(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{}", self.indicator_code, self.start, self.end)
    }
}

/// All observations of one indicator over a requested span, in source order.
///
/// Rows are immutable once built and shared by reference count, so cloning a
/// dataset out of the cache is cheap. Every filter returns a new value.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorDataset {
    key: RequestKey,
    rows: Arc<[Observation]>,
}

impl IndicatorDataset {
    pub fn new(key: RequestKey, rows: Vec<Observation>) -> Self {
        Self {
            key,
            rows: rows.into(),
        }
    }

    /// The uniform "not available" value.
    pub fn empty(key: RequestKey) -> Self {
        Self::new(key, Vec::new())
    }

    pub fn key(&self) -> &RequestKey {
        &self.key
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct country names, in the order they first appear.
    pub fn countries(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for row in self.rows.iter() {
            if seen.insert(row.country.as_str()) {
                out.push(row.country.clone());
            }
        }
        out
    }

    /// The series of one country, ordered by increasing year.
    ///
    /// The API lists each country newest-first; the chart wants oldest-first.
    pub fn for_country(&self, country: &str) -> IndicatorSeries {
        let mut points: Vec<SeriesPoint> = self
            .rows
            .iter()
            .filter(|row| row.country == country)
            .map(|row| SeriesPoint {
                year: row.year,
                value: row.value,
            })
            .collect();
        points.sort_by_key(|p| p.year);

        IndicatorSeries {
            country: country.to_string(),
            indicator_code: self.key.indicator_code.clone(),
            points,
        }
    }

    /// Rows reported for exactly `year`, in source order.
    pub fn for_year(&self, year: Year) -> Vec<Observation> {
        self.rows.iter().filter(|row| row.year == year).cloned().collect()
    }
}

/// A (year, value) point of a country series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub year: Year,
    pub value: f64,
}

/// One country's values for one indicator, ordered by increasing year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub country: String,
    pub indicator_code: String,
    pub points: Vec<SeriesPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reshape into generic (timestamp, value) pairs for a forecaster.
    pub fn timestamped(&self) -> Vec<(NaiveDate, f64)> {
        self.points
            .iter()
            .filter_map(|p| p.year.first_day().map(|d| (d, p.value)))
            .collect()
    }
}

/// Values of every country reporting in one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionalSnapshot {
    pub year: Year,
    pub rows: Vec<Observation>,
}

impl RegionalSnapshot {
    /// Rows sorted by value, largest first.
    pub fn ranked(&self) -> Vec<&Observation> {
        let mut sorted: Vec<&Observation> = self.rows.iter().collect();
        sorted.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
        sorted
    }
}

/// Country names a user may choose from.
///
/// Derived from the primary indicator's preloaded dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryUniverse {
    names: Vec<String>,
}

impl CountryUniverse {
    pub fn from_dataset(dataset: &IndicatorDataset) -> Self {
        Self {
            names: dataset.countries(),
        }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// The requested country when it is listed, otherwise the first country.
    pub fn choose<'a>(&'a self, requested: Option<&'a str>) -> Option<&'a str> {
        requested
            .filter(|name| self.position(name).is_some())
            .or_else(|| self.names.first().map(String::as_str))
    }

    /// First country whose name starts with `prefix` (case-insensitive).
    pub fn find_prefix(&self, prefix: &str) -> Option<usize> {
        let prefix = prefix.to_lowercase();
        self.names
            .iter()
            .position(|n| n.to_lowercase().starts_with(&prefix))
    }
}

/// Raw user selections for one pipeline pass.
///
/// Year fields stay as typed text; the pipeline validates them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewInputs {
    pub country: String,
    pub indicator: Indicator,
    pub forecast: bool,
    pub start_year: String,
    pub end_year: String,
    pub comparison_year: String,
}

/// A full run's configuration as understood by the `show` command.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub inputs: ViewInputs,
    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub export_series: Option<PathBuf>,
    pub export_regional: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}
