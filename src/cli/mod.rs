//! Command-line parsing for the World Development Indicators dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the pipeline code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{CountryUniverse, Indicator, RunConfig, ViewInputs};

pub const DEFAULT_START_YEAR: &str = "2000";
pub const DEFAULT_END_YEAR: &str = "2020";
pub const DEFAULT_COMPARISON_YEAR: &str = "2020";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "wdi", version, about = "World Bank development indicators dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one pipeline pass, print the series, forecast and regional rankings.
    Show(ShowArgs),
    /// List the countries available for selection.
    Countries,
    /// List the supported indicators and their World Bank codes.
    Indicators,
    /// Launch the interactive TUI.
    ///
    /// This uses the same view pipeline as `wdi show`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Selections shared by `show` and `tui`.
///
/// Years are taken as text and validated by the pipeline, so that bad input
/// produces the same message in both front-ends.
#[derive(Debug, Args, Clone)]
pub struct SelectionArgs {
    /// Country name as listed by `wdi countries` (default: first country).
    #[arg(short = 'c', long)]
    pub country: Option<String>,

    /// Indicator to chart.
    #[arg(short = 'i', long, value_enum, default_value_t = Indicator::PRIMARY)]
    pub indicator: Indicator,

    /// Extend the series with a 5-year forecast.
    #[arg(short = 'f', long)]
    pub forecast: bool,

    /// First year of the chart.
    #[arg(long, default_value = DEFAULT_START_YEAR)]
    pub start: String,

    /// Last year of the chart.
    #[arg(long, default_value = DEFAULT_END_YEAR)]
    pub end: String,

    /// Year shown on the map and in the rankings.
    #[arg(long, default_value = DEFAULT_COMPARISON_YEAR)]
    pub compare: String,

    /// Show top-N highest and lowest countries for the comparison year.
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

impl SelectionArgs {
    /// Pipeline inputs, with `fallback_country` used when none was given.
    pub fn view_inputs(&self, fallback_country: &str) -> ViewInputs {
        ViewInputs {
            country: self
                .country
                .clone()
                .unwrap_or_else(|| fallback_country.to_string()),
            indicator: self.indicator,
            forecast: self.forecast,
            start_year: self.start.clone(),
            end_year: self.end.clone(),
            comparison_year: self.compare.clone(),
        }
    }
}

/// Options for `wdi show`.
#[derive(Debug, Args, Clone)]
pub struct ShowArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the country series (and forecast) to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_series: Option<PathBuf>,

    /// Export the regional snapshot to CSV.
    #[arg(long, value_name = "CSV")]
    pub export_regional: Option<PathBuf>,

    /// Export the whole outcome (series, forecast, snapshot, halt) to JSON.
    #[arg(long, value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

impl ShowArgs {
    /// Run settings with the country picked from `universe`: the requested one
    /// when listed, otherwise the first.
    pub fn run_config(&self, universe: &CountryUniverse) -> RunConfig {
        let country = universe
            .choose(self.selection.country.as_deref())
            .unwrap_or_default();
        let mut inputs = self.selection.view_inputs(country);
        inputs.country = country.to_string();
        RunConfig {
            inputs,
            top_n: self.selection.top,
            plot: self.plot && !self.no_plot,
            plot_width: self.width,
            plot_height: self.height,
            export_series: self.export_series.clone(),
            export_regional: self.export_regional.clone(),
            export_json: self.export_json.clone(),
        }
    }
}

/// Options for the TUI.
#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
}
