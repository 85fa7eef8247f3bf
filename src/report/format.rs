//! Formatted terminal output for `wdi show`, `wdi indicators`.
//!
//! We keep formatting code in one place so the pipeline stays free of
//! presentation concerns.

use crate::app::pipeline::{ForecastOutcome, RenderOutcome};
use crate::domain::{Indicator, IndicatorSeries, Observation};
use crate::forecast::Forecast;
use crate::geo::MapLayer;

use super::Rankings;

/// Format the run header (selection, series stats, forecast and map status).
pub fn format_run_summary(outcome: &RenderOutcome, map: Option<&MapLayer>) -> String {
    let mut out = String::new();

    out.push_str("=== wdi - World Development Indicators ===\n");
    out.push_str(&format!(
        "Indicator: {} ({})\n",
        outcome.indicator.display_name(),
        outcome.indicator.code()
    ));
    out.push_str(&format!("Country: {}\n", outcome.country));
    if let Some(span) = outcome.span {
        out.push_str(&format!("Years: {}-{}\n", span.start, span.end));
    }

    if let Some(series) = &outcome.series {
        match value_range(series) {
            Some((lo, hi)) => out.push_str(&format!(
                "Points: n={} | value=[{}, {}] {}\n",
                series.len(),
                fmt_value(lo, outcome.indicator),
                fmt_value(hi, outcome.indicator),
                outcome.indicator.unit_label(),
            )),
            None => out.push_str("Points: n=0\n"),
        }
    }

    match &outcome.forecast {
        ForecastOutcome::Disabled => {}
        ForecastOutcome::Ready(fc) => out.push_str(&format!(
            "Forecast: {} | {} yearly periods | 80% band\n",
            fc.model, fc.horizon.periods
        )),
        other => {
            if let Some(msg) = other.message() {
                out.push_str(&format!("Forecast: {msg}\n"));
            }
        }
    }

    if let Some(snapshot) = &outcome.regional {
        out.push_str(&format!("Map: {} | countries={}", snapshot.year, snapshot.rows.len()));
        if let Some(layer) = map {
            out.push_str(&format!(
                " | placed={} unlocated={}",
                layer.markers.len(),
                layer.unlocated
            ));
        }
        out.push('\n');
    }

    out
}

/// Year/value table for the country series, followed by forecast rows.
pub fn format_series(series: &IndicatorSeries, indicator: Indicator, forecast: Option<&Forecast>) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} - {}:\n", series.country, indicator.display_name()));
    push_line(&mut out, format!("{:<6} {:>18} {:>18} {:>18}", "year", "value", "lower", "upper"));
    push_line(&mut out, format!("{:-<6} {:-<18} {:-<18} {:-<18}", "", "", "", ""));

    for p in &series.points {
        push_line(
            &mut out,
            format!("{:<6} {:>18}", p.year.to_string(), fmt_value(p.value, indicator)),
        );
    }

    if let Some(fc) = forecast {
        for p in fc.future() {
            push_line(
                &mut out,
                format!(
                    "{:<6} {:>18} {:>18} {:>18}",
                    format!("{}*", p.year()),
                    fmt_value(p.yhat, indicator),
                    fmt_value(p.yhat_lower, indicator),
                    fmt_value(p.yhat_upper, indicator),
                ),
            );
        }
        out.push_str("(* forecast)\n");
    }

    out
}

/// Format the highest/lowest tables of the regional snapshot.
pub fn format_rankings(rankings: &Rankings, indicator: Indicator) -> String {
    let mut out = String::new();

    out.push_str("Highest values:\n");
    out.push_str(&format_table(&rankings.highest, indicator));
    out.push('\n');

    out.push_str("Lowest values:\n");
    out.push_str(&format_table(&rankings.lowest, indicator));

    out
}

/// The fixed indicator set with World Bank codes.
pub fn format_indicators() -> String {
    let mut out = String::new();
    push_line(&mut out, format!("{:<16} {:<18} {}", "name", "code", "description"));
    for indicator in Indicator::ALL {
        let name = serde_json::to_value(indicator)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        push_line(
            &mut out,
            format!("{:<16} {:<18} {}", name, indicator.code(), indicator.display_name()),
        );
    }
    out
}

fn format_table(rows: &[Observation], indicator: Indicator) -> String {
    let mut out = String::new();
    push_line(&mut out, format!("{:<32} {:<5} {:>18}", "country", "iso3", "value"));
    push_line(&mut out, format!("{:-<32} {:-<5} {:-<18}", "", "", ""));

    for r in rows {
        push_line(
            &mut out,
            format!(
                "{:<32} {:<5} {:>18}",
                truncate(&r.country, 32),
                r.country_code,
                fmt_value(r.value, indicator),
            ),
        );
    }

    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

fn value_range(series: &IndicatorSeries) -> Option<(f64, f64)> {
    let mut it = series.points.iter().map(|p| p.value);
    let first = it.next()?;
    Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

pub(crate) fn fmt_value(v: f64, indicator: Indicator) -> String {
    match indicator {
        Indicator::Population => format!("{v:.0}"),
        Indicator::GdpPerCapita => format!("{v:.2}"),
        Indicator::LifeExpectancy | Indicator::Literacy => format!("{v:.1}"),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
