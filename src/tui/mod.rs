//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing a country, indicator,
//! forecast toggle and year fields, then renders the country chart, the world
//! map for the comparison year and its top values. Every change reruns the
//! view pipeline; fetched datasets come from the client's cache.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::info;

use crate::app::pipeline::{self, Preload, RenderOutcome};
use crate::cli::TuiArgs;
use crate::config::Settings;
use crate::data::{ReqwestTransport, Transport, WorldBankClient};
use crate::domain::{ViewInputs, Year, YearSpan};
use crate::error::AppError;
use crate::forecast::LinearTrend;
use crate::geo::MapLayer;
use crate::report::fmt_value;

mod map;
mod plotters_chart;

use map::MarkerMap;
use plotters_chart::IndicatorChart;

/// Longest text accepted in a year field.
const MAX_FIELD_LEN: usize = 8;

/// Start the TUI.
pub fn run(args: TuiArgs, settings: Settings) -> Result<(), AppError> {
    let client = WorldBankClient::from_settings(&settings);
    let mut app = App::new(client, &args, settings.preload_span);

    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Rows of the settings panel, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Country,
    Indicator,
    Forecast,
    Start,
    End,
    Comparison,
}

impl Field {
    const ALL: [Field; 6] = [
        Field::Country,
        Field::Indicator,
        Field::Forecast,
        Field::Start,
        Field::End,
        Field::Comparison,
    ];

    fn is_text(self) -> bool {
        matches!(self, Field::Start | Field::End | Field::Comparison)
    }
}

/// Text entry in progress: either a year field or the country search.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Entry {
    Year { field: Field, buffer: String },
    Search { query: String },
}

struct App<T: Transport = ReqwestTransport> {
    client: WorldBankClient<T>,
    forecaster: LinearTrend,
    preload_span: YearSpan,
    preload: Option<Preload>,
    requested_country: Option<String>,
    inputs: ViewInputs,
    top_n: usize,
    selected_field: usize,
    entry: Option<Entry>,
    status: String,
    outcome: Option<RenderOutcome>,
    map: Option<MapLayer>,
}

impl<T: Transport> App<T> {
    fn new(client: WorldBankClient<T>, args: &TuiArgs, preload_span: YearSpan) -> Self {
        let selection = &args.selection;
        let mut app = Self {
            client,
            forecaster: LinearTrend::new(),
            preload_span,
            preload: None,
            requested_country: selection.country.clone(),
            inputs: selection.view_inputs(""),
            top_n: selection.top,
            selected_field: 0,
            entry: None,
            status: String::new(),
            outcome: None,
            map: None,
        };
        app.reload();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Preload every indicator, then render the current selection.
    fn reload(&mut self) {
        self.outcome = None;
        self.map = None;
        match pipeline::preload(&self.client, self.preload_span) {
            Ok(preload) => {
                self.inputs.country = preload
                    .countries
                    .choose(self.requested_country.as_deref())
                    .unwrap_or_default()
                    .to_string();
                self.preload = Some(preload);
                self.rerun();
            }
            Err(halt) => {
                self.preload = None;
                self.status = format!("{} (r to retry)", halt.message());
            }
        }
    }

    /// One pass of the view pipeline with the current inputs.
    fn rerun(&mut self) {
        if self.preload.is_none() {
            return;
        }
        let outcome = pipeline::render(&self.client, &self.forecaster, &self.inputs);
        self.map = pipeline::map_layer(&self.client, &outcome);
        let messages = outcome.messages();
        self.status = if messages.is_empty() {
            format!("{} | {}", self.inputs.indicator.display_name(), self.inputs.country)
        } else {
            messages.join(" ")
        };
        self.outcome = Some(outcome);
    }

    fn field(&self) -> Field {
        Field::ALL[self.selected_field]
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if let Some(entry) = self.entry.take() {
            self.handle_entry(entry, code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field + 1 < Field::ALL.len() {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Enter => {
                let field = self.field();
                if field.is_text() {
                    self.entry = Some(Entry::Year {
                        field,
                        buffer: self.year_text(field).to_string(),
                    });
                    self.status = "Editing year. Enter to apply, Esc to cancel.".to_string();
                } else if field == Field::Country {
                    self.start_search();
                }
            }
            KeyCode::Char('/') => self.start_search(),
            KeyCode::Char('f') => {
                self.inputs.forecast = !self.inputs.forecast;
                self.rerun();
            }
            KeyCode::Char('r') => {
                info!("cache invalidated by user");
                self.client.cache().invalidate_all();
                self.client.forget_locations();
                self.requested_country = Some(self.inputs.country.clone());
                self.reload();
            }
            _ => {}
        }

        false
    }

    fn start_search(&mut self) {
        self.entry = Some(Entry::Search { query: String::new() });
        self.status = "Search country: type a prefix, Enter to select, Esc to cancel.".to_string();
    }

    fn handle_entry(&mut self, mut entry: Entry, code: KeyCode) {
        let is_search = matches!(entry, Entry::Search { .. });
        let buffer = match &mut entry {
            Entry::Year { buffer, .. } => buffer,
            Entry::Search { query } => query,
        };
        match code {
            KeyCode::Esc => {
                self.status = "Edit canceled.".to_string();
                return;
            }
            KeyCode::Enter => {
                self.apply_entry(entry);
                return;
            }
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => {
                if is_search || buffer.len() < MAX_FIELD_LEN {
                    // Validation is the pipeline's job; keep whatever was typed.
                    buffer.push(c);
                }
            }
            _ => {}
        }
        self.entry = Some(entry);
    }

    fn apply_entry(&mut self, entry: Entry) {
        match entry {
            Entry::Year { field, buffer } => {
                *self.year_text_mut(field) = buffer;
                self.rerun();
            }
            Entry::Search { query } => {
                let found = self
                    .preload
                    .as_ref()
                    .and_then(|p| p.countries.find_prefix(&query).map(|i| p.countries.names()[i].clone()));
                match found {
                    Some(country) => {
                        self.inputs.country = country;
                        self.rerun();
                    }
                    None => self.status = format!("No country starts with '{query}'."),
                }
            }
        }
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.field() {
            Field::Country => {
                let Some(preload) = &self.preload else {
                    return;
                };
                let names = preload.countries.names();
                if names.is_empty() {
                    return;
                }
                let cur = preload.countries.position(&self.inputs.country).unwrap_or(0);
                let next = if delta >= 0 {
                    (cur + 1) % names.len()
                } else {
                    (cur + names.len() - 1) % names.len()
                };
                self.inputs.country = names[next].clone();
            }
            Field::Indicator => {
                self.inputs.indicator = if delta >= 0 {
                    self.inputs.indicator.next()
                } else {
                    self.inputs.indicator.prev()
                };
            }
            Field::Forecast => self.inputs.forecast = !self.inputs.forecast,
            field => {
                // Arrows step a valid year; invalid text is left for the user to fix.
                let Some(year) = Year::parse_field(self.year_text(field)) else {
                    return;
                };
                let Some(next) = year.get().checked_add_signed(delta) else {
                    return;
                };
                *self.year_text_mut(field) = next.to_string();
            }
        }
        self.rerun();
    }

    fn year_text(&self, field: Field) -> &str {
        match field {
            Field::Start => &self.inputs.start_year,
            Field::End => &self.inputs.end_year,
            _ => &self.inputs.comparison_year,
        }
    }

    fn year_text_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Start => &mut self.inputs.start_year,
            Field::End => &mut self.inputs.end_year,
            _ => &mut self.inputs.comparison_year,
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("wdi", Style::default().fg(Color::Cyan)),
            Span::raw(" | World Bank development indicators"),
        ]));

        let n = self
            .outcome
            .as_ref()
            .and_then(|o| o.series.as_ref())
            .map(|s| s.len())
            .unwrap_or(0);
        let countries = self.preload.as_ref().map(|p| p.countries.len()).unwrap_or(0);

        lines.push(Line::from(Span::styled(
            format!(
                "{} ({}) | {} | n={n} | countries: {countries}",
                self.inputs.indicator.display_name(),
                self.inputs.indicator.code(),
                self.inputs.country,
            ),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(40), Constraint::Min(0)])
            .split(area);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(8), Constraint::Min(0)])
            .split(columns[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(columns[1]);

        self.draw_settings(frame, left[0]);
        self.draw_top_values(frame, left[1]);
        self.draw_chart(frame, right[0]);
        self.draw_map(frame, right[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default()
            .title(format!("{} - {}", self.inputs.country, self.inputs.indicator.display_name()))
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = self.outcome.as_ref().and_then(|o| o.series.as_ref());
        let Some(outcome) = self.outcome.as_ref().filter(|_| series.is_some_and(|s| !s.is_empty())) else {
            let msg = Paragraph::new(self.placeholder())
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let data = chart_series(outcome);
        let widget = IndicatorChart {
            observed: &data.observed,
            trend: &data.trend,
            lower: &data.lower,
            upper: &data.upper,
            x_bounds: data.x_bounds,
            y_bounds: data.y_bounds,
            x_label: "year",
            y_label: self.inputs.indicator.unit_label().to_string(),
            fmt_x: fmt_axis_year,
            fmt_y: fmt_axis_value,
        };
        frame.render_widget(widget, inner);
    }

    fn placeholder(&self) -> String {
        if self.preload.is_none() {
            return self.status.clone();
        }
        match self.outcome.as_ref().and_then(|o| o.halt) {
            Some(halt) if self.outcome.as_ref().is_some_and(|o| o.series.is_none()) => {
                halt.message().to_string()
            }
            _ => "No observations for this country and period.".to_string(),
        }
    }

    fn draw_map(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = match self.outcome.as_ref().and_then(|o| o.regional.as_ref()) {
            Some(snapshot) => format!(
                "Map {} ({} countries)",
                snapshot.year,
                snapshot.rows.len()
            ),
            None => format!("Map {}", self.inputs.comparison_year),
        };
        let highlight = self
            .outcome
            .as_ref()
            .and_then(|o| o.regional.as_ref())
            .and_then(|s| s.rows.iter().find(|r| r.country == self.inputs.country))
            .map(|r| r.country_code.as_str());

        frame.render_widget(
            MarkerMap {
                layer: self.map.as_ref(),
                highlight,
                title,
            },
            area,
        );
    }

    fn draw_top_values(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Top values").borders(Borders::ALL);
        let Some(snapshot) = self.outcome.as_ref().and_then(|o| o.regional.as_ref()) else {
            frame.render_widget(Paragraph::new("-").block(block), area);
            return;
        };

        let rankings = crate::report::rank_regional(snapshot, self.top_n);
        let items: Vec<ListItem> = rankings
            .highest
            .iter()
            .map(|r| {
                let style = if r.country == self.inputs.country {
                    Style::default().add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(format!(
                    "{:<22} {:>14}",
                    truncate(&r.country, 22),
                    fmt_value(r.value, self.inputs.indicator)
                ))
                .style(style)
            })
            .collect();
        frame.render_widget(List::new(items).block(block), area);
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let editing = match &self.entry {
            Some(Entry::Year { field, buffer }) => Some((*field, buffer.as_str())),
            _ => None,
        };
        let text = |field: Field| match editing {
            Some((f, buffer)) if f == field => format!("{buffer}_"),
            _ => self.year_text(field).to_string(),
        };

        let mut items = Vec::new();
        let country = match &self.entry {
            Some(Entry::Search { query }) => format!("/{query}_"),
            _ => self.inputs.country.clone(),
        };
        items.push(ListItem::new(format!("Country: {country}")));
        items.push(ListItem::new(format!("Indicator: {}", self.inputs.indicator.display_name())));
        items.push(ListItem::new(format!(
            "Forecast: {}",
            if self.inputs.forecast { "on" } else { "off" }
        )));
        items.push(ListItem::new(format!("Start year: {}", text(Field::Start))));
        items.push(ListItem::new(format!("End year: {}", text(Field::End))));
        items.push(ListItem::new(format!("Map year: {}", text(Field::Comparison))));

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  Enter edit  / search  f forecast  r refresh  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Plotters-ready series and bounds for one outcome.
struct ChartData {
    observed: Vec<(f64, f64)>,
    trend: Vec<(f64, f64)>,
    lower: Vec<(f64, f64)>,
    upper: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

fn chart_series(outcome: &RenderOutcome) -> ChartData {
    let observed: Vec<(f64, f64)> = outcome
        .series
        .iter()
        .flat_map(|s| s.points.iter())
        .map(|p| (f64::from(p.year.get()), p.value))
        .collect();

    let (mut trend, mut lower, mut upper) = (Vec::new(), Vec::new(), Vec::new());
    if let Some(fc) = outcome.forecast.forecast() {
        for p in &fc.points {
            let x = f64::from(p.year());
            trend.push((x, p.yhat));
            lower.push((x, p.yhat_lower));
            upper.push((x, p.yhat_upper));
        }
    }

    let all = || observed.iter().chain(&trend).chain(&lower).chain(&upper);

    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, y) in all() {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
        x_min -= 1.0;
        x_max += 1.0;
        if !x_min.is_finite() || !x_max.is_finite() {
            (x_min, x_max) = (0.0, 1.0);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min -= 1.0;
        y_max += 1.0;
        if !y_min.is_finite() || !y_max.is_finite() {
            (y_min, y_max) = (0.0, 1.0);
        }
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);

    ChartData {
        observed,
        trend,
        lower,
        upper,
        x_bounds: [x_min, x_max],
        y_bounds: [y_min - pad, y_max + pad],
    }
}

fn fmt_axis_year(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_value(v: f64) -> String {
    let a = v.abs();
    if a >= 1e9 {
        format!("{:.1}B", v / 1e9)
    } else if a >= 1e6 {
        format!("{:.1}M", v / 1e6)
    } else if a >= 1e4 {
        format!("{:.0}k", v / 1e3)
    } else {
        format!("{v:.1}")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::app::pipeline::{ForecastOutcome, Halt};
    use crate::cli::{Cli, Command};
    use crate::data::testing::{FakeWorld, ScriptedTransport, scripted_client};
    use crate::domain::{DEFAULT_PRELOAD_SPAN, Indicator};

    fn world() -> FakeWorld {
        let values: Vec<Option<f64>> = (0..21).map(|k| Some(50.0 + k as f64)).collect();
        let mut world = FakeWorld::new();
        for indicator in Indicator::ALL {
            world = world
                .with_series(indicator.code(), "Argentina", "ARG", 2000, &values)
                .with_series(indicator.code(), "Brazil", "BRA", 2000, &values)
                .with_series(indicator.code(), "Chile", "CHL", 2000, &values);
        }
        world
            .with_location("ARG", "Argentina", -34.6, -58.4)
            .with_location("BRA", "Brazil", -15.8, -47.9)
            .with_location("CHL", "Chile", -33.5, -70.6)
    }

    fn tui_args(extra: &[&str]) -> TuiArgs {
        let mut argv = vec!["wdi", "tui"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Command::Tui(args) => args,
            _ => unreachable!(),
        }
    }

    fn app(extra: &[&str]) -> App<ScriptedTransport> {
        App::new(
            scripted_client(world().into_transport()),
            &tui_args(extra),
            DEFAULT_PRELOAD_SPAN,
        )
    }

    fn type_text(app: &mut App<ScriptedTransport>, text: &str) {
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn starts_on_the_first_country() {
        let app = app(&[]);
        assert_eq!(app.inputs.country, "Argentina");
        let outcome = app.outcome.as_ref().unwrap();
        assert_eq!(outcome.halt, None);
        assert_eq!(outcome.series.as_ref().unwrap().len(), 21);
    }

    #[test]
    fn unknown_requested_country_falls_back() {
        let app = app(&["-c", "Atlantis"]);
        assert_eq!(app.inputs.country, "Argentina");
        let app = self::app(&["-c", "Chile"]);
        assert_eq!(app.inputs.country, "Chile");
    }

    #[test]
    fn arrows_cycle_countries() {
        let mut app = app(&[]);
        app.handle_key(KeyCode::Left);
        assert_eq!(app.inputs.country, "Chile");
        app.handle_key(KeyCode::Right);
        app.handle_key(KeyCode::Right);
        assert_eq!(app.inputs.country, "Brazil");
        assert_eq!(app.outcome.as_ref().unwrap().country, "Brazil");
    }

    #[test]
    fn typing_letters_into_a_year_halts_with_the_message() {
        let mut app = app(&[]);
        for _ in 0..3 {
            app.handle_key(KeyCode::Down);
        }
        app.handle_key(KeyCode::Enter);
        for _ in 0..4 {
            app.handle_key(KeyCode::Backspace);
        }
        type_text(&mut app, "abcd");
        app.handle_key(KeyCode::Enter);

        assert_eq!(app.inputs.start_year, "abcd");
        assert_eq!(app.outcome.as_ref().unwrap().halt, Some(Halt::InvalidYears));
        assert_eq!(app.status, "Please enter valid years.");
    }

    #[test]
    fn escape_discards_the_edit() {
        let mut app = app(&[]);
        app.selected_field = 5;
        app.handle_key(KeyCode::Enter);
        type_text(&mut app, "99");
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.inputs.comparison_year, "2020");
        assert!(app.entry.is_none());
    }

    #[test]
    fn year_arrows_step_by_one() {
        let mut app = app(&[]);
        app.selected_field = 4;
        app.handle_key(KeyCode::Left);
        assert_eq!(app.inputs.end_year, "2019");
    }

    #[test]
    fn search_jumps_to_the_first_prefix_match() {
        let mut app = app(&[]);
        app.handle_key(KeyCode::Char('/'));
        type_text(&mut app, "ch");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.inputs.country, "Chile");

        app.handle_key(KeyCode::Char('/'));
        type_text(&mut app, "zz");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.inputs.country, "Chile");
        assert!(app.status.contains("zz"));
    }

    #[test]
    fn forecast_toggle_reruns_the_pipeline() {
        let mut app = app(&[]);
        assert_eq!(app.outcome.as_ref().unwrap().forecast, ForecastOutcome::Disabled);
        app.handle_key(KeyCode::Char('f'));
        assert!(matches!(app.outcome.as_ref().unwrap().forecast, ForecastOutcome::Ready(_)));
    }

    #[test]
    fn refresh_refetches_after_invalidating() {
        let mut app = app(&[]);
        let before = app.client.transport().calls();
        app.handle_key(KeyCode::Char('f'));
        assert_eq!(app.client.transport().calls(), before);

        app.handle_key(KeyCode::Char('r'));
        assert!(app.client.transport().calls() > before);
        assert_eq!(app.inputs.country, "Argentina");

        let atlas_loads = app
            .client
            .transport()
            .requests()
            .iter()
            .filter(|r| r.url.ends_with("/country"))
            .count();
        assert_eq!(atlas_loads, 2);
        assert_eq!(app.map.as_ref().unwrap().markers.len(), 3);
    }

    #[test]
    fn failed_preload_is_reported_and_retryable() {
        let client = scripted_client(ScriptedTransport::always(503, "busy"));
        let mut app = App::new(client, &tui_args(&[]), DEFAULT_PRELOAD_SPAN);
        assert!(app.preload.is_none());
        assert!(app.status.starts_with("No data available."));
        assert!(!app.handle_key(KeyCode::Char('r')));
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn chart_bounds_cover_the_forecast() {
        let mut app = app(&["-f"]);
        app.rerun();
        let data = chart_series(app.outcome.as_ref().unwrap());
        assert_eq!(data.x_bounds, [2000.0, 2025.0]);
        assert_eq!(data.trend.len(), 26);
        assert!(data.y_bounds[0] < 50.0);
    }

    #[test]
    fn axis_values_are_compact() {
        assert_eq!(fmt_axis_value(212_559_409.0), "212.6M");
        assert_eq!(fmt_axis_value(74.5), "74.5");
    }
}
