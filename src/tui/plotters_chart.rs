//! Plotters-powered indicator chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct IndicatorChart<'a> {
    /// Observed values, one per year.
    pub observed: &'a [(f64, f64)],
    /// Forecast trend over history and future periods (empty without a forecast).
    pub trend: &'a [(f64, f64)],
    /// Lower and upper edges of the forecast band.
    pub lower: &'a [(f64, f64)],
    pub upper: &'a [(f64, f64)],
    /// X bounds (years).
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: String,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for IndicatorChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // When the available area is too small, Plotters may fail to build a chart.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
            );
            return;
        }

        let x0 = self.x_bounds[0];
        let x1 = self.x_bounds[1];
        let y0 = self.y_bounds[0];
        let y1 = self.y_bounds[1];

        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                // Terminal cells are low-res, so keep label areas compact.
                .set_label_area_size(LabelAreaPosition::Left, 8)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(&self.y_label)
                .x_labels(6)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let series_color = RGBColor(0, 255, 255); // cyan
            let trend_color = RGBColor(255, 165, 0); // orange
            let band_color = RGBColor(128, 128, 128);

            // Band edges first so the trend and observations stay on top.
            if !self.lower.is_empty() {
                chart.draw_series(LineSeries::new(self.lower.iter().copied(), &band_color))?;
                chart.draw_series(LineSeries::new(self.upper.iter().copied(), &band_color))?;
            }
            if !self.trend.is_empty() {
                chart.draw_series(LineSeries::new(self.trend.iter().copied(), &trend_color))?;
            }

            chart.draw_series(LineSeries::new(self.observed.iter().copied(), &series_color))?;
            // `Circle` radii are mis-scaled by the ratatui backend; pixels stay crisp.
            chart.draw_series(self.observed.iter().map(|&(x, y)| Pixel::new((x, y), WHITE)))?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
