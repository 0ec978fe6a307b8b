//! Plotters-powered series/forecast chart widget for Ratatui.
//!
//! Plotters output is drawn into the Ratatui buffer via
//! `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct SeriesPlottersChart<'a> {
    /// Observed (or differenced) values by year.
    pub history: &'a [(f64, f64)],
    /// Forecast mean, anchored at the last observation. Empty when not shown.
    pub mean: &'a [(f64, f64)],
    pub lower_95: &'a [(f64, f64)],
    pub upper_95: &'a [(f64, f64)],
    pub lower_80: &'a [(f64, f64)],
    pub upper_80: &'a [(f64, f64)],
    /// X bounds (years).
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: String,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for SeriesPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters cannot lay out a mesh in very small areas.
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
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(&self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let history_color = WHITE;
            let mean_color = RGBColor(0, 255, 255); // cyan
            let band_95_color = RGBColor(255, 165, 0); // orange
            let band_80_color = RGBColor(255, 255, 0); // yellow

            chart.draw_series(LineSeries::new(self.history.iter().copied(), &history_color))?;

            // Band edges first so the mean stays on top.
            for band in [self.lower_95, self.upper_95] {
                chart.draw_series(LineSeries::new(band.iter().copied(), &band_95_color))?;
            }
            for band in [self.lower_80, self.upper_80] {
                chart.draw_series(LineSeries::new(band.iter().copied(), &band_80_color))?;
            }
            chart.draw_series(LineSeries::new(self.mean.iter().copied(), &mean_color))?;

            // `Circle` radii are mis-scaled by the backend; pixels mark observations.
            chart.draw_series(
                self.history
                    .iter()
                    .map(|&(x, y)| Pixel::new((x, y), history_color)),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}
