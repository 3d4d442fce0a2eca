//! Plotters-powered chart widgets for Ratatui.
//!
//! Two render-only widgets:
//! - [`ForecastChart`]: daily history plus per-model test predictions and extension
//! - [`ClusterScatter`]: entities on two statistics, colored by cluster
//!
//! Plotters output is drawn into the Ratatui buffer with `plotters-ratatui-backend`.

use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use crate::domain::ModelKind;

const CLUSTER_PALETTE: [RGBColor; 10] = [
    RGBColor(0, 255, 255),
    RGBColor(255, 0, 255),
    RGBColor(255, 255, 0),
    RGBColor(0, 255, 0),
    RGBColor(255, 128, 0),
    RGBColor(64, 128, 255),
    RGBColor(255, 64, 64),
    RGBColor(160, 255, 160),
    RGBColor(200, 160, 255),
    RGBColor(255, 255, 255),
];

pub fn model_rgb(kind: ModelKind) -> RGBColor {
    match kind {
        ModelKind::HoltWinters => RGBColor(0, 255, 255),
        ModelKind::Sarima => RGBColor(255, 0, 255),
        ModelKind::MovingAverage => RGBColor(255, 255, 0),
    }
}

pub fn cluster_rgb(cluster: usize) -> RGBColor {
    CLUSTER_PALETTE[cluster % CLUSTER_PALETTE.len()]
}

/// Same color for Ratatui spans (legends).
pub fn terminal_color(RGBColor(r, g, b): RGBColor) -> Color {
    Color::Rgb(r, g, b)
}

/// Tick label for a day offset from `origin` (`MM-DD`).
pub fn day_label(origin: NaiveDate, offset: f64) -> String {
    if !offset.is_finite() {
        return String::new();
    }
    (origin + Duration::days(offset.round() as i64)).format("%m-%d").to_string()
}

/// Lines for one successfully fitted model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelLines {
    pub kind: ModelKind,
    /// Predictions over the test window.
    pub test: Vec<(f64, f64)>,
    /// Projection past the end of the series (empty when not requested).
    pub extension: Vec<(f64, f64)>,
}

/// Forecast chart; x is the day offset from `origin`.
pub struct ForecastChart<'a> {
    pub history: &'a [(f64, f64)],
    pub models: &'a [ModelLines],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub origin: NaiveDate,
}

impl Widget for ForecastChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if too_small(area, buf) || !bounds_ok(self.x_bounds, self.y_bounds) {
            return;
        }
        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        let origin = self.origin;

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
                .x_desc("date")
                .y_desc("units")
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| day_label(origin, *v))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            chart.draw_series(LineSeries::new(self.history.iter().copied(), &WHITE))?;

            for lines in self.models {
                let color = model_rgb(lines.kind);
                chart.draw_series(LineSeries::new(lines.test.iter().copied(), &color))?;
                chart.draw_series(LineSeries::new(lines.extension.iter().copied(), &color))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Cluster scatter; points are `(cluster, x, y)` in raw statistic units.
pub struct ClusterScatter<'a> {
    pub points: &'a [(usize, f64, f64)],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_desc: &'a str,
    pub y_desc: &'a str,
}

impl Widget for ClusterScatter<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if too_small(area, buf) || !bounds_ok(self.x_bounds, self.y_bounds) {
            return;
        }
        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;

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
                .x_desc(self.x_desc)
                .y_desc(self.y_desc)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| format!("{v:.1}"))
                .y_label_formatter(&|v| format!("{v:.1}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // `Circle` radii are mis-scaled by the ratatui backend; pixels stay crisp.
            chart.draw_series(
                self.points
                    .iter()
                    .map(|&(cluster, x, y)| Pixel::new((x, y), cluster_rgb(cluster))),
            )?;

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn too_small(area: Rect, buf: &mut Buffer) -> bool {
    if area.width < 20 || area.height < 8 {
        buf.set_string(
            area.x,
            area.y,
            "Chart area too small (resize terminal).",
            Style::default().fg(Color::Yellow),
        );
        return true;
    }
    false
}

fn bounds_ok(x: [f64; 2], y: [f64; 2]) -> bool {
    x.iter().chain(y.iter()).all(|v| v.is_finite()) && x[1] > x[0] && y[1] > y[0]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_labels_follow_the_origin() {
        let origin = NaiveDate::from_ymd_opt(2024, 1, 30).unwrap();
        assert_eq!(day_label(origin, 0.0), "01-30");
        assert_eq!(day_label(origin, 2.4), "02-01");
        assert_eq!(day_label(origin, f64::NAN), "");
    }

    #[test]
    fn palette_wraps_and_converts() {
        assert_eq!(cluster_rgb(0), cluster_rgb(10));
        assert_eq!(terminal_color(model_rgb(ModelKind::Sarima)), Color::Rgb(255, 0, 255));
    }

    #[test]
    fn degenerate_bounds_are_rejected() {
        assert!(bounds_ok([0.0, 1.0], [2.0, 3.0]));
        assert!(!bounds_ok([1.0, 1.0], [2.0, 3.0]));
        assert!(!bounds_ok([0.0, f64::NAN], [2.0, 3.0]));
    }
}
