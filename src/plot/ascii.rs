//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Forecast plot elements:
//! - training history: `.` line
//! - held-out actuals: `o`
//! - model predictions (test window + extension): `1`, `2`, `3` in model order
//!
//! Cluster scatter: one digit per entity, the digit being its cluster label.

use crate::cluster::ClusterTable;
use crate::domain::{ModelKind, TimeSeries};
use crate::forecast::{Evaluation, ExtensionForecast};

/// Marker digit for a model, `1`-based in display order.
pub fn model_marker(kind: ModelKind) -> char {
    let idx = ModelKind::ALL.iter().position(|k| *k == kind).unwrap_or(0);
    char::from_digit(idx as u32 + 1, 10).unwrap_or('?')
}

/// Render history, test actuals and every model's predictions on one grid.
pub fn render_forecast_plot(
    series: &TimeSeries,
    evaluation: &Evaluation,
    extension: &[ExtensionForecast],
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some(origin) = series.start() else {
        return "Plot: (empty series)\n".to_string();
    };
    let ext_len = extension.iter().map(|e| e.forecast.len()).max().unwrap_or(0);
    let x_max = (series.len() + ext_len).saturating_sub(1).max(1) as f64;
    let offset = |s: &TimeSeries| s.start().map(|d| (d - origin).num_days() as f64).unwrap_or(0.0);

    let history: Vec<(f64, f64)> = indexed(&evaluation.train, offset(&evaluation.train));
    let actuals: Vec<(f64, f64)> = indexed(&evaluation.test, offset(&evaluation.test));
    let mut predictions: Vec<(char, Vec<(f64, f64)>)> = Vec::new();
    for result in evaluation.results.values() {
        let mut points = indexed(&result.predictions, offset(&result.predictions));
        if let Some(ext) = extension.iter().find(|e| e.kind == result.kind) {
            points.extend(indexed(&ext.forecast, offset(&ext.forecast)));
        }
        predictions.push((model_marker(result.kind), points));
    }

    let all_y = history
        .iter()
        .chain(&actuals)
        .chain(predictions.iter().flat_map(|(_, p)| p.iter()))
        .map(|(_, y)| *y);
    let (y_min, y_max) = y_range(all_y).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    draw_polyline(&mut grid, &history, x_max, y_min, y_max, '.');
    for (marker, points) in &predictions {
        draw_polyline(&mut grid, points, x_max, y_min, y_max, *marker);
    }
    // Actuals overlay everything.
    for &(x, y) in &actuals {
        let col = map_x(x, 0.0, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = 'o';
    }

    let last = origin + chrono::Duration::days(x_max as i64);
    let mut out = String::new();
    out.push_str(&format!("Plot: days=[{origin}, {last}] | units=[{y_min:.2}, {y_max:.2}]\n"));
    let mut legend = String::from("Legend: . history  o actual");
    for kind in evaluation.results.keys() {
        legend.push_str(&format!("  {} {}", model_marker(*kind), kind.display_name()));
    }
    out.push_str(&legend);
    out.push('\n');

    push_grid(&mut out, grid);
    out
}

/// Scatter of the first two statistics (or the first against itself).
pub fn render_cluster_scatter(table: &ClusterTable, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let Some(x_stat) = table.stats.first() else {
        return "Plot: (no statistics)\n".to_string();
    };
    let y_idx = if table.stats.len() > 1 { 1 } else { 0 };
    let y_stat = table.stats[y_idx];

    let points: Vec<(f64, f64, usize)> = table
        .rows
        .iter()
        .map(|r| (r.values[0], r.values[y_idx], r.cluster))
        .collect();

    let (x_min, x_max) = y_range(points.iter().map(|p| p.0)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = y_range(points.iter().map(|p| p.1)).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];
    for &(x, y, cluster) in &points {
        let col = map_x(x - x_min, 0.0, x_max - x_min, width);
        let row = map_y(y, y_min, y_max, height);
        grid[row][col] = char::from_digit(cluster as u32 % 10, 10).unwrap_or('*');
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: x={x_stat} [{x_min:.2}, {x_max:.2}] | y={y_stat} [{y_min:.2}, {y_max:.2}]\n"
    ));
    push_grid(&mut out, grid);
    out
}

fn indexed(series: &TimeSeries, offset: f64) -> Vec<(f64, f64)> {
    series
        .values()
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, &v)| (offset + i as f64, v))
        .collect()
}

fn push_grid(out: &mut String, grid: Vec<Vec<char>>) {
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
}

fn y_range(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for y in values.filter(|v| v.is_finite()) {
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y { Some((min_y, max_y)) } else { Some((min_y - 0.5, max_y + 0.5)) }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_polyline(grid: &mut [Vec<char>], points: &[(f64, f64)], x_max: f64, y_min: f64, y_max: f64, ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(x, y) in points {
        let col = map_x(x, 0.0, x_max, width);
        let row = map_y(y, y_min, y_max, height);
        match prev {
            Some((c0, r0)) => draw_line(grid, c0, r0, col, row, ch),
            None => grid[row][col] = ch,
        }
        prev = Some((col, row));
    }
}

/// Integer line drawing (Bresenham-ish). Only blank cells are written.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterRow;
    use crate::domain::{Dimension, ModelChoice, Statistic};
    use crate::forecast::{evaluate_models, extend_forecast};
    use chrono::NaiveDate;

    #[test]
    fn scatter_golden_snapshot_small() {
        let table = ClusterTable {
            dimension: Dimension::Store,
            stats: vec![Statistic::TotalSales, Statistic::AvgMargin],
            k: 2,
            rows: vec![
                ClusterRow { key: "a".into(), values: vec![0.0, 0.0], cluster: 0 },
                ClusterRow { key: "b".into(), values: vec![10.0, 10.0], cluster: 1 },
                ClusterRow { key: "c".into(), values: vec![5.0, 0.0], cluster: 0 },
            ],
            inertia: 0.0,
        };

        let txt = render_cluster_scatter(&table, 11, 5);
        let expected = concat!(
            "Plot: x=Total_Ventas [0.00, 10.00] | y=Margen_Promedio [-0.50, 10.50]\n",
            "          1\n",
            "           \n",
            "           \n",
            "           \n",
            "0    0     \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn forecast_plot_shows_every_layer() {
        let pattern = [12.0, 9.0, 8.0, 10.0, 11.0, 15.0, 18.0];
        let values: Vec<f64> = (0..60).map(|t| pattern[t % 7]).collect();
        let series = TimeSeries::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), values);
        let eval = evaluate_models(&series).unwrap();
        let ext = extend_forecast(&eval, &series, ModelChoice::All).unwrap();

        let txt = render_forecast_plot(&series, &eval, &ext, 80, 12);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 2 + 12);
        assert!(lines[0].starts_with("Plot: days=[2024-01-01, 2024-03-30]"));
        assert!(lines[1].contains("3 Moving Avg."));

        let body: String = lines[2..].concat();
        for marker in ['.', 'o', '3'] {
            assert!(body.contains(marker), "missing {marker}");
        }
        // extension columns (right of the test window) carry model digits only
        let right: String = lines[2..].iter().map(|l| &l[70..]).collect();
        assert!(!right.contains('o'));
        assert!(!right.contains('.'));
    }

    #[test]
    fn markers_follow_model_order() {
        assert_eq!(model_marker(ModelKind::HoltWinters), '1');
        assert_eq!(model_marker(ModelKind::MovingAverage), '3');
    }
}
