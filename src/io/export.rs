//! Export forecast and clustering results to CSV/JSON.
//!
//! The exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::cluster::ClusterTable;
use crate::domain::{ModelKind, SeriesSelection, TimeSeries};
use crate::error::AppError;
use crate::forecast::{Evaluation, ExtensionForecast, ModelResult};

fn column_name(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::HoltWinters => "holt_winters",
        ModelKind::Sarima => "sarima",
        ModelKind::MovingAverage => "moving_average",
    }
}

fn cell(v: Option<f64>) -> String {
    match v {
        Some(v) if v.is_finite() => format!("{v:.4}"),
        _ => String::new(),
    }
}

fn create(path: &Path, what: &str) -> Result<File, AppError> {
    File::create(path).map_err(|e| AppError::Io(format!("Failed to create {what} '{}': {e}", path.display())))
}

/// Write the test-window predictions followed by the extension rows.
///
/// Columns: `date,actual,<model>...`; the `actual` cell is empty for
/// extension dates, model cells are empty where a model has no value.
pub fn write_forecast_csv(
    path: &Path,
    evaluation: &Evaluation,
    extension: &[ExtensionForecast],
) -> Result<(), AppError> {
    let mut file = create(path, "forecast CSV")?;
    let kinds: Vec<ModelKind> = evaluation.results.keys().copied().collect();
    let write_err = |e: std::io::Error| AppError::Io(format!("Failed to write forecast CSV: {e}"));

    let mut header = vec!["date", "actual"];
    header.extend(kinds.iter().map(|k| column_name(*k)));
    writeln!(file, "{}", header.join(",")).map_err(write_err)?;

    for (i, (date, actual)) in evaluation.test.points().enumerate() {
        let mut cells = vec![date.to_string(), cell(Some(actual))];
        for kind in &kinds {
            let value = evaluation.get(*kind).and_then(|r| r.predictions.values().get(i).copied());
            cells.push(cell(value));
        }
        writeln!(file, "{}", cells.join(",")).map_err(write_err)?;
    }

    let Some(first) = extension.first() else {
        return Ok(());
    };
    for (i, date) in first.forecast.dates().enumerate() {
        let mut cells = vec![date.to_string(), String::new()];
        for kind in &kinds {
            let value = extension
                .iter()
                .find(|e| e.kind == *kind)
                .and_then(|e| e.forecast.values().get(i).copied());
            cells.push(cell(value));
        }
        writeln!(file, "{}", cells.join(",")).map_err(write_err)?;
    }

    Ok(())
}

#[derive(Serialize)]
struct ForecastFile<'a> {
    selection: &'a SeriesSelection,
    series: &'a TimeSeries,
    models: Vec<&'a ModelResult>,
    parameters: Vec<(ModelKind, String)>,
    extension: &'a [ExtensionForecast],
}

/// Write the whole run (series, per-model results, extension) as JSON.
///
/// NaN metrics serialize as `null`.
pub fn write_forecast_json(
    path: &Path,
    selection: &SeriesSelection,
    series: &TimeSeries,
    evaluation: &Evaluation,
    extension: &[ExtensionForecast],
) -> Result<(), AppError> {
    let file = create(path, "forecast JSON")?;
    let doc = ForecastFile {
        selection,
        series,
        models: evaluation.results.values().collect(),
        parameters: evaluation
            .results
            .values()
            .filter_map(|r| r.model.as_ref().map(|m| (r.kind, m.describe())))
            .collect(),
        extension,
    };
    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::Io(format!("Failed to write forecast JSON: {e}")))?;
    Ok(())
}

/// Write one row per entity: key, raw statistics, cluster label.
pub fn write_cluster_csv(path: &Path, table: &ClusterTable) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::Io(format!("Failed to create cluster CSV '{}': {e}", path.display())))?;
    let write_err = |e: csv::Error| AppError::Io(format!("Failed to write cluster CSV: {e}"));

    let mut header = vec![table.dimension.key_column().header().to_string()];
    header.extend(table.stats.iter().map(|s| s.label().to_string()));
    header.push("Cluster".to_string());
    writer.write_record(&header).map_err(write_err)?;

    for row in table.rows_by_cluster() {
        let mut record = vec![row.key.clone()];
        record.extend(row.values.iter().map(|v| format!("{v:.4}")));
        record.push(row.cluster.to_string());
        writer.write_record(&record).map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::Io(format!("Failed to write cluster CSV: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterRow;
    use crate::domain::{Dimension, ModelChoice, SelectionMode, Statistic};
    use crate::forecast::{evaluate_models, extend_forecast};
    use chrono::NaiveDate;

    fn flat_run() -> (TimeSeries, Evaluation, Vec<ExtensionForecast>) {
        let series = TimeSeries::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), vec![10.0; 60]);
        let eval = evaluate_models(&series).unwrap();
        let ext = extend_forecast(&eval, &series, ModelChoice::MovingAverage).unwrap();
        (series, eval, ext)
    }

    #[test]
    fn forecast_csv_has_test_and_extension_rows() {
        let (_, eval, ext) = flat_run();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fc.csv");
        write_forecast_csv(&path, &eval, &ext).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,actual,holt_winters,sarima,moving_average");
        assert_eq!(lines.len(), 1 + 15 + 30);
        assert!(lines[1].starts_with("2024-02-15,10.0000,"));
        assert_eq!(lines[16], "2024-03-01,,,,10.0000");
    }

    #[test]
    fn forecast_json_is_valid() {
        let (series, eval, ext) = flat_run();
        let selection = SeriesSelection::new(SelectionMode::Category, "A", None).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fc.json");
        write_forecast_json(&path, &selection, &series, &eval, &ext).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["models"].as_array().map(|m| m.len()), Some(3));
        assert_eq!(value["extension"][0]["forecast"]["values"].as_array().map(|v| v.len()), Some(30));
    }

    #[test]
    fn cluster_csv_is_sorted_by_cluster() {
        let table = ClusterTable {
            dimension: Dimension::Store,
            stats: vec![Statistic::TotalSales],
            k: 2,
            rows: vec![
                ClusterRow { key: "a".into(), values: vec![9.0], cluster: 1 },
                ClusterRow { key: "b".into(), values: vec![1.0], cluster: 0 },
            ],
            inertia: 0.0,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cl.csv");
        write_cluster_csv(&path, &table).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Tienda,Total_Ventas,Cluster\nb,1.0000,0\na,9.0000,1\n");
    }
}
