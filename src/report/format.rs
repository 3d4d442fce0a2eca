//! Formatted terminal output for forecasts, clusters and file listings.

use crate::cluster::ClusterTable;
use crate::domain::{SeriesSelection, TimeSeries};
use crate::forecast::{Evaluation, ExtensionForecast};
use crate::io::{DeleteOutcome, SalesTable, TablePreview};
use crate::report::{fmt_metric, fmt_value};

/// Dataset summary plus the first few row errors.
pub fn format_load_summary(table: &SalesTable) -> String {
    let mut out = String::new();
    out.push_str(&format!("File: {}\n", table.source.display()));
    out.push_str(&format!("Rows: read={} used={}\n", table.rows_read, table.rows_used));
    if let Some((min, max)) = table.date_range() {
        out.push_str(&format!("Dates: {min} .. {max}\n"));
    }
    out.push_str(&format!("Categories: {}\n", table.categories().join(", ")));

    if !table.row_errors.is_empty() {
        out.push_str(&format!("Skipped rows: {}\n", table.row_errors.len()));
        for err in table.row_errors.iter().take(5) {
            out.push_str(&format!("  line {}: {}\n", err.line, err.message));
        }
        if table.row_errors.len() > 5 {
            out.push_str(&format!("  ... {} more\n", table.row_errors.len() - 5));
        }
    }
    out
}

/// Model comparison on the held-out window; `*` marks the best model.
pub fn format_forecast_report(selection: &SeriesSelection, series: &TimeSeries, evaluation: &Evaluation) -> String {
    let mut out = String::new();

    out.push_str("=== miq - Sales Forecast ===\n");
    out.push_str(&format!("Series: {}\n", selection.legend()));
    if let (Some(start), Some(end)) = (series.start(), series.end()) {
        out.push_str(&format!("Observations: n={} | {start} .. {end}\n", series.len()));
    }
    if let (Some(train_end), Some(test_start)) = (evaluation.train.end(), evaluation.test.start()) {
        out.push_str(&format!(
            "Train: n={} (to {train_end}) | Test: n={} (from {test_start})\n",
            evaluation.train.len(),
            evaluation.test.len()
        ));
    }

    out.push_str("\nModel comparison (test window):\n");
    out.push_str(format!("  {:<14} {:>10} {:>10}", "model", "MAPE", "RMSE").trim_end());
    out.push('\n');
    out.push_str(format!("  {:-<14} {:-<10} {:-<10}", "", "", "").trim_end());
    out.push('\n');

    let best = evaluation.best().map(|r| r.kind);
    for result in evaluation.results.values() {
        let marker = if Some(result.kind) == best { "*" } else { " " };
        out.push_str(&format!(
            "{marker} {:<14} {:>10} {:>10}\n",
            result.kind.display_name(),
            fmt_metric(result.mape),
            fmt_metric(result.rmse)
        ));
    }

    let failures: Vec<_> = evaluation
        .results
        .values()
        .filter_map(|r| r.failure.as_ref().map(|f| (r.kind, f)))
        .collect();
    if !failures.is_empty() {
        out.push_str("\nFailed models:\n");
        for (kind, reason) in failures {
            out.push_str(&format!("- {}: {reason}\n", kind.display_name()));
        }
    }

    out.push_str("\nFitted parameters:\n");
    for result in evaluation.results.values() {
        if let Some(model) = &result.model {
            out.push_str(&format!("- {}: {}\n", result.kind.display_name(), model.describe()));
        }
    }

    out
}

/// One row per extension date, one column per projected model.
pub fn format_extension_table(extension: &[ExtensionForecast]) -> String {
    let mut out = String::new();
    let Some(first) = extension.first() else {
        out.push_str("No model available for the 30-day forecast.\n");
        return out;
    };

    out.push_str(&format!("{}-day forecast:\n", first.forecast.len()));
    let mut header = format!("{:<10}", "date");
    let mut rule = format!("{:-<10}", "");
    for ext in extension {
        header.push_str(&format!(" {:>12}", truncate(ext.kind.display_name(), 12)));
        rule.push_str(&format!(" {:-<12}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(rule.trim_end());
    out.push('\n');

    for (i, date) in first.forecast.dates().enumerate() {
        let mut line = date.to_string();
        for ext in extension {
            let v = ext.forecast.values().get(i).copied().unwrap_or(f64::NAN);
            line.push_str(&format!(" {:>12}", fmt_value(v)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Entities sorted by cluster, with raw statistic values.
pub fn format_cluster_table(table: &ClusterTable) -> String {
    let mut out = String::new();
    out.push_str("=== miq - Segmentation ===\n");
    out.push_str(&format!(
        "{}: n={} | k={} | inertia={:.3}\n\n",
        table.dimension.display_name(),
        table.rows.len(),
        table.k,
        table.inertia
    ));

    let key_header = table.dimension.key_column().header();
    let mut header = format!("{:<20}", truncate(key_header, 20));
    let mut rule = format!("{:-<20}", "");
    for stat in &table.stats {
        header.push_str(&format!(" {:>20}", truncate(stat.label(), 20)));
        rule.push_str(&format!(" {:-<20}", ""));
    }
    header.push_str(&format!(" {:>7}", "Cluster"));
    rule.push_str(&format!(" {:-<7}", ""));
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(rule.trim_end());
    out.push('\n');

    for row in table.rows_by_cluster() {
        let mut line = format!("{:<20}", truncate(&row.key, 20));
        for v in &row.values {
            line.push_str(&format!(" {:>20}", fmt_value(*v)));
        }
        line.push_str(&format!(" {:>7}", row.cluster));
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

/// Cluster sizes and per-statistic means.
pub fn format_cluster_profiles(table: &ClusterTable) -> String {
    let mut out = String::from("Cluster profiles:\n");
    for profile in table.profiles() {
        let means: Vec<String> = table
            .stats
            .iter()
            .zip(&profile.means)
            .map(|(stat, m)| format!("{}={}", stat.label(), fmt_value(*m)))
            .collect();
        out.push_str(&format!(
            "- cluster {} (n={}): {}\n",
            profile.cluster,
            profile.size,
            means.join(" ")
        ));
    }
    out
}

pub fn format_file_list(names: &[String]) -> String {
    if names.is_empty() {
        return "No spreadsheets in the data directory.\n".to_string();
    }
    let mut out = String::new();
    for (i, name) in names.iter().enumerate() {
        out.push_str(&format!("{:>3}. {name}\n", i + 1));
    }
    out
}

pub fn format_delete_outcomes(outcomes: &[DeleteOutcome]) -> String {
    let mut out = String::new();
    for outcome in outcomes {
        match &outcome.result {
            Ok(()) => out.push_str(&format!("deleted {}\n", outcome.name)),
            Err(err) => out.push_str(&format!("failed  {}: {err}\n", outcome.name)),
        }
    }
    out
}

/// Header and first rows of a file, plus any missing required columns.
pub fn format_preview(name: &str, preview: &TablePreview) -> String {
    let mut out = format!("{name}: {} rows\n", preview.total_rows);
    if !preview.missing.is_empty() {
        out.push_str(&format!("Missing columns: {}\n", preview.missing.join(", ")));
    }
    let header: Vec<String> = preview.headers.iter().map(|h| format!("{:<14}", truncate(h, 14))).collect();
    out.push_str(header.join(" ").trim_end());
    out.push('\n');
    for row in &preview.rows {
        let cells: Vec<String> = row.iter().map(|c| format!("{:<14}", truncate(c, 14))).collect();
        out.push_str(cells.join(" ").trim_end());
        out.push('\n');
    }
    out
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ClusterRow;
    use crate::domain::{Dimension, ModelKind, SelectionMode, Statistic};
    use crate::forecast::{ModelResult, evaluate_models};
    use chrono::NaiveDate;

    #[test]
    fn truncate_marks_cut_text() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdefgh", 5), "abcd.");
    }

    #[test]
    fn forecast_report_lists_failures_with_dashes() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let series = TimeSeries::new(start, vec![10.0; 60]);
        let mut eval = evaluate_models(&series).unwrap();
        eval.results.insert(
            ModelKind::Sarima,
            ModelResult::failed(ModelKind::Sarima, NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(), "diverged"),
        );
        let selection = SeriesSelection::new(SelectionMode::Category, "A", None).unwrap();

        let text = format_forecast_report(&selection, &series, &eval);
        assert!(text.contains("Series: Category: A"));
        assert!(text.contains("SARIMA                  -          -"));
        assert!(text.contains("- SARIMA: diverged"));
        assert!(text.contains("Moving Avg.         0.000      0.000"));
    }

    #[test]
    fn cluster_table_is_grouped_by_label() {
        let table = ClusterTable {
            dimension: Dimension::Store,
            stats: vec![Statistic::TotalSales],
            k: 2,
            rows: vec![
                ClusterRow { key: "north".into(), values: vec![90.0], cluster: 1 },
                ClusterRow { key: "south".into(), values: vec![10.0], cluster: 0 },
                ClusterRow { key: "west".into(), values: vec![12.0], cluster: 0 },
            ],
            inertia: 1.5,
        };
        let text = format_cluster_table(&table);
        let south = text.find("south").unwrap();
        let north = text.find("north").unwrap();
        assert!(south < north);

        let profiles = format_cluster_profiles(&table);
        assert!(profiles.contains("- cluster 0 (n=2): Total_Ventas=11.000"));
        assert!(profiles.contains("- cluster 1 (n=1): Total_Ventas=90.000"));
    }

    #[test]
    fn empty_file_list_has_hint() {
        assert!(format_file_list(&[]).contains("No spreadsheets"));
        assert_eq!(format_file_list(&["a.csv".to_string()]), "  1. a.csv\n");
    }
}
