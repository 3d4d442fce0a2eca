//! Shared forecast and clustering pipelines used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflows:
//! - load -> extract series -> evaluate models -> extend 30 days
//! - load -> aggregate per entity -> standardize -> k-means
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).
//! Every call recomputes from scratch.

use crate::cluster::{ClusterTable, cluster_entities};
use crate::domain::{ClusterRequest, ForecastRequest, ModelChoice, Schema, SeriesSelection, TimeSeries};
use crate::error::AppError;
use crate::forecast::{Evaluation, ExtensionForecast, evaluate_models, extend_forecast};
use crate::io::{SalesTable, load_sales_table};
use crate::series::extract_series;

/// All computed outputs of a single forecast run.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub table: SalesTable,
    pub output: ForecastOutput,
}

/// Series-level results, independent of how the table was loaded.
#[derive(Debug, Clone)]
pub struct ForecastOutput {
    pub selection: SeriesSelection,
    pub series: TimeSeries,
    pub evaluation: Evaluation,
    pub extension: Vec<ExtensionForecast>,
    /// Why the requested model could not be extended; the evaluation is
    /// still valid.
    pub extension_error: Option<AppError>,
}

/// All computed outputs of a single clustering run.
#[derive(Debug, Clone)]
pub struct ClusterRun {
    pub table: SalesTable,
    pub clusters: ClusterTable,
}

/// Load the file and run the forecast workflow.
pub fn run_forecast(request: &ForecastRequest) -> Result<ForecastRun, AppError> {
    let table = load_sales_table(&request.file, Schema::Forecast)?;
    let output = forecast_table(&table, &request.selection, request.model)?;
    Ok(ForecastRun { table, output })
}

/// Forecast workflow on an already-loaded table.
///
/// This is useful for the TUI where the table is loaded once to fill the
/// category/product pickers.
pub fn forecast_table(
    table: &SalesTable,
    selection: &SeriesSelection,
    model: ModelChoice,
) -> Result<ForecastOutput, AppError> {
    let series = extract_series(&table.records, selection);
    if series.is_empty() {
        return Err(AppError::InsufficientData(format!(
            "No rows match {}.",
            selection.legend()
        )));
    }

    let evaluation = evaluate_models(&series)?;
    Ok(finish_forecast(selection, series, evaluation, model))
}

/// Extend an evaluated series, keeping the evaluation when extension fails.
pub fn finish_forecast(
    selection: &SeriesSelection,
    series: TimeSeries,
    evaluation: Evaluation,
    model: ModelChoice,
) -> ForecastOutput {
    let (extension, extension_error) = match extend_forecast(&evaluation, &series, model) {
        Ok(extension) => (extension, None),
        Err(err) => {
            tracing::warn!(error = %err, "extension unavailable; keeping evaluation");
            (Vec::new(), Some(err))
        }
    };

    ForecastOutput {
        selection: selection.clone(),
        series,
        evaluation,
        extension,
        extension_error,
    }
}

/// Load the file and run the clustering workflow.
pub fn run_cluster(request: &ClusterRequest) -> Result<ClusterRun, AppError> {
    let table = load_sales_table(&request.file, Schema::Cluster)?;
    let clusters = cluster_entities(&table.records, request.dimension, &request.stats, request.k)?;
    Ok(ClusterRun { table, clusters })
}
