//! 30-day projection past the end of the series.
//!
//! The models fitted during evaluation are reused as-is: no refit on the full
//! series. Holt-Winters and SARIMA continue from their train-window state; the
//! moving average repeats its stored mean. Values are dated from the day
//! after the last observed date.

use chrono::Duration;
use serde::Serialize;

use crate::domain::{ModelChoice, ModelKind, TimeSeries};
use crate::error::AppError;
use crate::forecast::Evaluation;
use crate::models::FittedModel;

pub const EXTENSION_HORIZON: usize = 30;

/// Projected values for one model.
#[derive(Debug, Clone, Serialize)]
pub struct ExtensionForecast {
    pub kind: ModelKind,
    pub forecast: TimeSeries,
}

/// Project the chosen model(s) [`EXTENSION_HORIZON`] days past `series`.
///
/// # Errors
/// - `AppError::InsufficientData` for an empty series
/// - `AppError::ModelUnavailable` when a single requested model failed to fit
///
/// With [`ModelChoice::All`], failed models are skipped.
pub fn extend_forecast(
    evaluation: &Evaluation,
    series: &TimeSeries,
    choice: ModelChoice,
) -> Result<Vec<ExtensionForecast>, AppError> {
    let Some(end) = series.end() else {
        return Err(AppError::InsufficientData("Cannot extend an empty series.".to_string()));
    };
    let start = end + Duration::days(1);
    let single = choice != ModelChoice::All;

    let mut out = Vec::new();
    for kind in choice.kinds() {
        match project(evaluation, kind) {
            Ok(values) => out.push(ExtensionForecast {
                kind,
                forecast: TimeSeries::new(start, values),
            }),
            Err(reason) if single => {
                return Err(AppError::ModelUnavailable {
                    model: kind.display_name().to_string(),
                    reason,
                });
            }
            Err(reason) => {
                tracing::warn!(model = %kind, %reason, "skipping model in extension");
            }
        }
    }
    Ok(out)
}

fn project(evaluation: &Evaluation, kind: ModelKind) -> Result<Vec<f64>, String> {
    let result = evaluation
        .get(kind)
        .ok_or_else(|| "model was not evaluated".to_string())?;
    let Some(model) = &result.model else {
        return Err(result.failure.clone().unwrap_or_else(|| "fit failed".to_string()));
    };

    match model {
        FittedModel::MovingAverage(ma) => Ok(vec![ma.mean; EXTENSION_HORIZON]),
        other => other.forecast(EXTENSION_HORIZON).map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::{ModelResult, evaluate_models};
    use chrono::NaiveDate;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    fn flat_eval() -> (Evaluation, TimeSeries) {
        let series = TimeSeries::new(d(1, 1), vec![10.0; 60]);
        (evaluate_models(&series).unwrap(), series)
    }

    fn weekly_eval() -> (Evaluation, TimeSeries) {
        let pattern = [12.0, 9.0, 8.0, 10.0, 11.0, 15.0, 18.0];
        let values = (0..60)
            .map(|t| pattern[t % 7] + 0.1 * ((t * 17 + 7) % 13) as f64)
            .collect();
        let series = TimeSeries::new(d(1, 1), values);
        (evaluate_models(&series).unwrap(), series)
    }

    #[test]
    fn extension_starts_after_series_end() {
        let (eval, series) = weekly_eval();
        let out = extend_forecast(&eval, &series, ModelChoice::All).unwrap();
        assert_eq!(out.len(), 3);
        for ext in &out {
            assert_eq!(ext.forecast.len(), EXTENSION_HORIZON);
            // series ends 2024-02-29
            assert_eq!(ext.forecast.start(), Some(d(3, 1)));
        }
    }

    #[test]
    fn moving_average_repeats_stored_mean() {
        let (eval, series) = flat_eval();
        let out = extend_forecast(&eval, &series, ModelChoice::MovingAverage).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].forecast.values(), &[10.0; EXTENSION_HORIZON]);
    }

    #[test]
    fn failed_single_model_is_unavailable() {
        let (mut eval, series) = weekly_eval();
        eval.results.insert(
            ModelKind::Sarima,
            ModelResult::failed(ModelKind::Sarima, d(2, 15), "diverged"),
        );

        let err = extend_forecast(&eval, &series, ModelChoice::Sarima).unwrap_err();
        assert!(matches!(err, AppError::ModelUnavailable { .. }));
        assert_eq!(err.exit_code(), 3);

        let all = extend_forecast(&eval, &series, ModelChoice::All).unwrap();
        let kinds: Vec<ModelKind> = all.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![ModelKind::HoltWinters, ModelKind::MovingAverage]);
    }
}
