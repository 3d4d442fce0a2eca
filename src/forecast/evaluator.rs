//! Hold-out evaluation of the forecasting models.
//!
//! The last [`TEST_HORIZON`] observations are held out, every model is fitted
//! on the remaining training window and scored on the held-out tail.
//!
//! A model that fails to fit (or forecasts non-finite values) does not abort
//! the evaluation: it is replaced by a placeholder whose predictions and
//! metrics are NaN, and the failure reason is kept for the report.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::Serialize;

use crate::domain::{ModelKind, TimeSeries};
use crate::error::{AppError, ForecastError};
use crate::math::{mape, rmse};
use crate::models::FittedModel;
use crate::series::MIN_OBSERVATIONS;

/// Held-out observations used for scoring.
pub const TEST_HORIZON: usize = 15;

/// Outcome of fitting and scoring one model.
#[derive(Debug, Clone, Serialize)]
pub struct ModelResult {
    pub kind: ModelKind,
    /// `None` when the fit failed.
    #[serde(skip)]
    pub model: Option<FittedModel>,
    /// One prediction per test date (NaN on failure).
    pub predictions: TimeSeries,
    pub mape: f64,
    pub rmse: f64,
    pub failure: Option<String>,
}

impl ModelResult {
    /// Placeholder for a model that could not be fitted.
    pub fn failed(kind: ModelKind, test_start: NaiveDate, reason: impl Into<String>) -> Self {
        Self {
            kind,
            model: None,
            predictions: TimeSeries::new(test_start, vec![f64::NAN; TEST_HORIZON]),
            mape: f64::NAN,
            rmse: f64::NAN,
            failure: Some(reason.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.failure.is_none()
    }
}

/// All model results plus the split they were computed on.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub results: BTreeMap<ModelKind, ModelResult>,
    pub train: TimeSeries,
    pub test: TimeSeries,
}

impl Evaluation {
    /// Best successful model: lowest RMSE, then MAPE, then model order.
    pub fn best(&self) -> Option<&ModelResult> {
        self.results
            .values()
            .filter(|r| r.is_ok() && r.rmse.is_finite())
            .min_by(|a, b| {
                a.rmse
                    .total_cmp(&b.rmse)
                    .then(a.mape.total_cmp(&b.mape))
                    .then(a.kind.cmp(&b.kind))
            })
    }

    pub fn get(&self, kind: ModelKind) -> Option<&ModelResult> {
        self.results.get(&kind)
    }
}

/// Split `series`, fit every model on the train window and score it.
///
/// # Errors
/// `AppError::InsufficientData` when the series is shorter than
/// [`MIN_OBSERVATIONS`]. Individual model failures are never errors.
pub fn evaluate_models(series: &TimeSeries) -> Result<Evaluation, AppError> {
    evaluate_with(series, FittedModel::fit)
}

/// [`evaluate_models`] with a caller-supplied fitting step.
///
/// Models are fitted in parallel; each failure is isolated to its own
/// placeholder result.
pub fn evaluate_with<F>(series: &TimeSeries, fit: F) -> Result<Evaluation, AppError>
where
    F: Fn(ModelKind, &TimeSeries) -> Result<FittedModel, ForecastError> + Sync,
{
    if series.len() < MIN_OBSERVATIONS {
        return Err(AppError::InsufficientData(format!(
            "Not enough data to forecast: need at least {MIN_OBSERVATIONS} daily observations, got {}.",
            series.len()
        )));
    }

    let (train, test) = series.split_at(series.len() - TEST_HORIZON);
    let Some(test_start) = test.start() else {
        return Err(AppError::Computation("Empty test window.".to_string()));
    };

    let results = ModelKind::ALL[..]
        .par_iter()
        .map(|&kind| {
            let result = match score_model(&fit, kind, &train, &test) {
                Ok(result) => {
                    tracing::info!(model = %kind, mape = result.mape, rmse = result.rmse, "model evaluated");
                    result
                }
                Err(err) => {
                    tracing::warn!(model = %kind, error = %err, "model fit failed; using placeholder");
                    ModelResult::failed(kind, test_start, err.to_string())
                }
            };
            (kind, result)
        })
        .collect::<BTreeMap<_, _>>();

    Ok(Evaluation { results, train, test })
}

fn score_model<F>(fit: &F, kind: ModelKind, train: &TimeSeries, test: &TimeSeries) -> Result<ModelResult, ForecastError>
where
    F: Fn(ModelKind, &TimeSeries) -> Result<FittedModel, ForecastError>,
{
    let model = fit(kind, train)?;
    let values = model.forecast(test.len())?;
    let test_start = test
        .start()
        .ok_or_else(|| ForecastError::InvalidData("empty test window".to_string()))?;

    Ok(ModelResult {
        kind,
        mape: mape(test.values(), &values),
        rmse: rmse(test.values(), &values),
        predictions: TimeSeries::new(test_start, values),
        model: Some(model),
        failure: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    /// Weekly pattern, slow trend and a small irregular component.
    fn weekly(n: usize) -> Vec<f64> {
        let pattern = [12.0, 9.0, 8.0, 10.0, 11.0, 15.0, 18.0];
        (0..n)
            .map(|t| pattern[t % 7] + 0.05 * t as f64 + 0.1 * ((t * 17 + 7) % 13) as f64)
            .collect()
    }

    #[test]
    fn constant_series_scores_perfectly() {
        let series = TimeSeries::new(start(), vec![10.0; 60]);
        let eval = evaluate_models(&series).unwrap();

        assert_eq!(eval.train.len(), 45);
        assert_eq!(eval.test.len(), TEST_HORIZON);
        assert_eq!(eval.test.start(), Some(NaiveDate::from_ymd_opt(2024, 2, 15).unwrap()));

        assert_eq!(eval.results.len(), 3);

        let ma = eval.get(ModelKind::MovingAverage).unwrap();
        assert!(ma.is_ok());
        assert_eq!(ma.predictions.values(), &[10.0; TEST_HORIZON]);
        assert_eq!(ma.mape, 0.0);
        assert_eq!(ma.rmse, 0.0);
        let hw = eval.get(ModelKind::HoltWinters).unwrap();
        assert!(hw.is_ok(), "{:?}", hw.failure);
        assert!(hw.rmse < 1e-6);
    }

    #[test]
    fn short_series_is_insufficient() {
        let series = TimeSeries::new(start(), vec![1.0; MIN_OBSERVATIONS - 1]);
        let err = evaluate_models(&series).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn failed_model_keeps_aligned_placeholder() {
        let placeholder = ModelResult::failed(ModelKind::Sarima, start(), "boom");
        assert_eq!(placeholder.predictions.len(), TEST_HORIZON);
        assert_eq!(placeholder.predictions.start(), Some(start()));
        assert!(placeholder.predictions.values().iter().all(|v| v.is_nan()));
        assert!(placeholder.mape.is_nan() && placeholder.rmse.is_nan());
        assert!(!placeholder.is_ok());
    }

    #[test]
    fn fit_failure_inside_evaluation_is_isolated() {
        let series = TimeSeries::new(start(), weekly(60));

        // SARIMA sees a corrupted train window and fails inside its real fit.
        let eval = evaluate_with(&series, |kind, train| {
            if kind == ModelKind::Sarima {
                let mut poisoned = train.values().to_vec();
                poisoned[10] = f64::NAN;
                let start = train.start().unwrap();
                FittedModel::fit(kind, &TimeSeries::new(start, poisoned))
            } else {
                FittedModel::fit(kind, train)
            }
        })
        .unwrap();

        let sarima = eval.get(ModelKind::Sarima).unwrap();
        assert!(!sarima.is_ok());
        assert!(sarima.model.is_none());
        assert!(sarima.failure.as_deref().unwrap().contains("non-finite"));
        assert_eq!(sarima.predictions.len(), TEST_HORIZON);
        assert_eq!(sarima.predictions.start(), eval.test.start());
        assert!(sarima.predictions.values().iter().all(|v| v.is_nan()));
        assert!(sarima.mape.is_nan() && sarima.rmse.is_nan());

        for kind in [ModelKind::HoltWinters, ModelKind::MovingAverage] {
            let result = eval.get(kind).unwrap();
            assert!(result.is_ok(), "{kind}: {:?}", result.failure);
            assert!(result.predictions.values().iter().all(|v| v.is_finite()));
            assert!(result.rmse.is_finite());
        }
        assert_ne!(eval.best().map(|r| r.kind), Some(ModelKind::Sarima));
    }

    #[test]
    fn huge_series_fails_every_model_without_aborting() {
        let series = TimeSeries::new(start(), vec![1e300; 60]);
        let eval = evaluate_models(&series).unwrap();
        assert_eq!(eval.results.len(), 3);
        assert!(eval.results.values().all(|r| !r.is_ok()));
        assert!(eval.best().is_none());
    }

    #[test]
    fn best_skips_failures_and_prefers_low_rmse() {
        let mut eval = evaluate_models(&TimeSeries::new(start(), weekly(60))).unwrap();
        eval.results.insert(
            ModelKind::HoltWinters,
            ModelResult::failed(ModelKind::HoltWinters, start(), "forced"),
        );
        let ma_rmse = eval.get(ModelKind::MovingAverage).unwrap().rmse;
        if let Some(sarima) = eval.results.get_mut(&ModelKind::Sarima) {
            sarima.failure = None;
            sarima.rmse = ma_rmse + 1.0;
        }
        assert_eq!(eval.best().map(|r| r.kind), Some(ModelKind::MovingAverage));

        if let Some(sarima) = eval.results.get_mut(&ModelKind::Sarima) {
            sarima.rmse = 0.0;
        }
        assert_eq!(eval.best().map(|r| r.kind), Some(ModelKind::Sarima));
    }

    #[test]
    fn weekly_series_evaluates_every_model() {
        let eval = evaluate_models(&TimeSeries::new(start(), weekly(70))).unwrap();

        assert_eq!(eval.results.len(), 3);
        for result in eval.results.values() {
            assert!(result.is_ok());
            assert!(result.mape >= 0.0 && result.rmse >= 0.0);
        }
        // Seasonal models should beat the flat baseline on a weekly pattern.
        let ma = eval.get(ModelKind::MovingAverage).unwrap().rmse;
        let hw = eval.get(ModelKind::HoltWinters).unwrap().rmse;
        assert!(hw < ma);
    }
}
