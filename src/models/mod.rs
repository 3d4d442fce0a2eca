//! Forecasting model implementations.
//!
//! Holt-Winters and SARIMA are estimated by `anofox-forecast`; the moving
//! average is computed locally. Each model exposes a `fit` constructor
//! returning the fitted state, and implements [`Forecaster`] so the evaluator
//! and the extension step can treat them uniformly through [`FittedModel`].

pub mod holt_winters;
pub mod moving_average;
pub mod sarima;

use anofox_forecast::core::TimeSeries as BackendSeries;
use chrono::{TimeZone, Utc};
use serde::Serialize;

pub use holt_winters::HoltWinters;
pub use moving_average::{MOVING_AVERAGE_WINDOW, MovingAverage};
pub use sarima::Sarima;

use crate::domain::{ModelKind, TimeSeries};
use crate::error::ForecastError;

/// Weekly seasonality on daily data.
pub const SEASONAL_PERIOD: usize = 7;

/// Largest absolute observation accepted by the estimators.
///
/// Squared errors of larger inputs overflow `f64` during parameter search.
pub const MAX_MAGNITUDE: f64 = 1e100;

/// A model that can project its fitted state `horizon` steps ahead.
pub trait Forecaster {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>, ForecastError>;
}

/// Fitted model of any kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "model", rename_all = "kebab-case")]
pub enum FittedModel {
    HoltWinters(HoltWinters),
    Sarima(Sarima),
    MovingAverage(MovingAverage),
}

impl FittedModel {
    /// Fit the model family `kind` on `train`.
    pub fn fit(kind: ModelKind, train: &TimeSeries) -> Result<Self, ForecastError> {
        check_observations(train.values())?;
        match kind {
            ModelKind::HoltWinters => HoltWinters::fit(train).map(FittedModel::HoltWinters),
            ModelKind::Sarima => Sarima::fit(train).map(FittedModel::Sarima),
            ModelKind::MovingAverage => {
                MovingAverage::fit(train.values()).map(FittedModel::MovingAverage)
            }
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            FittedModel::HoltWinters(_) => ModelKind::HoltWinters,
            FittedModel::Sarima(_) => ModelKind::Sarima,
            FittedModel::MovingAverage(_) => ModelKind::MovingAverage,
        }
    }

    /// Forecast `horizon` steps, rejecting non-finite output.
    pub fn forecast(&self, horizon: usize) -> Result<Vec<f64>, ForecastError> {
        let values = match self {
            FittedModel::HoltWinters(m) => m.forecast(horizon)?,
            FittedModel::Sarima(m) => m.forecast(horizon)?,
            FittedModel::MovingAverage(m) => m.forecast(horizon)?,
        };
        if values.len() != horizon {
            return Err(ForecastError::Backend(format!(
                "expected {horizon} forecast values, got {}",
                values.len()
            )));
        }
        if values.iter().all(|v| v.is_finite()) {
            Ok(values)
        } else {
            Err(ForecastError::NonFinite)
        }
    }

    /// One-line parameter summary for reports.
    pub fn describe(&self) -> String {
        match self {
            FittedModel::HoltWinters(m) => format!(
                "alpha={:.3} beta={:.3} gamma={:.3} period={}",
                m.alpha, m.beta, m.gamma, m.period
            ),
            FittedModel::Sarima(m) => format!(
                "(1,1,1)(1,1,1,{}) residual_sd={:.3}",
                m.period,
                m.residual_variance.sqrt()
            ),
            FittedModel::MovingAverage(m) => format!("window={} mean={:.3}", m.window, m.mean),
        }
    }
}

/// Reject observations the estimators cannot work with.
pub fn check_observations(y: &[f64]) -> Result<(), ForecastError> {
    if let Some(v) = y.iter().find(|v| !v.is_finite()) {
        return Err(ForecastError::InvalidData(format!("non-finite observation {v}")));
    }
    if let Some(v) = y.iter().find(|v| v.abs() > MAX_MAGNITUDE) {
        return Err(ForecastError::InvalidData(format!(
            "observation {v:e} exceeds the supported magnitude {MAX_MAGNITUDE:e}"
        )));
    }
    Ok(())
}

/// Daily series in the form the estimation backend expects.
pub(crate) fn backend_series(series: &TimeSeries) -> Result<BackendSeries, ForecastError> {
    let timestamps = series
        .dates()
        .map(|date| {
            date.and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive))
                .ok_or_else(|| ForecastError::InvalidData(format!("invalid date {date}")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    BackendSeries::univariate(timestamps, series.values().to_vec())
        .map_err(|e| ForecastError::Backend(e.to_string()))
}

/// Mean of the squared in-sample residuals, ignoring non-finite entries.
pub(crate) fn residual_variance(residuals: Option<&[f64]>) -> f64 {
    let finite: Vec<f64> = residuals
        .unwrap_or_default()
        .iter()
        .copied()
        .filter(|r| r.is_finite())
        .collect();
    if finite.is_empty() {
        return f64::NAN;
    }
    finite.iter().map(|r| r * r).sum::<f64>() / finite.len() as f64
}
