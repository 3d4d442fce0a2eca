//! Seasonal ARIMA (1,1,1)(1,1,1)_7.
//!
//! The series is differenced once at lag 1 and once at lag 7:
//!
//! ```text
//! w_t = (1 - B)(1 - B^7) y_t
//! ```
//!
//! and `w` follows the multiplicative ARMA
//!
//! ```text
//! (1 - φB)(1 - ΦB^7) w_t = (1 + θB)(1 + ΘB^7) e_t
//! ```
//!
//! Estimation and integration of the forecasts back to the original scale are
//! delegated to `anofox-forecast`.

use anofox_forecast::models::Forecaster as _;
use anofox_forecast::models::arima::SARIMA;
use serde::Serialize;

use crate::domain::TimeSeries;
use crate::error::ForecastError;
use crate::models::{Forecaster, SEASONAL_PERIOD, backend_series, residual_variance};

/// Observations lost to differencing (`1 + period`).
const DIFFERENCING_LOSS: usize = SEASONAL_PERIOD + 1;
/// Differenced observations needed to estimate the four coefficients.
const MIN_DIFFERENCED: usize = SEASONAL_PERIOD + 6;

/// Fitted SARIMA model.
#[derive(Debug, Clone, Serialize)]
pub struct Sarima {
    pub period: usize,
    /// Mean squared in-sample residual.
    pub residual_variance: f64,
    #[serde(skip)]
    estimator: SARIMA,
}

impl Sarima {
    pub fn fit(train: &TimeSeries) -> Result<Self, ForecastError> {
        let required = DIFFERENCING_LOSS + MIN_DIFFERENCED;
        if train.len() < required {
            return Err(ForecastError::InsufficientData {
                required,
                actual: train.len(),
            });
        }
        crate::models::check_observations(train.values())?;

        let mut estimator = SARIMA::new(1, 1, 1, 1, 1, 1, SEASONAL_PERIOD);
        estimator
            .fit(&backend_series(train)?)
            .map_err(|e| ForecastError::Backend(e.to_string()))?;
        let residual_variance = residual_variance(estimator.residuals());

        tracing::debug!(residual_variance, "fitted sarima");

        Ok(Self {
            period: SEASONAL_PERIOD,
            residual_variance,
            estimator,
        })
    }
}

impl Forecaster for Sarima {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>, ForecastError> {
        let forecast = self
            .estimator
            .predict(horizon)
            .map_err(|e| ForecastError::Backend(e.to_string()))?;
        Ok(forecast.primary().to_vec())
    }
}
