//! Holt-Winters exponential smoothing with additive trend and additive seasonality.
//!
//! ```text
//! ŷ_{t+h} = l_t + h b_t + s_{t+h-m}
//! l_t = α (y_t - s_{t-m}) + (1 - α)(l_{t-1} + b_{t-1})
//! b_t = β (l_t - l_{t-1}) + (1 - β) b_{t-1}
//! s_t = γ (y_t - l_t) + (1 - γ) s_{t-m}
//! ```
//!
//! Estimation is delegated to `anofox-forecast`, which optimizes `(α, β, γ)`
//! on the in-sample one-step-ahead errors.

use anofox_forecast::models::Forecaster as _;
use anofox_forecast::models::exponential::{HoltWinters as Estimator, SeasonalType};
use serde::Serialize;

use crate::domain::TimeSeries;
use crate::error::ForecastError;
use crate::models::{Forecaster, SEASONAL_PERIOD, backend_series, residual_variance};

/// Fitted additive Holt-Winters model.
#[derive(Debug, Clone, Serialize)]
pub struct HoltWinters {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub period: usize,
    /// Mean squared one-step-ahead in-sample error.
    pub residual_variance: f64,
    #[serde(skip)]
    estimator: Estimator,
}

impl HoltWinters {
    /// Fit on `train` (at least two full seasons).
    pub fn fit(train: &TimeSeries) -> Result<Self, ForecastError> {
        let m = SEASONAL_PERIOD;
        if train.len() < 2 * m {
            return Err(ForecastError::InsufficientData {
                required: 2 * m,
                actual: train.len(),
            });
        }
        crate::models::check_observations(train.values())?;

        let mut estimator = Estimator::auto(m, SeasonalType::Additive);
        estimator
            .fit(&backend_series(train)?)
            .map_err(|e| ForecastError::Backend(e.to_string()))?;

        let (Some(alpha), Some(beta), Some(gamma)) =
            (estimator.alpha(), estimator.beta(), estimator.gamma())
        else {
            return Err(ForecastError::Backend(
                "holt-winters smoothing parameters missing after fit".to_string(),
            ));
        };
        let residual_variance = residual_variance(estimator.residuals());

        tracing::debug!(alpha, beta, gamma, residual_variance, "fitted holt-winters");

        Ok(Self {
            alpha,
            beta,
            gamma,
            period: m,
            residual_variance,
            estimator,
        })
    }

    /// Level and trend at the end of the training window.
    pub fn state(&self) -> Option<(f64, f64)> {
        Some((self.estimator.level()?, self.estimator.trend()?))
    }
}

impl Forecaster for HoltWinters {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>, ForecastError> {
        let forecast = self
            .estimator
            .predict(horizon)
            .map_err(|e| ForecastError::Backend(e.to_string()))?;
        Ok(forecast.primary().to_vec())
    }
}
