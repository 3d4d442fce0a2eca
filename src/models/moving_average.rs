//! Trailing moving-average baseline.

use serde::Serialize;

use crate::error::ForecastError;
use crate::models::Forecaster;

pub const MOVING_AVERAGE_WINDOW: usize = 7;

/// Mean of the last `window` observations, broadcast flat.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovingAverage {
    pub window: usize,
    pub mean: f64,
}

impl MovingAverage {
    pub fn fit(y: &[f64]) -> Result<Self, ForecastError> {
        let window = MOVING_AVERAGE_WINDOW;
        if y.len() < window {
            return Err(ForecastError::InsufficientData {
                required: window,
                actual: y.len(),
            });
        }
        let tail = &y[y.len() - window..];
        let mean = tail.iter().sum::<f64>() / window as f64;
        if !mean.is_finite() {
            return Err(ForecastError::NonFinite);
        }
        Ok(Self { window, mean })
    }
}

impl Forecaster for MovingAverage {
    fn forecast(&self, horizon: usize) -> Result<Vec<f64>, ForecastError> {
        Ok(vec![self.mean; horizon])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_trailing_window_only() {
        let y = [100.0, 100.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let ma = MovingAverage::fit(&y).unwrap();
        assert!((ma.mean - 4.0).abs() < 1e-12);
        assert_eq!(ma.forecast(3).unwrap(), vec![4.0, 4.0, 4.0]);
    }

    #[test]
    fn short_input_fails() {
        assert!(MovingAverage::fit(&[1.0; 6]).is_err());
    }
}
