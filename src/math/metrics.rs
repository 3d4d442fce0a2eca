//! Forecast accuracy metrics.

/// Floor for the MAPE denominator so zero actuals do not divide by zero.
const MAPE_EPSILON: f64 = f64::EPSILON;

/// Mean absolute percentage error as a fraction (0.1 = 10%).
///
/// Each term is `|y - ŷ| / max(|y|, ε)`, so a zero actual with a non-zero
/// forecast yields a very large (but finite) error. Returns NaN for empty or
/// mismatched inputs.
pub fn mape(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return f64::NAN;
    }
    let total: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(&y, &p)| (y - p).abs() / y.abs().max(MAPE_EPSILON))
        .sum();
    total / actual.len() as f64
}

/// Root mean squared error.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() || actual.len() != predicted.len() {
        return f64::NAN;
    }
    let sse: f64 = actual.iter().zip(predicted).map(|(&y, &p)| (y - p) * (y - p)).sum();
    (sse / actual.len() as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perfect_forecast_scores_zero() {
        let y = [10.0, 10.0, 10.0];
        assert_eq!(mape(&y, &y), 0.0);
        assert_eq!(rmse(&y, &y), 0.0);
    }

    #[test]
    fn known_values() {
        let y = [100.0, 200.0];
        let p = [110.0, 180.0];
        assert!((mape(&y, &p) - 0.1).abs() < 1e-12);
        assert!((rmse(&y, &p) - (250.0_f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn zero_actuals_stay_finite() {
        let v = mape(&[0.0], &[1.0]);
        assert!(v.is_finite() && v > 1e10);
    }

    #[test]
    fn mismatched_lengths_are_nan() {
        assert!(mape(&[1.0], &[]).is_nan());
        assert!(rmse(&[], &[]).is_nan());
    }
}
