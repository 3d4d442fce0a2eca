//! Reporting utilities: rounding and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the forecasting/clustering code stays clean and testable
//! - output changes are localized (the plot and table tests pin them)

pub mod format;

pub use format::*;

/// Round to three decimals, the precision shown in every report.
pub fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

/// Metric cell: three decimals, `-` when undefined.
pub fn fmt_metric(v: f64) -> String {
    if v.is_finite() { format!("{:.3}", round3(v)) } else { "-".to_string() }
}

/// Value cell for forecast and cluster tables.
pub fn fmt_value(v: f64) -> String {
    fmt_metric(v)
}
