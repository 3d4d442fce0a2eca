//! Forecast accuracy metrics.

pub mod metrics;

pub use metrics::*;
