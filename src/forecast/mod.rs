//! Forecast evaluation and extension.

pub mod evaluator;
pub mod extension;

pub use evaluator::{Evaluation, ModelResult, TEST_HORIZON, evaluate_models, evaluate_with};
pub use extension::{EXTENSION_HORIZON, ExtensionForecast, extend_forecast};
