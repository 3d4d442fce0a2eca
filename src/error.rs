use thiserror::Error;

/// Errors that halt a request and reach the user.
///
/// Each variant maps onto a process exit code (see [`AppError::exit_code`]):
///
/// - `2`: input problems (I/O, schema, invalid arguments)
/// - `3`: not enough data to run the analysis
/// - `4`: computation or terminal failures
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("{0}")]
    Io(String),

    #[error(
        "Missing required column(s): {}. Expected columns: {}.",
        .missing.join(", "),
        .expected.join(", ")
    )]
    Schema {
        missing: Vec<String>,
        expected: Vec<String>,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    InsufficientData(String),

    #[error("The selected statistics show no variation across entities; nothing to cluster.")]
    NoVariance,

    #[error("Model {model} is unavailable: {reason}")]
    ModelUnavailable { model: String, reason: String },

    #[error("{0}")]
    Computation(String),

    #[error("{0}")]
    Terminal(String),
}

impl AppError {
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Io(_) | AppError::Schema { .. } | AppError::InvalidInput(_) => 2,
            AppError::InsufficientData(_) | AppError::NoVariance | AppError::ModelUnavailable { .. } => 3,
            AppError::Computation(_) | AppError::Terminal(_) => 4,
        }
    }
}

/// Failure of a single forecasting model.
///
/// These never escape the evaluator: a failed model becomes a placeholder
/// result and the remaining models carry on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForecastError {
    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("estimation failed: {0}")]
    Backend(String),

    #[error("forecast produced non-finite values")]
    NonFinite,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        let schema = AppError::Schema {
            missing: vec!["Fecha".to_string()],
            expected: vec!["Fecha".to_string(), "Tienda".to_string()],
        };
        assert_eq!(schema.exit_code(), 2);
        assert_eq!(AppError::NoVariance.exit_code(), 3);
        assert_eq!(AppError::InsufficientData("x".into()).exit_code(), 3);
        assert_eq!(AppError::Computation("x".into()).exit_code(), 4);
    }

    #[test]
    fn schema_error_lists_missing_and_expected() {
        let err = AppError::Schema {
            missing: vec!["Tienda".to_string()],
            expected: vec!["Fecha".to_string(), "Tienda".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Missing required column(s): Tienda."));
        assert!(msg.contains("Expected columns: Fecha, Tienda."));
    }
}
