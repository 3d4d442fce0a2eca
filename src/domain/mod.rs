//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - spreadsheet columns and required-column schemas (`Column`, `Schema`)
//! - loaded sales rows (`SalesRecord`) and daily series (`TimeSeries`)
//! - selection enums for forecasting and clustering requests

pub mod types;

pub use types::*;
