//! Input/output helpers.
//!
//! - spreadsheet ingest + validation (`ingest`)
//! - the data directory (`store`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;
pub mod store;

pub use export::*;
pub use ingest::*;
pub use store::*;
