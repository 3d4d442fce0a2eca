//! Data sources beyond user uploads.
//!
//! - `sample`: deterministic synthetic sales sheet for demos and tests

pub mod sample;

pub use sample::*;
