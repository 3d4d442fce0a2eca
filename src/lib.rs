//! `marketiq` library crate.
//!
//! The binary (`miq`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the CLI and the TUI share the same forecast/cluster pipelines
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod cluster;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod series;
pub mod tui;
