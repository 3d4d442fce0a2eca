//! Command-line parsing for the `miq` sales analytics tool.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the forecasting/clustering code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};

use crate::cluster::MAX_CLUSTERS;
use crate::domain::{Dimension, ModelChoice, SelectionMode, Statistic};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "miq", version, about = "Retail sales forecasting and customer/product/store segmentation")]
pub struct Cli {
    /// Directory holding the uploaded spreadsheets.
    #[arg(long, global = true, env = "MIQ_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// More log output (-v info, -vv debug). `MIQ_LOG` overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage the spreadsheets in the data directory.
    Files {
        #[command(subcommand)]
        command: FilesCommand,
    },
    /// Compare the forecasting models on a daily series and project 30 days ahead.
    Forecast(ForecastArgs),
    /// Segment products, customers or stores with k-means.
    Cluster(ClusterArgs),
    /// Write a synthetic sales sheet.
    Sample(SampleArgs),
    /// Launch the interactive TUI.
    ///
    /// Uses the same pipelines as `miq forecast` and `miq cluster`, rendered
    /// with Ratatui.
    Tui,
}

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// List spreadsheets in the data directory.
    List,
    /// Validate and copy spreadsheets into the data directory.
    Upload {
        #[arg(required = true, value_name = "PATH")]
        paths: Vec<PathBuf>,
    },
    /// Delete spreadsheets from the data directory (each file independently).
    Delete {
        #[arg(required = true, value_name = "NAME")]
        names: Vec<String>,
    },
    /// Show the header and first rows of a spreadsheet.
    Inspect {
        name: String,

        /// Rows to show.
        #[arg(long, default_value_t = 10)]
        rows: usize,
    },
}

/// Options for `miq forecast`.
#[derive(Debug, Parser, Clone)]
pub struct ForecastArgs {
    /// Spreadsheet name in the data directory (or a path). Prompted when omitted.
    #[arg(short = 'f', long = "file", value_name = "NAME")]
    pub file: Option<String>,

    /// Forecast one product or a whole category.
    #[arg(long, value_enum)]
    pub mode: SelectionMode,

    /// Category (`Categoria`) to select.
    #[arg(long)]
    pub category: String,

    /// Product (`Nombre_Producto`); required with `--mode product`.
    #[arg(long)]
    pub product: Option<String>,

    /// Model(s) to project past the end of the series.
    #[arg(long, value_enum, default_value_t = ModelChoice::All)]
    pub model: ModelChoice,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export test-window predictions and the extension to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the full run (series, models, extension) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for `miq cluster`.
#[derive(Debug, Parser, Clone)]
pub struct ClusterArgs {
    /// Spreadsheet name in the data directory (or a path). Prompted when omitted.
    #[arg(short = 'f', long = "file", value_name = "NAME")]
    pub file: Option<String>,

    /// Entity to group by.
    #[arg(long = "by", value_enum)]
    pub dimension: Dimension,

    /// Statistic to cluster on (repeatable). Defaults to the whole catalog of the dimension.
    #[arg(long = "stat", value_enum)]
    pub stats: Vec<Statistic>,

    /// Number of clusters.
    #[arg(short = 'k', long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(2..=MAX_CLUSTERS as i64))]
    pub k: u8,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export the cluster table to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,
}

/// Options for `miq sample`.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Number of days to generate.
    #[arg(long, default_value_t = 120)]
    pub days: usize,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First date (YYYY-MM-DD).
    #[arg(long, default_value = "2024-01-01")]
    pub start: NaiveDate,

    /// Also upload the generated file into the data directory.
    #[arg(long)]
    pub upload: bool,
}
