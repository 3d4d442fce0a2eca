//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - sets up logging
//! - dispatches file management, forecasting, clustering and sample commands
//! - prints reports/plots and writes optional exports

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::picker::{prompt_for_file, resolve_file};
use crate::cli::{ClusterArgs, Command, FilesCommand, ForecastArgs, SampleArgs};
use crate::data::{SampleConfig, generate_sample, write_sample_csv};
use crate::domain::{ClusterRequest, ForecastRequest, SeriesSelection};
use crate::error::AppError;
use crate::io::{DataStore, preview_table};
use crate::report;

pub mod pipeline;

/// Environment variable holding an `EnvFilter` directive (overrides `-v`).
pub const LOG_ENV: &str = "MIQ_LOG";
/// Log file written inside the data directory while the TUI owns the terminal.
pub const TUI_LOG_FILE: &str = "miq.log";

/// Entry point for the `miq` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();

    // We want `miq` and `miq --data-dir x` to behave like `miq tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let store = DataStore::new(&cli.data_dir);

    let is_tui = matches!(cli.command, Command::Tui);
    init_logging(cli.verbose, is_tui.then_some(&store))?;

    match cli.command {
        Command::Files { command } => handle_files(&store, command),
        Command::Forecast(args) => handle_forecast(&store, args),
        Command::Cluster(args) => handle_cluster(&store, args),
        Command::Sample(args) => handle_sample(&store, args),
        Command::Tui => crate::tui::run(store),
    }
}

/// Install the global subscriber.
///
/// CLI commands log to stderr; the TUI logs to [`TUI_LOG_FILE`] in the data
/// directory so the alternate screen is not corrupted.
fn init_logging(verbose: u8, tui_store: Option<&DataStore>) -> Result<(), AppError> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    match tui_store {
        Some(store) => {
            std::fs::create_dir_all(store.root())
                .map_err(|e| AppError::Io(format!("Failed to create data directory: {e}")))?;
            let path = store.root().join(TUI_LOG_FILE);
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .map_err(|e| AppError::Io(format!("Failed to open log file '{}': {e}", path.display())))?;
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(std::sync::Mutex::new(file)))
                .with(filter)
                .try_init()
                .ok();
        }
        None => {
            tracing_subscriber::registry()
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .with(filter)
                .try_init()
                .ok();
        }
    }
    Ok(())
}

fn handle_files(store: &DataStore, command: FilesCommand) -> Result<(), AppError> {
    match command {
        FilesCommand::List => {
            print!("{}", report::format_file_list(&store.list()?));
            Ok(())
        }
        FilesCommand::Upload { paths } => {
            // Each path is validated and copied independently; the first error
            // decides the exit code once the batch is done.
            let mut first_err = None;
            for path in &paths {
                match store.upload(path) {
                    Ok(table) => {
                        println!("uploaded {}", path.display());
                        print!("{}", report::format_load_summary(&table));
                    }
                    Err(err) => {
                        eprintln!("failed  {}: {err}", path.display());
                        first_err.get_or_insert(err);
                    }
                }
            }
            first_err.map_or(Ok(()), Err)
        }
        FilesCommand::Delete { names } => {
            let outcomes = store.delete(&names);
            print!("{}", report::format_delete_outcomes(&outcomes));
            match outcomes.into_iter().find_map(|o| o.result.err()) {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
        FilesCommand::Inspect { name, rows } => {
            let path = resolve_file(store, &name)?;
            let preview = preview_table(&path, rows)?;
            print!("{}", report::format_preview(&name, &preview));
            Ok(())
        }
    }
}

fn select_file(store: &DataStore, file: Option<&str>) -> Result<PathBuf, AppError> {
    match file {
        Some(name) => resolve_file(store, name),
        None => prompt_for_file(store),
    }
}

fn handle_forecast(store: &DataStore, args: ForecastArgs) -> Result<(), AppError> {
    let file = select_file(store, args.file.as_deref())?;
    let selection = SeriesSelection::new(args.mode, args.category.clone(), args.product.clone())?;
    let request = ForecastRequest { file, selection, model: args.model };

    let run = pipeline::run_forecast(&request)?;
    let out = &run.output;

    println!("{}", report::format_load_summary(&run.table));
    println!("{}", report::format_forecast_report(&out.selection, &out.series, &out.evaluation));
    match &out.extension_error {
        Some(err) => println!("Warning: no 30-day extension. {err}\n"),
        None => println!("{}", report::format_extension_table(&out.extension)),
    }

    if !args.no_plot {
        let plot = crate::plot::render_forecast_plot(&out.series, &out.evaluation, &out.extension, args.width, args.height);
        println!("{plot}");
    }

    if let Some(path) = &args.export {
        crate::io::write_forecast_csv(path, &out.evaluation, &out.extension)?;
        println!("Wrote {}", path.display());
    }
    if let Some(path) = &args.export_json {
        crate::io::write_forecast_json(path, &out.selection, &out.series, &out.evaluation, &out.extension)?;
        println!("Wrote {}", path.display());
    }
    match run.output.extension_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn handle_cluster(store: &DataStore, args: ClusterArgs) -> Result<(), AppError> {
    let file = select_file(store, args.file.as_deref())?;
    let stats = if args.stats.is_empty() {
        args.dimension.catalog().to_vec()
    } else {
        args.stats.clone()
    };
    let request = ClusterRequest {
        file,
        dimension: args.dimension,
        stats,
        k: usize::from(args.k),
    };

    let run = pipeline::run_cluster(&request)?;
    println!("{}", report::format_load_summary(&run.table));
    println!("{}", report::format_cluster_table(&run.clusters));
    println!("{}", report::format_cluster_profiles(&run.clusters));

    if !args.no_plot {
        println!("{}", crate::plot::render_cluster_scatter(&run.clusters, args.width, args.height));
    }
    if let Some(path) = &args.export {
        crate::io::write_cluster_csv(path, &run.clusters)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn handle_sample(store: &DataStore, args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        days: args.days,
        start: args.start,
        seed: args.seed,
    };
    let records = generate_sample(&config)?;
    write_sample_csv(&args.out, &records)?;
    println!("Wrote {} rows to {}", records.len(), args.out.display());

    if args.upload {
        store.upload(&args.out)?;
        println!("Uploaded into {}", store.root().display());
    }
    Ok(())
}

const SUBCOMMANDS: [&str; 6] = ["files", "forecast", "cluster", "sample", "tui", "help"];

/// Rewrite argv so `miq` defaults to `miq tui`.
///
/// Rules:
/// - `miq`                       -> `miq tui`
/// - `miq --data-dir d -v`       -> `miq --data-dir d -v tui`
/// - `miq --help/--version/-h`   -> unchanged (show top-level help/version)
/// - anything with a subcommand  -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let mut args = argv.iter().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" | "-V" | "--version" => return argv,
            "--data-dir" => {
                args.next();
            }
            a if a.starts_with('-') => {}
            a if SUBCOMMANDS.contains(&a) => return argv,
            // Unknown positional: let clap report it.
            _ => return argv,
        }
    }
    argv.push("tui".to_string());
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs_tui() {
        assert_eq!(rewrite_args(args(&["miq"])), args(&["miq", "tui"]));
    }

    #[test]
    fn global_flags_only_run_tui() {
        assert_eq!(
            rewrite_args(args(&["miq", "--data-dir", "forecast", "-v"])),
            args(&["miq", "--data-dir", "forecast", "-v", "tui"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        let fc = args(&["miq", "-v", "forecast", "--mode", "category"]);
        assert_eq!(rewrite_args(fc.clone()), fc);
        let help = args(&["miq", "--help"]);
        assert_eq!(rewrite_args(help.clone()), help);
    }
}
