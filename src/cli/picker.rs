//! Interactive spreadsheet picker.
//!
//! This is intentionally kept separate from clap parsing:
//! - clap handles structured flags/subcommands
//! - the picker provides the "run `miq forecast` and choose a file" UX
//!
//! The picker lists the spreadsheets in the data directory.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;
use crate::io::{DataStore, is_supported_extension};

/// Prompt the user to select a spreadsheet from the data directory.
///
/// Behavior:
/// - list the stored `.xlsx`/`.xls`/`.csv` files
/// - accept either a number (from the list) or an explicit path
/// - `q` cancels
pub fn prompt_for_file(store: &DataStore) -> Result<PathBuf, AppError> {
    let files = store.list()?;
    if files.is_empty() {
        return Err(AppError::InvalidInput(format!(
            "No spreadsheets in {}. Upload one with `miq files upload <PATH>`.",
            store.root().display()
        )));
    }

    println!("Found {} spreadsheet(s) in {}:", files.len(), store.root().display());
    for (idx, name) in files.iter().enumerate() {
        println!("{:>3}) {name}", idx + 1);
    }

    loop {
        print!("Select a file by number (1-{}) or type a path (q to quit): ", files.len());
        io::stdout()
            .flush()
            .map_err(|e| AppError::Io(format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::Io(format!("Failed to read input: {e}")))?;

        if bytes == 0 {
            return Err(AppError::InvalidInput(
                "No input received. Pass a file with `-f <NAME>`.".to_string(),
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::InvalidInput("Canceled.".to_string()));
        }

        if let Ok(choice) = input.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return store.resolve(&files[choice - 1]);
            }
            println!("Invalid choice: {choice}. Enter a number between 1 and {}.", files.len());
            continue;
        }

        match validate_sales_path(Path::new(input)) {
            Ok(path) => return Ok(path),
            Err(err) => println!("{err}"),
        }
    }
}

/// Resolve `-f NAME`: a stored file name first, then a filesystem path.
pub fn resolve_file(store: &DataStore, name: &str) -> Result<PathBuf, AppError> {
    match store.resolve(name) {
        Ok(path) => Ok(path),
        Err(err) => {
            let candidate = Path::new(name);
            if candidate.exists() { validate_sales_path(candidate) } else { Err(err) }
        }
    }
}

/// Validate the provided path points to a readable spreadsheet.
pub fn validate_sales_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::Io(format!("File not found: {}", path.display())));
    }
    if path.is_dir() {
        return Err(AppError::Io(format!("Expected a file, got a directory: {}", path.display())));
    }
    if !is_supported_extension(path) {
        return Err(AppError::InvalidInput(format!(
            "Expected an .xlsx, .xls or .csv file (got: {}).",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_directories_and_other_extensions() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_sales_path(dir.path()).is_err());

        let txt = dir.path().join("notes.txt");
        std::fs::write(&txt, "x").unwrap();
        assert!(validate_sales_path(&txt).is_err());

        let csv = dir.path().join("ventas.CSV");
        std::fs::write(&csv, "x").unwrap();
        assert_eq!(validate_sales_path(&csv).unwrap(), csv);
    }

    #[test]
    fn resolve_prefers_the_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path().join("data"));
        std::fs::create_dir_all(store.root()).unwrap();
        std::fs::write(store.root().join("a.csv"), "x").unwrap();

        assert_eq!(resolve_file(&store, "a.csv").unwrap(), store.root().join("a.csv"));
        assert!(resolve_file(&store, "missing.csv").is_err());

        let outside = dir.path().join("b.csv");
        std::fs::write(&outside, "x").unwrap();
        let name = outside.to_string_lossy().to_string();
        assert_eq!(resolve_file(&store, &name).unwrap(), outside);
    }
}
