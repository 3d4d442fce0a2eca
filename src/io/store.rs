//! The data directory: list, upload and delete sales files.
//!
//! Every file is validated against the full upload schema before it is copied
//! in, so anything listed here can be fed to either analysis.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Schema;
use crate::error::AppError;
use crate::io::ingest::{SalesTable, is_supported_extension, load_sales_table};

/// Result of deleting one file in a batch.
#[derive(Debug, Clone)]
pub struct DeleteOutcome {
    pub name: String,
    pub result: Result<(), AppError>,
}

/// Handle on the configured data directory.
#[derive(Debug, Clone)]
pub struct DataStore {
    root: PathBuf,
}

impl DataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn ensure_dir(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            AppError::Io(format!(
                "Failed to create data directory '{}': {e}",
                self.root.display()
            ))
        })
    }

    /// File names of supported spreadsheets, sorted.
    pub fn list(&self) -> Result<Vec<String>, AppError> {
        self.ensure_dir()?;
        let entries = fs::read_dir(&self.root).map_err(|e| {
            AppError::Io(format!("Failed to read data directory '{}': {e}", self.root.display()))
        })?;

        let mut names: Vec<String> = entries
            .flatten()
            .filter(|entry| entry.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|entry| entry.path())
            .filter(|path| is_supported_extension(path))
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Full path of a listed file.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, AppError> {
        validate_name(name)?;
        let path = self.root.join(name);
        if !path.is_file() {
            return Err(AppError::Io(format!(
                "File '{name}' not found in {}.",
                self.root.display()
            )));
        }
        Ok(path)
    }

    /// Validate `src` against the upload schema and copy it into the directory.
    ///
    /// An existing file with the same name is overwritten.
    pub fn upload(&self, src: &Path) -> Result<SalesTable, AppError> {
        let name = src
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::InvalidInput(format!("Invalid file name: {}", src.display())))?
            .to_string();

        let table = load_sales_table(src, Schema::Upload)?;

        self.ensure_dir()?;
        let dest = self.root.join(&name);
        if dest.exists() {
            tracing::info!(file = %name, "overwriting existing file");
        }
        fs::copy(src, &dest)
            .map_err(|e| AppError::Io(format!("Failed to copy '{}' into data directory: {e}", src.display())))?;

        tracing::info!(file = %name, rows = table.rows_used, "uploaded file");
        Ok(table)
    }

    /// Delete each named file independently.
    ///
    /// A failure is recorded for that file and the rest of the batch continues.
    pub fn delete(&self, names: &[String]) -> Vec<DeleteOutcome> {
        names
            .iter()
            .map(|name| {
                let result = self.delete_one(name);
                match &result {
                    Ok(()) => tracing::info!(file = %name, "deleted file"),
                    Err(err) => tracing::warn!(file = %name, error = %err, "delete failed"),
                }
                DeleteOutcome {
                    name: name.clone(),
                    result,
                }
            })
            .collect()
    }

    fn delete_one(&self, name: &str) -> Result<(), AppError> {
        let path = self.resolve(name)?;
        fs::remove_file(&path).map_err(|e| AppError::Io(format!("Failed to delete '{name}': {e}")))
    }
}

/// Reject names that would escape the data directory.
fn validate_name(name: &str) -> Result<(), AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\']) {
        return Err(AppError::InvalidInput(format!("Invalid file name: '{name}'")));
    }
    Ok(())
}
