//! Spreadsheet ingest and normalization.
//!
//! This module turns a sales export (`.csv`, `.xlsx` or `.xls`) into a clean
//! list of `SalesRecord`s.
//!
//! Design goals:
//! - **Strict schema**: the required columns of the requested `Schema` must all
//!   be present before any row is parsed (clear error listing what is missing)
//! - **Row-level validation**: skip bad rows, but report what happened
//! - **One code path** for CSV and workbooks: both are read into raw cells first

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto};
use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::domain::{Column, SalesRecord, Schema};
use crate::error::AppError;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone, PartialEq)]
pub struct RowError {
    /// 1-based line/row number in the source file (header is line 1).
    pub line: usize,
    pub message: String,
}

/// Ingest output: normalized records + row errors.
#[derive(Debug, Clone)]
pub struct SalesTable {
    pub source: PathBuf,
    pub records: Vec<SalesRecord>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
}

impl SalesTable {
    /// Distinct categories, sorted.
    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.category.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Distinct products sold within `category`, sorted.
    pub fn products_in(&self, category: &str) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .records
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.product.as_str())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let min = self.records.iter().map(|r| r.date).min()?;
        let max = self.records.iter().map(|r| r.date).max()?;
        Some((min, max))
    }
}

/// Header + first rows of a file, as displayed text.
#[derive(Debug, Clone)]
pub struct TablePreview {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub total_rows: usize,
    /// Columns of the full upload schema absent from the header.
    pub missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => fmt_number(*v),
            Cell::Date(d) => d.to_string(),
        }
    }
}

/// Raw cells read from a CSV or workbook, before any typing.
struct RawTable {
    headers: Vec<String>,
    /// `(line, cells)`; rows that failed to decode carry the decode error instead.
    rows: Vec<(usize, Result<Vec<Cell>, String>)>,
}

/// Load a sales file and normalize it to `SalesRecord`s.
///
/// Fails with `AppError::Schema` when a column required by `schema` is absent,
/// and with `AppError::InsufficientData` when no row survives validation.
pub fn load_sales_table(path: &Path, schema: Schema) -> Result<SalesTable, AppError> {
    let raw = read_raw_table(path)?;
    let header_map = build_header_map(&raw.headers);
    ensure_required_columns_exist(schema, &header_map)?;

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (line, row) in &raw.rows {
        let cells = match row {
            Ok(cells) if cells.iter().all(|c| *c == Cell::Empty) => continue,
            Ok(cells) => cells,
            Err(message) => {
                rows_read += 1;
                row_errors.push(RowError {
                    line: *line,
                    message: message.clone(),
                });
                continue;
            }
        };
        rows_read += 1;

        match parse_row(cells, &header_map, schema) {
            Ok(record) => records.push(record),
            Err(message) => row_errors.push(RowError { line: *line, message }),
        }
    }

    let rows_used = records.len();
    if !row_errors.is_empty() {
        tracing::warn!(
            path = %path.display(),
            skipped = row_errors.len(),
            "skipped rows that failed validation"
        );
    }
    if rows_used == 0 {
        return Err(AppError::InsufficientData(format!(
            "No valid rows in '{}'.",
            path.display()
        )));
    }

    tracing::info!(path = %path.display(), rows_read, rows_used, "loaded sales table");

    Ok(SalesTable {
        source: path.to_path_buf(),
        records,
        row_errors,
        rows_read,
        rows_used,
    })
}

/// Read the header and the first `max_rows` rows for display.
pub fn preview_table(path: &Path, max_rows: usize) -> Result<TablePreview, AppError> {
    let raw = read_raw_table(path)?;
    let header_map = build_header_map(&raw.headers);
    let missing = missing_columns(Schema::Upload, &header_map);

    let rows = raw
        .rows
        .iter()
        .filter_map(|(_, row)| row.as_ref().ok())
        .take(max_rows)
        .map(|cells| cells.iter().map(Cell::display).collect())
        .collect();

    Ok(TablePreview {
        headers: raw.headers.clone(),
        rows,
        total_rows: raw.rows.len(),
        missing,
    })
}

/// Whether the file extension is one the loader understands.
pub fn is_supported_extension(path: &Path) -> bool {
    file_kind(path).is_some()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Workbook,
}

fn file_kind(path: &Path) -> Option<FileKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some(FileKind::Csv),
        "xlsx" | "xls" => Some(FileKind::Workbook),
        _ => None,
    }
}

fn read_raw_table(path: &Path) -> Result<RawTable, AppError> {
    match file_kind(path) {
        Some(FileKind::Csv) => read_csv_table(path),
        Some(FileKind::Workbook) => read_workbook_table(path),
        None => Err(AppError::InvalidInput(format!(
            "Unsupported file type: {} (expected .xlsx, .xls or .csv)",
            path.display()
        ))),
    }
}

fn read_csv_table(path: &Path) -> Result<RawTable, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::Io(format!("Failed to open CSV '{}': {e}", path.display())))?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::Io(format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header, lines are 1-based
        let line = idx + 2;
        let row = result
            .map(|record| {
                record
                    .iter()
                    .map(|field| {
                        if field.is_empty() {
                            Cell::Empty
                        } else {
                            Cell::Text(field.to_string())
                        }
                    })
                    .collect()
            })
            .map_err(|e| format!("CSV parse error: {e}"));
        rows.push((line, row));
    }

    Ok(RawTable { headers, rows })
}

fn read_workbook_table(path: &Path) -> Result<RawTable, AppError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| AppError::Io(format!("Failed to open workbook '{}': {e}", path.display())))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::InvalidInput(format!("Workbook '{}' has no worksheets.", path.display())))?
        .map_err(|e| AppError::Io(format!("Failed to read worksheet in '{}': {e}", path.display())))?;

    let mut sheet_rows = range.rows();
    let headers: Vec<String> = sheet_rows
        .next()
        .map(|row| row.iter().map(|c| workbook_cell(c).display()).collect())
        .unwrap_or_default();

    let rows = sheet_rows
        .enumerate()
        .map(|(idx, row)| (idx + 2, Ok(row.iter().map(workbook_cell).collect())))
        .collect();

    Ok(RawTable { headers, rows })
}

fn workbook_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            let s = s.trim();
            if s.is_empty() { Cell::Empty } else { Cell::Text(s.to_string()) }
        }
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()).map(Cell::Date).unwrap_or(Cell::Empty),
        Data::Error(e) => Cell::Text(format!("#{e:?}")),
    }
}

fn build_header_map(headers: &[String]) -> HashMap<String, usize> {
    let mut map = HashMap::new();
    for (idx, name) in headers.iter().enumerate() {
        // first occurrence wins on duplicated headers
        map.entry(normalize_header_name(name)).or_insert(idx);
    }
    map
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report `Fecha` as missing.
    // Header names are otherwise matched exactly (case-sensitive).
    name.trim().trim_start_matches('\u{feff}').to_string()
}

fn column_index(header_map: &HashMap<String, usize>, column: Column) -> Option<usize> {
    header_map.get(column.header()).copied()
}

fn missing_columns(schema: Schema, header_map: &HashMap<String, usize>) -> Vec<String> {
    schema
        .columns()
        .iter()
        .filter(|&&c| column_index(header_map, c).is_none())
        .map(|c| c.header().to_string())
        .collect()
}

fn ensure_required_columns_exist(schema: Schema, header_map: &HashMap<String, usize>) -> Result<(), AppError> {
    let missing = missing_columns(schema, header_map);
    if missing.is_empty() {
        return Ok(());
    }
    Err(AppError::Schema {
        missing,
        expected: schema.headers(),
    })
}

fn parse_row(cells: &[Cell], header_map: &HashMap<String, usize>, schema: Schema) -> Result<SalesRecord, String> {
    let date = match get_cell(cells, header_map, schema, Column::Date)? {
        Some(cell) => parse_date(cell)?,
        None => return Err(format!("Missing required value: `{}`", Column::Date.header())),
    };

    let day_of_year = match get_cell(cells, header_map, schema, Column::DayOfYear)? {
        Some(cell) => lenient(schema, Column::DayOfYear, parse_day_of_year(cell))?,
        None => None,
    };

    let text = |column: Column| get_text(cells, header_map, schema, column);
    let number = |column: Column| get_number(cells, header_map, schema, column);

    Ok(SalesRecord {
        date,
        day_of_year,
        customer_id: text(Column::CustomerId)?,
        product_id: text(Column::ProductId)?,
        category: text(Column::Category)?,
        description: text(Column::Description)?,
        product: text(Column::Product)?,
        store: text(Column::Store)?,
        units: number(Column::Units)?,
        purchase_price: number(Column::PurchasePrice)?,
        sale_price: number(Column::SalePrice)?,
    })
}

/// Non-empty cell for `column`; a required column with no value is a row error.
fn get_cell<'a>(
    cells: &'a [Cell],
    header_map: &HashMap<String, usize>,
    schema: Schema,
    column: Column,
) -> Result<Option<&'a Cell>, String> {
    let cell = column_index(header_map, column)
        .and_then(|idx| cells.get(idx))
        .filter(|c| **c != Cell::Empty);
    if cell.is_none() && schema.requires(column) {
        return Err(format!("Missing required value: `{}`", column.header()));
    }
    Ok(cell)
}

fn get_text(cells: &[Cell], header_map: &HashMap<String, usize>, schema: Schema, column: Column) -> Result<String, String> {
    Ok(get_cell(cells, header_map, schema, column)?
        .map(Cell::display)
        .unwrap_or_default())
}

fn get_number(cells: &[Cell], header_map: &HashMap<String, usize>, schema: Schema, column: Column) -> Result<f64, String> {
    match get_cell(cells, header_map, schema, column)? {
        Some(cell) => Ok(lenient(schema, column, parse_number(cell, column))?.unwrap_or(0.0)),
        None => Ok(0.0),
    }
}

/// A parse failure rejects the row only when `schema` requires `column`;
/// otherwise the value falls back to its neutral default (`None`).
fn lenient<T>(schema: Schema, column: Column, parsed: Result<T, String>) -> Result<Option<T>, String> {
    match parsed {
        Ok(v) => Ok(Some(v)),
        Err(message) if schema.requires(column) => Err(message),
        Err(message) => {
            tracing::debug!(column = column.header(), %message, "ignoring unparseable optional value");
            Ok(None)
        }
    }
}

fn parse_day_of_year(cell: &Cell) -> Result<u32, String> {
    let v = parse_number(cell, Column::DayOfYear)?;
    if v.fract() != 0.0 || !(1.0..=366.0).contains(&v) {
        return Err(format!(
            "Invalid day of year '{}' in `{}` (expected 1 to 366).",
            fmt_number(v),
            Column::DayOfYear.header()
        ));
    }
    Ok(v as u32)
}

fn parse_number(cell: &Cell, column: Column) -> Result<f64, String> {
    let v = match cell {
        Cell::Number(v) => *v,
        Cell::Text(s) => parse_decimal(s)
            .ok_or_else(|| format!("Invalid number '{s}' in `{}`.", column.header()))?,
        Cell::Date(_) | Cell::Empty => {
            return Err(format!("Expected a number in `{}`.", column.header()));
        }
    };
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite number in `{}`.", column.header()))
    }
}

fn parse_decimal(s: &str) -> Option<f64> {
    let s = s.trim();
    if let Ok(v) = s.parse::<f64>() {
        return Some(v);
    }
    // decimal comma ("12,5") from Spanish-locale exports
    if s.contains(',') && !s.contains('.') {
        return s.replace(',', ".").parse::<f64>().ok();
    }
    None
}

fn parse_date(cell: &Cell) -> Result<NaiveDate, String> {
    match cell {
        Cell::Date(d) => Ok(*d),
        Cell::Number(serial) => {
            excel_serial_to_date(*serial).ok_or_else(|| format!("Invalid date serial '{serial}'."))
        }
        Cell::Text(s) => parse_date_str(s),
        Cell::Empty => Err("Missing date.".to_string()),
    }
}

fn parse_date_str(s: &str) -> Result<NaiveDate, String> {
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"];
    const DATETIME_FMTS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

    let s = s.trim();
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    Err(format!(
        "Invalid date '{s}'. Expected one of: YYYY-MM-DD, DD/MM/YYYY, DD-MM-YYYY, YYYY/MM/DD."
    ))
}

/// Excel day serial (1900 date system) to a calendar date.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}

fn fmt_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}
