//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory by the forecast and clustering pipelines
//! - exported to JSON/CSV
//! - shown in the terminal UI without conversion

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Spreadsheet columns recognized by the loader.
///
/// The header names are the exact (Spanish) names used by the sales exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    Date,
    DayOfYear,
    CustomerId,
    ProductId,
    Category,
    Description,
    Product,
    Store,
    Units,
    PurchasePrice,
    SalePrice,
}

impl Column {
    pub const ALL: [Column; 11] = [
        Column::Date,
        Column::DayOfYear,
        Column::CustomerId,
        Column::ProductId,
        Column::Category,
        Column::Description,
        Column::Product,
        Column::Store,
        Column::Units,
        Column::PurchasePrice,
        Column::SalePrice,
    ];

    pub fn header(self) -> &'static str {
        match self {
            Column::Date => "Fecha",
            Column::DayOfYear => "Dia_del_anio",
            Column::CustomerId => "ID_Cliente",
            Column::ProductId => "ID_Producto",
            Column::Category => "Categoria",
            Column::Description => "Descripcion_Producto",
            Column::Product => "Nombre_Producto",
            Column::Store => "Tienda",
            Column::Units => "Ventas_Unidades",
            Column::PurchasePrice => "Precio_Compra",
            Column::SalePrice => "Precio_Venta",
        }
    }
}

/// Required-column sets, one per consumer of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Every column; checked before a file is accepted into the data directory.
    Upload,
    Forecast,
    Cluster,
}

impl Schema {
    pub fn columns(self) -> &'static [Column] {
        match self {
            Schema::Upload => &Column::ALL,
            Schema::Forecast => &[Column::Date, Column::Category, Column::Product, Column::Units],
            Schema::Cluster => &[
                Column::Date,
                Column::Product,
                Column::Units,
                Column::PurchasePrice,
                Column::SalePrice,
                Column::CustomerId,
                Column::Store,
            ],
        }
    }

    pub fn headers(self) -> Vec<String> {
        self.columns().iter().map(|c| c.header().to_string()).collect()
    }

    pub fn requires(self, column: Column) -> bool {
        self.columns().contains(&column)
    }
}

/// One row of a sales spreadsheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub date: NaiveDate,
    pub day_of_year: Option<u32>,
    pub customer_id: String,
    pub product_id: String,
    pub category: String,
    pub description: String,
    pub product: String,
    pub store: String,
    pub units: f64,
    pub purchase_price: f64,
    pub sale_price: f64,
}

impl SalesRecord {
    pub fn margin(&self) -> f64 {
        self.sale_price - self.purchase_price
    }
}

/// Daily series with one value per calendar day.
///
/// Dates are derived from `start`, so the series is contiguous and strictly
/// ascending by construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    start: NaiveDate,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn new(start: NaiveDate, values: Vec<f64>) -> Self {
        Self { start, values }
    }

    pub fn start(&self) -> Option<NaiveDate> {
        if self.values.is_empty() { None } else { Some(self.start) }
    }

    pub fn end(&self) -> Option<NaiveDate> {
        let last = self.values.len().checked_sub(1)?;
        Some(self.date_at(last))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn date_at(&self, idx: usize) -> NaiveDate {
        self.start + Duration::days(idx as i64)
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.values.len()).map(|i| self.date_at(i))
    }

    pub fn points(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.values.iter().enumerate().map(|(i, &v)| (self.date_at(i), v))
    }

    /// Split into `[0, at)` and `[at, len)`, keeping dates aligned.
    pub fn split_at(&self, at: usize) -> (TimeSeries, TimeSeries) {
        let at = at.min(self.values.len());
        let (head, tail) = self.values.split_at(at);
        (
            TimeSeries::new(self.start, head.to_vec()),
            TimeSeries::new(self.date_at(at), tail.to_vec()),
        )
    }
}

/// How the forecast series is selected from the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    /// One product within a category.
    Product,
    /// Every product of a category, summed.
    Category,
}

impl SelectionMode {
    pub fn display_name(self) -> &'static str {
        match self {
            SelectionMode::Product => "Product",
            SelectionMode::Category => "Category",
        }
    }
}

impl FromStr for SelectionMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "product" | "producto" => Ok(SelectionMode::Product),
            "category" | "categoria" => Ok(SelectionMode::Category),
            other => Err(AppError::InvalidInput(format!(
                "Unknown selection mode '{other}'. Expected `product` or `category`."
            ))),
        }
    }
}

/// Resolved series selection (mode + keys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesSelection {
    pub mode: SelectionMode,
    pub category: String,
    pub product: Option<String>,
}

impl SeriesSelection {
    pub fn new(mode: SelectionMode, category: impl Into<String>, product: Option<String>) -> Result<Self, AppError> {
        let category = category.into();
        if category.trim().is_empty() {
            return Err(AppError::InvalidInput("A category is required.".to_string()));
        }
        let product = match mode {
            SelectionMode::Product => match product {
                Some(p) if !p.trim().is_empty() => Some(p),
                _ => {
                    return Err(AppError::InvalidInput(
                        "Product mode requires a product (`--product`).".to_string(),
                    ));
                }
            },
            SelectionMode::Category => None,
        };
        Ok(Self { mode, category, product })
    }

    /// Legend label for plots and report headers.
    pub fn legend(&self) -> String {
        match (&self.mode, &self.product) {
            (SelectionMode::Product, Some(p)) => format!("Product: {p}"),
            _ => format!("Category: {}", self.category),
        }
    }
}

/// The three forecasting model families.
///
/// Declaration order is the display order (and the `BTreeMap` order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    HoltWinters,
    Sarima,
    MovingAverage,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::HoltWinters, ModelKind::Sarima, ModelKind::MovingAverage];

    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::HoltWinters => "Holt-Winters",
            ModelKind::Sarima => "SARIMA",
            ModelKind::MovingAverage => "Moving Avg.",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Which model(s) to project forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ModelChoice {
    All,
    HoltWinters,
    Sarima,
    MovingAverage,
}

impl ModelChoice {
    pub fn kinds(self) -> Vec<ModelKind> {
        match self {
            ModelChoice::All => ModelKind::ALL.to_vec(),
            ModelChoice::HoltWinters => vec![ModelKind::HoltWinters],
            ModelChoice::Sarima => vec![ModelKind::Sarima],
            ModelChoice::MovingAverage => vec![ModelKind::MovingAverage],
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ModelChoice::All => "All",
            ModelChoice::HoltWinters => ModelKind::HoltWinters.display_name(),
            ModelChoice::Sarima => ModelKind::Sarima.display_name(),
            ModelChoice::MovingAverage => ModelKind::MovingAverage.display_name(),
        }
    }
}

/// Entity the clustering pipeline groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Product,
    Customer,
    Store,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Product, Dimension::Customer, Dimension::Store];

    pub fn display_name(self) -> &'static str {
        match self {
            Dimension::Product => "Products",
            Dimension::Customer => "Customers",
            Dimension::Store => "Stores",
        }
    }

    /// Column holding the group key.
    pub fn key_column(self) -> Column {
        match self {
            Dimension::Product => Column::Product,
            Dimension::Customer => Column::CustomerId,
            Dimension::Store => Column::Store,
        }
    }

    /// Statistics that may be computed for this dimension.
    pub fn catalog(self) -> &'static [Statistic] {
        match self {
            Dimension::Product => &[
                Statistic::AvgSales,
                Statistic::SalesStdDev,
                Statistic::Frequency,
                Statistic::AvgMargin,
            ],
            Dimension::Customer => &[
                Statistic::AvgPurchase,
                Statistic::PurchaseFrequency,
                Statistic::AvgMargin,
                Statistic::ProductDiversity,
            ],
            Dimension::Store => &[
                Statistic::TotalSales,
                Statistic::AvgMargin,
                Statistic::ProductCount,
                Statistic::CustomerCount,
            ],
        }
    }
}

/// Per-entity summary statistics used as clustering features.
///
/// CLI values use the column-style labels (`Promedio_Ventas`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
pub enum Statistic {
    /// Mean units per row.
    #[value(name = "Promedio_Ventas")]
    AvgSales,
    /// Sample standard deviation of units.
    #[value(name = "Desviacion_Ventas")]
    SalesStdDev,
    /// Rows with units > 0.
    #[value(name = "Frecuencia")]
    Frequency,
    /// Mean per-row margin (sale - purchase price).
    #[value(name = "Margen_Promedio")]
    AvgMargin,
    #[value(name = "Promedio_Compra")]
    AvgPurchase,
    #[value(name = "Frecuencia_Compra")]
    PurchaseFrequency,
    /// Distinct products bought.
    #[value(name = "Diversidad_Productos")]
    ProductDiversity,
    #[value(name = "Total_Ventas")]
    TotalSales,
    #[value(name = "Cantidad_Productos")]
    ProductCount,
    #[value(name = "Cantidad_Clientes")]
    CustomerCount,
}

impl Statistic {
    pub fn label(self) -> &'static str {
        match self {
            Statistic::AvgSales => "Promedio_Ventas",
            Statistic::SalesStdDev => "Desviacion_Ventas",
            Statistic::Frequency => "Frecuencia",
            Statistic::AvgMargin => "Margen_Promedio",
            Statistic::AvgPurchase => "Promedio_Compra",
            Statistic::PurchaseFrequency => "Frecuencia_Compra",
            Statistic::ProductDiversity => "Diversidad_Productos",
            Statistic::TotalSales => "Total_Ventas",
            Statistic::ProductCount => "Cantidad_Productos",
            Statistic::CustomerCount => "Cantidad_Clientes",
        }
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Statistic {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ALL_STATISTICS
            .iter()
            .copied()
            .find(|stat| stat.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown statistic '{wanted}'.")))
    }
}

const ALL_STATISTICS: [Statistic; 10] = [
    Statistic::AvgSales,
    Statistic::SalesStdDev,
    Statistic::Frequency,
    Statistic::AvgMargin,
    Statistic::AvgPurchase,
    Statistic::PurchaseFrequency,
    Statistic::ProductDiversity,
    Statistic::TotalSales,
    Statistic::ProductCount,
    Statistic::CustomerCount,
];

/// Forecast run request (what the user selected).
#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub file: PathBuf,
    pub selection: SeriesSelection,
    pub model: ModelChoice,
}

/// Clustering run request.
#[derive(Debug, Clone)]
pub struct ClusterRequest {
    pub file: PathBuf,
    pub dimension: Dimension,
    pub stats: Vec<Statistic>,
    pub k: usize,
}
