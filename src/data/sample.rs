//! Synthetic sales sample generation.
//!
//! Produces a complete eleven-column sales sheet with a weekly demand
//! pattern, per-product demand levels and Normal noise. The same seed always
//! produces the same file.

use std::path::Path;

use chrono::{Datelike, Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{Column, SalesRecord};
use crate::error::AppError;

/// Relative demand by weekday (Monday first).
const WEEKLY_PATTERN: [f64; 7] = [0.85, 0.8, 0.9, 0.95, 1.1, 1.35, 1.25];

struct ProductSpec {
    id: &'static str,
    name: &'static str,
    category: &'static str,
    description: &'static str,
    level: f64,
    purchase_price: f64,
    margin: f64,
}

const PRODUCTS: [ProductSpec; 7] = [
    ProductSpec { id: "P001", name: "Agua", category: "Bebidas", description: "Agua mineral 1L", level: 18.0, purchase_price: 0.4, margin: 0.35 },
    ProductSpec { id: "P002", name: "Jugo", category: "Bebidas", description: "Jugo de naranja 1L", level: 9.0, purchase_price: 1.1, margin: 0.6 },
    ProductSpec { id: "P003", name: "Refresco", category: "Bebidas", description: "Refresco cola 500ml", level: 14.0, purchase_price: 0.7, margin: 0.5 },
    ProductSpec { id: "P004", name: "Papas", category: "Snacks", description: "Papas fritas 150g", level: 11.0, purchase_price: 0.9, margin: 0.7 },
    ProductSpec { id: "P005", name: "Galletas", category: "Snacks", description: "Galletas de avena", level: 7.0, purchase_price: 1.2, margin: 0.8 },
    ProductSpec { id: "P006", name: "Leche", category: "Lacteos", description: "Leche entera 1L", level: 16.0, purchase_price: 0.8, margin: 0.25 },
    ProductSpec { id: "P007", name: "Yogur", category: "Lacteos", description: "Yogur natural 500g", level: 6.0, purchase_price: 1.0, margin: 0.55 },
];

const STORES: [(&str, f64); 3] = [("Centro", 1.2), ("Norte", 1.0), ("Sur", 0.7)];
const CUSTOMERS: usize = 25;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub days: usize,
    pub start: NaiveDate,
    pub seed: u64,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            days: 120,
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
            seed: 42,
        }
    }
}

/// One row per (day, product, store).
pub fn generate_sample(config: &SampleConfig) -> Result<Vec<SalesRecord>, AppError> {
    if config.days == 0 {
        return Err(AppError::InvalidInput("Sample days must be > 0.".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let noise = Normal::new(0.0, 1.0).map_err(|e| AppError::Computation(format!("Noise distribution error: {e}")))?;

    let mut records = Vec::with_capacity(config.days * PRODUCTS.len() * STORES.len());
    for day in 0..config.days {
        let date = config.start + Duration::days(day as i64);
        let weekday = date.weekday().num_days_from_monday() as usize;
        // slow upward drift over the sample
        let trend = 1.0 + 0.002 * day as f64;

        for product in &PRODUCTS {
            for &(store, store_factor) in &STORES {
                let expected = product.level * WEEKLY_PATTERN[weekday] * store_factor * trend;
                let sd = (expected * 0.15).max(0.5);
                let units = (expected + sd * noise.sample(&mut rng)).round().max(0.0);

                let customer = rng.gen_range(1..=CUSTOMERS);
                let price_jitter = rng.gen_range(0.95..1.05);
                let purchase_price = round2(product.purchase_price * price_jitter);
                let sale_price = round2(purchase_price * (1.0 + product.margin));

                records.push(SalesRecord {
                    date,
                    day_of_year: Some(date.ordinal()),
                    customer_id: format!("C{customer:03}"),
                    product_id: product.id.to_string(),
                    category: product.category.to_string(),
                    description: product.description.to_string(),
                    product: product.name.to_string(),
                    store: store.to_string(),
                    units,
                    purchase_price,
                    sale_price,
                });
            }
        }
    }

    tracing::info!(rows = records.len(), days = config.days, seed = config.seed, "generated sample");
    Ok(records)
}

/// Write records with the full spreadsheet header.
pub fn write_sample_csv(path: &Path, records: &[SalesRecord]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::Io(format!("Failed to create sample CSV '{}': {e}", path.display())))?;
    let write_err = |e: csv::Error| AppError::Io(format!("Failed to write sample CSV: {e}"));

    writer
        .write_record(Column::ALL.iter().map(|c| c.header()))
        .map_err(write_err)?;
    for r in records {
        writer
            .write_record([
                r.date.to_string(),
                r.day_of_year.map(|d| d.to_string()).unwrap_or_default(),
                r.customer_id.clone(),
                r.product_id.clone(),
                r.category.clone(),
                r.description.clone(),
                r.product.clone(),
                r.store.clone(),
                format!("{}", r.units),
                format!("{:.2}", r.purchase_price),
                format!("{:.2}", r.sale_price),
            ])
            .map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::Io(format!("Failed to write sample CSV: {e}")))?;
    Ok(())
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
