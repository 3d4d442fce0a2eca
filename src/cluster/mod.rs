//! Entity segmentation: aggregate per entity, standardize, k-means.
//!
//! ```text
//! records ──group by key──► statistics ──z-score──► k-means ──► ClusterTable
//! ```

pub mod aggregate;
pub mod kmeans;

use std::collections::BTreeSet;

use ndarray::Array2;
use serde::Serialize;

use crate::domain::{Dimension, SalesRecord, Statistic};
use crate::error::AppError;

pub use aggregate::{aggregate, sample_std};
pub use kmeans::{KMeansFit, fit_kmeans, standardize};

pub const MIN_CLUSTERS: usize = 2;
pub const MAX_CLUSTERS: usize = 10;

/// Below this summed spread the statistics are treated as constant.
const VARIANCE_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterRow {
    pub key: String,
    /// Raw (unscaled) statistic values, in `ClusterTable::stats` order.
    pub values: Vec<f64>,
    pub cluster: usize,
}

/// Clustering output: one row per entity, sorted by key.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterTable {
    pub dimension: Dimension,
    pub stats: Vec<Statistic>,
    pub k: usize,
    pub rows: Vec<ClusterRow>,
    pub inertia: f64,
}

/// Size and statistic means of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterProfile {
    pub cluster: usize,
    pub size: usize,
    pub means: Vec<f64>,
}

impl ClusterTable {
    /// Rows ordered by cluster label, then key.
    pub fn rows_by_cluster(&self) -> Vec<&ClusterRow> {
        let mut rows: Vec<&ClusterRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| a.cluster.cmp(&b.cluster).then_with(|| a.key.cmp(&b.key)));
        rows
    }

    /// Per-cluster sizes and raw statistic means (empty clusters omitted).
    pub fn profiles(&self) -> Vec<ClusterProfile> {
        (0..self.k)
            .filter_map(|cluster| {
                let members: Vec<&ClusterRow> = self.rows.iter().filter(|r| r.cluster == cluster).collect();
                if members.is_empty() {
                    return None;
                }
                let size = members.len();
                let means = (0..self.stats.len())
                    .map(|j| members.iter().map(|r| r.values[j]).sum::<f64>() / size as f64)
                    .collect();
                Some(ClusterProfile { cluster, size, means })
            })
            .collect()
    }
}

/// Check a statistic selection against the dimension's catalog.
pub fn validate_selection(dimension: Dimension, stats: &[Statistic], k: usize) -> Result<(), AppError> {
    if stats.is_empty() {
        return Err(AppError::InvalidInput("Select at least one statistic.".to_string()));
    }
    let catalog = dimension.catalog();
    if let Some(bad) = stats.iter().find(|s| !catalog.contains(*s)) {
        let allowed: Vec<&str> = catalog.iter().map(|s| s.label()).collect();
        return Err(AppError::InvalidInput(format!(
            "Statistic {bad} is not available for {}. Choose from: {}.",
            dimension.display_name(),
            allowed.join(", ")
        )));
    }
    let mut seen = BTreeSet::new();
    if let Some(dup) = stats.iter().find(|s| !seen.insert(**s)) {
        return Err(AppError::InvalidInput(format!("Statistic {dup} was selected more than once.")));
    }
    if !(MIN_CLUSTERS..=MAX_CLUSTERS).contains(&k) {
        return Err(AppError::InvalidInput(format!(
            "Number of clusters must be between {MIN_CLUSTERS} and {MAX_CLUSTERS}, got {k}."
        )));
    }
    Ok(())
}

/// Group `records` by `dimension`, compute `stats` and assign `k` clusters.
///
/// # Errors
/// - `InvalidInput` for an empty, duplicated or out-of-catalog selection or `k` outside 2..=10
/// - `NoVariance` when every statistic is constant across entities
/// - `InsufficientData` when there are fewer entities than clusters
pub fn cluster_entities(
    records: &[SalesRecord],
    dimension: Dimension,
    stats: &[Statistic],
    k: usize,
) -> Result<ClusterTable, AppError> {
    validate_selection(dimension, stats, k)?;

    let entities = aggregate(records, dimension, stats);
    let n = entities.len();
    let cols = stats.len();

    let mut features = Array2::<f64>::zeros((n, cols));
    for (i, (_, values)) in entities.iter().enumerate() {
        for (j, v) in values.iter().enumerate() {
            features[[i, j]] = *v;
        }
    }

    let spread: f64 = (0..cols)
        .map(|j| sample_std(&features.column(j).to_vec()))
        .map(|s| if s.is_nan() { 0.0 } else { s })
        .sum();
    if spread < VARIANCE_EPSILON {
        return Err(AppError::NoVariance);
    }
    if n < k {
        return Err(AppError::InsufficientData(format!(
            "Only {n} {} available for {k} clusters.",
            dimension.display_name().to_lowercase()
        )));
    }

    let scaled = standardize(&features);
    let fit = fit_kmeans(&scaled, k)?;

    tracing::info!(
        dimension = dimension.display_name(),
        entities = n,
        k,
        inertia = fit.inertia,
        "clustered entities"
    );

    let rows = entities
        .into_iter()
        .zip(fit.labels)
        .map(|((key, values), cluster)| ClusterRow { key, values, cluster })
        .collect();

    Ok(ClusterTable {
        dimension,
        stats: stats.to_vec(),
        k,
        rows,
        inertia: fit.inertia,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sale(store: &str, product: &str, units: f64) -> SalesRecord {
        SalesRecord {
            date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            day_of_year: None,
            customer_id: format!("c-{product}"),
            product_id: product.to_string(),
            category: "A".to_string(),
            description: String::new(),
            product: product.to_string(),
            store: store.to_string(),
            units,
            purchase_price: 1.0,
            sale_price: 3.0,
        }
    }

    #[test]
    fn identical_stores_have_no_variance() {
        let records = vec![sale("s1", "p", 5.0), sale("s2", "p", 5.0), sale("s3", "p", 5.0)];
        let err = cluster_entities(&records, Dimension::Store, &[Statistic::TotalSales], 2).unwrap_err();
        assert!(matches!(err, AppError::NoVariance));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn labels_cover_every_entity() {
        let mut records = Vec::new();
        for (i, units) in [1.0, 2.0, 1.5, 40.0, 42.0, 41.0].iter().enumerate() {
            records.push(sale(&format!("s{i}"), "p", *units));
        }
        let table = cluster_entities(&records, Dimension::Store, &[Statistic::TotalSales], 2).unwrap();

        assert_eq!(table.rows.len(), 6);
        let keys: Vec<&str> = table.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["s0", "s1", "s2", "s3", "s4", "s5"]);
        assert!(table.rows.iter().all(|r| r.cluster < 2));
        assert_eq!(table.rows[0].cluster, table.rows[1].cluster);
        assert_ne!(table.rows[0].cluster, table.rows[3].cluster);

        let profiles = table.profiles();
        assert_eq!(profiles.iter().map(|p| p.size).sum::<usize>(), 6);
        let sorted = table.rows_by_cluster();
        assert!(sorted.windows(2).all(|w| w[0].cluster <= w[1].cluster));
    }

    #[test]
    fn fewer_entities_than_clusters() {
        let records = vec![sale("s1", "p", 1.0), sale("s2", "p", 9.0)];
        let err = cluster_entities(&records, Dimension::Store, &[Statistic::TotalSales], 3).unwrap_err();
        assert!(matches!(err, AppError::InsufficientData(_)));
    }

    #[test]
    fn selection_is_validated() {
        let d = Dimension::Product;
        assert!(validate_selection(d, &[], 3).is_err());
        assert!(validate_selection(d, &[Statistic::TotalSales], 3).is_err());
        assert!(validate_selection(d, &[Statistic::AvgSales, Statistic::AvgSales], 3).is_err());
        assert!(validate_selection(d, &[Statistic::AvgSales], 11).is_err());
        assert!(validate_selection(d, &[Statistic::AvgSales], 1).is_err());
        assert!(validate_selection(d, &[Statistic::AvgSales, Statistic::AvgMargin], 10).is_ok());
    }
}
