//! Standardization and k-means.

use linfa::prelude::*;
use linfa_clustering::KMeans;
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::AppError;

pub const KMEANS_SEED: u64 = 42;
pub const KMEANS_RUNS: usize = 10;
pub const KMEANS_MAX_ITERATIONS: u64 = 300;
pub const KMEANS_TOLERANCE: f64 = 1e-4;

/// Center each column and scale it to unit population variance.
///
/// Columns with zero spread are only centred.
pub fn standardize(features: &Array2<f64>) -> Array2<f64> {
    let Some(mean) = features.mean_axis(Axis(0)) else {
        return features.clone();
    };
    let std = features.std_axis(Axis(0), 0.0);
    let scale = std.mapv(|s| if s > 0.0 && s.is_finite() { s } else { 1.0 });
    (features - &mean) / &scale
}

/// Labels and inertia of a k-means fit.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    pub labels: Vec<usize>,
    pub inertia: f64,
}

/// Fit k-means (k-means++ init, fixed seed, best of several runs).
pub fn fit_kmeans(features: &Array2<f64>, k: usize) -> Result<KMeansFit, AppError> {
    let n = features.nrows();
    let dataset = Dataset::new(features.clone(), Array1::<usize>::zeros(n));

    let model = KMeans::params_with_rng(k, StdRng::seed_from_u64(KMEANS_SEED))
        .n_runs(KMEANS_RUNS)
        .max_n_iterations(KMEANS_MAX_ITERATIONS)
        .tolerance(KMEANS_TOLERANCE)
        .fit(&dataset)
        .map_err(|e| AppError::Computation(format!("k-means failed: {e}")))?;

    let labels: Array1<usize> = model.predict(dataset.records());
    let inertia = compute_inertia(features, &labels, model.centroids());

    Ok(KMeansFit {
        labels: labels.to_vec(),
        inertia,
    })
}

/// Within-cluster sum of squared distances.
fn compute_inertia(features: &Array2<f64>, labels: &Array1<usize>, centroids: &Array2<f64>) -> f64 {
    labels
        .iter()
        .enumerate()
        .filter(|(_, c)| **c < centroids.nrows())
        .map(|(i, &c)| {
            features
                .row(i)
                .iter()
                .zip(centroids.row(c).iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum::<f64>()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn standardize_uses_population_std() {
        let x = array![[1.0, 5.0], [3.0, 5.0]];
        let z = standardize(&x);
        assert!((z[[0, 0]] + 1.0).abs() < 1e-12);
        assert!((z[[1, 0]] - 1.0).abs() < 1e-12);
        // constant column is centred only
        assert_eq!(z[[0, 1]], 0.0);
        assert_eq!(z[[1, 1]], 0.0);
    }

    #[test]
    fn separates_obvious_groups() {
        let x = array![[0.0, 0.0], [0.1, 0.0], [0.0, 0.1], [10.0, 10.0], [10.1, 10.0], [10.0, 10.1]];
        let fit = fit_kmeans(&x, 2).unwrap();
        assert_eq!(fit.labels.len(), 6);
        assert_eq!(fit.labels[0], fit.labels[1]);
        assert_eq!(fit.labels[0], fit.labels[2]);
        assert_eq!(fit.labels[3], fit.labels[4]);
        assert_ne!(fit.labels[0], fit.labels[3]);
        assert!(fit.inertia < 0.1);
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let x = array![[1.0], [2.0], [3.0], [8.0], [9.0], [20.0]];
        let a = fit_kmeans(&x, 3).unwrap();
        let b = fit_kmeans(&x, 3).unwrap();
        assert_eq!(a.labels, b.labels);
    }
}
