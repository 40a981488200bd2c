//! k-nearest-neighbors regression over small fitted tables.

use crate::error::{ModelError, ModelResult};

/// One training sample: feature vector and target value.
#[derive(Clone, Debug)]
pub struct KnnSample {
    pub features: Vec<f64>,
    pub target: f64,
}

/// Brute-force kNN regressor (Euclidean distance, mean of the k nearest
/// targets). The tables involved hold a dozen rows, so a linear scan per
/// prediction is the right tool.
#[derive(Clone, Debug, Default)]
pub struct KnnRegressor {
    n_neighbors: usize,
    samples: Vec<KnnSample>,
}

impl KnnRegressor {
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors,
            samples: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.samples.is_empty()
    }

    pub fn fit(&mut self, samples: Vec<KnnSample>) -> ModelResult<()> {
        if samples.is_empty() {
            return Err(ModelError::InvalidArg {
                what: "kNN dataset must not be empty",
            });
        }
        if self.n_neighbors == 0 {
            return Err(ModelError::InvalidArg {
                what: "kNN neighbor count must be positive",
            });
        }
        self.samples = samples;
        Ok(())
    }

    pub fn predict(&self, features: &[f64]) -> ModelResult<f64> {
        if self.samples.is_empty() {
            return Err(ModelError::NotFitted { what: "kNN regressor" });
        }
        let mut neighbors: Vec<(f64, f64)> = self
            .samples
            .iter()
            .map(|s| (euclidean_distance(features, &s.features), s.target))
            .collect();
        neighbors.sort_by(|a, b| a.0.total_cmp(&b.0));

        let k = self.n_neighbors.min(neighbors.len());
        let sum: f64 = neighbors[..k].iter().map(|(_, t)| t).sum();
        Ok(sum / k as f64)
    }
}

fn euclidean_distance(x: &[f64], y: &[f64]) -> f64 {
    x.iter()
        .zip(y)
        .map(|(a, b)| (a - b) * (a - b))
        .sum::<f64>()
        .sqrt()
}
