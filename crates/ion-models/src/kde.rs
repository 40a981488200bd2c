//! Univariate Gaussian kernel density estimation with sampling.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use crate::error::{ModelError, ModelResult};

/// Bandwidth selection rule for the kernel width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BandwidthMethod {
    #[default]
    Scott,
    Silverman,
}

impl BandwidthMethod {
    // Both rules reduce to n^(-1/5) for the univariate case used here.
    fn factor(self, len: usize) -> f64 {
        (len as f64).powf(-0.2)
    }
}

/// Gaussian KDE over empirical residual data, used to draw stochastic
/// degradation noise. Sampling picks a data point uniformly and perturbs
/// it with Gaussian noise of the kernel bandwidth.
#[derive(Clone, Debug)]
pub struct GaussianKde {
    data: Vec<f64>,
    std: f64,
    rng: StdRng,
}

impl GaussianKde {
    /// Fit a KDE over `data` with the given bandwidth rule and RNG seed.
    ///
    /// Independent simulation runs must use independent seeds; the
    /// sampler's RNG state is the only mutable part of a trained model.
    pub fn fit(data: Vec<f64>, method: BandwidthMethod, seed: u64) -> ModelResult<Self> {
        if data.len() < 2 {
            return Err(ModelError::InvalidArg {
                what: "KDE needs at least two data points",
            });
        }
        let factor = method.factor(data.len());
        let variance = factor * factor * sample_variance(&data);
        Ok(Self {
            data,
            std: variance.sqrt(),
            rng: StdRng::seed_from_u64(seed),
        })
    }

    pub fn bandwidth_std(&self) -> f64 {
        self.std
    }

    /// Draw one sample from the estimated density.
    pub fn sample(&mut self) -> f64 {
        let idx = self.rng.random_range(0..self.data.len());
        // the bandwidth comes from a finite variance; a degenerate
        // kernel falls back to resampling the data directly
        match Normal::new(0.0, self.std) {
            Ok(normal) => self.data[idx] + normal.sample(&mut self.rng),
            Err(_) => self.data[idx],
        }
    }
}

fn sample_variance(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    data.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / (n - 1.0)
}
