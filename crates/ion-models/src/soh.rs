//! Cycle-boundary degradation models.

use ion_core::{clip, polyval};
use tracing::{debug, warn};

use crate::error::ModelResult;
use crate::kde::{BandwidthMethod, GaussianKde};
use crate::knn::{KnnRegressor, KnnSample};
use crate::params::MasseranoParams;

/// Tagged degradation model, advanced once per completed cycle.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DegradationModel {
    /// Geometric decay towards `final_soh` over `total_cycles`,
    /// independent of usage pattern.
    Vendor { total_cycles: u64, final_soh: f64 },
    /// Usage/temperature/noise-corrected model.
    Masserano(MasseranoModel),
}

impl Default for DegradationModel {
    fn default() -> Self {
        DegradationModel::Vendor {
            total_cycles: 1000,
            final_soh: 0.7,
        }
    }
}

impl DegradationModel {
    /// State of health after one more cycle with the given per-cycle SoC
    /// statistics. The result is non-increasing and clipped to [0, 1].
    pub fn next_soh(
        &mut self,
        soh: f64,
        soc_mean: f64,
        soc_max: f64,
        soc_min: f64,
        internal_temp_k: f64,
    ) -> ModelResult<f64> {
        let next = match self {
            DegradationModel::Vendor {
                total_cycles,
                final_soh,
            } => {
                let rate = final_soh.powf(1.0 / *total_cycles as f64);
                rate * soh
            }
            DegradationModel::Masserano(model) => {
                model.next_soh(soh, soc_mean, soc_max, soc_min, internal_temp_k)?
            }
        };
        Ok(clip(next, 0.0, 1.0))
    }
}

/// Masserano degradation model with its trained helpers.
///
/// The severity regressor is fitted once from the parameter table; the
/// noise estimator is trained separately on empirical residual data via
/// `train_noise` (or attached pre-fit). Without a trained estimator the
/// noise term is skipped.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MasseranoModel {
    pub params: MasseranoParams,
    #[cfg_attr(feature = "serde", serde(skip))]
    knn: KnnRegressor,
    #[cfg_attr(feature = "serde", serde(skip))]
    kde: Option<GaussianKde>,
}

impl MasseranoModel {
    pub fn new(params: MasseranoParams) -> Self {
        Self {
            params,
            knn: KnnRegressor::default(),
            kde: None,
        }
    }

    /// Fit the noise estimator over empirical residuals. The sampler's
    /// RNG is seeded from `kde_seed`, so runs configured with the same
    /// seed and residual data draw identical noise.
    pub fn train_noise(
        &mut self,
        residuals: Vec<f64>,
        method: BandwidthMethod,
    ) -> ModelResult<()> {
        self.kde = Some(GaussianKde::fit(residuals, method, self.params.kde_seed)?);
        Ok(())
    }

    /// Attach a trained noise estimator over empirical residuals.
    pub fn with_kde(mut self, kde: GaussianKde) -> Self {
        self.kde = Some(kde);
        self
    }

    pub fn set_kde(&mut self, kde: GaussianKde) {
        self.kde = Some(kde);
    }

    pub fn has_kde(&self) -> bool {
        self.kde.is_some()
    }

    fn ensure_fitted(&mut self) -> ModelResult<()> {
        if self.knn.is_fitted() {
            return Ok(());
        }
        let eq_final_soh = self.params.eq_final_soh;
        let samples = self
            .params
            .table
            .iter()
            .map(|row| KnnSample {
                features: vec![
                    0.5 * (row.soc_min + row.soc_max),
                    row.soc_max - row.soc_min,
                    eq_final_soh,
                ],
                target: row.coeff,
            })
            .collect();
        let mut knn = KnnRegressor::new(self.params.n_neighbors);
        knn.fit(samples)?;
        self.knn = knn;
        Ok(())
    }

    fn next_soh(
        &mut self,
        soh: f64,
        soc_mean: f64,
        soc_max: f64,
        soc_min: f64,
        internal_temp_k: f64,
    ) -> ModelResult<f64> {
        self.ensure_fitted()?;
        let p = &self.params;
        let mut total_cycles = p.eq_cycles as f64;

        // Correct from SoC usage pattern
        let usage_factor = self.knn.predict(&[
            soc_mean,
            soc_max - soc_min,
            p.eq_final_soh,
        ])?;
        debug!(usage_factor, "kNN severity factor");
        total_cycles *= usage_factor;

        // Correct from temperature
        let temp_factor = clip(polyval(internal_temp_k - 273.0, &p.temp_poly), 0.0, 1.0);
        debug!(temp_factor, "temperature severity factor");
        total_cycles *= temp_factor;

        let noise = match self.kde.as_mut() {
            Some(kde) => kde.sample() - p.noise_bias,
            None => {
                warn!("Masserano model has no trained KDE, skipping noise draw");
                0.0
            }
        };

        let base_rate = p.eq_final_soh.powf(1.0 / total_cycles);
        let rate = clip(base_rate + noise, 0.0, 1.0);
        debug!(total_cycles, base_rate, rate, noise, "degradation update");
        Ok(rate * soh)
    }
}
