//! Internal resistance models.

use ion_core::polyval;

use crate::error::{ModelError, ModelResult};
use crate::params::{FUZZY_SET_COUNT, GaussianMf, PolarizationParams, SigmoidMf};

/// Sigmoid membership: `1 / (1 + exp(-a (x - c)))`.
pub fn mf_sigmoid(x: f64, p: &SigmoidMf) -> f64 {
    1.0 / (1.0 + (-p.a * (x - p.c)).exp())
}

/// Gaussian membership: `exp(-0.5 (x - mean)^2 / sigma^2)`.
pub fn mf_gaussian(x: f64, p: &GaussianMf) -> f64 {
    let num = 0.5 * (x - p.mean).powi(2);
    (-num / p.sigma.powi(2)).exp()
}

/// Tagged internal-resistance model.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ResistanceModel {
    /// Constant resistance, independent of SoC and current.
    Fixed { resistance_ohm: f64 },
    /// Fuzzy Takagi-Sugeno blend over eight current membership sets.
    Polarization(PolarizationParams),
}

impl Default for ResistanceModel {
    fn default() -> Self {
        ResistanceModel::Fixed {
            resistance_ohm: 0.12,
        }
    }
}

impl ResistanceModel {
    /// Internal resistance (ohm) at the given usable SoC and current.
    ///
    /// The fixed variant returns the configured constant unchanged; the
    /// polarization blend divides by the state of health to model
    /// resistance growth with aging.
    pub fn resistance(&self, soc_usable: f64, current_a: f64, soh: f64) -> ModelResult<f64> {
        match self {
            ResistanceModel::Fixed { resistance_ohm } => Ok(*resistance_ohm),
            ResistanceModel::Polarization(p) => {
                Ok(polarization_resistance(soc_usable, current_a, p)? / soh)
            }
        }
    }
}

fn polarization_resistance(
    soc_usable: f64,
    current_a: f64,
    p: &PolarizationParams,
) -> ModelResult<f64> {
    let memberships = [
        mf_sigmoid(current_a, &p.c40),
        mf_gaussian(current_a, &p.c20),
        mf_gaussian(current_a, &p.c10),
        mf_gaussian(current_a, &p.c4),
        mf_gaussian(current_a, &p.d5),
        mf_gaussian(current_a, &p.d10),
        mf_gaussian(current_a, &p.d15),
        mf_sigmoid(current_a, &p.d30),
    ];
    let sum: f64 = memberships.iter().sum();
    if !(sum > 0.0) || !sum.is_finite() {
        return Err(ModelError::DegenerateMembership {
            current_a,
            sum,
        });
    }

    let mut num = 0.0;
    for i in 0..FUZZY_SET_COUNT {
        num += memberships[i] * polyval(soc_usable, &p.poly[i]);
    }
    Ok(num / sum)
}
