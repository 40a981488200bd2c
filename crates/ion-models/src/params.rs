//! Cell parameter groups.
//!
//! Defaults mirror the reference cell used to fit the models: a 4 Ah
//! (14400 C) cell at 298 K with a fixed 0.12 ohm internal resistance and
//! a vendor degradation curve of 1000 cycles to 70 % health.

use crate::resistance::ResistanceModel;
use crate::soh::DegradationModel;

/// Initial conditions applied when a simulation state is (re)initialized.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitialConditions {
    /// State of charge, fraction of nominal capacity
    pub soc: f64,
    /// State of health, fraction of original capacity
    pub soh: f64,
    /// Internal temperature (K)
    pub internal_temp_k: f64,
    /// Nominal capacity (C)
    pub capacity_c: f64,
    /// Warm-start guess for the implicit current solve (A)
    pub current_guess_a: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            soc: 0.1,
            soh: 1.0,
            internal_temp_k: 298.0,
            capacity_c: 14400.0,
            current_guess_a: 10.0,
        }
    }
}

/// Entropic heat coefficient closed form: Gaussian bump minus exponential.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EhcParams {
    pub a: f64,
    pub b: f64,
    pub mu: f64,
    pub kappa: f64,
    pub sigma: f64,
    pub l: f64,
}

impl Default for EhcParams {
    fn default() -> Self {
        Self {
            a: 4e-5,
            b: 5e-5,
            mu: 0.4,
            kappa: 3.0,
            sigma: 0.05,
            l: 7.0,
        }
    }
}

/// Burgos open-circuit voltage model coefficients.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OcvParams {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
    pub v0: f64,
    pub vl: f64,
}

impl Default for OcvParams {
    fn default() -> Self {
        Self {
            alpha: 0.15,
            beta: 17.0,
            gamma: 10.5,
            v0: 4.14,
            vl: 3.977,
        }
    }
}

/// Vogel-Fulcher-Tammann capacity derating coefficients.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VftParams {
    /// VFT activation constant (K)
    pub k1: f64,
    /// VFT divergence temperature (K)
    pub k2: f64,
    /// Reference temperature at which kappa == 1 (K)
    pub tref: f64,
}

impl Default for VftParams {
    fn default() -> Self {
        Self {
            k1: -5.738,
            k2: 209.9,
            tref: 298.0,
        }
    }
}

/// Lumped thermal network: one heat capacity and two thermal resistances.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ThermalParams {
    /// Heat capacity (J/K)
    pub cp: f64,
    /// Core-to-surface thermal resistance (K/W)
    pub rin: f64,
    /// Surface-to-ambient thermal resistance (K/W)
    pub rout: f64,
}

impl Default for ThermalParams {
    fn default() -> Self {
        Self {
            cp: 100.0,
            rin: 3.0,
            rout: 9.0,
        }
    }
}

/// Sigmoid membership function parameters.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SigmoidMf {
    pub a: f64,
    pub c: f64,
}

/// Gaussian membership function parameters.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GaussianMf {
    pub mean: f64,
    pub sigma: f64,
}

/// Number of fuzzy sets in the polarization resistance model.
pub const FUZZY_SET_COUNT: usize = 8;
/// Coefficients per per-set resistance polynomial (ascending powers of SoC).
pub const FUZZY_POLY_COEFFS: usize = 4;

/// Polarization resistance model: eight membership functions over current
/// (four charge sets, four discharge sets) with one resistance polynomial
/// over usable SoC per set.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolarizationParams {
    /// 40 A charge set (sigmoid, open towards strong charge)
    pub c40: SigmoidMf,
    pub c20: GaussianMf,
    pub c10: GaussianMf,
    pub c4: GaussianMf,
    pub d5: GaussianMf,
    pub d10: GaussianMf,
    pub d15: GaussianMf,
    /// 30 A discharge set (sigmoid, open towards strong discharge)
    pub d30: SigmoidMf,
    /// Per-set resistance polynomials over usable SoC
    pub poly: [[f64; FUZZY_POLY_COEFFS]; FUZZY_SET_COUNT],
}

impl Default for PolarizationParams {
    fn default() -> Self {
        Self {
            c40: SigmoidMf {
                a: -19.9748,
                c: -26.5422,
            },
            c20: GaussianMf {
                mean: -20.0,
                sigma: 3.0,
            },
            c10: GaussianMf {
                mean: -10.0,
                sigma: 2.3875,
            },
            c4: GaussianMf {
                mean: -4.0,
                sigma: 2.1623,
            },
            d5: GaussianMf {
                mean: 5.0,
                sigma: 2.0,
            },
            d10: GaussianMf {
                mean: 10.0,
                sigma: 3.1631,
            },
            d15: GaussianMf {
                mean: 15.0,
                sigma: 2.0,
            },
            d30: SigmoidMf {
                a: 15.9494,
                c: 17.3438,
            },
            poly: [
                [0.04172, 0.001688, -0.01526, 0.04006],
                [0.04385, 0.01758, -0.04159, 0.05488],
                [0.05166, 0.02408, -0.05132, 0.06101],
                [0.07004, 0.03910, -0.05345, 0.05015],
                [0.1317, -0.05083, -0.2579, 0.3084],
                [0.0958, -0.05706, -0.07709, 0.1141],
                [0.07868, -0.05782, -0.008633, 0.04612],
                [0.07218, -0.07066, 0.04202, 0.0061],
            ],
        }
    }
}

/// One row of the fitted cycle-severity table used by the Masserano model.
///
/// `soc_max`/`soc_min` are the cycle window bounds (SoC fraction) and
/// `coeff` is the usage-severity multiplier observed for that window.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SeverityRow {
    pub soc_max: f64,
    pub soc_min: f64,
    pub coeff: f64,
}

/// Masserano degradation model payload.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MasseranoParams {
    /// Equivalent cycle count of the reference aging experiment
    pub eq_cycles: u64,
    /// State of health at the end of the reference experiment
    pub eq_final_soh: f64,
    /// Fitted cycle-severity table for nearest-neighbor lookups
    pub table: Vec<SeverityRow>,
    /// Neighbors used by the severity regression
    pub n_neighbors: usize,
    /// Thermal severity polynomial, evaluated at T - 273 (ascending powers)
    pub temp_poly: Vec<f64>,
    /// Bias subtracted from each KDE noise draw
    pub noise_bias: f64,
    /// Seed for the KDE sampling RNG
    pub kde_seed: u64,
}

impl Default for MasseranoParams {
    fn default() -> Self {
        Self {
            eq_cycles: 1000,
            eq_final_soh: 0.7,
            table: vec![
                SeverityRow {
                    soc_max: 1.0,
                    soc_min: 0.0,
                    coeff: 1.0,
                },
                SeverityRow {
                    soc_max: 1.0,
                    soc_min: 0.25,
                    coeff: 0.7875,
                },
                SeverityRow {
                    soc_max: 0.75,
                    soc_min: 0.0,
                    coeff: 1.12525,
                },
                SeverityRow {
                    soc_max: 1.0,
                    soc_min: 0.5,
                    coeff: 0.4375,
                },
                SeverityRow {
                    soc_max: 0.75,
                    soc_min: 0.25,
                    coeff: 0.6875,
                },
                SeverityRow {
                    soc_max: 0.5,
                    soc_min: 0.0,
                    coeff: 1.03125,
                },
                SeverityRow {
                    soc_max: 1.0,
                    soc_min: 0.75,
                    coeff: 0.40625,
                },
                SeverityRow {
                    soc_max: 0.75,
                    soc_min: 0.5,
                    coeff: 0.297,
                },
                SeverityRow {
                    soc_max: 0.625,
                    soc_min: 0.375,
                    coeff: 0.28125,
                },
                SeverityRow {
                    soc_max: 0.5,
                    soc_min: 0.25,
                    coeff: 0.625,
                },
                SeverityRow {
                    soc_max: 0.25,
                    soc_min: 0.0,
                    coeff: 1.0,
                },
            ],
            n_neighbors: 3,
            // Identity thermal correction until a cell-specific fit exists
            temp_poly: vec![1.0],
            noise_bias: 0.999161393145505,
            kde_seed: 0,
        }
    }
}

/// Full immutable parameter set for a run.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Parameters {
    pub init: InitialConditions,
    pub ehc: EhcParams,
    pub ocv: OcvParams,
    pub vft: VftParams,
    pub thermal: ThermalParams,
    pub resistance: ResistanceModel,
    pub degradation: DegradationModel,
}
