//! Run configuration.

use ion_core::Tolerances;
use ion_solver::{MinimizerKind, StepperKind};

/// Jacobian strategy for the implicit stepper families.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum JacobianKind {
    /// Closed-form partial derivatives evaluated at the resolved state
    #[default]
    Analytical,
    /// Central differences over the re-resolved algebraic pipeline
    CentralDifference,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimConfig {
    pub sim_name: String,
    pub stepper: StepperKind,
    pub jacobian: JacobianKind,
    pub minimizer: MinimizerKind,
    /// Absolute tolerance shared by the minimizer and Newton iterations
    pub epsabs: f64,
    /// Relative tolerance shared by the minimizer and Newton iterations
    pub epsrel: f64,
    /// Iteration cap for the implicit current solve
    pub min_max_iter: usize,
    /// Fixed macro step (s)
    pub step_s: f64,
    /// Total simulated duration (s)
    pub time_s: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            sim_name: "simulation".to_string(),
            stepper: StepperKind::default(),
            jacobian: JacobianKind::default(),
            minimizer: MinimizerKind::default(),
            epsabs: 1e-8,
            epsrel: 1e-8,
            min_max_iter: 100,
            step_s: 1e-3,
            time_s: 10.0,
        }
    }
}

impl SimConfig {
    pub fn tolerances(&self) -> Tolerances {
        Tolerances {
            abs: self.epsabs,
            rel: self.epsrel,
        }
    }

    /// Iteration cap implied by the configured duration and step.
    pub fn total_steps(&self) -> u64 {
        (self.time_s / self.step_s).round() as u64
    }
}
