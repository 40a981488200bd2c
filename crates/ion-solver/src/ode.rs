//! Stepper trait and system interface for the two-state cell ODE.

use ion_core::Tolerances;
use nalgebra::{Matrix2, Vector2};

use crate::error::{SolverError, SolverResult};
use crate::explicit::{ExplicitRk, GraggExtrapolation, Tableau};
use crate::implicit::{ImplicitRk, ImplicitTableau, SemiImplicitMidpoint};
use crate::multistep::{AdamsMoulton, Bdf2};

/// Two-component ODE state: [state of charge, internal temperature].
pub type State2 = Vector2<f64>;

/// Right-hand side and optional Jacobian of the cell ODE.
///
/// `rhs` may mutate the implementor to cache algebraic intermediates.
/// `jacobian` returns (df/dy, df/dt); explicit steppers never call it.
pub trait OdeSystem {
    fn rhs(&mut self, t: f64, y: &State2) -> SolverResult<State2>;

    fn jacobian(&mut self, _t: f64, _y: &State2) -> SolverResult<(Matrix2<f64>, State2)> {
        Err(SolverError::JacobianUnavailable {
            what: "system provides no Jacobian",
        })
    }
}

/// One fixed step of size `h` from `t`.
///
/// Steppers carrying history (multistep families) invalidate it through
/// `reset`, which must be called when the trajectory is restarted.
pub trait Stepper {
    fn step(&mut self, sys: &mut dyn OdeSystem, t: f64, h: f64, y: &State2)
    -> SolverResult<State2>;

    fn reset(&mut self) {}

    fn name(&self) -> &'static str;
}

/// Stepper family selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StepperKind {
    /// Heun's 2nd-order explicit method
    Rk2,
    /// Classic 4th-order Runge-Kutta
    Rk4,
    /// Runge-Kutta-Fehlberg 4(5), 5th-order solution
    #[default]
    Rkf45,
    /// Cash-Karp 4(5), 5th-order solution
    Rkck,
    /// 8th-order explicit stepping (extrapolated Gragg midpoint)
    Rk8pd,
    /// Implicit Euler (1st order)
    Rk1imp,
    /// Implicit midpoint (2nd order)
    Rk2imp,
    /// 2-stage Gauss-Legendre (4th order)
    Rk4imp,
    /// Semi-implicit midpoint extrapolation
    Bsimp,
    /// Adams-Bashforth-Moulton predictor-corrector
    Msadams,
    /// 2nd-order backward differentiation formula
    Msbdf,
}

impl StepperKind {
    /// Whether the family needs a Jacobian from the system.
    pub fn needs_jacobian(self) -> bool {
        matches!(
            self,
            StepperKind::Rk1imp
                | StepperKind::Rk2imp
                | StepperKind::Rk4imp
                | StepperKind::Bsimp
                | StepperKind::Msbdf
        )
    }

    /// Instantiate the stepper. `tol` bounds the Newton iterations of the
    /// implicit families.
    pub fn build(self, tol: Tolerances) -> Box<dyn Stepper> {
        match self {
            StepperKind::Rk2 => Box::new(ExplicitRk::new("rk2", Tableau::rk2())),
            StepperKind::Rk4 => Box::new(ExplicitRk::new("rk4", Tableau::rk4())),
            StepperKind::Rkf45 => Box::new(ExplicitRk::new("rkf45", Tableau::rkf45())),
            StepperKind::Rkck => Box::new(ExplicitRk::new("rkck", Tableau::rkck())),
            StepperKind::Rk8pd => Box::new(GraggExtrapolation::order8()),
            StepperKind::Rk1imp => {
                Box::new(ImplicitRk::new("rk1imp", ImplicitTableau::euler(), tol))
            }
            StepperKind::Rk2imp => {
                Box::new(ImplicitRk::new("rk2imp", ImplicitTableau::midpoint(), tol))
            }
            StepperKind::Rk4imp => {
                Box::new(ImplicitRk::new("rk4imp", ImplicitTableau::gauss4(), tol))
            }
            StepperKind::Bsimp => Box::new(SemiImplicitMidpoint::new(tol)),
            StepperKind::Msadams => Box::new(AdamsMoulton::new()),
            StepperKind::Msbdf => Box::new(Bdf2::new(tol)),
        }
    }
}
