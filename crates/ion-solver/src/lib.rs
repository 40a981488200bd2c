//! ion-solver: numerical services for the cell stepping engine.
//!
//! Provides:
//! - bounded scalar minimization (golden-section / Brent / quad-golden)
//!   behind a set/iterate/test-interval protocol
//! - fixed-step ODE steppers over a two-state system: explicit Runge-Kutta
//!   tableaus, an 8th-order extrapolation stepper, implicit Runge-Kutta
//!   with Newton stage solves, semi-implicit extrapolation, and multistep
//!   Adams / BDF methods
//!
//! These exist to serve the simulation engine; they are not a
//! general-purpose numerics API.

pub mod error;
pub mod explicit;
pub mod implicit;
pub mod minimize;
pub mod multistep;
pub mod ode;

pub use error::{SolverError, SolverResult};
pub use minimize::{BracketMinimizer, MinimizerKind};
pub use ode::{OdeSystem, State2, Stepper, StepperKind};
