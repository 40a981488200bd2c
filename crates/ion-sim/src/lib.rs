//! ion-sim: the cell stepping engine.
//!
//! Couples the algebraic resolver (implicit current solve, derived
//! electrical and thermal quantities) with one fixed ODE macro step per
//! call, plus cycle detection and degradation bookkeeping. The
//! `Simulation` orchestrator owns the state and the numerical machinery
//! and exposes `init`/`step`/`run`/`reset`/`cleanup`.

pub mod config;
pub mod error;
pub mod resolve;
pub mod sim;
pub mod state;
pub mod system;

pub use config::{JacobianKind, SimConfig};
pub use error::{RunStatus, SimError, SimResult};
pub use sim::{Phase, Simulation};
pub use state::CellState;
