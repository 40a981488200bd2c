use thiserror::Error;

pub type SimResult<T> = Result<T, SimError>;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Non-finite {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Simulation is not running: {what}")]
    NotRunning { what: &'static str },

    #[error(transparent)]
    Model(#[from] ion_models::ModelError),

    #[error(transparent)]
    Solver(#[from] ion_solver::SolverError),

    #[error(transparent)]
    Core(#[from] ion_core::CoreError),
}

/// How a `run` ended: either the input was consumed (or the iteration cap
/// reached), or the continue predicate asked to stop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Completed,
    EarlyExit,
}
