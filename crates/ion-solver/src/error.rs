use thiserror::Error;

pub type SolverResult<T> = Result<T, SolverError>;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Convergence failed: {what}")]
    ConvergenceFailed { what: String },

    #[error("Jacobian unavailable: {what}")]
    JacobianUnavailable { what: &'static str },

    #[error("Numeric failure: {what}")]
    Numeric { what: String },

    #[error(transparent)]
    Core(#[from] ion_core::CoreError),
}
