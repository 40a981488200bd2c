use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Degenerate fuzzy membership sum ({sum}) at current {current_a} A")]
    DegenerateMembership { current_a: f64, sum: f64 },

    #[error("Regressor used before fitting: {what}")]
    NotFitted { what: &'static str },

    #[error(transparent)]
    Core(#[from] ion_core::CoreError),
}
