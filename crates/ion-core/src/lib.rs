//! ion-core: stable foundation for ionflow.
//!
//! Contains:
//! - numeric (Real + tolerances + float helpers)
//! - series (growable f64 sequence with bounds-checked access and CSV loading)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod series;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use series::Series;
