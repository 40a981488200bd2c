//! ion-models: physics and empirical models of a single lithium-ion cell.
//!
//! Provides:
//! - cell parameter groups with reference defaults
//! - capacity derating (Vogel-Fulcher-Tammann kappa) and usable-SoC scaling
//! - open-circuit voltage (Burgos model) and entropic heat coefficient
//! - closed-form terminal current and heat generation
//! - fuzzy internal-resistance model (fixed / polarization)
//! - degradation models (vendor / Masserano) with kNN and KDE helpers

pub mod capacity;
pub mod current;
pub mod ehc;
pub mod error;
pub mod heat;
pub mod kde;
pub mod knn;
pub mod ocv;
pub mod params;
pub mod resistance;
pub mod soh;

pub use error::{ModelError, ModelResult};
pub use kde::{BandwidthMethod, GaussianKde};
pub use knn::{KnnRegressor, KnnSample};
pub use params::{
    EhcParams, InitialConditions, MasseranoParams, OcvParams, Parameters, PolarizationParams,
    SeverityRow, ThermalParams, VftParams,
};
pub use resistance::ResistanceModel;
pub use soh::DegradationModel;
