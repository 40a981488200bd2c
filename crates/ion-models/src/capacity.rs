//! Temperature-dependent capacity derating.
//!
//! The derating factor `kappa` follows a Vogel-Fulcher-Tammann law
//! normalized so that `kappa(tref) == 1`. Below the reference temperature
//! less of the nominal capacity is usable; the usable state of charge is
//! rescaled accordingly.

use crate::params::VftParams;

/// Capacity derating factor at the given internal temperature.
pub fn kappa(internal_temp_k: f64, vft: &VftParams) -> f64 {
    let left = vft.k1 / (internal_temp_k - vft.k2);
    let right = vft.k1 / (vft.tref - vft.k2);
    (left - right).exp()
}

/// d(kappa)/dT, used by the analytical Jacobian.
pub fn kappa_grad(internal_temp_k: f64, vft: &VftParams) -> f64 {
    let d = internal_temp_k - vft.k2;
    kappa(internal_temp_k, vft) * (-vft.k1 / (d * d))
}

/// Usable state of charge given the nominal state of charge and kappa.
pub fn soc_usable(soc_nominal: f64, kappa: f64) -> f64 {
    1.0 + (soc_nominal - 1.0) / kappa
}

/// Health-derated nominal capacity (C).
pub fn capacity_nominal(initial_capacity_c: f64, soh: f64) -> f64 {
    soh * initial_capacity_c
}

/// Temperature-derated usable capacity (C).
pub fn capacity_usable(capacity_nominal_c: f64, kappa: f64) -> f64 {
    kappa * capacity_nominal_c
}
