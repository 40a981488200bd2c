//! Open-circuit voltage (Burgos model).

use crate::params::OcvParams;

/// Open-circuit voltage at the reference temperature for a usable SoC.
pub fn ocv(soc_usable: f64, p: &OcvParams) -> f64 {
    let term1 = (p.v0 - p.vl) * (p.gamma * (soc_usable - 1.0)).exp();
    let term2 = p.alpha * p.vl * (soc_usable - 1.0);
    let term3 =
        (1.0 - p.alpha) * p.vl * ((-p.beta).exp() - (-p.beta * soc_usable.sqrt()).exp());
    p.vl + term1 + term2 + term3
}

/// d(OCV)/d(SoC), used by the analytical Jacobian.
pub fn ocv_grad(soc_usable: f64, p: &OcvParams) -> f64 {
    let sqrt_soc = soc_usable.sqrt();
    let mut grad = p.gamma * (p.v0 - p.vl) * (p.gamma * (soc_usable - 1.0)).exp();
    grad += p.alpha * p.vl;
    grad += (1.0 - p.alpha) * p.vl * p.beta * (-p.beta * sqrt_soc).exp() / (2.0 * sqrt_soc);
    grad
}

/// Temperature-corrected open-circuit voltage.
pub fn ocv_with_temperature(
    soc_usable: f64,
    internal_temp_k: f64,
    tref_k: f64,
    ehc_v_per_k: f64,
    p: &OcvParams,
) -> f64 {
    ocv(soc_usable, p) + ehc_v_per_k * (internal_temp_k - tref_k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn full_charge_is_v0() {
        let p = OcvParams::default();
        // At soc = 1 the exponential terms collapse: ocv = v0
        assert_relative_eq!(ocv(1.0, &p), p.v0, epsilon = 1e-12);
    }

    #[test]
    fn grad_matches_finite_difference() {
        let p = OcvParams::default();
        for soc in [0.1, 0.3, 0.5, 0.9] {
            let h = 1e-7;
            let fd = (ocv(soc + h, &p) - ocv(soc - h, &p)) / (2.0 * h);
            assert_relative_eq!(ocv_grad(soc, &p), fd, epsilon = 1e-5);
        }
    }

    #[test]
    fn temperature_correction_is_linear_in_ehc() {
        let p = OcvParams::default();
        let base = ocv(0.5, &p);
        let corrected = ocv_with_temperature(0.5, 308.0, 298.0, 2e-4, &p);
        assert_relative_eq!(corrected - base, 2e-3, epsilon = 1e-12);
    }
}
