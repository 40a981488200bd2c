//! Entropic heat coefficient.

use std::f64::consts::PI;

use crate::params::EhcParams;

/// Entropic heat coefficient (V/K) at a usable SoC.
///
/// Closed form: a scaled Gaussian bump around `mu` minus an exponential
/// decay, shifted by `b`.
pub fn ehc(soc_usable: f64, p: &EhcParams) -> f64 {
    let exp_num = (soc_usable - p.mu).powi(2);
    let exp_den = 2.0 * p.sigma.powi(2);
    let gaussian = (-exp_num / exp_den).exp() / (p.sigma * (2.0 * PI).sqrt());
    let decay = p.l * (-p.kappa * soc_usable).exp();
    p.a * (gaussian - decay) + p.b
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn peak_at_mu() {
        let p = EhcParams::default();
        let at_mu = ehc(p.mu, &p);
        assert!(at_mu > ehc(p.mu - 0.1, &p));
        assert!(at_mu > ehc(p.mu + 0.1, &p));
    }

    #[test]
    fn gaussian_normalization() {
        // With l = 0 and b = 0 the value at mu is a / (sigma * sqrt(2 pi))
        let p = EhcParams {
            a: 1.0,
            b: 0.0,
            l: 0.0,
            ..EhcParams::default()
        };
        let expected = 1.0 / (p.sigma * (2.0 * PI).sqrt());
        assert_relative_eq!(ehc(p.mu, &p), expected, epsilon = 1e-12);
    }
}
