//! Closed-form terminal current for a given power draw.
//!
//! From `P = V * I` and `V = Voc - R * I` the terminal current is the
//! smaller root of `R I^2 - Voc I + P = 0`. The relation becomes implicit
//! once the resistance itself depends on the current; the enclosing
//! resolver handles that with a bounded minimization.

use tracing::warn;

/// Terminal current (A) from power, open-circuit voltage and resistance.
///
/// A negative discriminant (demanded power beyond what the cell can
/// deliver) propagates NaN, which the caller treats as fatal.
pub fn current(power_w: f64, ocv_v: f64, resistance_ohm: f64) -> f64 {
    let half = ocv_v / (2.0 * resistance_ohm);
    let discriminant = half * half - power_w / resistance_ohm;
    if discriminant < 0.0 {
        warn!(discriminant, "negative discriminant in current solve");
    }
    half - discriminant.sqrt()
}

/// d(current)/d(Voc), used by the analytical Jacobian.
pub fn current_grad_ocv(power_w: f64, ocv_v: f64, resistance_ohm: f64) -> f64 {
    let half = ocv_v / (2.0 * resistance_ohm);
    let discriminant = half * half - power_w / resistance_ohm;
    let term1 = 1.0 / (2.0 * resistance_ohm);
    let term2 = ocv_v / (4.0 * resistance_ohm * resistance_ohm) / discriminant.sqrt();
    term1 - term2
}

/// Terminal voltage from power and current.
pub fn voltage_from_current(power_w: f64, current_a: f64) -> f64 {
    power_w / current_a
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn zero_power_zero_current() {
        assert_relative_eq!(current(0.0, 3.9, 0.12), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn current_satisfies_power_balance() {
        let (p, voc, r) = (10.0, 3.9, 0.12);
        let i = current(p, voc, r);
        let v = voc - r * i;
        assert_relative_eq!(v * i, p, epsilon = 1e-9);
    }

    #[test]
    fn grad_matches_finite_difference() {
        let (p, voc, r) = (10.0, 3.9, 0.12);
        let h = 1e-7;
        let fd = (current(p, voc + h, r) - current(p, voc - h, r)) / (2.0 * h);
        assert_relative_eq!(current_grad_ocv(p, voc, r), fd, epsilon = 1e-5);
    }

    #[test]
    fn overdraw_is_nan() {
        // Power far beyond the deliverable maximum
        assert!(current(1e6, 3.9, 0.12).is_nan());
    }
}
