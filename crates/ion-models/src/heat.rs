//! Heat generation and the lumped thermal network.

use crate::params::ThermalParams;

/// Irreversible plus reversible heat (W), floored at zero.
pub fn generated_heat(
    current_a: f64,
    internal_temp_k: f64,
    resistance_ohm: f64,
    ehc_v_per_k: f64,
) -> f64 {
    let ohmic = resistance_ohm * current_a * current_a;
    let entropic = current_a * internal_temp_k * ehc_v_per_k;
    (ohmic - entropic).max(0.0)
}

/// Surface temperature (K): thermal-resistance-weighted average of the
/// internal and ambient temperatures.
pub fn surface_temperature(internal_temp_k: f64, ambient_temp_k: f64, t: &ThermalParams) -> f64 {
    let rt = t.rin + t.rout;
    internal_temp_k * t.rout / rt + ambient_temp_k * t.rin / rt
}

/// d(T_internal)/dt (K/s) for the two-state cell ODE.
pub fn internal_temperature_d(
    internal_temp_k: f64,
    heat_w: f64,
    ambient_temp_k: f64,
    t: &ThermalParams,
) -> f64 {
    let rt = t.rin + t.rout;
    ((ambient_temp_k - internal_temp_k) / rt + heat_w) / t.cp
}

/// d(SoC)/dt (1/s): discharge convention, positive current drains charge.
pub fn soc_d(current_a: f64, capacity_usable_c: f64) -> f64 {
    -current_a / capacity_usable_c
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn heat_is_floored_at_zero() {
        // Entropic term dominating ohmic losses must not cool the cell
        assert_eq!(generated_heat(1.0, 300.0, 1e-6, 1.0), 0.0);
        assert!(generated_heat(10.0, 298.0, 0.12, 5e-5) > 0.0);
    }

    #[test]
    fn surface_temperature_between_bounds() {
        let t = ThermalParams::default();
        let ts = surface_temperature(310.0, 298.0, &t);
        assert!(ts > 298.0 && ts < 310.0);
        // rin = 3, rout = 9: surface sits closer to the core
        assert_relative_eq!(ts, 310.0 * 0.75 + 298.0 * 0.25, epsilon = 1e-12);
    }

    #[test]
    fn equilibrium_has_no_drift() {
        let t = ThermalParams::default();
        assert_relative_eq!(
            internal_temperature_d(298.0, 0.0, 298.0, &t),
            0.0,
            epsilon = 1e-15
        );
    }

    #[test]
    fn discharge_drains_soc() {
        assert!(soc_d(10.0, 14400.0) < 0.0);
        assert_relative_eq!(soc_d(14400.0, 14400.0), -1.0, epsilon = 1e-15);
    }
}
