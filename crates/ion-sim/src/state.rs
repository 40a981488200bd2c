//! Mutable cell state owned by the simulation orchestrator.
//!
//! The state is double-buffered on the two integrated quantities: each
//! step writes the integrator result into the `next_*` pair and the
//! following step promotes it, so after any step the struct holds the
//! inputs, outputs and states of timestep k together with the states of
//! k+1.

use ion_models::InitialConditions;

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellState {
    // clock and bookkeeping
    pub time_s: f64,
    pub step: u64,
    pub cycle: u64,
    pub cycle_step: u64,

    // inputs
    pub power_w: f64,
    pub ambient_temp_k: f64,

    // charge
    pub soc_nominal: f64,
    pub soc_usable: f64,
    pub kappa: f64,
    pub capacity_nominal_c: f64,
    pub capacity_usable_c: f64,

    // electrical
    pub current_a: f64,
    pub voltage_v: f64,
    pub ref_open_circuit_voltage_v: f64,
    pub open_circuit_voltage_v: f64,
    pub internal_resistance_ohm: f64,

    // thermal
    pub internal_temp_k: f64,
    pub surface_temp_k: f64,
    pub ehc_v_per_k: f64,
    pub generated_heat_w: f64,

    // health
    pub soh: f64,

    // per-cycle statistics
    pub soc_mean: f64,
    pub soc_max: f64,
    pub soc_min: f64,
    pub acc_discharge_c: f64,

    // pending pair, promoted at the start of the next step
    pub next_soc_nominal: f64,
    pub next_internal_temp_k: f64,
}

impl CellState {
    /// Fresh state seeded from the initial conditions. The initial values
    /// land in the pending pair so the first step promotes them; the
    /// current doubles as the warm start for the implicit solve.
    pub fn initial(init: &InitialConditions) -> Self {
        Self {
            next_soc_nominal: init.soc,
            next_internal_temp_k: init.internal_temp_k,
            soh: init.soh,
            current_a: init.current_guess_a,
            soc_min: 1.0,
            soc_max: 0.0,
            ..Self::default()
        }
    }

    /// Promote the pending pair into the live state.
    pub fn promote_pending(&mut self) {
        self.soc_nominal = self.next_soc_nominal;
        self.internal_temp_k = self.next_internal_temp_k;
    }

    /// Reset the per-cycle SoC statistics and discharge window counters.
    pub fn reset_cycle_stats(&mut self) {
        self.soc_mean = 0.0;
        self.soc_max = 0.0;
        self.soc_min = 1.0;
        self.cycle_step = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_seeds_pending_pair() {
        let init = InitialConditions::default();
        let state = CellState::initial(&init);
        assert_eq!(state.next_soc_nominal, init.soc);
        assert_eq!(state.next_internal_temp_k, init.internal_temp_k);
        assert_eq!(state.current_a, init.current_guess_a);
        assert_eq!(state.soh, init.soh);
        // statistics start at the extremes so the first sample wins
        assert_eq!(state.soc_min, 1.0);
        assert_eq!(state.soc_max, 0.0);
        assert_eq!(state.step, 0);
        assert_eq!(state.cycle, 0);
    }

    #[test]
    fn promote_moves_pending_into_live() {
        let mut state = CellState::initial(&InitialConditions::default());
        state.next_soc_nominal = 0.42;
        state.next_internal_temp_k = 301.5;
        state.promote_pending();
        assert_eq!(state.soc_nominal, 0.42);
        assert_eq!(state.internal_temp_k, 301.5);
    }
}
