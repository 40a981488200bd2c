//! The two-state cell ODE handed to the steppers.
//!
//! Derivatives are evaluated against a frozen algebraic snapshot: the
//! resolver runs once per macro step, and within the step the current,
//! usable capacity and generated heat are held at their resolved values.
//! Only the conduction term sees the integrated temperature directly.

use ion_models::{Parameters, capacity, current, ehc, heat, ocv};
use ion_solver::{OdeSystem, SolverResult, State2};
use nalgebra::Matrix2;

use crate::config::JacobianKind;
use crate::state::CellState;

/// Relative perturbation for the central-difference Jacobian.
const FD_EPS: f64 = 1e-6;

pub struct CellOde<'a> {
    snapshot: CellState,
    params: &'a Parameters,
    jacobian: JacobianKind,
}

impl<'a> CellOde<'a> {
    /// Capture the resolved state for one macro step.
    pub fn new(state: &CellState, params: &'a Parameters, jacobian: JacobianKind) -> Self {
        Self {
            snapshot: state.clone(),
            params,
            jacobian,
        }
    }

    /// Re-resolve the algebraic pipeline at an arbitrary (SoC, T) point,
    /// holding the internal resistance at its solved value, and return
    /// the state derivatives there.
    fn derivs_at(&self, soc_nominal: f64, temp_k: f64) -> State2 {
        let p = self.params;
        let s = &self.snapshot;
        let kappa = capacity::kappa(temp_k, &p.vft);
        let cap_nominal = capacity::capacity_nominal(p.init.capacity_c, s.soh);
        let soc_use = capacity::soc_usable(soc_nominal, kappa);
        let cap_use = capacity::capacity_usable(cap_nominal, kappa);
        let e = ehc::ehc(soc_use, &p.ehc);
        let voc = ocv::ocv_with_temperature(soc_use, temp_k, p.vft.tref, e, &p.ocv);
        let i = current::current(s.power_w, voc, s.internal_resistance_ohm);
        let q = heat::generated_heat(i, temp_k, s.internal_resistance_ohm, e);
        State2::new(
            heat::soc_d(i, cap_use),
            heat::internal_temperature_d(temp_k, q, s.ambient_temp_k, &p.thermal),
        )
    }

    /// Closed-form Jacobian entries, evaluated at the resolved snapshot.
    fn jacobian_analytical(&self) -> Matrix2<f64> {
        let p = self.params;
        let s = &self.snapshot;
        let di_dvoc = current::current_grad_ocv(
            s.power_w,
            s.open_circuit_voltage_v,
            s.internal_resistance_ohm,
        );
        let dvoc_dsoc = ocv::ocv_grad(s.soc_usable, &p.ocv);
        let dkappa_dt = capacity::kappa_grad(s.internal_temp_k, &p.vft);

        let j00 = -di_dvoc * dvoc_dsoc * s.kappa / s.capacity_usable_c;

        let num_left = s.capacity_usable_c * (di_dvoc * dvoc_dsoc * s.soc_nominal * dkappa_dt);
        let num_right = s.current_a * s.capacity_nominal_c * dkappa_dt;
        let j01 = (num_left - num_right) / (s.capacity_usable_c * s.capacity_usable_c);

        let heat_gradient = 2.0 * s.internal_resistance_ohm * s.current_a
            - s.internal_temp_k * s.ehc_v_per_k;
        let j10 = heat_gradient * di_dvoc * dvoc_dsoc * s.kappa / p.thermal.cp;

        let rt = p.thermal.rin + p.thermal.rout;
        let j11 = -1.0 / (p.thermal.cp * rt) - s.ehc_v_per_k / p.thermal.cp;

        Matrix2::new(j00, j01, j10, j11)
    }

    /// Central differences of the re-resolved derivative map.
    fn jacobian_central_difference(&self, y: &State2) -> Matrix2<f64> {
        let h_soc = FD_EPS * (1.0 + y[0].abs());
        let h_temp = FD_EPS * (1.0 + y[1].abs());
        let d_soc =
            (self.derivs_at(y[0] + h_soc, y[1]) - self.derivs_at(y[0] - h_soc, y[1]))
                / (2.0 * h_soc);
        let d_temp =
            (self.derivs_at(y[0], y[1] + h_temp) - self.derivs_at(y[0], y[1] - h_temp))
                / (2.0 * h_temp);
        Matrix2::new(d_soc[0], d_temp[0], d_soc[1], d_temp[1])
    }
}

impl OdeSystem for CellOde<'_> {
    fn rhs(&mut self, _t: f64, y: &State2) -> SolverResult<State2> {
        let s = &self.snapshot;
        Ok(State2::new(
            heat::soc_d(s.current_a, s.capacity_usable_c),
            heat::internal_temperature_d(
                y[1],
                s.generated_heat_w,
                s.ambient_temp_k,
                &self.params.thermal,
            ),
        ))
    }

    fn jacobian(&mut self, _t: f64, y: &State2) -> SolverResult<(Matrix2<f64>, State2)> {
        let dfdy = match self.jacobian {
            JacobianKind::Analytical => self.jacobian_analytical(),
            JacobianKind::CentralDifference => self.jacobian_central_difference(y),
        };
        Ok((dfdy, State2::zeros()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SimConfig;
    use crate::resolve::resolve;
    use approx::assert_relative_eq;
    use ion_solver::minimize::BracketMinimizer;

    fn resolved_state(power_w: f64) -> (CellState, Parameters) {
        let params = Parameters::default();
        let config = SimConfig::default();
        let mut minimizer = BracketMinimizer::new(config.minimizer);
        let mut state = CellState::initial(&params.init);
        state.promote_pending();
        state.power_w = power_w;
        state.ambient_temp_k = 298.0;
        resolve(&mut state, &params, &mut minimizer, &config).unwrap();
        (state, params)
    }

    #[test]
    fn rhs_matches_resolved_quantities() {
        let (state, params) = resolved_state(10.0);
        let mut ode = CellOde::new(&state, &params, JacobianKind::Analytical);
        let y = State2::new(state.soc_nominal, state.internal_temp_k);
        let dy = ode.rhs(0.0, &y).unwrap();
        assert_relative_eq!(
            dy[0],
            -state.current_a / state.capacity_usable_c,
            epsilon = 1e-12
        );
        // discharge at ambient: SoC falls, temperature rises
        assert!(dy[0] < 0.0);
        assert!(dy[1] > 0.0);
    }

    #[test]
    fn jacobian_strategies_agree_on_temperature_row() {
        // The temperature equation is explicit in T, so both strategies
        // must produce the same j11 up to finite-difference error.
        let (state, params) = resolved_state(10.0);
        let y = State2::new(state.soc_nominal, state.internal_temp_k);

        let mut analytical = CellOde::new(&state, &params, JacobianKind::Analytical);
        let (ja, dfdt) = analytical.jacobian(0.0, &y).unwrap();
        assert_eq!(dfdt, State2::zeros());

        let mut numeric = CellOde::new(&state, &params, JacobianKind::CentralDifference);
        let (jn, _) = numeric.jacobian(0.0, &y).unwrap();

        assert_relative_eq!(ja[(1, 1)], jn[(1, 1)], epsilon = 1e-4);
        // both see SoC decay accelerate with SoC through the OCV slope
        assert!(ja[(0, 0)].is_finite() && jn[(0, 0)].is_finite());
    }
}
