//! Multistep steppers: Adams-Bashforth-Moulton predictor-corrector and
//! a 2nd-order backward differentiation formula.
//!
//! Both carry slope history tied to a fixed step size. `reset` drops the
//! history; it is also dropped automatically when the caller changes `h`.

use ion_core::Tolerances;
use nalgebra::Matrix2;

use crate::error::{SolverError, SolverResult};
use crate::explicit::{ExplicitRk, Tableau};
use crate::ode::{OdeSystem, State2, Stepper};

const NEWTON_MAX_ITER: usize = 50;

/// 4th-order Adams-Bashforth-Moulton predictor-corrector. The first
/// three steps bootstrap with classic RK4 while slope history builds up.
pub struct AdamsMoulton {
    bootstrap: ExplicitRk,
    // slopes at t_{n-3}, t_{n-2}, t_{n-1}, oldest first
    history: Vec<State2>,
    last_h: Option<f64>,
}

impl AdamsMoulton {
    pub fn new() -> Self {
        Self {
            bootstrap: ExplicitRk::new("rk4", Tableau::rk4()),
            history: Vec::with_capacity(3),
            last_h: None,
        }
    }
}

impl Default for AdamsMoulton {
    fn default() -> Self {
        Self::new()
    }
}

impl Stepper for AdamsMoulton {
    fn step(
        &mut self,
        sys: &mut dyn OdeSystem,
        t: f64,
        h: f64,
        y: &State2,
    ) -> SolverResult<State2> {
        if self.last_h.is_some_and(|prev| prev != h) {
            self.history.clear();
        }
        self.last_h = Some(h);

        let f_n = sys.rhs(t, y)?;

        if self.history.len() < 3 {
            self.history.push(f_n);
            return self.bootstrap.step(sys, t, h, y);
        }

        let (f_nm3, f_nm2, f_nm1) = (self.history[0], self.history[1], self.history[2]);

        // AB4 predictor
        let y_pred =
            y + (f_n * 55.0 - f_nm1 * 59.0 + f_nm2 * 37.0 - f_nm3 * 9.0) * (h / 24.0);
        let f_pred = sys.rhs(t + h, &y_pred)?;

        // AM4 corrector
        let y_next = y + (f_pred * 9.0 + f_n * 19.0 - f_nm1 * 5.0 + f_nm2) * (h / 24.0);

        self.history.remove(0);
        self.history.push(f_n);
        Ok(y_next)
    }

    fn reset(&mut self) {
        self.history.clear();
        self.last_h = None;
    }

    fn name(&self) -> &'static str {
        "msadams"
    }
}

/// 2nd-order BDF with a simplified Newton solve per step. Falls back to
/// backward Euler for the first step, when no previous point exists.
pub struct Bdf2 {
    tol: Tolerances,
    y_prev: Option<State2>,
    last_h: Option<f64>,
}

impl Bdf2 {
    pub fn new(tol: Tolerances) -> Self {
        Self {
            tol,
            y_prev: None,
            last_h: None,
        }
    }

    /// Solve u = rhs_scale * f(t1, u) + lhs for u, Jacobian frozen at (t1, y0).
    fn newton_solve(
        &self,
        sys: &mut dyn OdeSystem,
        t1: f64,
        rhs_scale: f64,
        lhs: &State2,
        y0: &State2,
        label: &'static str,
    ) -> SolverResult<State2> {
        let (jac, _dfdt) = sys.jacobian(t1, y0)?;
        let m = Matrix2::identity() - jac * rhs_scale;
        let lu = m.lu();

        let mut u = *y0;
        for _ in 0..NEWTON_MAX_ITER {
            let residual = u - sys.rhs(t1, &u)? * rhs_scale - lhs;
            let delta = lu.solve(&(-residual)).ok_or_else(|| SolverError::Numeric {
                what: format!("singular Newton matrix in {label}"),
            })?;
            u += delta;
            if delta.amax() <= self.tol.abs + self.tol.rel * u.amax() {
                return Ok(u);
            }
        }
        Err(SolverError::ConvergenceFailed {
            what: format!("{label} Newton exceeded {NEWTON_MAX_ITER} iterations"),
        })
    }
}

impl Stepper for Bdf2 {
    fn step(
        &mut self,
        sys: &mut dyn OdeSystem,
        t: f64,
        h: f64,
        y: &State2,
    ) -> SolverResult<State2> {
        if self.last_h.is_some_and(|prev| prev != h) {
            self.y_prev = None;
        }
        self.last_h = Some(h);

        let y_next = match self.y_prev {
            // y1 = y + h f(t+h, y1)
            None => self.newton_solve(sys, t + h, h, y, y, "bdf startup")?,
            // y1 = 4/3 y - 1/3 y_prev + 2/3 h f(t+h, y1)
            Some(prev) => {
                let lhs = y * (4.0 / 3.0) - prev * (1.0 / 3.0);
                self.newton_solve(sys, t + h, 2.0 * h / 3.0, &lhs, y, "bdf2")?
            }
        };

        self.y_prev = Some(*y);
        Ok(y_next)
    }

    fn reset(&mut self) {
        self.y_prev = None;
        self.last_h = None;
    }

    fn name(&self) -> &'static str {
        "msbdf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode::StepperKind;

    struct Decay;
    impl OdeSystem for Decay {
        fn rhs(&mut self, _t: f64, y: &State2) -> SolverResult<State2> {
            Ok(-y)
        }
        fn jacobian(&mut self, _t: f64, _y: &State2) -> SolverResult<(Matrix2<f64>, State2)> {
            Ok((-Matrix2::identity(), State2::zeros()))
        }
    }

    fn integrate(kind: StepperKind, t_end: f64, h: f64) -> State2 {
        let mut stepper = kind.build(Tolerances {
            abs: 1e-12,
            rel: 1e-12,
        });
        let mut y = State2::new(1.0, 1.0);
        let mut t = 0.0;
        while t < t_end - 1e-12 {
            y = stepper.step(&mut Decay, t, h, &y).unwrap();
            t += h;
        }
        y
    }

    #[test]
    fn adams_matches_exponential_decay() {
        let y = integrate(StepperKind::Msadams, 1.0, 0.01);
        let exact = (-1.0_f64).exp();
        assert!((y[0] - exact).abs() < 1e-8, "error {}", (y[0] - exact).abs());
    }

    #[test]
    fn bdf_matches_exponential_decay() {
        let y = integrate(StepperKind::Msbdf, 1.0, 0.01);
        let exact = (-1.0_f64).exp();
        assert!((y[0] - exact).abs() < 1e-4, "error {}", (y[0] - exact).abs());
    }

    #[test]
    fn adams_reset_clears_history() {
        let mut stepper = AdamsMoulton::new();
        let y0 = State2::new(1.0, 1.0);
        let mut y = y0;
        for i in 0..5 {
            y = stepper.step(&mut Decay, i as f64 * 0.1, 0.1, &y).unwrap();
        }
        assert_eq!(stepper.history.len(), 3);
        stepper.reset();
        assert!(stepper.history.is_empty());
        // usable again from scratch
        let y1 = stepper.step(&mut Decay, 0.0, 0.1, &y0).unwrap();
        assert!((y1[0] - (-0.1_f64).exp()).abs() < 1e-6);
    }

    #[test]
    fn step_size_change_drops_history() {
        let mut stepper = AdamsMoulton::new();
        let mut y = State2::new(1.0, 1.0);
        for i in 0..4 {
            y = stepper.step(&mut Decay, i as f64 * 0.1, 0.1, &y).unwrap();
        }
        assert_eq!(stepper.history.len(), 3);
        stepper.step(&mut Decay, 0.4, 0.05, &y).unwrap();
        assert_eq!(stepper.history.len(), 1);
    }
}
