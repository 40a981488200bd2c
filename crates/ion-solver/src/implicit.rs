//! Implicit steppers: Runge-Kutta stage solves via Newton and
//! semi-implicit midpoint extrapolation. All of them require a Jacobian
//! from the system.

use ion_core::Tolerances;
use nalgebra::{DMatrix, DVector, Matrix2};

use crate::error::{SolverError, SolverResult};
use crate::ode::{OdeSystem, State2, Stepper};

const NEWTON_MAX_ITER: usize = 50;

/// Full (possibly dense) Butcher tableau for an implicit method.
pub struct ImplicitTableau {
    pub a: Vec<Vec<f64>>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
}

impl ImplicitTableau {
    /// Backward Euler (1st order, L-stable).
    pub fn euler() -> Self {
        Self {
            a: vec![vec![1.0]],
            b: vec![1.0],
            c: vec![1.0],
        }
    }

    /// Implicit midpoint (2nd order, A-stable, symplectic).
    pub fn midpoint() -> Self {
        Self {
            a: vec![vec![0.5]],
            b: vec![1.0],
            c: vec![0.5],
        }
    }

    /// 2-stage Gauss-Legendre (4th order, A-stable).
    pub fn gauss4() -> Self {
        let s3 = 3.0_f64.sqrt() / 6.0;
        Self {
            a: vec![vec![0.25, 0.25 - s3], vec![0.25 + s3, 0.25]],
            b: vec![0.5, 0.5],
            c: vec![0.5 - s3, 0.5 + s3],
        }
    }
}

/// Implicit Runge-Kutta stepper using a simplified Newton iteration on
/// the stacked stage system, with the Jacobian frozen at the step start.
pub struct ImplicitRk {
    name: &'static str,
    tableau: ImplicitTableau,
    tol: Tolerances,
}

impl ImplicitRk {
    pub fn new(name: &'static str, tableau: ImplicitTableau, tol: Tolerances) -> Self {
        Self { name, tableau, tol }
    }
}

impl Stepper for ImplicitRk {
    fn step(
        &mut self,
        sys: &mut dyn OdeSystem,
        t: f64,
        h: f64,
        y: &State2,
    ) -> SolverResult<State2> {
        let s = self.tableau.b.len();
        let dim = 2 * s;
        let (jac, _dfdt) = sys.jacobian(t, y)?;

        // Newton matrix M = I - h (A (x) J), constant over the iteration
        let mut m = DMatrix::<f64>::identity(dim, dim);
        for i in 0..s {
            for j in 0..s {
                let aij = self.tableau.a[i][j];
                if aij != 0.0 {
                    for r in 0..2 {
                        for c in 0..2 {
                            m[(2 * i + r, 2 * j + c)] -= h * aij * jac[(r, c)];
                        }
                    }
                }
            }
        }
        let lu = m.lu();

        // Stage values, initialized from the explicit slope
        let f0 = sys.rhs(t, y)?;
        let mut k: Vec<State2> = vec![f0; s];

        for iter in 0..NEWTON_MAX_ITER {
            // Residual R_i = k_i - f(t + c_i h, y + h sum_j a_ij k_j)
            let mut residual = DVector::<f64>::zeros(dim);
            for i in 0..s {
                let mut yi = *y;
                for j in 0..s {
                    let aij = self.tableau.a[i][j];
                    if aij != 0.0 {
                        yi += k[j] * (h * aij);
                    }
                }
                let fi = sys.rhs(t + self.tableau.c[i] * h, &yi)?;
                residual[2 * i] = k[i][0] - fi[0];
                residual[2 * i + 1] = k[i][1] - fi[1];
            }

            let delta = lu
                .solve(&(-&residual))
                .ok_or_else(|| SolverError::Numeric {
                    what: "singular Newton matrix in implicit stage solve".to_string(),
                })?;

            let mut k_norm = 0.0_f64;
            for i in 0..s {
                k[i][0] += delta[2 * i];
                k[i][1] += delta[2 * i + 1];
                k_norm = k_norm.max(k[i].amax());
            }

            if delta.amax() <= self.tol.abs + self.tol.rel * k_norm {
                let mut next = *y;
                for (bi, ki) in self.tableau.b.iter().zip(&k) {
                    next += ki * (h * bi);
                }
                return Ok(next);
            }

            if iter == NEWTON_MAX_ITER - 1 {
                break;
            }
        }

        Err(SolverError::ConvergenceFailed {
            what: format!("{} stage Newton exceeded {NEWTON_MAX_ITER} iterations", self.name),
        })
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Semi-implicit midpoint rule (Bader-Deuflhard) with Richardson
/// extrapolation, the stiff counterpart of the Gragg stepper.
pub struct SemiImplicitMidpoint {
    substeps: &'static [usize],
}

impl SemiImplicitMidpoint {
    pub fn new(_tol: Tolerances) -> Self {
        Self {
            substeps: &[2, 6, 10],
        }
    }

    fn advance(
        sys: &mut dyn OdeSystem,
        t: f64,
        h: f64,
        y: &State2,
        jac: &Matrix2<f64>,
        n: usize,
    ) -> SolverResult<State2> {
        let sub = h / n as f64;
        let w = Matrix2::identity() - jac * sub;
        let w_lu = w.lu();
        let solve = |v: State2| -> SolverResult<State2> {
            w_lu.solve(&v).ok_or_else(|| SolverError::Numeric {
                what: "singular W matrix in semi-implicit midpoint".to_string(),
            })
        };

        let mut delta = solve(sys.rhs(t, y)? * sub)?;
        let mut z = *y + delta;
        for m in 1..n {
            let r = sys.rhs(t + m as f64 * sub, &z)? * sub;
            delta += solve(r - delta)? * 2.0;
            z += delta;
        }
        let r = sys.rhs(t + h, &z)? * sub;
        let last = solve(r - delta)?;
        Ok(z + last)
    }
}

impl Stepper for SemiImplicitMidpoint {
    fn step(
        &mut self,
        sys: &mut dyn OdeSystem,
        t: f64,
        h: f64,
        y: &State2,
    ) -> SolverResult<State2> {
        let (jac, _dfdt) = sys.jacobian(t, y)?;
        let mut prev: Vec<State2> = Vec::new();
        for (i, n) in self.substeps.iter().enumerate() {
            let mut cur = vec![Self::advance(sys, t, h, y, &jac, *n)?];
            for j in 1..=i {
                let ratio = (*n as f64 / self.substeps[i - j] as f64).powi(2);
                let extrapolated = cur[j - 1] + (cur[j - 1] - prev[j - 1]) / (ratio - 1.0);
                cur.push(extrapolated);
            }
            prev = cur;
        }
        Ok(prev[prev.len() - 1])
    }

    fn name(&self) -> &'static str {
        "bsimp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode::StepperKind;
    use approx::assert_relative_eq;

    struct Decay;
    impl OdeSystem for Decay {
        fn rhs(&mut self, _t: f64, y: &State2) -> SolverResult<State2> {
            Ok(-y)
        }
        fn jacobian(&mut self, _t: f64, _y: &State2) -> SolverResult<(Matrix2<f64>, State2)> {
            Ok((-Matrix2::identity(), State2::zeros()))
        }
    }

    /// Stiff linear system: one fast (-1000) and one slow (-1) mode.
    struct Stiff;
    impl OdeSystem for Stiff {
        fn rhs(&mut self, _t: f64, y: &State2) -> SolverResult<State2> {
            Ok(State2::new(-1000.0 * y[0], -y[1]))
        }
        fn jacobian(&mut self, _t: f64, _y: &State2) -> SolverResult<(Matrix2<f64>, State2)> {
            Ok((
                Matrix2::new(-1000.0, 0.0, 0.0, -1.0),
                State2::zeros(),
            ))
        }
    }

    fn integrate(kind: StepperKind, sys: &mut dyn OdeSystem, t_end: f64, h: f64) -> State2 {
        let mut stepper = kind.build(ion_core::Tolerances {
            abs: 1e-12,
            rel: 1e-12,
        });
        let mut y = State2::new(1.0, 1.0);
        let mut t = 0.0;
        while t < t_end - 1e-12 {
            y = stepper.step(sys, t, h, &y).unwrap();
            t += h;
        }
        y
    }

    #[test]
    fn implicit_families_hit_exponential_decay() {
        let exact = (-1.0_f64).exp();
        for (kind, tol) in [
            (StepperKind::Rk1imp, 1e-2),
            (StepperKind::Rk2imp, 1e-4),
            (StepperKind::Rk4imp, 1e-8),
            (StepperKind::Bsimp, 1e-6),
        ] {
            let y = integrate(kind, &mut Decay, 1.0, 0.01);
            assert!(
                (y[0] - exact).abs() < tol,
                "{kind:?}: error {}",
                (y[0] - exact).abs()
            );
        }
    }

    #[test]
    fn implicit_euler_stable_on_stiff_system() {
        // h = 0.01 puts the fast mode far outside the explicit stability
        // region (lambda h = -10); implicit Euler damps it monotonically.
        let y = integrate(StepperKind::Rk1imp, &mut Stiff, 1.0, 0.01);
        assert!(y[0].abs() < 1e-6, "fast mode not damped: {}", y[0]);
        assert_relative_eq!(y[1], (-1.0_f64).exp(), epsilon = 1e-2);
    }

    #[test]
    fn gauss4_is_fourth_order() {
        // Error ratio between h and h/2 should approach 2^4
        let exact = (-1.0_f64).exp();
        let e1 = (integrate(StepperKind::Rk4imp, &mut Decay, 1.0, 0.02)[0] - exact).abs();
        let e2 = (integrate(StepperKind::Rk4imp, &mut Decay, 1.0, 0.01)[0] - exact).abs();
        let ratio = e1 / e2;
        assert!(ratio > 10.0 && ratio < 25.0, "order ratio {ratio}");
    }
}
