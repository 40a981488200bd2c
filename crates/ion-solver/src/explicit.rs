//! Explicit fixed-step Runge-Kutta steppers.

use crate::error::SolverResult;
use crate::ode::{OdeSystem, State2, Stepper};

/// Butcher tableau for an explicit Runge-Kutta method. `a` holds the
/// strictly lower-triangular rows for stages 1.., `b` the solution
/// weights, `c` the stage abscissae.
pub struct Tableau {
    pub a: &'static [&'static [f64]],
    pub b: &'static [f64],
    pub c: &'static [f64],
}

impl Tableau {
    /// Heun's method (2nd order).
    pub fn rk2() -> Self {
        Tableau {
            a: &[&[1.0]],
            b: &[0.5, 0.5],
            c: &[0.0, 1.0],
        }
    }

    /// Classic 4th-order Runge-Kutta.
    pub fn rk4() -> Self {
        Tableau {
            a: &[&[0.5], &[0.0, 0.5], &[0.0, 0.0, 1.0]],
            b: &[1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0],
            c: &[0.0, 0.5, 0.5, 1.0],
        }
    }

    /// Runge-Kutta-Fehlberg 4(5); the 5th-order weights are used.
    pub fn rkf45() -> Self {
        Tableau {
            a: &[
                &[0.25],
                &[3.0 / 32.0, 9.0 / 32.0],
                &[1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0],
                &[439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0],
                &[
                    -8.0 / 27.0,
                    2.0,
                    -3544.0 / 2565.0,
                    1859.0 / 4104.0,
                    -11.0 / 40.0,
                ],
            ],
            b: &[
                16.0 / 135.0,
                0.0,
                6656.0 / 12825.0,
                28561.0 / 56430.0,
                -9.0 / 50.0,
                2.0 / 55.0,
            ],
            c: &[0.0, 0.25, 3.0 / 8.0, 12.0 / 13.0, 1.0, 0.5],
        }
    }

    /// Cash-Karp 4(5); the 5th-order weights are used.
    pub fn rkck() -> Self {
        Tableau {
            a: &[
                &[0.2],
                &[3.0 / 40.0, 9.0 / 40.0],
                &[0.3, -0.9, 1.2],
                &[-11.0 / 54.0, 2.5, -70.0 / 27.0, 35.0 / 27.0],
                &[
                    1631.0 / 55296.0,
                    175.0 / 512.0,
                    575.0 / 13824.0,
                    44275.0 / 110592.0,
                    253.0 / 4096.0,
                ],
            ],
            b: &[
                37.0 / 378.0,
                0.0,
                250.0 / 621.0,
                125.0 / 594.0,
                0.0,
                512.0 / 1771.0,
            ],
            c: &[0.0, 0.2, 0.3, 0.6, 1.0, 7.0 / 8.0],
        }
    }
}

/// Generic explicit Runge-Kutta stepper driven by a tableau.
pub struct ExplicitRk {
    name: &'static str,
    tableau: Tableau,
}

impl ExplicitRk {
    pub fn new(name: &'static str, tableau: Tableau) -> Self {
        Self { name, tableau }
    }
}

impl Stepper for ExplicitRk {
    fn step(
        &mut self,
        sys: &mut dyn OdeSystem,
        t: f64,
        h: f64,
        y: &State2,
    ) -> SolverResult<State2> {
        let stages = self.tableau.b.len();
        let mut k: Vec<State2> = Vec::with_capacity(stages);
        k.push(sys.rhs(t, y)?);
        for i in 1..stages {
            let row = self.tableau.a[i - 1];
            let mut yi = *y;
            for (j, aij) in row.iter().enumerate() {
                if *aij != 0.0 {
                    yi += k[j] * (h * aij);
                }
            }
            k.push(sys.rhs(t + self.tableau.c[i] * h, &yi)?);
        }

        let mut next = *y;
        for (bi, ki) in self.tableau.b.iter().zip(&k) {
            if *bi != 0.0 {
                next += ki * (h * bi);
            }
        }
        Ok(next)
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// High-order explicit stepping via Gragg's modified midpoint rule with
/// Richardson extrapolation. With substep counts 2, 4, 6, 8 the error
/// expansion in h^2 is eliminated to 8th order.
pub struct GraggExtrapolation {
    substeps: &'static [usize],
}

impl GraggExtrapolation {
    pub fn order8() -> Self {
        Self {
            substeps: &[2, 4, 6, 8],
        }
    }

    fn midpoint(
        sys: &mut dyn OdeSystem,
        t: f64,
        h: f64,
        y: &State2,
        n: usize,
    ) -> SolverResult<State2> {
        let sub = h / n as f64;
        let mut z_prev = *y;
        let mut z = *y + sys.rhs(t, y)? * sub;
        for m in 1..n {
            let z_next = z_prev + sys.rhs(t + m as f64 * sub, &z)? * (2.0 * sub);
            z_prev = z;
            z = z_next;
        }
        // Gragg's smoothing step removes the oscillating error component
        Ok((z + z_prev + sys.rhs(t + h, &z)? * sub) * 0.5)
    }
}

impl Stepper for GraggExtrapolation {
    fn step(
        &mut self,
        sys: &mut dyn OdeSystem,
        t: f64,
        h: f64,
        y: &State2,
    ) -> SolverResult<State2> {
        // Aitken-Neville in (h/n)^2: T[i][j] = T[i][j-1]
        //   + (T[i][j-1] - T[i-1][j-1]) / ((n_i / n_{i-j})^2 - 1)
        let mut prev: Vec<State2> = Vec::new();
        for (i, n) in self.substeps.iter().enumerate() {
            let mut cur = vec![Self::midpoint(sys, t, h, y, *n)?];
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
        "rk8ex"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode::StepperKind;
    use approx::assert_relative_eq;
    use ion_core::Tolerances;

    struct Decay;
    impl OdeSystem for Decay {
        fn rhs(&mut self, _t: f64, y: &State2) -> SolverResult<State2> {
            Ok(-y)
        }
    }

    struct Oscillator;
    impl OdeSystem for Oscillator {
        fn rhs(&mut self, _t: f64, y: &State2) -> SolverResult<State2> {
            Ok(State2::new(y[1], -y[0]))
        }
    }

    fn integrate(kind: StepperKind, sys: &mut dyn OdeSystem, t_end: f64, h: f64) -> State2 {
        let mut stepper = kind.build(Tolerances::default());
        let mut y = State2::new(1.0, 0.0);
        let mut t = 0.0;
        while t < t_end - 1e-12 {
            y = stepper.step(sys, t, h, &y).unwrap();
            t += h;
        }
        y
    }

    #[test]
    fn explicit_families_hit_exponential_decay() {
        for (kind, tol) in [
            (StepperKind::Rk2, 1e-3),
            (StepperKind::Rk4, 1e-7),
            (StepperKind::Rkf45, 1e-9),
            (StepperKind::Rkck, 1e-9),
            (StepperKind::Rk8pd, 1e-10),
        ] {
            let y = integrate(kind, &mut Decay, 1.0, 0.01);
            let exact = (-1.0_f64).exp();
            assert!(
                (y[0] - exact).abs() < tol,
                "{kind:?}: error {}",
                (y[0] - exact).abs()
            );
        }
    }

    #[test]
    fn rk4_oscillator_period() {
        let y = integrate(StepperKind::Rk4, &mut Oscillator, std::f64::consts::TAU, 0.001);
        assert_relative_eq!(y[0], 1.0, epsilon = 1e-8);
        assert_relative_eq!(y[1], 0.0, epsilon = 1e-8);
    }

    #[test]
    fn gragg_single_step_beats_rk4() {
        let mut rk8 = StepperKind::Rk8pd.build(Tolerances::default());
        let mut rk4 = StepperKind::Rk4.build(Tolerances::default());
        let y0 = State2::new(1.0, 0.0);
        let exact = (-0.5_f64).exp();
        let e8 = (rk8.step(&mut Decay, 0.0, 0.5, &y0).unwrap()[0] - exact).abs();
        let e4 = (rk4.step(&mut Decay, 0.0, 0.5, &y0).unwrap()[0] - exact).abs();
        assert!(e8 < e4);
    }
}
