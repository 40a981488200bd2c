//! Bounded scalar minimization behind a set / iterate / test-interval
//! protocol, so the caller owns the iteration loop and can warm-start
//! from the previous solution.

use ion_core::Tolerances;
use tracing::debug;

use crate::error::{SolverError, SolverResult};

const GOLDEN: f64 = 0.381_966_011_250_105; // 2 - phi
const SQRT_EPS: f64 = 1.490_116_119_384_765_6e-8;
const SCAN_POINTS: usize = 64;

/// Objective for the bracket minimizer.
pub type Objective<'a> = dyn FnMut(f64) -> SolverResult<f64> + 'a;

/// Minimization algorithm selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MinimizerKind {
    /// Pure golden-section bracket shrinking, linear convergence
    GoldenSection,
    /// Brent's method, parabolic interpolation with golden fallback
    #[default]
    Brent,
    /// Parabolic fit through the bracket with golden fallback
    QuadGolden,
}

/// Bracketing minimizer over a bounded interval.
///
/// `set` installs a bracket around an initial guess, `iterate` shrinks it
/// one evaluation at a time, `test_interval` reports convergence. The
/// minimizer never fails outright on a poor guess; it falls back to a
/// coarse scan of the interval so an estimate is always available.
pub struct BracketMinimizer {
    kind: MinimizerKind,
    a: f64,
    b: f64,
    fa: f64,
    fb: f64,
    x: f64,
    fx: f64,
    // Brent history: previous and second-previous best points
    v: f64,
    fv: f64,
    w: f64,
    fw: f64,
    // last two step lengths, gating the parabolic fit
    d: f64,
    e: f64,
}

impl BracketMinimizer {
    pub fn new(kind: MinimizerKind) -> Self {
        Self {
            kind,
            a: 0.0,
            b: 0.0,
            fa: 0.0,
            fb: 0.0,
            x: 0.0,
            fx: 0.0,
            v: 0.0,
            fv: 0.0,
            w: 0.0,
            fw: 0.0,
            d: 0.0,
            e: 0.0,
        }
    }

    pub fn kind(&self) -> MinimizerKind {
        self.kind
    }

    pub fn x_minimum(&self) -> f64 {
        self.x
    }

    pub fn f_minimum(&self) -> f64 {
        self.fx
    }

    pub fn x_lower(&self) -> f64 {
        self.a
    }

    pub fn x_upper(&self) -> f64 {
        self.b
    }

    /// Bracket width convergence test: width below `abs + rel * min(|a|, |b|)`.
    pub fn test_interval(&self, tol: Tolerances) -> bool {
        let width = self.b - self.a;
        width.abs() < tol.abs + tol.rel * self.a.abs().min(self.b.abs())
    }

    /// Install a bracket `lower < guess < upper` around `guess`. If the
    /// guess does not sit below both endpoints, the interval is scanned
    /// coarsely and the best interior point becomes the starting estimate.
    pub fn set(
        &mut self,
        f: &mut Objective<'_>,
        guess: f64,
        lower: f64,
        upper: f64,
    ) -> SolverResult<()> {
        if !(lower < upper) || !lower.is_finite() || !upper.is_finite() {
            return Err(SolverError::InvalidArg {
                what: "minimizer bracket must satisfy lower < upper and be finite",
            });
        }

        self.a = lower;
        self.b = upper;
        self.fa = f(lower)?;
        self.fb = f(upper)?;

        let mut x = guess.clamp(lower, upper);
        if x <= lower || x >= upper {
            x = lower + GOLDEN * (upper - lower);
        }
        let mut fx = f(x)?;

        if !(fx < self.fa && fx < self.fb) {
            debug!(guess, fx, "guess does not bracket a minimum, scanning interval");
            let width = upper - lower;
            for i in 1..SCAN_POINTS {
                let xi = lower + width * i as f64 / SCAN_POINTS as f64;
                let fi = f(xi)?;
                if fi < fx {
                    x = xi;
                    fx = fi;
                }
            }
        }

        self.x = x;
        self.fx = fx;
        self.v = self.a + GOLDEN * (self.b - self.a);
        self.fv = f(self.v)?;
        self.w = self.v;
        self.fw = self.fv;
        self.d = 0.0;
        self.e = 0.0;
        Ok(())
    }

    /// One shrink of the bracket. The current estimate never gets worse.
    pub fn iterate(&mut self, f: &mut Objective<'_>) -> SolverResult<()> {
        match self.kind {
            MinimizerKind::GoldenSection => self.iterate_golden(f),
            MinimizerKind::Brent => self.iterate_brent(f),
            MinimizerKind::QuadGolden => self.iterate_quad_golden(f),
        }
    }

    fn golden_trial(&self) -> f64 {
        let w_lower = self.x - self.a;
        let w_upper = self.b - self.x;
        if w_upper > w_lower {
            self.x + GOLDEN * w_upper
        } else {
            self.x - GOLDEN * w_lower
        }
    }

    fn accept(&mut self, u: f64, fu: f64) {
        if fu <= self.fx {
            if u < self.x {
                self.b = self.x;
                self.fb = self.fx;
            } else {
                self.a = self.x;
                self.fa = self.fx;
            }
            self.v = self.w;
            self.fv = self.fw;
            self.w = self.x;
            self.fw = self.fx;
            self.x = u;
            self.fx = fu;
        } else {
            if u < self.x {
                self.a = u;
                self.fa = fu;
            } else {
                self.b = u;
                self.fb = fu;
            }
            if fu <= self.fw || self.w == self.x {
                self.v = self.w;
                self.fv = self.fw;
                self.w = u;
                self.fw = fu;
            } else if fu <= self.fv || self.v == self.x || self.v == self.w {
                self.v = u;
                self.fv = fu;
            }
        }
    }

    fn iterate_golden(&mut self, f: &mut Objective<'_>) -> SolverResult<()> {
        let u = self.golden_trial();
        let fu = f(u)?;
        self.accept(u, fu);
        Ok(())
    }

    fn iterate_brent(&mut self, f: &mut Objective<'_>) -> SolverResult<()> {
        let tolerance = SQRT_EPS * self.x.abs();
        let midpoint = 0.5 * (self.a + self.b);

        let mut step = if self.e.abs() > tolerance {
            // parabolic fit through x, w, v
            let r = (self.x - self.w) * (self.fx - self.fv);
            let mut q = (self.x - self.v) * (self.fx - self.fw);
            let mut p = (self.x - self.v) * q - (self.x - self.w) * r;
            q = 2.0 * (q - r);
            if q > 0.0 {
                p = -p;
            } else {
                q = -q;
            }
            let e_prev = self.e;
            self.e = self.d;
            if p.abs() < (0.5 * q * e_prev).abs()
                && p > q * (self.a - self.x)
                && p < q * (self.b - self.x)
            {
                p / q
            } else {
                // golden step into the larger subinterval
                self.e = if self.x < midpoint {
                    self.b - self.x
                } else {
                    self.a - self.x
                };
                GOLDEN * self.e
            }
        } else {
            self.e = if self.x < midpoint {
                self.b - self.x
            } else {
                self.a - self.x
            };
            GOLDEN * self.e
        };

        if step.abs() < tolerance {
            step = if step >= 0.0 { tolerance } else { -tolerance };
        }
        self.d = step;

        let u = self.x + step;
        let fu = f(u)?;
        self.accept(u, fu);
        Ok(())
    }

    fn iterate_quad_golden(&mut self, f: &mut Objective<'_>) -> SolverResult<()> {
        // vertex of the parabola through the bracket endpoints and x
        let (xa, xb, xc) = (self.a, self.x, self.b);
        let (fa, fb, fc) = (self.fa, self.fx, self.fb);
        let num = (xb - xa).powi(2) * (fb - fc) - (xb - xc).powi(2) * (fb - fa);
        let den = (xb - xa) * (fb - fc) - (xb - xc) * (fb - fa);

        let tolerance = SQRT_EPS * self.x.abs();
        let u = if den.abs() > f64::MIN_POSITIVE {
            let vertex = xb - 0.5 * num / den;
            if vertex > self.a + tolerance
                && vertex < self.b - tolerance
                && (vertex - self.x).abs() > tolerance
            {
                vertex
            } else {
                self.golden_trial()
            }
        } else {
            self.golden_trial()
        };

        let fu = f(u)?;
        self.accept(u, fu);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimize(kind: MinimizerKind, f: &mut Objective<'_>, guess: f64, lo: f64, hi: f64) -> f64 {
        let mut min = BracketMinimizer::new(kind);
        min.set(f, guess, lo, hi).unwrap();
        let tol = Tolerances {
            abs: 1e-10,
            rel: 0.0,
        };
        for _ in 0..200 {
            min.iterate(f).unwrap();
            if min.test_interval(tol) {
                break;
            }
        }
        min.x_minimum()
    }

    #[test]
    fn all_kinds_find_parabola_minimum() {
        for kind in [
            MinimizerKind::GoldenSection,
            MinimizerKind::Brent,
            MinimizerKind::QuadGolden,
        ] {
            let mut f = |x: f64| -> SolverResult<f64> { Ok((x - 2.0).powi(2)) };
            let x = minimize(kind, &mut f, 1.0, -10.0, 10.0);
            assert!((x - 2.0).abs() < 1e-7, "{kind:?}: got {x}");
        }
    }

    #[test]
    fn brent_handles_asymmetric_objective() {
        let mut f = |x: f64| -> SolverResult<f64> { Ok((x - 0.3).powi(2) + 0.1 * (x - 0.3).powi(4)) };
        let x = minimize(MinimizerKind::Brent, &mut f, 0.5, -1.0, 1.0);
        assert!((x - 0.3).abs() < 1e-7, "got {x}");
    }

    #[test]
    fn poor_guess_falls_back_to_scan() {
        // guess sits on the wrong side of the interval, above both
        // surrounding values of the objective
        let mut f = |x: f64| -> SolverResult<f64> { Ok((x - 8.0).powi(2)) };
        let x = minimize(MinimizerKind::Brent, &mut f, -9.9, -10.0, 10.0);
        assert!((x - 8.0).abs() < 1e-6, "got {x}");
    }

    #[test]
    fn invalid_bracket_rejected() {
        let mut min = BracketMinimizer::new(MinimizerKind::Brent);
        let mut f = |x: f64| -> SolverResult<f64> { Ok(x * x) };
        assert!(min.set(&mut f, 0.0, 5.0, -5.0).is_err());
    }

    #[test]
    fn test_interval_reports_width() {
        let mut min = BracketMinimizer::new(MinimizerKind::GoldenSection);
        let mut f = |x: f64| -> SolverResult<f64> { Ok(x * x) };
        min.set(&mut f, 0.1, -1.0, 1.0).unwrap();
        assert!(!min.test_interval(Tolerances {
            abs: 1e-6,
            rel: 0.0
        }));
        for _ in 0..100 {
            min.iterate(&mut f).unwrap();
        }
        assert!(min.test_interval(Tolerances {
            abs: 1e-6,
            rel: 0.0
        }));
    }
}
