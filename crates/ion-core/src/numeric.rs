use crate::CoreError;

/// Floating point type used throughout the engine
pub type Real = f64;

/// Absolute/relative tolerance pair shared by the minimizer and steppers.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-8,
            rel: 1e-8,
        }
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let diff = (a - b).abs();
    if diff <= tol.abs {
        return true;
    }
    diff <= tol.rel * a.abs().max(b.abs())
}

pub fn ensure_finite(v: Real, what: &'static str) -> Result<Real, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Evaluate `sum(coeffs[i] * x^i)` with coefficients in ascending order.
pub fn polyval(x: Real, coeffs: &[Real]) -> Real {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Clamp `v` to `[lo, hi]`.
pub fn clip(v: Real, lo: Real, hi: Real) -> Real {
    v.clamp(lo, hi)
}

/// Fold the next sample into a running mean over `count` prior samples.
pub fn incremental_mean(mean: Real, sample: Real, count: u64) -> Real {
    (count as Real * mean + sample) / (count as Real + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn nearly_equal_basic() {
        let tol = Tolerances {
            abs: 1e-12,
            rel: 1e-9,
        };
        assert!(nearly_equal(1.0, 1.0 + 1e-12, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(1.0, 1.0 + 1e-6, tol));
    }

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn polyval_cubic() {
        // 1 + 2x + 3x^2 at x = 2 -> 17
        assert_eq!(polyval(2.0, &[1.0, 2.0, 3.0]), 17.0);
        assert_eq!(polyval(5.0, &[]), 0.0);
    }

    #[test]
    fn incremental_mean_matches_batch() {
        let samples = [0.3, 0.5, 0.2, 0.9];
        let mut mean = 0.0;
        for (i, s) in samples.iter().enumerate() {
            mean = incremental_mean(mean, *s, i as u64);
        }
        let batch: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
        assert!((mean - batch).abs() < 1e-14);
    }

    proptest! {
        #[test]
        fn clip_stays_in_range(v in -1e6_f64..1e6) {
            let c = clip(v, 0.0, 1.0);
            prop_assert!((0.0..=1.0).contains(&c));
        }
    }
}
