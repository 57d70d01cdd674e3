use crate::{MfError, MfResult};

/// Floating point type used throughout the solver
pub type Real = f64;

/// One tolerance for everything
#[derive(Clone, Copy, Debug)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            abs: 1e-12,
            rel: 1e-9,
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

pub fn ensure_finite(v: Real, what: &'static str) -> MfResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(MfError::NonFinite { what, value: v })
    }
}

/// Finite and strictly positive.
pub fn ensure_positive(v: Real, what: &'static str) -> MfResult<Real> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(MfError::NotPositive { what, value: v })
    }
}

/// Real roots of `a x² + b x + c`, largest first. `None` when the
/// discriminant is negative beyond round-off.
pub fn quadratic_roots(a: Real, b: Real, c: Real) -> Option<(Real, Real)> {
    if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        let x = -c / b;
        return Some((x, x));
    }
    let mut disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        if disc > -1e-12 * b * b {
            disc = 0.0;
        } else {
            return None;
        }
    }
    // Cancellation-free form.
    let q = -0.5 * (b + b.signum() * disc.sqrt());
    let (x1, x2) = if q == 0.0 { (0.0, 0.0) } else { (q / a, c / q) };
    Some((x1.max(x2), x1.min(x2)))
}
