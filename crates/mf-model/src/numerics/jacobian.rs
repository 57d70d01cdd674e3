//! Finite difference Jacobian computation.

use crate::error::ModelResult;
use nalgebra::{DMatrix, DVector};

/// Compute Jacobian using forward finite differences.
///
/// Column j perturbs x[j] by `epsilon · max(|x[j]|, 1)`.
pub fn finite_difference_jacobian<F>(x: &DVector<f64>, f: F, epsilon: f64) -> ModelResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> ModelResult<DVector<f64>>,
{
    let n = x.len();
    let f_x = f(x)?;
    let mut jac = DMatrix::zeros(f_x.len(), n);

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);
        let mut x_perturbed = x.clone();
        x_perturbed[j] += dx;
        let df = (f(&x_perturbed)? - &f_x) / dx;
        jac.set_column(j, &df);
    }

    Ok(jac)
}

/// Compute Jacobian using central finite differences (more accurate but 2x cost).
pub fn central_difference_jacobian<F>(x: &DVector<f64>, f: F, epsilon: f64) -> ModelResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> ModelResult<DVector<f64>>,
{
    let n = x.len();
    let mut jac: Option<DMatrix<f64>> = None;

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);
        let mut x_plus = x.clone();
        x_plus[j] += dx;
        let mut x_minus = x.clone();
        x_minus[j] -= dx;
        let df = (f(&x_plus)? - f(&x_minus)?) / (2.0 * dx);
        jac.get_or_insert_with(|| DMatrix::zeros(df.len(), n))
            .set_column(j, &df);
    }

    Ok(jac.unwrap_or_else(|| DMatrix::zeros(0, 0)))
}
