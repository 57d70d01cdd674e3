//! Damped Newton iteration with an admissibility constraint.

use crate::error::{ModelError, ModelResult};
use nalgebra::{DMatrix, DVector};

/// Newton solver configuration.
#[derive(Clone, Debug)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Absolute tolerance for residual norm
    pub abs_tol: f64,
    /// Relative tolerance for residual norm
    pub rel_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-12,
            rel_tol: 1e-13,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
        }
    }
}

/// Newton iteration result.
#[derive(Clone, Debug)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Final residual norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Newton solver with backtracking line search.
///
/// Trial points rejected by `admissible` (negative densities, pressures
/// below a law's floor...) are backtracked like points that fail to reduce
/// the residual. Residuals should be scaled to order one.
pub fn newton_solve<F, J, A>(
    x0: DVector<f64>,
    residual_fn: F,
    jacobian_fn: J,
    admissible: A,
    config: &NewtonConfig,
) -> ModelResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> ModelResult<DVector<f64>>,
    J: Fn(&DVector<f64>) -> ModelResult<DMatrix<f64>>,
    A: Fn(&DVector<f64>) -> bool,
{
    if !admissible(&x0) {
        return Err(ModelError::numerical("Newton start point is not admissible"));
    }
    let mut x = x0;
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();
    let r0_norm = r_norm;

    for iter in 0..config.max_iterations {
        if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
            return Ok(NewtonResult {
                x,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        let jac = jacobian_fn(&x)?;
        let dx = jac
            .lu()
            .solve(&(-&r))
            .ok_or_else(|| ModelError::numerical("singular Jacobian in Newton iteration"))?;

        let mut step = 1.0;
        let mut accepted = None;
        for _ in 0..config.max_line_search_iters {
            let x_new = &x + step * &dx;
            if admissible(&x_new) {
                let r_new = residual_fn(&x_new)?;
                let r_new_norm = r_new.norm();
                if r_new_norm.is_finite() && r_new_norm < r_norm {
                    accepted = Some((x_new, r_new, r_new_norm));
                    break;
                }
            }
            step *= config.line_search_beta;
        }

        let Some((x_new, r_new, r_new_norm)) = accepted else {
            return Err(ModelError::numerical(format!(
                "Newton line search stagnated at iteration {iter}, residual = {r_norm:e}"
            )));
        };
        x = x_new;
        r = r_new;
        r_norm = r_new_norm;
    }

    if r_norm < config.abs_tol || r_norm < config.rel_tol * r0_norm {
        return Ok(NewtonResult {
            x,
            residual_norm: r_norm,
            iterations: config.max_iterations,
        });
    }
    Err(ModelError::numerical(format!(
        "Newton did not converge in {} iterations, residual = {r_norm:e}",
        config.max_iterations
    )))
}
