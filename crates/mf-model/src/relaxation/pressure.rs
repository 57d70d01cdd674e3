//! Mechanical (pressure) relaxation at constant partial masses.

use mf_core::quadratic_roots;
use mf_eos::{Eos, EquationOfState, StiffenedCoefficients};
use nalgebra::DVector;
use tracing::trace;

use super::{Method, RelaxScratch, Relaxation, RelaxationKind, already_uniform, assign_densities};
use crate::error::{ModelError, ModelResult};
use crate::numerics::{NewtonConfig, finite_difference_jacobian, newton_solve};
use crate::state::CellState;

/// Drives all phase pressures to a common value.
///
/// Each phase follows its own adiabat e - e₀ + p*(1/ρ - 1/ρ₀) = 0, which
/// conserves Σ α_k ρ_k e_k, while the volume fractions adjust under
/// Σ α_k = 1. The relaxed pressure lies between the initial extremes.
#[derive(Clone, Debug, Default)]
pub struct PressureRelaxation {
    method: Method,
    newton: NewtonConfig,
}

impl PressureRelaxation {
    pub fn new(method: Method, newton: NewtonConfig) -> Self {
        Self { method, newton }
    }

    /// Always iterate, even when a closed form exists.
    pub fn iterative() -> Self {
        Self::new(Method::Iterative, NewtonConfig::default())
    }

    fn iterate(&self, eos: &[Eos], scratch: &RelaxScratch) -> ModelResult<(f64, Vec<f64>)> {
        let n = scratch.masses.len();
        let p_scale = scratch
            .pressures
            .iter()
            .fold(1.0_f64, |acc, p| acc.max(p.abs()));
        let rho0 = &scratch.densities;
        let e0 = &scratch.energies;
        let m = &scratch.masses;
        let weights: Vec<f64> = (0..n).map(|k| e0[k].abs() + p_scale / rho0[k]).collect();

        // Unknowns scaled to order one: x = [p / p_scale, ρ_k / ρ_k0].
        let residual = |x: &DVector<f64>| -> ModelResult<DVector<f64>> {
            let p = x[0] * p_scale;
            let mut r = DVector::zeros(n + 1);
            r[0] = -1.0;
            for k in 0..n {
                let rho = x[k + 1] * rho0[k];
                r[0] += m[k] / rho;
                let e = eos[k].energy_from_pressure(rho, p);
                r[k + 1] = (e - e0[k] + p * (1.0 / rho - 1.0 / rho0[k])) / weights[k];
            }
            Ok(r)
        };
        let admissible = |x: &DVector<f64>| {
            let p = x[0] * p_scale;
            (0..n).all(|k| {
                let rho = x[k + 1] * rho0[k];
                rho > 0.0 && eos[k].clamp_density(rho) >= rho && p > eos[k].pressure_floor()
            })
        };

        let mut x0 = DVector::from_element(n + 1, 1.0);
        x0[0] = scratch
            .alphas
            .iter()
            .zip(&scratch.pressures)
            .map(|(a, p)| a * p)
            .sum::<f64>()
            / p_scale;

        let result = newton_solve(
            x0,
            residual,
            |x| finite_difference_jacobian(x, residual, 1e-7),
            admissible,
            &self.newton,
        )?;
        trace!(iterations = result.iterations, residual = result.residual_norm, "pressure relaxation");
        let densities = (0..n).map(|k| result.x[k + 1] * rho0[k]).collect();
        Ok((result.x[0] * p_scale, densities))
    }
}

/// Relaxed pressure of two stiffened phases.
///
/// With A_k = p_k0 + γ_k p∞_k the adiabats give
/// α_k = α_k0 (A_k + (γ_k - 1) p) / (γ_k (p + p∞_k)), and Σ α_k = 1 is a
/// quadratic in p.
fn two_phase_pressure(
    alphas: &[f64],
    pressures: &[f64],
    c: [StiffenedCoefficients; 2],
    bracket: (f64, f64),
) -> Option<f64> {
    let (a1, a2) = (alphas[0], alphas[1]);
    let (g1, g2) = (c[0].gamma, c[1].gamma);
    let (pi1, pi2) = (c[0].p_inf, c[1].p_inf);
    let big_a1 = pressures[0] + g1 * pi1;
    let big_a2 = pressures[1] + g2 * pi2;

    let qa = a1 * g2 * (g1 - 1.0) + a2 * g1 * (g2 - 1.0) - g1 * g2;
    let qb = a1 * g2 * ((g1 - 1.0) * pi2 + big_a1) + a2 * g1 * ((g2 - 1.0) * pi1 + big_a2)
        - g1 * g2 * (pi1 + pi2);
    let qc = a1 * g2 * big_a1 * pi2 + a2 * g1 * big_a2 * pi1 - g1 * g2 * pi1 * pi2;

    let (hi, lo) = quadratic_roots(qa, qb, qc)?;
    let (pmin, pmax) = bracket;
    let tol = 1e-9 * (pmax - pmin) + 1e-12 * pmax.abs().max(pmin.abs());
    [hi, lo]
        .into_iter()
        .find(|p| *p >= pmin - tol && *p <= pmax + tol)
}

impl Relaxation for PressureRelaxation {
    fn kind(&self) -> RelaxationKind {
        RelaxationKind::Pressure
    }

    fn relax(&self, state: &mut CellState, eos: &[Eos], scratch: &mut RelaxScratch) -> ModelResult<()> {
        if state.n_phases() < 2 {
            return Ok(());
        }
        scratch.load(state);
        if already_uniform(&scratch.pressures) {
            return Ok(());
        }
        let pmin = scratch.pressures.iter().copied().fold(f64::INFINITY, f64::min);
        let pmax = scratch.pressures.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let closed_form = match (self.method, eos) {
            (Method::Auto, [e1, e2]) => e1.stiffened().zip(e2.stiffened()),
            _ => None,
        };
        let (p_star, densities) = match closed_form {
            Some((c1, c2)) => {
                let p = two_phase_pressure(&scratch.alphas, &scratch.pressures, [c1, c2], (pmin, pmax))
                    .ok_or_else(|| ModelError::numerical("no admissible root for pressure relaxation"))?;
                let densities = [c1, c2]
                    .iter()
                    .enumerate()
                    .map(|(k, c)| {
                        let a = c.gamma * (p + c.p_inf);
                        let b = scratch.pressures[k] + c.gamma * c.p_inf + (c.gamma - 1.0) * p;
                        scratch.densities[k] * a / b
                    })
                    .collect::<Vec<_>>();
                (p, densities)
            }
            None => self.iterate(eos, scratch)?,
        };

        let tol = 1e-8 * (pmax - pmin) + 1e-12 * pmax.abs().max(pmin.abs());
        if !p_star.is_finite() || p_star < pmin - tol || p_star > pmax + tol {
            return Err(ModelError::numerical(format!(
                "relaxed pressure {p_star:e} outside [{pmin:e}, {pmax:e}]"
            )));
        }
        let p_star = p_star.clamp(pmin, pmax);
        if densities.iter().any(|r| !r.is_finite() || *r <= 0.0) {
            return Err(ModelError::numerical("non-positive density after pressure relaxation"));
        }

        let masses = std::mem::take(&mut scratch.masses);
        assign_densities(state, &masses, &densities);
        scratch.masses = masses;
        for (k, phase) in state.phases.iter_mut().enumerate() {
            phase.pressure = p_star;
            phase.extend(&eos[k]);
        }
        Ok(())
    }
}
