//! Thermal (pressure and temperature) relaxation.

use mf_core::quadratic_roots;
use mf_eos::{Eos, EquationOfState, StiffenedCoefficients};
use nalgebra::DVector;
use tracing::trace;

use super::{Method, RelaxScratch, Relaxation, RelaxationKind, already_uniform, assign_densities};
use crate::error::{ModelError, ModelResult};
use crate::numerics::{NewtonConfig, central_difference_jacobian, newton_solve};
use crate::state::CellState;

/// Common (p, T) of a set of phases and the matching phase densities.
#[derive(Clone, Debug, PartialEq)]
pub struct Equilibrium {
    pub pressure: f64,
    pub temperature: f64,
    pub densities: Vec<f64>,
}

/// Drives all phases to a common pressure and temperature at fixed
/// partial masses and fixed mixture internal energy Σ α_k ρ_k e_k.
#[derive(Clone, Debug, Default)]
pub struct PressureTemperatureRelaxation {
    method: Method,
    newton: NewtonConfig,
}

impl PressureTemperatureRelaxation {
    pub fn new(method: Method, newton: NewtonConfig) -> Self {
        Self { method, newton }
    }

    /// Always iterate, even when a closed form exists.
    pub fn iterative() -> Self {
        Self::new(Method::Iterative, NewtonConfig::default())
    }
}

impl Relaxation for PressureTemperatureRelaxation {
    fn kind(&self) -> RelaxationKind {
        RelaxationKind::PressureTemperature
    }

    fn relax(&self, state: &mut CellState, eos: &[Eos], scratch: &mut RelaxScratch) -> ModelResult<()> {
        scratch.load(state);
        let temperatures: Vec<f64> = state.phases.iter().map(|p| p.temperature).collect();
        if already_uniform(&scratch.pressures) && already_uniform(&temperatures) {
            return Ok(());
        }
        let rho_e = state.internal_energy_density();
        let rho = state.total_mass();
        let guess = (
            scratch.alphas.iter().zip(&scratch.pressures).map(|(a, p)| a * p).sum::<f64>(),
            state.phases.iter().map(|p| p.mass() * p.temperature).sum::<f64>() / rho,
        );
        let eq = solve(&scratch.masses, rho_e, eos, guess, self.method, &self.newton)?;
        apply(state, eos, &scratch.masses, &eq);
        Ok(())
    }
}

/// Write an equilibrium into the phases of `state`.
pub(crate) fn apply(state: &mut CellState, eos: &[Eos], masses: &[f64], eq: &Equilibrium) {
    assign_densities(state, masses, &eq.densities);
    for (k, phase) in state.phases.iter_mut().enumerate() {
        phase.pressure = eq.pressure;
        phase.extend(&eos[k]);
    }
}

/// Solve for (p, T) with the default method and tolerances.
pub(crate) fn solve_equilibrium(
    masses: &[f64],
    rho_e: f64,
    eos: &[Eos],
    guess: (f64, f64),
) -> ModelResult<Equilibrium> {
    solve(masses, rho_e, eos, guess, Method::Auto, &NewtonConfig::default())
}

pub(crate) fn solve(
    masses: &[f64],
    rho_e: f64,
    eos: &[Eos],
    guess: (f64, f64),
    method: Method,
    newton: &NewtonConfig,
) -> ModelResult<Equilibrium> {
    let eq = match (method, eos) {
        (Method::Auto, [e1, e2]) => match e1.stiffened().zip(e2.stiffened()) {
            Some((c1, c2)) => two_phase(masses, rho_e, [c1, c2])?,
            None => iterate(masses, rho_e, eos, guess, newton)?,
        },
        _ => iterate(masses, rho_e, eos, guess, newton)?,
    };
    if !(eq.temperature.is_finite() && eq.temperature > 0.0) {
        return Err(ModelError::numerical(format!(
            "non-positive equilibrium temperature {:e}",
            eq.temperature
        )));
    }
    if eq.densities.iter().any(|r| !r.is_finite() || *r <= 0.0) {
        return Err(ModelError::numerical("non-positive equilibrium density"));
    }
    Ok(eq)
}

/// Closed form for two stiffened phases.
///
/// With q_k = m_k cv_k and E = ρe - Σ m_k e_ref,k, the temperature is
/// 1/T = Σ q_k (γ_k - 1)/(p + p∞_k) and energy balance
/// E = Σ q_k T (p + γ_k p∞_k)/(p + p∞_k) reduces to a quadratic in p.
fn two_phase(masses: &[f64], rho_e: f64, c: [StiffenedCoefficients; 2]) -> ModelResult<Equilibrium> {
    let q1 = masses[0] * c[0].cv;
    let q2 = masses[1] * c[1].cv;
    let (g1, g2) = (c[0].gamma, c[1].gamma);
    let (pi1, pi2) = (c[0].p_inf, c[1].p_inf);
    let e = rho_e - masses[0] * c[0].e_ref - masses[1] * c[1].e_ref;

    let qa = q1 + q2;
    let qb = q1 * (pi2 + g1 * pi1) + q2 * (pi1 + g2 * pi2) - e * (q1 * (g1 - 1.0) + q2 * (g2 - 1.0));
    let qc = (q1 * g1 + q2 * g2) * pi1 * pi2 - e * (q1 * (g1 - 1.0) * pi2 + q2 * (g2 - 1.0) * pi1);

    let (p, _) = quadratic_roots(qa, qb, qc)
        .ok_or_else(|| ModelError::numerical("no real root for pressure-temperature equilibrium"))?;
    if p + pi1 <= 0.0 || p + pi2 <= 0.0 {
        return Err(ModelError::numerical(format!(
            "equilibrium pressure {p:e} below a stiffened floor"
        )));
    }
    let inv_t = q1 * (g1 - 1.0) / (p + pi1) + q2 * (g2 - 1.0) / (p + pi2);
    let t = 1.0 / inv_t;
    let densities = c
        .iter()
        .map(|c| (p + c.p_inf) / ((c.gamma - 1.0) * c.cv * t))
        .collect();
    Ok(Equilibrium {
        pressure: p,
        temperature: t,
        densities,
    })
}

/// Newton on scaled (p, T):
/// Σ m_k / ρ_k(p, T) = 1 and Σ m_k e_k(ρ_k, T) = ρe.
fn iterate(
    masses: &[f64],
    rho_e: f64,
    eos: &[Eos],
    guess: (f64, f64),
    newton: &NewtonConfig,
) -> ModelResult<Equilibrium> {
    let floor = eos
        .iter()
        .map(|e| e.pressure_floor())
        .fold(f64::NEG_INFINITY, f64::max);
    let (p0, t0) = guess;
    let p0 = if p0.is_finite() && p0 > floor { p0 } else { floor.max(0.0) + 1e5 };
    let t0 = if t0.is_finite() && t0 > 0.0 { t0 } else { 300.0 };
    let p_scale = p0.abs().max(1.0);
    let t_scale = t0;
    let rho: f64 = masses.iter().sum();
    let e_scale = rho_e.abs() + masses.iter().zip(eos).map(|(m, e)| m * e.cv()).sum::<f64>() * t_scale;

    let densities = |p: f64, t: f64| -> ModelResult<Vec<f64>> {
        eos.iter()
            .map(|e| e.density_from_pt(p, t).map_err(ModelError::from))
            .collect()
    };
    let residual = |x: &DVector<f64>| -> ModelResult<DVector<f64>> {
        let (p, t) = (x[0] * p_scale, x[1] * t_scale);
        let rhos = densities(p, t)?;
        let mut volume = -1.0;
        let mut energy = -rho_e;
        for (k, r) in rhos.iter().enumerate() {
            volume += masses[k] / r;
            energy += masses[k] * eos[k].energy(*r, t);
        }
        Ok(DVector::from_vec(vec![volume, energy / e_scale]))
    };
    let admissible = |x: &DVector<f64>| x[1] > 0.0 && x[0] * p_scale > floor && densities(x[0] * p_scale, x[1] * t_scale).is_ok();

    let result = newton_solve(
        DVector::from_vec(vec![p0 / p_scale, 1.0]),
        residual,
        |x| central_difference_jacobian(x, residual, 1e-6),
        admissible,
        newton,
    )?;
    trace!(
        iterations = result.iterations,
        residual = result.residual_norm,
        mixture_density = rho,
        "pressure-temperature relaxation"
    );
    let (p, t) = (result.x[0] * p_scale, result.x[1] * t_scale);
    Ok(Equilibrium {
        pressure: p,
        temperature: t,
        densities: densities(p, t)?,
    })
}
