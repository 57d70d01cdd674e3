//! Total-energy correction after a pressure-type relaxation.
//!
//! Under shared velocity the mixture total-energy equation is
//! conservative while the phase internal-energy equations are not. After
//! relaxing, the common pressure is recomputed so that Σ α_k ρ_k e_k
//! matches the mixture internal energy taken from the conservative budget.

use mf_eos::{Eos, EquationOfState};
use nalgebra::{DMatrix, DVector};

use super::pressure_temperature;
use crate::error::{ModelError, ModelResult};
use crate::numerics::{NewtonConfig, newton_solve};
use crate::state::CellState;

/// Common pressure at frozen volume fractions and densities such that
/// Σ α_k ρ_k e_k(ρ_k, p) = `rho_e`.
pub(crate) fn correct_pressure(state: &mut CellState, eos: &[Eos], rho_e: f64, newton: &NewtonConfig) -> ModelResult<()> {
    let coefficients: Option<Vec<_>> = eos.iter().map(|e| e.stiffened()).collect();
    let p = match coefficients {
        Some(c) => {
            // α_k ρ_k e_k = α_k (p + γ_k p∞_k)/(γ_k - 1) + α_k ρ_k e_ref,k
            let mut num = rho_e;
            let mut den = 0.0;
            for (phase, c) in state.phases.iter().zip(&c) {
                num -= phase.mass() * c.e_ref + phase.alpha * c.gamma * c.p_inf / (c.gamma - 1.0);
                den += phase.alpha / (c.gamma - 1.0);
            }
            num / den
        }
        None => iterate(state, eos, rho_e, newton)?,
    };
    let floor = eos
        .iter()
        .map(|e| e.pressure_floor())
        .fold(f64::NEG_INFINITY, f64::max);
    if !p.is_finite() || p <= floor {
        return Err(ModelError::numerical(format!(
            "energy-corrected pressure {p:e} is not admissible"
        )));
    }
    for (k, phase) in state.phases.iter_mut().enumerate() {
        phase.pressure = p;
        phase.extend(&eos[k]);
    }
    Ok(())
}

fn iterate(state: &CellState, eos: &[Eos], rho_e: f64, newton: &NewtonConfig) -> ModelResult<f64> {
    let scale = rho_e.abs().max(1.0);
    let energy = |p: f64| -> f64 {
        state
            .phases
            .iter()
            .zip(eos)
            .map(|(phase, e)| phase.mass() * e.energy_from_pressure(phase.density, p))
            .sum::<f64>()
    };
    let residual = |x: &DVector<f64>| -> ModelResult<DVector<f64>> {
        Ok(DVector::from_element(1, (energy(x[0]) - rho_e) / scale))
    };
    // d(ρe)/dp at frozen densities is Σ α_k ρ_k (∂e/∂p)_ρ > 0.
    let jacobian = |x: &DVector<f64>| -> ModelResult<DMatrix<f64>> {
        let h = 1e-6 * x[0].abs().max(1.0);
        let slope = (energy(x[0] + h) - energy(x[0] - h)) / (2.0 * h * scale);
        Ok(DMatrix::from_element(1, 1, slope))
    };
    let floor = eos
        .iter()
        .map(|e| e.pressure_floor())
        .fold(f64::NEG_INFINITY, f64::max);
    let p0 = state.phases.iter().map(|p| p.alpha * p.pressure).sum::<f64>();
    let result = newton_solve(DVector::from_element(1, p0), residual, jacobian, |x| x[0] > floor, newton)?;
    Ok(result.x[0])
}

/// Redo the pressure-temperature equilibrium on the corrected budget.
pub(crate) fn correct_pressure_temperature(state: &mut CellState, eos: &[Eos], rho_e: f64) -> ModelResult<()> {
    let masses: Vec<f64> = state.phases.iter().map(|p| p.mass()).collect();
    let rho: f64 = masses.iter().sum();
    let guess = (
        state.mixture.pressure,
        state.phases.iter().map(|p| p.mass() * p.temperature).sum::<f64>() / rho,
    );
    let eq = pressure_temperature::solve_equilibrium(&masses, rho_e, eos, guess)?;
    pressure_temperature::apply(state, eos, &masses, &eq);
    Ok(())
}
