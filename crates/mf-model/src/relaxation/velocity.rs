//! Mechanical (velocity) relaxation.

use mf_core::Vec3;
use mf_eos::Eos;

use super::{RelaxScratch, Relaxation, RelaxationKind};
use crate::error::{ModelError, ModelResult};
use crate::state::CellState;

/// Drives all phase velocities to the mass-weighted velocity.
///
/// The relative kinetic energy ½|u_k - u|² is given back to each phase as
/// internal energy, so mixture total energy is conserved.
#[derive(Clone, Copy, Debug, Default)]
pub struct VelocityRelaxation;

impl Relaxation for VelocityRelaxation {
    fn kind(&self) -> RelaxationKind {
        RelaxationKind::Velocity
    }

    fn relax(&self, state: &mut CellState, eos: &[Eos], _scratch: &mut RelaxScratch) -> ModelResult<()> {
        let rho = state.total_mass();
        if !rho.is_finite() || rho <= 0.0 {
            return Err(ModelError::numerical("velocity relaxation on a massless cell"));
        }
        let u: Vec3 = state.phases.iter().map(|p| p.velocity * p.mass()).sum::<Vec3>() / rho;
        for (k, phase) in state.phases.iter_mut().enumerate() {
            let e = phase.energy + 0.5 * (phase.velocity - u).norm_squared();
            phase.velocity = u;
            phase.set_energy(&eos[k], e);
        }
        Ok(())
    }
}
