//! Boundary conditions as ghost states seen across a boundary face.

use mf_core::{Frame, Vec3};
use mf_eos::EquationOfState;
use mf_model::{CellState, Model, ModelError, ModelResult};

/// Condition applied on a boundary face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoundaryKind {
    /// Impermeable adiabatic wall.
    Wall,
    /// Mirror plane.
    Symmetry,
    /// Zero-gradient outflow.
    NonReflecting,
    /// Reservoir at stagnation pressure and temperature.
    InletStagnation { p0: f64, t0: f64 },
    /// Imposed static pressure.
    OutletPressure { p: f64 },
}

impl BoundaryKind {
    pub fn name(&self) -> &'static str {
        match self {
            BoundaryKind::Wall => "wall",
            BoundaryKind::Symmetry => "symmetry",
            BoundaryKind::NonReflecting => "non-reflecting",
            BoundaryKind::InletStagnation { .. } => "inlet",
            BoundaryKind::OutletPressure { .. } => "outlet",
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        let ok = match *self {
            BoundaryKind::InletStagnation { p0, t0 } => {
                p0.is_finite() && t0.is_finite() && t0 > 0.0
            }
            BoundaryKind::OutletPressure { p } => p.is_finite(),
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(ModelError::configuration(format!(
                "invalid {} boundary parameters",
                self.name()
            )))
        }
    }
}

fn reflect(v: &Vec3, n: &Vec3) -> Vec3 {
    v - n * (2.0 * v.dot(n))
}

/// State on the far side of a boundary face whose outward normal is
/// `frame.normal`, given the interior state next to it.
pub fn ghost_state(
    model: &Model,
    interior: &CellState,
    frame: &Frame,
    kind: &BoundaryKind,
) -> ModelResult<CellState> {
    let mut ghost = interior.clone();
    match *kind {
        BoundaryKind::NonReflecting => {}
        BoundaryKind::Wall | BoundaryKind::Symmetry => {
            for phase in &mut ghost.phases {
                phase.velocity = reflect(&phase.velocity, &frame.normal);
            }
            ghost.mixture.velocity = reflect(&ghost.mixture.velocity, &frame.normal);
            for (phase, eos) in ghost.phases.iter_mut().zip(model.eos()) {
                phase.extend(eos);
            }
            model.update_mixture(&mut ghost);
        }
        BoundaryKind::OutletPressure { p } => {
            for phase in &mut ghost.phases {
                phase.pressure = p;
            }
            ghost.mixture.pressure = p;
            model.complete_reconstruction(&mut ghost)?;
        }
        BoundaryKind::InletStagnation { p0, t0 } => {
            for (phase, eos) in ghost.phases.iter_mut().zip(model.eos()) {
                phase.pressure = p0;
                phase.density = eos.density_from_pt(p0, t0)?;
                phase.velocity = Vec3::zeros();
            }
            ghost.mixture.pressure = p0;
            ghost.mixture.temperature = t0;
            ghost.mixture.velocity = Vec3::zeros();
            model.complete_reconstruction(&mut ghost)?;
        }
    }
    Ok(ghost)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use mf_eos::{Eos, EosKind};
    use mf_model::{Closure, Phase, solve_interface};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn wall_flux_carries_no_mass(u in -300.0f64..300.0, rho in 0.1f64..10.0, p in 1e4f64..1e7) {
            let eos = Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0]).unwrap();
            let model = Model::new(Closure::Euler, vec![eos], &[], 0).unwrap();
            let phase = Phase::new(1.0, rho, p, Vec3::new(u, 5.0, 0.0));
            let interior = model.build_state(vec![phase], vec![]).unwrap();
            let frame = Frame::x_axis();
            let ghost = ghost_state(&model, &interior, &frame, &BoundaryKind::Wall).unwrap();
            let flux = solve_interface(&model, &interior, &ghost, &frame).unwrap();
            let scale = rho * (u.abs() + interior.phases[0].sound_speed);
            prop_assert!(flux.total_mass().abs() <= 1e-12 * scale);
        }
    }
}
