//! Fourier heat conduction inside each phase.

use mf_core::Vec3;
use mf_eos::EquationOfState;
use mf_model::gradient::LeastSquares;
use mf_model::{Cell, Flux, Model, ModelError, ModelResult, StateSelector};
use rayon::prelude::*;

use crate::addphys::{AdditionalPhysics, PhaseGradients};
use crate::boundary::BoundaryKind;
use crate::mesh::{CellInterface, FaceSide, Mesh};

/// Heat flux q_k = -λ_k α_k ∇T_k, with λ_k taken from each phase's law.
#[derive(Clone, Debug, PartialEq)]
pub struct Conductivity {
    lambdas: Vec<f64>,
}

impl Conductivity {
    pub fn new(model: &Model) -> ModelResult<Self> {
        let lambdas: Vec<f64> = model.eos().iter().map(|e| e.conductivity()).collect();
        if lambdas.iter().all(|l| *l <= 0.0) {
            return Err(ModelError::configuration("no phase has a positive conductivity"));
        }
        Ok(Self { lambdas })
    }

    pub fn lambdas(&self) -> &[f64] {
        &self.lambdas
    }

    fn conducting(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.lambdas
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, l)| *l > 0.0)
    }

    fn temperature_gradients(&self, mesh: &Mesh, i: usize, selector: StateSelector) -> ModelResult<Vec<Vec3>> {
        let cell = &mesh.cells[i];
        let state = cell.state(selector);
        let stencil = mesh.neighbours(i);
        let ls = LeastSquares::new(cell.position, stencil.iter().map(|(j, _)| mesh.cells[*j].position))?;
        let mut grads = vec![Vec3::zeros(); self.lambdas.len()];
        for (k, _) in self.conducting() {
            grads[k] = ls.gradient(
                state.phases[k].temperature,
                stencil
                    .iter()
                    .map(|(j, _)| mesh.cells[*j].state(selector).phases[k].temperature),
            );
        }
        Ok(grads)
    }

    /// Flux towards a boundary at temperature `t_b` per phase, over the
    /// normal distance from the cell centre to the face.
    fn boundary_flux<F>(&self, model: &Model, cell: &Cell, face: &CellInterface, selector: StateSelector, t_b: F) -> ModelResult<Flux>
    where
        F: Fn(usize) -> ModelResult<f64>,
    {
        let d = (face.position - cell.position).dot(&face.frame.normal);
        if !d.is_finite() || d <= 0.0 {
            return Err(ModelError::configuration(format!(
                "boundary face {} is not ahead of its cell",
                face.id
            )));
        }
        let state = cell.state(selector);
        let mut flux = model.allocate_flux();
        for (k, lambda) in self.conducting() {
            let phase = &state.phases[k];
            let q = -lambda * phase.alpha * (t_b(k)? - phase.temperature) / d;
            flux.add_heat(k, q);
        }
        Ok(flux)
    }
}

impl AdditionalPhysics for Conductivity {
    fn name(&self) -> &'static str {
        "conductivity"
    }

    fn prepare(&self, _model: &Model, mesh: &Mesh, selector: StateSelector) -> ModelResult<PhaseGradients> {
        (0..mesh.n_cells())
            .into_par_iter()
            .map(|i| {
                self.temperature_gradients(mesh, i, selector)
                    .map_err(|e| e.at(mesh.cells[i].id()))
            })
            .collect()
    }

    fn face_flux(
        &self,
        model: &Model,
        mesh: &Mesh,
        face: &CellInterface,
        prepared: &PhaseGradients,
        selector: StateSelector,
    ) -> ModelResult<Option<Flux>> {
        let left = &mesh.cells[face.left];
        let left_state = left.state(selector);
        let n = &face.frame.normal;
        let flux = match face.side {
            FaceSide::Interior(r) => {
                let right_state = mesh.cells[r].state(selector);
                let mut flux = model.allocate_flux();
                for (k, lambda) in self.conducting() {
                    let mean = (prepared[face.left][k] * left_state.phases[k].alpha
                        + prepared[r][k] * right_state.phases[k].alpha)
                        * 0.5;
                    flux.add_heat(k, -lambda * mean.dot(n));
                }
                flux
            }
            FaceSide::Boundary(BoundaryKind::Wall) => return Ok(None),
            FaceSide::Boundary(BoundaryKind::Symmetry) => {
                return Err(ModelError::unimplemented("conductivity on a symmetry boundary"));
            }
            FaceSide::Boundary(BoundaryKind::NonReflecting) => {
                let mut flux = model.allocate_flux();
                for (k, lambda) in self.conducting() {
                    let g = prepared[face.left][k] * left_state.phases[k].alpha;
                    flux.add_heat(k, -lambda * g.dot(n));
                }
                flux
            }
            FaceSide::Boundary(BoundaryKind::InletStagnation { t0, .. }) => {
                self.boundary_flux(model, left, face, selector, |_| Ok(t0))?
            }
            FaceSide::Boundary(BoundaryKind::OutletPressure { p }) => {
                self.boundary_flux(model, left, face, selector, |k| {
                    let t = model.eos()[k].temperature_from_pressure(left_state.phases[k].density, p);
                    if t.is_finite() && t > 0.0 {
                        Ok(t)
                    } else {
                        Err(ModelError::numerical(format!(
                            "outlet temperature of phase {k} is not positive"
                        )))
                    }
                })?
            }
        };
        Ok(Some(flux))
    }

    /// Explicit diffusion limit L² ρ c_v / (2 λ) of the most diffusive phase.
    fn max_time_step(&self, model: &Model, cell: &Cell, selector: StateSelector) -> Option<f64> {
        let state = cell.state(selector);
        self.conducting()
            .map(|(k, lambda)| {
                let rho_cv = state.phases[k].density * model.eos()[k].cv();
                0.5 * cell.length_scale * cell.length_scale * rho_cv / lambda
            })
            .reduce(f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_eos::{Eos, EosKind};
    use mf_model::{Closure, ErrorCategory, Phase};

    const LAMBDA: f64 = 0.5;

    fn model() -> Model {
        let eos = Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0])
            .unwrap()
            .with_conductivity(LAMBDA)
            .unwrap();
        Model::new(Closure::Euler, vec![eos], &[], 0).unwrap()
    }

    fn two_cells(model: &Model, left: BoundaryKind, right: BoundaryKind) -> Mesh {
        Mesh::line(model, 2, 2.0, left, right, |x| {
            let rho = if x < 1.0 { 1.0 } else { 2.0 };
            model.build_state(vec![Phase::new(1.0, rho, 1.0e5, Vec3::zeros())], vec![])
        })
        .unwrap()
    }

    fn temperature(mesh: &Mesh, i: usize) -> f64 {
        mesh.cells[i].state.phases[0].temperature
    }

    #[test]
    fn interior_flux_follows_fourier() {
        let model = model();
        let mesh = two_cells(&model, BoundaryKind::Wall, BoundaryKind::Wall);
        let physics = Conductivity::new(&model).unwrap();
        let grads = physics.prepare(&model, &mesh, StateSelector::Current).unwrap();
        let flux = physics
            .face_flux(&model, &mesh, &mesh.interfaces[1], &grads, StateSelector::Current)
            .unwrap()
            .unwrap();
        // dx = 1 between the two centres; the hot left cell loses energy.
        let expected = LAMBDA * (temperature(&mesh, 0) - temperature(&mesh, 1));
        assert!(expected > 0.0);
        assert!((flux.total_energy() - expected).abs() < 1e-9 * expected);
        assert_eq!(flux.total_mass(), 0.0);
    }

    #[test]
    fn walls_are_adiabatic_and_symmetry_is_unsupported() {
        let model = model();
        let mesh = two_cells(&model, BoundaryKind::Wall, BoundaryKind::Symmetry);
        let physics = Conductivity::new(&model).unwrap();
        let grads = physics.prepare(&model, &mesh, StateSelector::Current).unwrap();
        let wall = physics
            .face_flux(&model, &mesh, &mesh.interfaces[0], &grads, StateSelector::Current)
            .unwrap();
        assert!(wall.is_none());
        let err = physics
            .face_flux(&model, &mesh, &mesh.interfaces[2], &grads, StateSelector::Current)
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnimplementedCombination);
    }

    #[test]
    fn hot_inlet_heats_the_cell() {
        let model = model();
        let inlet = BoundaryKind::InletStagnation { p0: 1.0e5, t0: 1000.0 };
        let mesh = two_cells(&model, inlet, BoundaryKind::Wall);
        let physics = Conductivity::new(&model).unwrap();
        let grads = physics.prepare(&model, &mesh, StateSelector::Current).unwrap();
        let flux = physics
            .face_flux(&model, &mesh, &mesh.interfaces[0], &grads, StateSelector::Current)
            .unwrap()
            .unwrap();
        // Normal points out of the domain; heat enters, so the flux is negative.
        let expected = -LAMBDA * (1000.0 - temperature(&mesh, 0)) / 0.5;
        assert!((flux.total_energy() - expected).abs() < 1e-9 * expected.abs());
    }

    #[test]
    fn outlet_uses_the_imposed_pressure_temperature() {
        let model = model();
        let outlet = BoundaryKind::OutletPressure { p: 1.0e5 };
        let mesh = two_cells(&model, BoundaryKind::Wall, outlet);
        let physics = Conductivity::new(&model).unwrap();
        let grads = physics.prepare(&model, &mesh, StateSelector::Current).unwrap();
        let flux = physics
            .face_flux(&model, &mesh, &mesh.interfaces[2], &grads, StateSelector::Current)
            .unwrap()
            .unwrap();
        // Same pressure and density as the cell: no temperature jump.
        assert!(flux.total_energy().abs() < 1e-9);
    }

    #[test]
    fn time_step_shrinks_with_conductivity() {
        let model = model();
        let mesh = two_cells(&model, BoundaryKind::Wall, BoundaryKind::Wall);
        let physics = Conductivity::new(&model).unwrap();
        let dt = physics
            .max_time_step(&model, &mesh.cells[0], StateSelector::Current)
            .unwrap();
        assert!((dt - 0.5 * 717.5 / LAMBDA).abs() < 1e-9);
    }

    #[test]
    fn requires_a_conducting_phase() {
        let eos = Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0]).unwrap();
        let model = Model::new(Closure::Euler, vec![eos], &[], 0).unwrap();
        assert!(Conductivity::new(&model).is_err());
    }
}
