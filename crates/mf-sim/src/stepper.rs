//! One explicit finite-volume time step over a mesh.

use mf_core::timing::{self, step_timing};
use mf_model::{
    CellGradients, CellState, Flux, LimiterKind, Model, ModelResult, NeighbourSample, StateSelector,
    solve_interface,
};
use rayon::prelude::*;
use tracing::trace;

use crate::addphys::AdditionalPhysics;
use crate::boundary::ghost_state;
use crate::error::{SimError, SimResult};
use crate::mesh::{CellInterface, FaceSide, Mesh};

/// Time integration scheme.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    /// First order in time and space.
    ForwardEuler,
    /// Two stages averaged (Heun), with limited reconstruction.
    #[default]
    Heun,
}

#[derive(Clone, Debug)]
pub struct StepperOptions {
    /// Courant number in (0, 1].
    pub cfl: f64,
    pub integrator: IntegratorType,
    pub limiter: LimiterKind,
}

impl Default for StepperOptions {
    fn default() -> Self {
        Self {
            cfl: 0.8,
            integrator: IntegratorType::default(),
            limiter: LimiterKind::default(),
        }
    }
}

impl StepperOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !self.cfl.is_finite() || self.cfl <= 0.0 || self.cfl > 1.0 {
            return Err(SimError::invalid("cfl must be in (0, 1]"));
        }
        Ok(())
    }

    fn second_order(&self) -> bool {
        self.integrator == IntegratorType::Heun && self.limiter != LimiterKind::FirstOrder
    }
}

/// Advances a mesh with a model and optional additional physics.
#[derive(Debug)]
pub struct Stepper {
    model: Model,
    physics: Vec<Box<dyn AdditionalPhysics>>,
    options: StepperOptions,
}

impl Stepper {
    pub fn new(model: Model, options: StepperOptions) -> SimResult<Self> {
        options.validate()?;
        Ok(Self {
            model,
            physics: Vec::new(),
            options,
        })
    }

    pub fn with_physics(mut self, physics: Box<dyn AdditionalPhysics>) -> Self {
        self.physics.push(physics);
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn options(&self) -> &StepperOptions {
        &self.options
    }

    pub fn physics_names(&self) -> Vec<&'static str> {
        self.physics.iter().map(|p| p.name()).collect()
    }

    /// Largest stable step: CFL bound on |u| + c, then every physics bound.
    pub fn compute_time_step(&self, mesh: &Mesh) -> SimResult<f64> {
        let convective = mesh
            .cells
            .par_iter()
            .map(|cell| {
                let speed = self.model.max_wave_speed(&cell.state);
                cell.length_scale / speed
            })
            .reduce(|| f64::INFINITY, f64::min);
        let mut dt = self.options.cfl * convective;
        for physics in &self.physics {
            for cell in &mesh.cells {
                if let Some(limit) = physics.max_time_step(&self.model, cell, StateSelector::Current) {
                    dt = dt.min(limit);
                }
            }
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::NonPhysical {
                what: format!("time step {dt} is not positive and finite"),
            });
        }
        Ok(dt)
    }

    /// Advance every cell by `dt`.
    pub fn step(&self, mesh: &mut Mesh, dt: f64) -> SimResult<()> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SimError::invalid("dt must be positive"));
        }
        match self.options.integrator {
            IntegratorType::ForwardEuler => {
                self.stage(mesh, StateSelector::Current, dt)?;
                self.commit(mesh, StateSelector::Current, StateSelector::Current)?;
            }
            IntegratorType::Heun => {
                self.stage(mesh, StateSelector::Current, dt)?;
                self.commit(mesh, StateSelector::Current, StateSelector::Intermediate)?;
                self.stage(mesh, StateSelector::Intermediate, dt)?;
                self.commit(mesh, StateSelector::Intermediate, StateSelector::Intermediate)?;
                let _timer = timing::stage(&step_timing::COMMIT);
                let model = &self.model;
                mesh.cells
                    .par_iter_mut()
                    .try_for_each_init(|| model.allocate_scratch(), |scratch, cell| {
                        model.average_stages(cell, scratch)
                    })?;
            }
        }
        Ok(())
    }

    /// Accumulate dt·S/V·flux increments of the `selector` state into
    /// each cell's conservative buffer.
    fn stage(&self, mesh: &mut Mesh, selector: StateSelector, dt: f64) -> SimResult<()> {
        mesh.cells.par_iter_mut().for_each(|cell| cell.cons.set_to_zero());

        let second_order = self.options.second_order();
        if second_order {
            self.reconstruct_gradients(mesh, selector)?;
        }

        let convective: Vec<Flux> = {
            let _timer = timing::stage(&step_timing::CONVECTIVE_FLUXES);
            let mesh_ref = &*mesh;
            mesh_ref
                .interfaces
                .par_iter()
                .map(|face| {
                    self.convective_flux(mesh_ref, face, selector, second_order)
                        .map_err(|e| e.at(mesh_ref.cells[face.left].id()))
                })
                .collect::<ModelResult<_>>()?
        };
        for (face, flux) in mesh.interfaces.iter().zip(&convective) {
            let surface = face.surface;
            let left = &mut mesh.cells[face.left];
            let coef = dt * surface / left.volume;
            left.subtract_face_flux(flux, coef, selector, &face.frame);
            if let FaceSide::Interior(r) = face.side {
                let right = &mut mesh.cells[r];
                let coef = dt * surface / right.volume;
                right.add_face_flux(flux, coef, selector, &face.frame);
            }
        }

        for physics in &self.physics {
            let _timer = timing::stage(&step_timing::DIFFUSIVE_FLUXES);
            let prepared = physics.prepare(&self.model, mesh, selector)?;
            let mesh_ref = &*mesh;
            let fluxes: Vec<Option<Flux>> = mesh_ref
                .interfaces
                .par_iter()
                .map(|face| physics.face_flux(&self.model, mesh_ref, face, &prepared, selector))
                .collect::<ModelResult<_>>()?;
            for (face, flux) in mesh.interfaces.iter().zip(&fluxes) {
                let Some(flux) = flux else { continue };
                let left = &mut mesh.cells[face.left];
                let coef = dt * face.surface / left.volume;
                let (cons, state) = left.cons_and_state(selector);
                cons.subtract_flux(flux, coef);
                physics.add_non_cons(cons, flux, -coef, state, &face.frame);
                if let FaceSide::Interior(r) = face.side {
                    let right = &mut mesh.cells[r];
                    let coef = dt * face.surface / right.volume;
                    let (cons, state) = right.cons_and_state(selector);
                    cons.add_flux(flux, coef);
                    physics.add_non_cons(cons, flux, coef, state, &face.frame);
                }
            }
        }
        Ok(())
    }

    fn reconstruct_gradients(&self, mesh: &mut Mesh, selector: StateSelector) -> SimResult<()> {
        let _timer = timing::stage(&step_timing::GRADIENTS);
        let schema = self.model.gradient_schema();
        let limiter = self.options.limiter;
        let mesh_ref = &*mesh;
        let gradients = (0..mesh_ref.n_cells())
            .into_par_iter()
            .map(|i| -> ModelResult<CellGradients> {
                let cell = &mesh_ref.cells[i];
                let state = cell.state(selector);
                let neighbours: Vec<NeighbourSample<'_>> = mesh_ref
                    .neighbours(i)
                    .iter()
                    .map(|&(j, f)| NeighbourSample {
                        state: mesh_ref.cells[j].state(selector),
                        position: mesh_ref.cells[j].position,
                        face: mesh_ref.interfaces[f].position,
                    })
                    .collect();
                let mut gradients = cell.gradients.clone();
                gradients.compute(schema, state, cell.position, &neighbours)?;
                let limiters = gradients.compute_limiters(schema, limiter, state, cell.position, &neighbours)?;
                gradients.limit(&limiters)?;
                Ok(gradients)
            })
            .collect::<ModelResult<Vec<_>>>()?;
        for (cell, g) in mesh.cells.iter_mut().zip(gradients) {
            cell.gradients = g;
        }
        Ok(())
    }

    fn convective_flux(
        &self,
        mesh: &Mesh,
        face: &CellInterface,
        selector: StateSelector,
        second_order: bool,
    ) -> ModelResult<Flux> {
        let left = self.face_state(mesh, face.left, face, selector, second_order);
        let right = match face.side {
            FaceSide::Interior(r) => self.face_state(mesh, r, face, selector, second_order),
            FaceSide::Boundary(kind) => ghost_state(&self.model, &left, &face.frame, &kind)?,
        };
        solve_interface(&self.model, &left, &right, &face.frame)
    }

    /// State of cell `i` extrapolated to `face`; the cell average when
    /// the extrapolated state is not admissible.
    fn face_state(
        &self,
        mesh: &Mesh,
        i: usize,
        face: &CellInterface,
        selector: StateSelector,
        second_order: bool,
    ) -> CellState {
        let cell = &mesh.cells[i];
        let source = cell.state(selector);
        if !second_order {
            return source.clone();
        }
        let mut target = source.clone();
        let distance = face.position - cell.position;
        cell.gradients
            .extrapolate(self.model.gradient_schema(), source, &distance, &mut target);
        match self.model.complete_reconstruction(&mut target) {
            Ok(()) => target,
            Err(e) => {
                trace!(cell = %cell.id(), face = %face.id, error = %e, "first-order fallback");
                source.clone()
            }
        }
    }

    fn commit(&self, mesh: &mut Mesh, base: StateSelector, target: StateSelector) -> SimResult<()> {
        let _timer = timing::stage(&step_timing::COMMIT);
        let model = &self.model;
        mesh.cells
            .par_iter_mut()
            .try_for_each_init(|| model.allocate_scratch(), |scratch, cell| {
                model.commit(cell, base, target, scratch)
            })?;
        Ok(())
    }
}
