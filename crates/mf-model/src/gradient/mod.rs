//! Gradient storage, computation, limiting and face reconstruction.

use mf_core::Vec3;

use crate::closure::Closure;
use crate::error::{ModelError, ModelResult};
use crate::quantity::{self, Quantity, Scope};
use crate::state::CellState;

pub mod least_squares;
pub mod limiter;

pub use least_squares::LeastSquares;
pub use limiter::LimiterKind;

use limiter::FaceJump;

/// Which scalars a closure reconstructs at second order, in buffer order:
/// every phase quantity for phase 0, then phase 1, ..., then the mixture
/// quantities, then one slot per transport.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientSchema {
    slots: Vec<(Quantity, Scope)>,
}

impl GradientSchema {
    pub fn new(closure: Closure, n_phases: usize, n_transports: usize) -> Self {
        let mut slots = Vec::new();
        for k in 0..n_phases {
            for q in closure.phase_gradient_quantities() {
                slots.push((*q, Scope::Phase(k)));
            }
        }
        for q in closure.mixture_gradient_quantities() {
            slots.push((*q, Scope::Mixture));
        }
        for i in 0..n_transports {
            slots.push((Quantity::Transport(i), Scope::Mixture));
        }
        Self { slots }
    }

    /// Number of gradient vectors stored per cell.
    pub fn number_of_transmitted_gradients(&self) -> usize {
        self.slots.len()
    }

    /// Length of the flat buffer used to exchange one cell's gradients.
    pub fn packed_len(&self) -> usize {
        3 * self.slots.len()
    }

    pub fn slots(&self) -> &[(Quantity, Scope)] {
        &self.slots
    }
}

/// A neighbour of a cell across one interior face.
#[derive(Clone, Copy, Debug)]
pub struct NeighbourSample<'a> {
    pub state: &'a CellState,
    pub position: Vec3,
    /// Center of the shared face.
    pub face: Vec3,
}

/// Per-cell gradient buffer, one vector per schema slot.
#[derive(Clone, Debug, PartialEq)]
pub struct CellGradients {
    values: Vec<Vec3>,
}

impl CellGradients {
    pub fn new(schema: &GradientSchema) -> Self {
        Self {
            values: vec![Vec3::zeros(); schema.number_of_transmitted_gradients()],
        }
    }

    pub fn values(&self) -> &[Vec3] {
        &self.values
    }

    pub fn set_to_zero(&mut self) {
        self.values.fill(Vec3::zeros());
    }

    /// Least-squares gradients of every schema slot.
    pub fn compute(
        &mut self,
        schema: &GradientSchema,
        state: &CellState,
        position: Vec3,
        neighbours: &[NeighbourSample<'_>],
    ) -> ModelResult<()> {
        let ls = LeastSquares::new(position, neighbours.iter().map(|n| n.position))?;
        for (slot, (q, s)) in self.values.iter_mut().zip(schema.slots()) {
            let center = read(state, *q, *s)?;
            *slot = ls.gradient(
                center,
                neighbours
                    .iter()
                    .map(|n| quantity::read(n.state, *q, *s).unwrap_or(center)),
            );
        }
        Ok(())
    }

    /// One limiter coefficient per slot.
    pub fn compute_limiters(
        &self,
        schema: &GradientSchema,
        kind: LimiterKind,
        state: &CellState,
        position: Vec3,
        neighbours: &[NeighbourSample<'_>],
    ) -> ModelResult<Vec<f64>> {
        let mut limiters = Vec::with_capacity(self.values.len());
        let mut faces = Vec::with_capacity(neighbours.len());
        for (grad, (q, s)) in self.values.iter().zip(schema.slots()) {
            let center = read(state, *q, *s)?;
            let mut delta_max: f64 = 0.0;
            let mut delta_min: f64 = 0.0;
            faces.clear();
            for n in neighbours {
                let jump = quantity::read(n.state, *q, *s).unwrap_or(center) - center;
                delta_max = delta_max.max(jump);
                delta_min = delta_min.min(jump);
                let to_face = n.face - position;
                let to_neighbour = (n.position - position).norm();
                faces.push(FaceJump {
                    extrapolated: grad.dot(&to_face),
                    neighbour: jump * to_face.norm() / to_neighbour,
                });
            }
            limiters.push(kind.coefficient(center, delta_max, delta_min, &faces));
        }
        Ok(limiters)
    }

    /// Scale each slot by its limiter coefficient.
    pub fn limit(&mut self, limiters: &[f64]) -> ModelResult<()> {
        if limiters.len() != self.values.len() {
            return Err(ModelError::configuration(format!(
                "{} limiters for {} gradients",
                limiters.len(),
                self.values.len()
            )));
        }
        if let Some(phi) = limiters.iter().find(|phi| !(0.0..=1.0).contains(*phi)) {
            return Err(ModelError::configuration(format!(
                "limiter coefficient {phi} outside [0, 1]"
            )));
        }
        for (g, phi) in self.values.iter_mut().zip(limiters) {
            *g *= *phi;
        }
        Ok(())
    }

    /// `target` = `source` with every schema slot moved by gradient · distance.
    ///
    /// Only primary slots are written; derived quantities must be
    /// completed by the model.
    pub fn extrapolate(&self, schema: &GradientSchema, source: &CellState, distance: &Vec3, target: &mut CellState) {
        target.clone_from(source);
        for (g, (q, s)) in self.values.iter().zip(schema.slots()) {
            if let Some(v) = quantity::read(source, *q, *s) {
                quantity::write(target, *q, *s, v + g.dot(distance));
            }
        }
    }

    /// Flatten into `buffer` (length [`GradientSchema::packed_len`]).
    pub fn pack(&self, buffer: &mut [f64]) -> ModelResult<()> {
        self.check_len(buffer.len())?;
        for (chunk, g) in buffer.chunks_exact_mut(3).zip(&self.values) {
            chunk.copy_from_slice(g.as_slice());
        }
        Ok(())
    }

    pub fn unpack(&mut self, buffer: &[f64]) -> ModelResult<()> {
        self.check_len(buffer.len())?;
        for (chunk, g) in buffer.chunks_exact(3).zip(&mut self.values) {
            *g = Vec3::new(chunk[0], chunk[1], chunk[2]);
        }
        Ok(())
    }

    fn check_len(&self, len: usize) -> ModelResult<()> {
        if len == 3 * self.values.len() {
            Ok(())
        } else {
            Err(ModelError::configuration(format!(
                "gradient buffer of length {len}, expected {}",
                3 * self.values.len()
            )))
        }
    }
}

fn read(state: &CellState, q: Quantity, s: Scope) -> ModelResult<f64> {
    quantity::read(state, q, s)
        .ok_or_else(|| ModelError::configuration(format!("no {} in {s:?}", q.name())))
}
