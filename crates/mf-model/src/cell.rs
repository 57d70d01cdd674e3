//! Finite-volume cell: geometry, states and accumulators.

use mf_core::{CellId, Frame, Vec3};

use crate::flux::Flux;
use crate::gradient::CellGradients;
use crate::state::{CellState, StateSelector};

#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    id: CellId,
    pub position: Vec3,
    pub volume: f64,
    /// Characteristic size used by the CFL condition.
    pub length_scale: f64,
    pub state: CellState,
    pub intermediate: CellState,
    /// Conservative increments accumulated during a stage.
    pub cons: Flux,
    pub gradients: CellGradients,
}

impl Cell {
    pub(crate) fn new(
        id: CellId,
        position: Vec3,
        volume: f64,
        length_scale: f64,
        state: CellState,
        cons: Flux,
        gradients: CellGradients,
    ) -> Self {
        Self {
            id,
            position,
            volume,
            length_scale,
            intermediate: state.clone(),
            state,
            cons,
            gradients,
        }
    }

    pub fn id(&self) -> CellId {
        self.id
    }

    pub fn state(&self, selector: StateSelector) -> &CellState {
        match selector {
            StateSelector::Current => &self.state,
            StateSelector::Intermediate => &self.intermediate,
        }
    }

    pub fn state_mut(&mut self, selector: StateSelector) -> &mut CellState {
        match selector {
            StateSelector::Current => &mut self.state,
            StateSelector::Intermediate => &mut self.intermediate,
        }
    }

    /// Conservative buffer alongside one state copy.
    pub fn cons_and_state(&mut self, selector: StateSelector) -> (&mut Flux, &CellState) {
        let state = match selector {
            StateSelector::Current => &self.state,
            StateSelector::Intermediate => &self.intermediate,
        };
        (&mut self.cons, state)
    }

    /// Overwrite one state copy with the other.
    pub fn copy_state(&mut self, from: StateSelector, to: StateSelector) {
        match (from, to) {
            (StateSelector::Current, StateSelector::Intermediate) => self.intermediate.clone_from(&self.state),
            (StateSelector::Intermediate, StateSelector::Current) => self.state.clone_from(&self.intermediate),
            _ => {}
        }
    }

    /// Face flux entering this cell (the normal points into it).
    pub fn add_face_flux(&mut self, face: &Flux, coef_a: f64, selector: StateSelector, frame: &Frame) {
        self.cons.add_flux(face, coef_a);
        let state = match selector {
            StateSelector::Current => &self.state,
            StateSelector::Intermediate => &self.intermediate,
        };
        self.cons.add_non_cons(face, coef_a, state, frame);
    }

    /// Face flux leaving this cell (the normal points out of it).
    pub fn subtract_face_flux(&mut self, face: &Flux, coef_a: f64, selector: StateSelector, frame: &Frame) {
        self.cons.subtract_flux(face, coef_a);
        let state = match selector {
            StateSelector::Current => &self.state,
            StateSelector::Intermediate => &self.intermediate,
        };
        self.cons.subtract_non_cons(face, coef_a, state, frame);
    }
}
