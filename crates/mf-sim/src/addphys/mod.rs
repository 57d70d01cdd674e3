//! Physics added on top of the convective model.
//!
//! Each contribution computes whatever per-cell data it needs once per
//! stage, then a flux per face that the stepper accumulates exactly like
//! the convective fluxes.

use std::fmt;

use mf_core::{Frame, Vec3};
use mf_model::{Cell, CellState, Flux, Model, ModelResult, StateSelector};

use crate::mesh::{CellInterface, Mesh};

pub mod conductivity;

pub use conductivity::Conductivity;

/// Per cell, one vector per phase.
pub type PhaseGradients = Vec<Vec<Vec3>>;

pub trait AdditionalPhysics: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    /// Per-cell data needed by [`AdditionalPhysics::face_flux`].
    fn prepare(&self, model: &Model, mesh: &Mesh, selector: StateSelector) -> ModelResult<PhaseGradients>;

    /// Flux through `face` along its normal, `None` when nothing crosses it.
    fn face_flux(
        &self,
        model: &Model,
        mesh: &Mesh,
        face: &CellInterface,
        prepared: &PhaseGradients,
        selector: StateSelector,
    ) -> ModelResult<Option<Flux>>;

    /// Non-conservative part of a face flux on one side of the face.
    fn add_non_cons(
        &self,
        _cons: &mut Flux,
        _face_flux: &Flux,
        _coef_a: f64,
        _state: &CellState,
        _frame: &Frame,
    ) {
    }

    /// Stability bound on the time step for one cell.
    fn max_time_step(&self, _model: &Model, _cell: &Cell, _selector: StateSelector) -> Option<f64> {
        None
    }
}
