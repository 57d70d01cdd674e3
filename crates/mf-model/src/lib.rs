//! Flow-model layer for compressible N-phase finite-volume solvers.
//!
//! A [`Model`] binds one equilibrium [`Closure`] (which of velocity,
//! pressure and temperature the phases share) to:
//! - per-cell primitive state ([`Phase`], [`Mixture`], [`CellState`])
//! - the conservative buffer and its slot table ([`Flux`], [`ConsLayout`])
//! - the gradient schema used for second-order reconstruction
//! - the ordered list of stiff relaxations restoring equilibrium
//!
//! Mesh topology, boundary bookkeeping and time stepping live in `mf-sim`.

pub mod cell;
pub mod closure;
pub mod error;
pub mod flux;
pub mod gradient;
pub mod mixture;
pub mod model;
pub mod numerics;
pub mod phase;
pub mod quantity;
pub mod relaxation;
pub mod riemann;
pub mod state;

pub use cell::Cell;
pub use closure::Closure;
pub use error::{ErrorCategory, ModelError, ModelResult};
pub use flux::{ConsLayout, Flux, InterfaceValues};
pub use gradient::{CellGradients, GradientSchema, LimiterKind, NeighbourSample};
pub use mixture::Mixture;
pub use model::Model;
pub use numerics::NewtonConfig;
pub use phase::Phase;
pub use quantity::{Quantity, Scope};
pub use relaxation::{
    PressureRelaxation, PressureTemperatureRelaxation, Relaxation, RelaxationKind,
    RelaxScratch, VelocityRelaxation,
};
pub use riemann::solve_interface;
pub use state::{CellState, StateSelector};
