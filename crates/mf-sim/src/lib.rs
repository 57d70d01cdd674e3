//! Finite-volume time stepping for multiflow.
//!
//! Provides:
//! - `Mesh` of cells and interfaces, with a 1D line builder
//! - Boundary ghost states (wall, symmetry, non-reflecting, inlet, outlet)
//! - Additional physics through the `AdditionalPhysics` trait (conductivity)
//! - `Stepper`: CFL time step, first-order and Heun second-order stages
//! - `run_sim`: fixed end-time driver with decimated snapshots

pub mod addphys;
pub mod boundary;
pub mod error;
pub mod mesh;
pub mod sim;
pub mod stepper;

pub use addphys::{AdditionalPhysics, Conductivity, PhaseGradients};
pub use boundary::{BoundaryKind, ghost_state};
pub use error::{SimError, SimResult};
pub use mesh::{CellInterface, FaceSide, Mesh};
pub use sim::{CellSample, SimOptions, SimProgress, SimRecord, run_sim, run_sim_with_progress};
pub use stepper::{IntegratorType, Stepper, StepperOptions};
