//! mf-core: stable foundation for multiflow.
//!
//! Contains:
//! - units (uom SI types + constructors)
//! - numeric (Real + tolerances + float helpers)
//! - geometry (3D vectors and face frames)
//! - ids (compact ids for cells and faces)
//! - timing (stage timers for the step kernels)
//! - error (shared error types)

pub mod error;
pub mod geometry;
pub mod ids;
pub mod numeric;
pub mod timing;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{MfError, MfResult};
pub use geometry::{Frame, Vec3};
pub use ids::*;
pub use numeric::*;
pub use units::*;
