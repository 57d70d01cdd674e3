//! Small dense solvers shared by the relaxation procedures.

pub mod jacobian;
pub mod newton;

pub use jacobian::{central_difference_jacobian, finite_difference_jacobian};
pub use newton::{NewtonConfig, NewtonResult, newton_solve};
