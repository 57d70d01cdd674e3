//! Equation-of-state errors.

use mf_core::MfError;
use thiserror::Error;

/// Result type for equation-of-state operations.
pub type EosResult<T> = Result<T, EosError>;

/// Errors raised while building or evaluating an equation of state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EosError {
    /// Parameter list length does not match the law.
    #[error("{kind} expects {expected} parameters, got {got}")]
    Arity {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    /// Parameter value outside its admissible range.
    #[error("Invalid parameter {what} for {kind}: {value}")]
    InvalidParameter {
        kind: &'static str,
        what: &'static str,
        value: f64,
    },

    /// Non-physical input or output (negative density, temperature...).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Iterative inversion did not converge.
    #[error("Convergence failed for {what}")]
    ConvergenceFailed { what: &'static str },
}

impl From<EosError> for MfError {
    fn from(err: EosError) -> Self {
        match err {
            EosError::Arity { .. } | EosError::InvalidParameter { .. } => MfError::InvalidArg {
                what: "equation of state parameters",
            },
            EosError::NonPhysical { what } | EosError::ConvergenceFailed { what } => {
                MfError::NonPhysical { what }
            }
        }
    }
}
