//! Error types for simulation operations.

use mf_model::{ErrorCategory, ModelError};
use thiserror::Error;

/// Errors encountered during time stepping.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Non-physical condition: {what}")]
    NonPhysical { what: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub fn invalid(what: impl Into<String>) -> Self {
        SimError::InvalidArg { what: what.into() }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SimError::InvalidArg { .. } => ErrorCategory::Configuration,
            SimError::NonPhysical { .. } => ErrorCategory::Numerical,
            SimError::Model(e) => e.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_keep_their_category() {
        let err: SimError = ModelError::unimplemented("symmetry conduction").into();
        assert_eq!(err.category(), ErrorCategory::UnimplementedCombination);
        assert!(err.to_string().contains("symmetry conduction"));
        assert_eq!(SimError::invalid("cfl").category(), ErrorCategory::Configuration);
    }
}
