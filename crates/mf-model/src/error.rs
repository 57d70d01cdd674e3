//! Error taxonomy of the flow-model layer.

use mf_core::{CellId, MfError};
use mf_eos::EosError;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

/// The three fatal error families of the numerical core.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Numerical,
    UnimplementedCombination,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Malformed setup: EOS arity, phase-count mismatch, bad relaxation list.
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    /// Non-finite or unphysical state, or a solver that did not converge.
    #[error("Numerical error{}: {what}", at_cell(.cell))]
    Numerical { cell: Option<CellId>, what: String },

    /// No formula exists for this boundary category or model combination.
    #[error("Unimplemented combination: {what}")]
    UnimplementedCombination { what: String },
}

fn at_cell(cell: &Option<CellId>) -> String {
    cell.map(|c| format!(" at cell {c}")).unwrap_or_default()
}

impl ModelError {
    pub fn configuration(what: impl Into<String>) -> Self {
        ModelError::Configuration { what: what.into() }
    }

    pub fn numerical(what: impl Into<String>) -> Self {
        ModelError::Numerical {
            cell: None,
            what: what.into(),
        }
    }

    pub fn unimplemented(what: impl Into<String>) -> Self {
        ModelError::UnimplementedCombination { what: what.into() }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ModelError::Configuration { .. } => ErrorCategory::Configuration,
            ModelError::Numerical { .. } => ErrorCategory::Numerical,
            ModelError::UnimplementedCombination { .. } => ErrorCategory::UnimplementedCombination,
        }
    }

    /// Attach the offending cell to a numerical error that has none yet.
    pub fn at(self, id: CellId) -> Self {
        match self {
            ModelError::Numerical { cell: None, what } => ModelError::Numerical {
                cell: Some(id),
                what,
            },
            other => other,
        }
    }
}

impl From<EosError> for ModelError {
    fn from(err: EosError) -> Self {
        match err {
            EosError::Arity { .. } | EosError::InvalidParameter { .. } => {
                ModelError::configuration(err.to_string())
            }
            EosError::NonPhysical { .. } | EosError::ConvergenceFailed { .. } => {
                ModelError::numerical(err.to_string())
            }
        }
    }
}

impl From<MfError> for ModelError {
    fn from(err: MfError) -> Self {
        match err {
            MfError::InvalidArg { .. } | MfError::DegenerateNormal { .. } => {
                ModelError::configuration(err.to_string())
            }
            MfError::NonFinite { .. } | MfError::NotPositive { .. } | MfError::NonPhysical { .. } => {
                ModelError::numerical(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eos_arity_is_a_configuration_error() {
        let err: ModelError = EosError::Arity {
            kind: "IdealGas",
            expected: 3,
            got: 1,
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("IdealGas"));
    }

    #[test]
    fn numerical_error_names_the_cell() {
        let err = ModelError::numerical("negative density").at(CellId::from_index(7));
        assert_eq!(err.category(), ErrorCategory::Numerical);
        assert!(err.to_string().contains("at cell 7"));
    }

    #[test]
    fn at_keeps_existing_cell() {
        let err = ModelError::numerical("x")
            .at(CellId::from_index(1))
            .at(CellId::from_index(2));
        assert!(err.to_string().contains("at cell 1"));
    }
}
