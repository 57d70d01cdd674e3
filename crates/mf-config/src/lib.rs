//! mf-config: YAML case files for multiflow runs.
//!
//! A case names the closure, the phase laws, relaxations, numerics, a 1D
//! line mesh with initial regions and boundaries, and the run length.
//! [`load_yaml`] parses and validates; [`CaseDef::prepare`] builds the
//! stepper and mesh.

pub mod build;
pub mod schema;
pub mod validate;

use mf_model::{ErrorCategory, ModelError};
use mf_sim::SimError;

pub use schema::*;
pub use validate::{LATEST_VERSION, ValidationError, validate_case};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ConfigError::Model(e) => e.category(),
            ConfigError::Sim(e) => e.category(),
            ConfigError::Validation(ValidationError::Unsupported { .. }) => {
                ErrorCategory::UnimplementedCombination
            }
            _ => ErrorCategory::Configuration,
        }
    }
}

pub fn parse_yaml(content: &str) -> ConfigResult<CaseDef> {
    let case: CaseDef = serde_yaml::from_str(content)?;
    validate_case(&case)?;
    Ok(case)
}

pub fn load_yaml(path: &std::path::Path) -> ConfigResult<CaseDef> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content)
}

pub fn save_yaml(path: &std::path::Path, case: &CaseDef) -> ConfigResult<()> {
    validate_case(case)?;
    let content = serde_yaml::to_string(case)?;
    std::fs::write(path, content)?;
    Ok(())
}
