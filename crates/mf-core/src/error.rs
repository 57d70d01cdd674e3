use thiserror::Error;

pub type MfResult<T> = Result<T, MfError>;

/// Failures of the shared numeric and geometric helpers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MfError {
    #[error("{what} is not finite: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("{what} must be positive, got {value}")]
    NotPositive { what: &'static str, value: f64 },

    #[error("face normal of length {length} cannot orient a frame")]
    DegenerateNormal { length: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Non-physical state: {what}")]
    NonPhysical { what: &'static str },
}
