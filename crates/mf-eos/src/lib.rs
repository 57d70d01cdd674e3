//! mf-eos: equations of state for multiflow.
//!
//! Provides:
//! - `EquationOfState` trait: the per-phase thermodynamic closure
//! - Ideal gas, stiffened gas and van der Waals laws
//! - `Eos`: the tagged law selected once from configuration
//!
//! # Example
//!
//! ```
//! use mf_eos::{Eos, EosKind, EquationOfState};
//!
//! let air = Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0]).unwrap();
//! let e = air.energy(1.2, 300.0);
//! assert!((air.temperature(1.2, e) - 300.0).abs() < 1e-9);
//! ```

pub mod eos;
pub mod error;
pub mod ideal_gas;
pub mod law;
pub mod stiffened_gas;
pub mod van_der_waals;

pub use eos::{Eos, EosKind};
pub use error::{EosError, EosResult};
pub use ideal_gas::IdealGas;
pub use law::{EquationOfState, StiffenedCoefficients};
pub use stiffened_gas::StiffenedGas;
pub use van_der_waals::VanDerWaals;
