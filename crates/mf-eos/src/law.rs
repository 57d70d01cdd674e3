//! Equation-of-state trait and validation helpers.

use crate::error::{EosError, EosResult};

/// Coefficients of a law of stiffened-gas type:
/// `p = (γ-1) ρ (e - e_ref) - γ p∞` and `p + p∞ = (γ-1) ρ cv T`.
///
/// Ideal gas is the `p∞ = 0` case. Relaxation procedures use these to take
/// their analytical paths.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StiffenedCoefficients {
    pub gamma: f64,
    pub p_inf: f64,
    pub cv: f64,
    pub e_ref: f64,
}

/// Per-phase thermodynamic closure.
///
/// Every method is pure and reentrant; implementations are immutable after
/// construction and shared by reference across cells and threads.
/// Energies are specific internal energies [J/kg].
pub trait EquationOfState: Send + Sync {
    /// Law name (for diagnostics).
    fn name(&self) -> &'static str;

    /// e(ρ, T).
    fn energy(&self, rho: f64, t: f64) -> f64;

    /// p(ρ, T).
    fn pressure(&self, rho: f64, t: f64) -> f64;

    /// T(ρ, e).
    fn temperature(&self, rho: f64, e: f64) -> f64;

    /// ∂e/∂ρ at constant temperature.
    fn de_drho(&self, rho: f64, t: f64) -> f64;

    /// ∂²e/∂ρ² at constant temperature.
    fn d2e_drho2(&self, rho: f64, t: f64) -> f64;

    /// Enforce the law's density ceiling. No-op when the law has none.
    fn clamp_density(&self, rho: f64) -> f64 {
        rho
    }

    /// p(ρ, e).
    fn pressure_from_energy(&self, rho: f64, e: f64) -> f64;

    /// e(ρ, p).
    fn energy_from_pressure(&self, rho: f64, p: f64) -> f64;

    /// T(ρ, p).
    fn temperature_from_pressure(&self, rho: f64, p: f64) -> f64;

    /// ρ(p, T).
    fn density_from_pt(&self, p: f64, t: f64) -> EosResult<f64>;

    /// Squared isentropic sound speed at (ρ, p).
    fn sound_speed_squared(&self, rho: f64, p: f64) -> f64;

    /// Specific enthalpy h = e + p/ρ.
    fn enthalpy(&self, rho: f64, p: f64) -> f64 {
        self.energy_from_pressure(rho, p) + p / rho
    }

    /// Pressures at or below this value are unphysical.
    fn pressure_floor(&self) -> f64;

    /// Specific heat at constant volume [J/(kg·K)].
    fn cv(&self) -> f64;

    /// Thermal conductivity [W/(m·K)], zero when not given.
    fn conductivity(&self) -> f64;

    /// Closed-form coefficients when the law is of stiffened-gas type.
    fn stiffened(&self) -> Option<StiffenedCoefficients> {
        None
    }

    /// Check that (ρ, p) is admissible for this law.
    fn check_state(&self, rho: f64, p: f64) -> EosResult<()> {
        validation::validate_density(rho)?;
        if !p.is_finite() || p <= self.pressure_floor() {
            return Err(EosError::NonPhysical {
                what: "pressure must be finite and above the law's floor",
            });
        }
        Ok(())
    }
}

/// Validation helpers for law parameters and states.
pub(crate) mod validation {
    use super::*;

    pub fn validate_density(rho: f64) -> EosResult<()> {
        if !rho.is_finite() || rho <= 0.0 {
            return Err(EosError::NonPhysical {
                what: "density must be positive and finite",
            });
        }
        Ok(())
    }

    pub fn validate_temperature(t: f64) -> EosResult<()> {
        if !t.is_finite() || t <= 0.0 {
            return Err(EosError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        Ok(())
    }

    pub fn validate_gamma(kind: &'static str, gamma: f64) -> EosResult<()> {
        if !gamma.is_finite() || gamma <= 1.0 {
            return Err(EosError::InvalidParameter {
                kind,
                what: "gamma",
                value: gamma,
            });
        }
        Ok(())
    }

    pub fn validate_positive(kind: &'static str, what: &'static str, value: f64) -> EosResult<()> {
        if !value.is_finite() || value <= 0.0 {
            return Err(EosError::InvalidParameter { kind, what, value });
        }
        Ok(())
    }

    pub fn validate_non_negative(
        kind: &'static str,
        what: &'static str,
        value: f64,
    ) -> EosResult<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(EosError::InvalidParameter { kind, what, value });
        }
        Ok(())
    }

    pub fn validate_finite(kind: &'static str, what: &'static str, value: f64) -> EosResult<()> {
        if !value.is_finite() {
            return Err(EosError::InvalidParameter { kind, what, value });
        }
        Ok(())
    }
}
