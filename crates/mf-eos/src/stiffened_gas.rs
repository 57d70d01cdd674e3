//! Stiffened gas: liquids and dense phases.

use crate::error::EosResult;
use crate::law::validation::{
    validate_finite, validate_gamma, validate_non_negative, validate_positive,
    validate_temperature,
};
use crate::law::{EquationOfState, StiffenedCoefficients};

/// `p = (γ-1) ρ (e - e_ref) - γ p∞`, `e(ρ, T) = cv T + p∞/ρ + e_ref`.
#[derive(Clone, Debug, PartialEq)]
pub struct StiffenedGas {
    gamma: f64,
    p_inf: f64,
    cv: f64,
    e_ref: f64,
    conductivity: f64,
}

impl StiffenedGas {
    pub const KIND: &'static str = "StiffenedGas";
    /// Parameter order: `[gamma, p_inf, cv, e_ref]`.
    pub const ARITY: usize = 4;

    pub fn new(gamma: f64, p_inf: f64, cv: f64, e_ref: f64) -> EosResult<Self> {
        validate_gamma(Self::KIND, gamma)?;
        validate_non_negative(Self::KIND, "p_inf", p_inf)?;
        validate_positive(Self::KIND, "cv", cv)?;
        validate_finite(Self::KIND, "e_ref", e_ref)?;
        Ok(Self {
            gamma,
            p_inf,
            cv,
            e_ref,
            conductivity: 0.0,
        })
    }

    pub fn with_conductivity(mut self, conductivity: f64) -> EosResult<Self> {
        validate_non_negative(Self::KIND, "conductivity", conductivity)?;
        self.conductivity = conductivity;
        Ok(self)
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn p_inf(&self) -> f64 {
        self.p_inf
    }
}

impl EquationOfState for StiffenedGas {
    fn name(&self) -> &'static str {
        Self::KIND
    }

    fn energy(&self, rho: f64, t: f64) -> f64 {
        self.cv * t + self.p_inf / rho + self.e_ref
    }

    fn pressure(&self, rho: f64, t: f64) -> f64 {
        (self.gamma - 1.0) * rho * self.cv * t - self.p_inf
    }

    fn temperature(&self, rho: f64, e: f64) -> f64 {
        (e - self.e_ref - self.p_inf / rho) / self.cv
    }

    fn de_drho(&self, rho: f64, _t: f64) -> f64 {
        -self.p_inf / (rho * rho)
    }

    fn d2e_drho2(&self, rho: f64, _t: f64) -> f64 {
        2.0 * self.p_inf / (rho * rho * rho)
    }

    fn pressure_from_energy(&self, rho: f64, e: f64) -> f64 {
        (self.gamma - 1.0) * rho * (e - self.e_ref) - self.gamma * self.p_inf
    }

    fn energy_from_pressure(&self, rho: f64, p: f64) -> f64 {
        (p + self.gamma * self.p_inf) / ((self.gamma - 1.0) * rho) + self.e_ref
    }

    fn temperature_from_pressure(&self, rho: f64, p: f64) -> f64 {
        (p + self.p_inf) / ((self.gamma - 1.0) * rho * self.cv)
    }

    fn density_from_pt(&self, p: f64, t: f64) -> EosResult<f64> {
        validate_temperature(t)?;
        Ok((p + self.p_inf) / ((self.gamma - 1.0) * self.cv * t))
    }

    fn sound_speed_squared(&self, rho: f64, p: f64) -> f64 {
        self.gamma * (p + self.p_inf) / rho
    }

    fn pressure_floor(&self) -> f64 {
        -self.p_inf
    }

    fn cv(&self) -> f64 {
        self.cv
    }

    fn conductivity(&self) -> f64 {
        self.conductivity
    }

    fn stiffened(&self) -> Option<StiffenedCoefficients> {
        Some(StiffenedCoefficients {
            gamma: self.gamma,
            p_inf: self.p_inf,
            cv: self.cv,
            e_ref: self.e_ref,
        })
    }
}
