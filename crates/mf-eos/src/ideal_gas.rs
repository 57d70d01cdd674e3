//! Calorically perfect gas.

use crate::error::EosResult;
use crate::law::validation::{
    validate_finite, validate_gamma, validate_non_negative, validate_positive,
    validate_temperature,
};
use crate::law::{EquationOfState, StiffenedCoefficients};

/// `p = (γ-1) ρ (e - e_ref)`, `e = cv T + e_ref`.
#[derive(Clone, Debug, PartialEq)]
pub struct IdealGas {
    gamma: f64,
    cv: f64,
    e_ref: f64,
    conductivity: f64,
}

impl IdealGas {
    pub const KIND: &'static str = "IdealGas";
    /// Parameter order: `[gamma, cv, e_ref]`.
    pub const ARITY: usize = 3;

    pub fn new(gamma: f64, cv: f64, e_ref: f64) -> EosResult<Self> {
        validate_gamma(Self::KIND, gamma)?;
        validate_positive(Self::KIND, "cv", cv)?;
        validate_finite(Self::KIND, "e_ref", e_ref)?;
        Ok(Self {
            gamma,
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
}

impl EquationOfState for IdealGas {
    fn name(&self) -> &'static str {
        Self::KIND
    }

    fn energy(&self, _rho: f64, t: f64) -> f64 {
        self.cv * t + self.e_ref
    }

    fn pressure(&self, rho: f64, t: f64) -> f64 {
        (self.gamma - 1.0) * rho * self.cv * t
    }

    fn temperature(&self, _rho: f64, e: f64) -> f64 {
        (e - self.e_ref) / self.cv
    }

    fn de_drho(&self, _rho: f64, _t: f64) -> f64 {
        0.0
    }

    fn d2e_drho2(&self, _rho: f64, _t: f64) -> f64 {
        0.0
    }

    fn pressure_from_energy(&self, rho: f64, e: f64) -> f64 {
        (self.gamma - 1.0) * rho * (e - self.e_ref)
    }

    fn energy_from_pressure(&self, rho: f64, p: f64) -> f64 {
        p / ((self.gamma - 1.0) * rho) + self.e_ref
    }

    fn temperature_from_pressure(&self, rho: f64, p: f64) -> f64 {
        p / ((self.gamma - 1.0) * rho * self.cv)
    }

    fn density_from_pt(&self, p: f64, t: f64) -> EosResult<f64> {
        validate_temperature(t)?;
        Ok(p / ((self.gamma - 1.0) * self.cv * t))
    }

    fn sound_speed_squared(&self, rho: f64, p: f64) -> f64 {
        self.gamma * p / rho
    }

    fn pressure_floor(&self) -> f64 {
        0.0
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
            p_inf: 0.0,
            cv: self.cv,
            e_ref: self.e_ref,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn air() -> IdealGas {
        IdealGas::new(1.4, 717.5, 0.0).unwrap()
    }

    #[test]
    fn standard_air_pressure() {
        // r = 287 J/(kg K): 1.177 kg/m³ at 300 K is about one atmosphere.
        let p = air().pressure(1.177, 300.0);
        assert!((p - 101_325.0).abs() / 101_325.0 < 0.01);
    }

    #[test]
    fn energy_pressure_consistency() {
        let g = air();
        let e = g.energy_from_pressure(1.2, 1.0e5);
        assert!((g.pressure_from_energy(1.2, e) - 1.0e5).abs() < 1e-6);
        let t = g.temperature_from_pressure(1.2, 1.0e5);
        assert!((g.pressure(1.2, t) - 1.0e5).abs() < 1e-6);
    }

    #[test]
    fn density_from_pt_inverts_pressure() {
        let g = air();
        let rho = g.density_from_pt(2.0e5, 450.0).unwrap();
        assert!((g.pressure(rho, 450.0) - 2.0e5).abs() < 1e-6);
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(IdealGas::new(0.9, 717.5, 0.0).is_err());
        assert!(IdealGas::new(1.4, -1.0, 0.0).is_err());
        assert!(air().with_conductivity(-0.1).is_err());
    }
}
