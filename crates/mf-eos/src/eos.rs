//! Law selection from configuration.

use crate::error::{EosError, EosResult};
use crate::ideal_gas::IdealGas;
use crate::law::{EquationOfState, StiffenedCoefficients};
use crate::stiffened_gas::StiffenedGas;
use crate::van_der_waals::VanDerWaals;

/// Law names as they appear in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EosKind {
    IdealGas,
    StiffenedGas,
    VanDerWaals,
}

impl EosKind {
    /// Expected number of parameters for the law.
    pub fn arity(self) -> usize {
        match self {
            EosKind::IdealGas => IdealGas::ARITY,
            EosKind::StiffenedGas => StiffenedGas::ARITY,
            EosKind::VanDerWaals => VanDerWaals::ARITY,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            EosKind::IdealGas => IdealGas::KIND,
            EosKind::StiffenedGas => StiffenedGas::KIND,
            EosKind::VanDerWaals => VanDerWaals::KIND,
        }
    }
}

/// An equation of state chosen once at configuration time.
#[derive(Clone, Debug, PartialEq)]
pub enum Eos {
    IdealGas(IdealGas),
    StiffenedGas(StiffenedGas),
    VanDerWaals(VanDerWaals),
}

impl Eos {
    /// Build a law from its flat parameter list (see each law's `ARITY`).
    pub fn from_params(kind: EosKind, params: &[f64]) -> EosResult<Self> {
        if params.len() != kind.arity() {
            return Err(EosError::Arity {
                kind: kind.name(),
                expected: kind.arity(),
                got: params.len(),
            });
        }
        Ok(match kind {
            EosKind::IdealGas => Eos::IdealGas(IdealGas::new(params[0], params[1], params[2])?),
            EosKind::StiffenedGas => Eos::StiffenedGas(StiffenedGas::new(
                params[0], params[1], params[2], params[3],
            )?),
            EosKind::VanDerWaals => Eos::VanDerWaals(VanDerWaals::new(
                params[0], params[1], params[2], params[3], params[4],
            )?),
        })
    }

    /// Attach a thermal conductivity.
    pub fn with_conductivity(self, conductivity: f64) -> EosResult<Self> {
        Ok(match self {
            Eos::IdealGas(law) => Eos::IdealGas(law.with_conductivity(conductivity)?),
            Eos::StiffenedGas(law) => Eos::StiffenedGas(law.with_conductivity(conductivity)?),
            Eos::VanDerWaals(law) => Eos::VanDerWaals(law.with_conductivity(conductivity)?),
        })
    }

    pub fn kind(&self) -> EosKind {
        match self {
            Eos::IdealGas(_) => EosKind::IdealGas,
            Eos::StiffenedGas(_) => EosKind::StiffenedGas,
            Eos::VanDerWaals(_) => EosKind::VanDerWaals,
        }
    }

    fn law(&self) -> &dyn EquationOfState {
        match self {
            Eos::IdealGas(law) => law,
            Eos::StiffenedGas(law) => law,
            Eos::VanDerWaals(law) => law,
        }
    }
}

impl EquationOfState for Eos {
    fn name(&self) -> &'static str {
        self.law().name()
    }

    fn energy(&self, rho: f64, t: f64) -> f64 {
        self.law().energy(rho, t)
    }

    fn pressure(&self, rho: f64, t: f64) -> f64 {
        self.law().pressure(rho, t)
    }

    fn temperature(&self, rho: f64, e: f64) -> f64 {
        self.law().temperature(rho, e)
    }

    fn de_drho(&self, rho: f64, t: f64) -> f64 {
        self.law().de_drho(rho, t)
    }

    fn d2e_drho2(&self, rho: f64, t: f64) -> f64 {
        self.law().d2e_drho2(rho, t)
    }

    fn clamp_density(&self, rho: f64) -> f64 {
        self.law().clamp_density(rho)
    }

    fn pressure_from_energy(&self, rho: f64, e: f64) -> f64 {
        self.law().pressure_from_energy(rho, e)
    }

    fn energy_from_pressure(&self, rho: f64, p: f64) -> f64 {
        self.law().energy_from_pressure(rho, p)
    }

    fn temperature_from_pressure(&self, rho: f64, p: f64) -> f64 {
        self.law().temperature_from_pressure(rho, p)
    }

    fn density_from_pt(&self, p: f64, t: f64) -> EosResult<f64> {
        self.law().density_from_pt(p, t)
    }

    fn sound_speed_squared(&self, rho: f64, p: f64) -> f64 {
        self.law().sound_speed_squared(rho, p)
    }

    fn enthalpy(&self, rho: f64, p: f64) -> f64 {
        self.law().enthalpy(rho, p)
    }

    fn pressure_floor(&self) -> f64 {
        self.law().pressure_floor()
    }

    fn cv(&self) -> f64 {
        self.law().cv()
    }

    fn conductivity(&self) -> f64 {
        self.law().conductivity()
    }

    fn stiffened(&self) -> Option<StiffenedCoefficients> {
        self.law().stiffened()
    }

    fn check_state(&self, rho: f64, p: f64) -> EosResult<()> {
        self.law().check_state(rho, p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_mismatch_is_reported() {
        let err = Eos::from_params(EosKind::StiffenedGas, &[4.4, 6.0e8]).unwrap_err();
        assert_eq!(
            err,
            EosError::Arity {
                kind: "StiffenedGas",
                expected: 4,
                got: 2
            }
        );
    }

    #[test]
    fn builds_each_law() {
        let ig = Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0]).unwrap();
        let sg = Eos::from_params(EosKind::StiffenedGas, &[4.4, 6.0e8, 1816.0, 0.0]).unwrap();
        let vdw =
            Eos::from_params(EosKind::VanDerWaals, &[1.4, 174.6, 1.38e-3, 742.0, 0.0]).unwrap();
        assert_eq!(ig.kind(), EosKind::IdealGas);
        assert_eq!(sg.name(), "StiffenedGas");
        assert!(vdw.stiffened().is_none());
        assert!(ig.stiffened().is_some());
    }

    #[test]
    fn conductivity_is_carried() {
        let ig = Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0])
            .unwrap()
            .with_conductivity(0.026)
            .unwrap();
        assert_eq!(ig.conductivity(), 0.026);
    }
}
