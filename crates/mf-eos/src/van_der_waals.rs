//! Van der Waals real gas.

use crate::error::{EosError, EosResult};
use crate::law::EquationOfState;
use crate::law::validation::{
    validate_density, validate_finite, validate_gamma, validate_non_negative,
    validate_positive, validate_temperature,
};

/// Fraction of the co-volume limit `1/b` used as density ceiling.
const CEILING_FRACTION: f64 = 1.0 - 1.0e-6;

/// `p = ρ r T / (1 - ρ b) - a ρ²` and
/// `e(ρ, T) = -r T ln(1/ρ - b) - a ρ + e_ref`, with `r = (γ-1) cv`.
///
/// The caloric law is singular where `1/ρ - b = 1`; `check_state` rejects
/// densities there.
#[derive(Clone, Debug, PartialEq)]
pub struct VanDerWaals {
    gamma: f64,
    a: f64,
    b: f64,
    cv: f64,
    e_ref: f64,
    conductivity: f64,
}

impl VanDerWaals {
    pub const KIND: &'static str = "VanDerWaals";
    /// Parameter order: `[gamma, a, b, cv, e_ref]`.
    pub const ARITY: usize = 5;

    const MAX_ITER: usize = 200;
    const REL_TOL: f64 = 1e-12;

    pub fn new(gamma: f64, a: f64, b: f64, cv: f64, e_ref: f64) -> EosResult<Self> {
        validate_gamma(Self::KIND, gamma)?;
        validate_non_negative(Self::KIND, "a", a)?;
        validate_positive(Self::KIND, "b", b)?;
        validate_positive(Self::KIND, "cv", cv)?;
        validate_finite(Self::KIND, "e_ref", e_ref)?;
        Ok(Self {
            gamma,
            a,
            b,
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

    fn gas_constant(&self) -> f64 {
        (self.gamma - 1.0) * self.cv
    }

    fn density_ceiling(&self) -> f64 {
        CEILING_FRACTION / self.b
    }

    /// `ln(1/ρ - b)`
    fn log_volume(&self, rho: f64) -> f64 {
        (1.0 / rho - self.b).ln()
    }
}

impl EquationOfState for VanDerWaals {
    fn name(&self) -> &'static str {
        Self::KIND
    }

    fn energy(&self, rho: f64, t: f64) -> f64 {
        -self.gas_constant() * t * self.log_volume(rho) - self.a * rho + self.e_ref
    }

    fn pressure(&self, rho: f64, t: f64) -> f64 {
        rho * self.gas_constant() * t / (1.0 - rho * self.b) - self.a * rho * rho
    }

    fn temperature(&self, rho: f64, e: f64) -> f64 {
        -(e - self.e_ref + self.a * rho) / (self.gas_constant() * self.log_volume(rho))
    }

    fn de_drho(&self, rho: f64, t: f64) -> f64 {
        self.gas_constant() * t / (rho * (1.0 - rho * self.b)) - self.a
    }

    fn d2e_drho2(&self, rho: f64, t: f64) -> f64 {
        let q = rho * (1.0 - rho * self.b);
        -self.gas_constant() * t * (1.0 - 2.0 * rho * self.b) / (q * q)
    }

    fn clamp_density(&self, rho: f64) -> f64 {
        rho.min(self.density_ceiling())
    }

    fn pressure_from_energy(&self, rho: f64, e: f64) -> f64 {
        self.pressure(rho, self.temperature(rho, e))
    }

    fn energy_from_pressure(&self, rho: f64, p: f64) -> f64 {
        self.energy(rho, self.temperature_from_pressure(rho, p))
    }

    fn temperature_from_pressure(&self, rho: f64, p: f64) -> f64 {
        (p + self.a * rho * rho) * (1.0 - rho * self.b) / (rho * self.gas_constant())
    }

    /// Safeguarded Newton on `ρ ↦ p(ρ, T) - p` inside `(0, 1/b)`, started
    /// from the ideal-gas density. Below the critical temperature several
    /// roots exist; the one reached from the ideal-gas estimate is returned.
    fn density_from_pt(&self, p: f64, t: f64) -> EosResult<f64> {
        validate_temperature(t)?;
        if !p.is_finite() || p <= 0.0 {
            return Err(EosError::NonPhysical {
                what: "van der Waals density inversion needs a positive pressure",
            });
        }
        let rt = self.gas_constant() * t;
        let residual = |rho: f64| self.pressure(rho, t) - p;
        let slope = |rho: f64| {
            let s = 1.0 - rho * self.b;
            rt / (s * s) - 2.0 * self.a * rho
        };

        let (mut lo, mut hi) = (0.0, self.density_ceiling());
        let mut rho = (p / rt).clamp(1e-12 * hi, 0.5 * hi);
        for _ in 0..Self::MAX_ITER {
            let f = residual(rho);
            if f.abs() <= Self::REL_TOL * p {
                return Ok(rho);
            }
            if f < 0.0 {
                lo = rho;
            } else {
                hi = rho;
            }
            let df = slope(rho);
            let newton = rho - f / df;
            rho = if df > 0.0 && newton > lo && newton < hi {
                newton
            } else {
                0.5 * (lo + hi)
            };
            if hi - lo <= Self::REL_TOL * hi {
                return Ok(rho);
            }
        }
        Err(EosError::ConvergenceFailed {
            what: "van der Waals density from (p, T)",
        })
    }

    /// `(∂e/∂ρ)_T = p/ρ²` for this caloric law, so the isentropic and the
    /// isothermal sound speeds coincide.
    fn sound_speed_squared(&self, rho: f64, p: f64) -> f64 {
        let s = 1.0 - rho * self.b;
        let t = self.temperature_from_pressure(rho, p);
        self.gas_constant() * t / (s * s) - 2.0 * self.a * rho
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

    fn check_state(&self, rho: f64, p: f64) -> EosResult<()> {
        validate_density(rho)?;
        if rho * self.b >= 1.0 {
            return Err(EosError::NonPhysical {
                what: "density above the van der Waals co-volume limit",
            });
        }
        if self.log_volume(rho).abs() <= f64::EPSILON {
            return Err(EosError::NonPhysical {
                what: "van der Waals caloric law is singular at 1/ρ - b = 1",
            });
        }
        if !p.is_finite() || p <= self.pressure_floor() {
            return Err(EosError::NonPhysical {
                what: "pressure must be finite and above the law's floor",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Roughly nitrogen.
    fn vdw() -> VanDerWaals {
        VanDerWaals::new(1.4, 174.6, 1.38e-3, 742.0, 0.0).unwrap()
    }

    #[test]
    fn reduces_to_ideal_gas_at_low_density() {
        let g = vdw();
        let r = 0.4 * 742.0;
        let p = g.pressure(1e-3, 300.0);
        assert!((p - 1e-3 * r * 300.0).abs() / p < 1e-3);
    }

    #[test]
    fn density_ceiling_is_enforced() {
        let g = vdw();
        let ceiling = g.clamp_density(1.0e6);
        assert!(ceiling < 1.0 / 1.38e-3);
        assert_eq!(g.clamp_density(10.0), 10.0);
    }

    #[test]
    fn density_from_pt_inverts_pressure() {
        let g = vdw();
        let rho = g.density_from_pt(5.0e6, 300.0).unwrap();
        assert!((g.pressure(rho, 300.0) - 5.0e6).abs() / 5.0e6 < 1e-10);
    }

    #[test]
    fn sound_speed_matches_isentropic_finite_difference() {
        let g = vdw();
        let (rho, p) = (50.0, 4.0e6);
        let e = g.energy_from_pressure(rho, p);
        // Along an isentrope de = p/ρ² dρ.
        let h = 1e-4 * rho;
        let p_plus = g.pressure_from_energy(rho + h, e + p / (rho * rho) * h);
        let p_minus = g.pressure_from_energy(rho - h, e - p / (rho * rho) * h);
        let fd = (p_plus - p_minus) / (2.0 * h);
        let c2 = g.sound_speed_squared(rho, p);
        assert!((c2 - fd).abs() / c2 < 1e-4);
    }

    #[test]
    fn energy_follows_the_log_volume_law() {
        let g = VanDerWaals::new(1.4, 5.0, 1e-3, 718.0, 0.0).unwrap();
        let r = 0.4 * 718.0;
        let (rho, t) = (10.0, 300.0);
        let expected = -r * t * (1.0 / rho - 1e-3_f64).ln() - rho * 5.0;
        assert!((g.energy(rho, t) - expected).abs() < 1e-9 * expected.abs());
        assert!((g.temperature(rho, expected) - t).abs() < 1e-9 * t);

        let shifted = VanDerWaals::new(1.4, 5.0, 1e-3, 718.0, 2.5e4).unwrap();
        assert!((shifted.energy(rho, t) - expected - 2.5e4).abs() < 1e-6);
    }

    #[test]
    fn density_derivatives_match_finite_differences() {
        let g = VanDerWaals::new(1.4, 5.0, 1e-3, 718.0, 0.0).unwrap();
        let (rho, t, h) = (10.0, 300.0, 1e-3);
        let fd1 = (g.energy(rho + h, t) - g.energy(rho - h, t)) / (2.0 * h);
        assert!((g.de_drho(rho, t) - fd1).abs() < 1e-6 * fd1.abs());
        let fd2 = (g.energy(rho + h, t) - 2.0 * g.energy(rho, t) + g.energy(rho - h, t)) / (h * h);
        let exact = g.d2e_drho2(rho, t);
        assert!((exact - fd2).abs() < 1e-3 * exact.abs());
        // The isothermal slope of the energy is p/ρ².
        assert!((g.de_drho(rho, t) - g.pressure(rho, t) / (rho * rho)).abs() < 1e-9 * fd1.abs());
    }

    #[test]
    fn energy_from_pressure_is_consistent() {
        let g = vdw();
        let (rho, t) = (40.0, 350.0);
        let p = g.pressure(rho, t);
        assert!((g.energy_from_pressure(rho, p) - g.energy(rho, t)).abs() < 1e-8 * g.energy(rho, t).abs());
        let back = g.density_from_pt(p, t).unwrap();
        assert!((back - rho).abs() < 1e-8 * rho);
    }

    #[test]
    fn rejects_singular_caloric_density() {
        let g = vdw();
        assert!(g.check_state(1.0 / (1.0 + 1.38e-3), 1.0e5).is_err());
    }

    #[test]
    fn rejects_states_beyond_co_volume() {
        let g = vdw();
        assert!(g.check_state(1.0 / 1.38e-3, 1.0e5).is_err());
        assert!(g.check_state(10.0, 1.0e5).is_ok());
    }
}
