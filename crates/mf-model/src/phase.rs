//! Per-phase primitive state.

use mf_core::{Density, Pressure, Vec3, Velocity};
use mf_eos::{EosResult, EquationOfState};
use uom::si::{mass_density::kilogram_per_cubic_meter, pressure::pascal, velocity::meter_per_second};

/// Primitive variables of one phase in one cell.
///
/// `alpha`, `density`, `pressure` and `velocity` are primary; the rest is
/// derived through the phase's equation of state by [`Phase::extend`].
#[derive(Clone, Debug, PartialEq)]
pub struct Phase {
    pub alpha: f64,
    pub density: f64,
    pub pressure: f64,
    pub velocity: Vec3,
    /// Specific internal energy.
    pub energy: f64,
    /// Specific total energy e + |u|²/2.
    pub total_energy: f64,
    pub temperature: f64,
    pub sound_speed: f64,
}

impl Phase {
    pub fn zeroed() -> Self {
        Self {
            alpha: 0.0,
            density: 0.0,
            pressure: 0.0,
            velocity: Vec3::zeros(),
            energy: 0.0,
            total_energy: 0.0,
            temperature: 0.0,
            sound_speed: 0.0,
        }
    }

    /// Primary variables only; call [`Phase::extend`] before use.
    pub fn new(alpha: f64, density: f64, pressure: f64, velocity: Vec3) -> Self {
        Self {
            alpha,
            density,
            pressure,
            velocity,
            ..Self::zeroed()
        }
    }

    /// Same as [`Phase::new`] from unit-checked quantities.
    pub fn from_si(alpha: f64, density: Density, pressure: Pressure, velocity: [Velocity; 3]) -> Self {
        let [u, v, w] = velocity.map(|c| c.get::<meter_per_second>());
        Self::new(
            alpha,
            density.get::<kilogram_per_cubic_meter>(),
            pressure.get::<pascal>(),
            Vec3::new(u, v, w),
        )
    }

    /// Partial density αρ.
    #[inline]
    pub fn mass(&self) -> f64 {
        self.alpha * self.density
    }

    /// Recompute energy, temperature and sound speed from (ρ, p, u).
    pub fn extend(&mut self, eos: &impl EquationOfState) {
        self.energy = eos.energy_from_pressure(self.density, self.pressure);
        self.total_energy = self.energy + 0.5 * self.velocity.norm_squared();
        self.temperature = eos.temperature_from_pressure(self.density, self.pressure);
        self.sound_speed = eos.sound_speed_squared(self.density, self.pressure).max(0.0).sqrt();
    }

    /// Set the internal energy, deduce pressure and the other derived fields.
    pub fn set_energy(&mut self, eos: &impl EquationOfState, e: f64) {
        self.pressure = eos.pressure_from_energy(self.density, e);
        self.extend(eos);
    }

    /// Volume fraction in [0, 1] and an admissible (ρ, p) for the law.
    pub fn check(&self, eos: &impl EquationOfState) -> EosResult<()> {
        if !self.alpha.is_finite() || !(0.0..=1.0).contains(&self.alpha) {
            return Err(mf_eos::EosError::NonPhysical {
                what: "volume fraction must lie in [0, 1]",
            });
        }
        if !self.velocity.iter().all(|c| c.is_finite()) {
            return Err(mf_eos::EosError::NonPhysical { what: "velocity" });
        }
        eos.check_state(self.density, self.pressure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mf_core::{kg_per_m3, mps, pa};
    use mf_eos::{Eos, EosKind};

    fn air() -> Eos {
        Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0]).unwrap()
    }

    #[test]
    fn extend_fills_derived_fields() {
        let mut p = Phase::new(1.0, 1.2, 1e5, Vec3::new(10.0, 0.0, 0.0));
        p.extend(&air());
        assert!((p.energy - 1e5 / (0.4 * 1.2)).abs() < 1e-6);
        assert!((p.total_energy - p.energy - 50.0).abs() < 1e-9);
        assert!((p.sound_speed - (1.4_f64 * 1e5 / 1.2).sqrt()).abs() < 1e-9);
        assert!(p.temperature > 0.0);
    }

    #[test]
    fn set_energy_inverts_extend() {
        let eos = air();
        let mut p = Phase::new(0.5, 1.2, 1e5, Vec3::zeros());
        p.extend(&eos);
        let e = p.energy;
        p.pressure = 0.0;
        p.set_energy(&eos, e);
        assert!((p.pressure - 1e5).abs() < 1e-6);
    }

    #[test]
    fn from_si_matches_raw_values() {
        let p = Phase::from_si(0.3, kg_per_m3(2.0), pa(3e5), [mps(1.0), mps(2.0), mps(3.0)]);
        assert_eq!(p.alpha, 0.3);
        assert_eq!(p.density, 2.0);
        assert_eq!(p.pressure, 3e5);
        assert_eq!(p.velocity, Vec3::new(1.0, 2.0, 3.0));
        assert!((p.mass() - 0.6).abs() < 1e-15);
    }

    #[test]
    fn check_rejects_alpha_out_of_range() {
        let mut p = Phase::new(1.5, 1.2, 1e5, Vec3::zeros());
        assert!(p.check(&air()).is_err());
        p.alpha = 1.0;
        assert!(p.check(&air()).is_ok());
        p.density = -1.0;
        assert!(p.check(&air()).is_err());
    }
}
