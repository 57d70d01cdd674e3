//! Mixture-level primitive state.

use mf_core::Vec3;

/// Mixture variables of one cell. Which fields are primary depends on the
/// closure: shared velocity, pressure or temperature live here.
#[derive(Clone, Debug, PartialEq)]
pub struct Mixture {
    pub density: f64,
    pub pressure: f64,
    pub velocity: Vec3,
    pub energy: f64,
    pub total_energy: f64,
    pub temperature: f64,
    /// Frozen sound speed, sqrt(Σ Y_k c_k²).
    pub sound_speed: f64,
}

impl Mixture {
    pub fn zeroed() -> Self {
        Self {
            density: 0.0,
            pressure: 0.0,
            velocity: Vec3::zeros(),
            energy: 0.0,
            total_energy: 0.0,
            temperature: 0.0,
            sound_speed: 0.0,
        }
    }

    /// Kinetic energy per unit volume.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.density * self.velocity.norm_squared()
    }
}

impl Default for Mixture {
    fn default() -> Self {
        Self::zeroed()
    }
}
