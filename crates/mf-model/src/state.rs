//! Full primitive state of a cell.

use mf_core::Vec3;

use crate::closure::Closure;
use crate::mixture::Mixture;
use crate::phase::Phase;

/// Which copy of a cell's state an operation reads or writes.
///
/// Second-order time stepping keeps the predictor result in
/// `Intermediate` while `Current` holds the state at the start of the step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StateSelector {
    #[default]
    Current,
    Intermediate,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CellState {
    pub phases: Vec<Phase>,
    pub mixture: Mixture,
    /// Passive scalars advected at the contact speed.
    pub transports: Vec<f64>,
}

impl CellState {
    pub fn new(phases: Vec<Phase>, transports: Vec<f64>) -> Self {
        Self {
            phases,
            mixture: Mixture::zeroed(),
            transports,
        }
    }

    pub fn n_phases(&self) -> usize {
        self.phases.len()
    }

    /// Σ α_k ρ_k.
    pub fn total_mass(&self) -> f64 {
        self.phases.iter().map(|p| p.mass()).sum()
    }

    /// Σ α_k ρ_k e_k.
    pub fn internal_energy_density(&self) -> f64 {
        self.phases.iter().map(|p| p.mass() * p.energy).sum()
    }

    /// Σ α_k.
    pub fn alpha_sum(&self) -> f64 {
        self.phases.iter().map(|p| p.alpha).sum()
    }
}

impl CellState {
    /// Recompute the mixture from the phases under `closure`.
    ///
    /// Shared-velocity closures read the velocity from the phases, which
    /// all carry the mixture velocity.
    pub fn refresh_mixture(&mut self, closure: Closure) {
        if closure == Closure::Euler {
            if let Some(p) = self.phases.first() {
                self.mixture = Mixture {
                    density: p.density,
                    pressure: p.pressure,
                    velocity: p.velocity,
                    energy: p.energy,
                    total_energy: p.total_energy,
                    temperature: p.temperature,
                    sound_speed: p.sound_speed,
                };
            }
            return;
        }

        let rho = self.total_mass();
        let inv_rho = if rho > 0.0 { 1.0 / rho } else { 0.0 };
        let mut pressure = 0.0;
        let mut temperature = 0.0;
        let mut c2 = 0.0;
        let mut momentum = Vec3::zeros();
        let mut energy = 0.0;
        let mut total_energy = 0.0;
        for p in &self.phases {
            let y = p.mass() * inv_rho;
            pressure += p.alpha * p.pressure;
            temperature += y * p.temperature;
            c2 += y * p.sound_speed * p.sound_speed;
            momentum += p.velocity * p.mass();
            energy += y * p.energy;
            total_energy += y * p.total_energy;
        }

        let mix = &mut self.mixture;
        mix.density = rho;
        mix.pressure = pressure;
        mix.temperature = temperature;
        mix.sound_speed = c2.sqrt();
        if closure == Closure::NonEq {
            mix.velocity = momentum * inv_rho;
            mix.total_energy = total_energy;
            mix.energy = total_energy - 0.5 * mix.velocity.norm_squared();
        } else {
            mix.velocity = self.phases.first().map(|p| p.velocity).unwrap_or_default();
            mix.energy = energy;
            mix.total_energy = energy + 0.5 * mix.velocity.norm_squared();
        }
    }

    /// Largest signal speed |u| + c over the phases and the mixture.
    pub fn max_signal_speed(&self) -> f64 {
        let mixture = self.mixture.velocity.norm() + self.mixture.sound_speed;
        self.phases
            .iter()
            .map(|p| p.velocity.norm() + p.sound_speed)
            .fold(mixture, f64::max)
    }

    /// Clamp volume fractions into [0, 1] and rescale them to sum to one.
    pub(crate) fn normalize_alphas(&mut self) -> bool {
        let mut sum = 0.0;
        for p in &mut self.phases {
            p.alpha = p.alpha.clamp(0.0, 1.0);
            sum += p.alpha;
        }
        if !sum.is_finite() || sum <= 0.0 {
            return false;
        }
        for p in &mut self.phases {
            p.alpha /= sum;
        }
        true
    }
}
