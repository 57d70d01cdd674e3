//! Stiff relaxation procedures.
//!
//! Each procedure drives the phases of one cell to an equilibrium in a
//! single call (infinite relaxation rate). They act on phase quantities
//! only; the model refreshes the mixture afterwards.

use std::fmt;

use mf_eos::Eos;

use crate::error::ModelResult;
use crate::numerics::NewtonConfig;
use crate::state::CellState;

pub mod energy;
pub mod pressure;
pub mod pressure_temperature;
pub mod velocity;

pub use pressure::PressureRelaxation;
pub use pressure_temperature::PressureTemperatureRelaxation;
pub use velocity::VelocityRelaxation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RelaxationKind {
    Velocity,
    Pressure,
    PressureTemperature,
}

impl RelaxationKind {
    pub fn name(self) -> &'static str {
        match self {
            RelaxationKind::Velocity => "velocity",
            RelaxationKind::Pressure => "pressure",
            RelaxationKind::PressureTemperature => "pressure-temperature",
        }
    }

    /// Instantiate the procedure. `force_iterative` skips closed-form paths.
    pub fn build(self, newton: &NewtonConfig, force_iterative: bool) -> Box<dyn Relaxation> {
        let method = if force_iterative { Method::Iterative } else { Method::Auto };
        match self {
            RelaxationKind::Velocity => Box::new(VelocityRelaxation),
            RelaxationKind::Pressure => Box::new(PressureRelaxation::new(method, newton.clone())),
            RelaxationKind::PressureTemperature => {
                Box::new(PressureTemperatureRelaxation::new(method, newton.clone()))
            }
        }
    }
}

/// Closed form when every phase law allows it, Newton otherwise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Auto,
    Iterative,
}

/// A stiff relaxation applied to one cell state.
pub trait Relaxation: Send + Sync + fmt::Debug {
    fn kind(&self) -> RelaxationKind;

    /// Drive `state.phases` to equilibrium, conserving partial masses,
    /// mixture momentum and mixture total energy.
    fn relax(&self, state: &mut CellState, eos: &[Eos], scratch: &mut RelaxScratch) -> ModelResult<()>;
}

/// Per-worker buffers holding the pre-relaxation phase values.
#[derive(Clone, Debug, Default)]
pub struct RelaxScratch {
    pub(crate) alphas: Vec<f64>,
    pub(crate) densities: Vec<f64>,
    pub(crate) pressures: Vec<f64>,
    pub(crate) energies: Vec<f64>,
    pub(crate) masses: Vec<f64>,
}

impl RelaxScratch {
    pub fn new(n_phases: usize) -> Self {
        Self {
            alphas: Vec::with_capacity(n_phases),
            densities: Vec::with_capacity(n_phases),
            pressures: Vec::with_capacity(n_phases),
            energies: Vec::with_capacity(n_phases),
            masses: Vec::with_capacity(n_phases),
        }
    }

    pub(crate) fn load(&mut self, state: &CellState) {
        self.alphas.clear();
        self.densities.clear();
        self.pressures.clear();
        self.energies.clear();
        self.masses.clear();
        for p in &state.phases {
            self.alphas.push(p.alpha);
            self.densities.push(p.density);
            self.pressures.push(p.pressure);
            self.energies.push(p.energy);
            self.masses.push(p.mass());
        }
    }
}

/// Whether all values agree to round-off, relative to their magnitude.
pub(crate) fn already_uniform(values: &[f64]) -> bool {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    hi - lo <= 1e-13 * hi.abs().max(lo.abs()).max(1.0)
}

/// Set volume fractions from relaxed densities and rescale them onto the
/// unit simplex; densities follow so that partial masses are untouched.
pub(crate) fn assign_densities(state: &mut CellState, masses: &[f64], densities: &[f64]) {
    for (k, phase) in state.phases.iter_mut().enumerate() {
        phase.alpha = masses[k] / densities[k];
    }
    let sum = state.alpha_sum();
    for (k, phase) in state.phases.iter_mut().enumerate() {
        phase.alpha /= sum;
        phase.density = masses[k] / phase.alpha;
    }
}
