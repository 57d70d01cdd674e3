//! Named scalar quantities of a cell state.

use crate::state::CellState;

/// A scalar that can be read from (and for reconstructable ones, written
/// to) a [`CellState`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quantity {
    Alpha,
    Density,
    Pressure,
    VelocityU,
    VelocityV,
    VelocityW,
    Temperature,
    Energy,
    TotalEnergy,
    SoundSpeed,
    MassFraction,
    Transport(usize),
}

/// Where a quantity is read: one phase, or the mixture.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Phase(usize),
    Mixture,
}

impl Quantity {
    pub fn name(self) -> String {
        match self {
            Quantity::Alpha => "alpha".into(),
            Quantity::Density => "density".into(),
            Quantity::Pressure => "pressure".into(),
            Quantity::VelocityU => "u".into(),
            Quantity::VelocityV => "v".into(),
            Quantity::VelocityW => "w".into(),
            Quantity::Temperature => "temperature".into(),
            Quantity::Energy => "energy".into(),
            Quantity::TotalEnergy => "total_energy".into(),
            Quantity::SoundSpeed => "sound_speed".into(),
            Quantity::MassFraction => "mass_fraction".into(),
            Quantity::Transport(i) => format!("transport_{i}"),
        }
    }

    fn component(self) -> Option<usize> {
        match self {
            Quantity::VelocityU => Some(0),
            Quantity::VelocityV => Some(1),
            Quantity::VelocityW => Some(2),
            _ => None,
        }
    }
}

/// Read a scalar. `None` when the quantity has no meaning in that scope
/// or an index is out of range.
pub(crate) fn read(state: &CellState, quantity: Quantity, scope: Scope) -> Option<f64> {
    if let Quantity::Transport(i) = quantity {
        return state.transports.get(i).copied();
    }
    match scope {
        Scope::Phase(k) => {
            let phase = state.phases.get(k)?;
            Some(match quantity {
                Quantity::Alpha => phase.alpha,
                Quantity::Density => phase.density,
                Quantity::Pressure => phase.pressure,
                Quantity::Temperature => phase.temperature,
                Quantity::Energy => phase.energy,
                Quantity::TotalEnergy => phase.total_energy,
                Quantity::SoundSpeed => phase.sound_speed,
                Quantity::MassFraction => {
                    let rho = state.mixture.density;
                    if rho > 0.0 { phase.mass() / rho } else { 0.0 }
                }
                q => phase.velocity[q.component()?],
            })
        }
        Scope::Mixture => {
            let mix = &state.mixture;
            Some(match quantity {
                Quantity::Alpha | Quantity::MassFraction => return None,
                Quantity::Density => mix.density,
                Quantity::Pressure => mix.pressure,
                Quantity::Temperature => mix.temperature,
                Quantity::Energy => mix.energy,
                Quantity::TotalEnergy => mix.total_energy,
                Quantity::SoundSpeed => mix.sound_speed,
                q => mix.velocity[q.component()?],
            })
        }
    }
}

/// Overwrite a primary scalar. Returns `false` for derived quantities,
/// which are recomputed from the primary ones instead.
pub(crate) fn write(state: &mut CellState, quantity: Quantity, scope: Scope, value: f64) -> bool {
    if let Quantity::Transport(i) = quantity {
        return match state.transports.get_mut(i) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        };
    }
    match scope {
        Scope::Phase(k) => {
            let Some(phase) = state.phases.get_mut(k) else {
                return false;
            };
            match quantity {
                Quantity::Alpha => phase.alpha = value,
                Quantity::Density => phase.density = value,
                Quantity::Pressure => phase.pressure = value,
                Quantity::Temperature => phase.temperature = value,
                q => match q.component() {
                    Some(c) => phase.velocity[c] = value,
                    None => return false,
                },
            }
            true
        }
        Scope::Mixture => {
            let mix = &mut state.mixture;
            match quantity {
                Quantity::Density => mix.density = value,
                Quantity::Pressure => mix.pressure = value,
                Quantity::Temperature => mix.temperature = value,
                q => match q.component() {
                    Some(c) => mix.velocity[c] = value,
                    None => return false,
                },
            }
            true
        }
    }
}
