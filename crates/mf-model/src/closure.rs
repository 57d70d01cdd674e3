//! Equilibrium closures and their static tables.

use crate::quantity::Quantity;
use crate::relaxation::RelaxationKind;

/// Which of velocity, pressure and temperature the phases share.
///
/// | closure | shared        | mandatory relaxations |
/// |---------|---------------|-----------------------|
/// | Euler   | single phase  | none                  |
/// | NonEq   | nothing       | none                  |
/// | UEq     | u             | none                  |
/// | PUEq    | u, p          | pressure              |
/// | PTUEq   | u, p, T       | pressure-temperature  |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Closure {
    Euler,
    NonEq,
    UEq,
    PUEq,
    PTUEq,
}

impl Closure {
    pub fn name(self) -> &'static str {
        match self {
            Closure::Euler => "Euler",
            Closure::NonEq => "NonEq",
            Closure::UEq => "UEq",
            Closure::PUEq => "PUEq",
            Closure::PTUEq => "PTUEq",
        }
    }

    pub fn shares_velocity(self) -> bool {
        !matches!(self, Closure::NonEq)
    }

    pub fn shares_pressure(self) -> bool {
        matches!(self, Closure::Euler | Closure::PUEq | Closure::PTUEq)
    }

    pub fn shares_temperature(self) -> bool {
        matches!(self, Closure::Euler | Closure::PTUEq)
    }

    /// Admissible phase count.
    pub fn accepts_phase_count(self, n: usize) -> bool {
        match self {
            Closure::Euler => n == 1,
            _ => n >= 2,
        }
    }

    /// Relaxations that always run for this closure, in order.
    pub fn mandatory_relaxations(self) -> &'static [RelaxationKind] {
        match self {
            Closure::PUEq => &[RelaxationKind::Pressure],
            Closure::PTUEq => &[RelaxationKind::PressureTemperature],
            _ => &[],
        }
    }

    /// Whether a relaxation has anything to act on under this closure.
    pub fn allows_relaxation(self, kind: RelaxationKind) -> bool {
        match (self, kind) {
            (Closure::Euler, _) => false,
            (Closure::NonEq, _) => true,
            (_, RelaxationKind::Velocity) => false,
            (Closure::UEq, _) => true,
            (Closure::PUEq, RelaxationKind::Pressure | RelaxationKind::PressureTemperature) => true,
            (Closure::PTUEq, RelaxationKind::PressureTemperature) => true,
            _ => false,
        }
    }

    /// Per-phase quantities carried by the gradient buffer.
    pub fn phase_gradient_quantities(self) -> &'static [Quantity] {
        use Quantity::*;
        match self {
            Closure::Euler => &[Density, Pressure, VelocityU, VelocityV, VelocityW],
            Closure::NonEq => &[Alpha, Density, Pressure, VelocityU, VelocityV, VelocityW],
            Closure::UEq => &[Alpha, Density, Pressure],
            Closure::PUEq => &[Alpha, Density],
            Closure::PTUEq => &[Alpha],
        }
    }

    /// Mixture quantities carried by the gradient buffer (transports excluded).
    pub fn mixture_gradient_quantities(self) -> &'static [Quantity] {
        use Quantity::*;
        match self {
            Closure::Euler | Closure::NonEq => &[],
            Closure::UEq => &[VelocityU, VelocityV, VelocityW],
            Closure::PUEq => &[Pressure, VelocityU, VelocityV, VelocityW],
            Closure::PTUEq => &[Pressure, Temperature, VelocityU, VelocityV, VelocityW],
        }
    }
}

impl std::fmt::Display for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Closure {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Euler" => Ok(Closure::Euler),
            "NonEq" => Ok(Closure::NonEq),
            "UEq" => Ok(Closure::UEq),
            "PUEq" => Ok(Closure::PUEq),
            "PTUEq" => Ok(Closure::PTUEq),
            other => Err(format!("unknown closure '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_count_rules() {
        assert!(Closure::Euler.accepts_phase_count(1));
        assert!(!Closure::Euler.accepts_phase_count(2));
        assert!(!Closure::PUEq.accepts_phase_count(1));
        assert!(Closure::PTUEq.accepts_phase_count(3));
    }

    #[test]
    fn relaxation_compatibility() {
        assert!(Closure::NonEq.allows_relaxation(RelaxationKind::Velocity));
        assert!(!Closure::UEq.allows_relaxation(RelaxationKind::Velocity));
        assert!(!Closure::PTUEq.allows_relaxation(RelaxationKind::Pressure));
        assert!(!Closure::Euler.allows_relaxation(RelaxationKind::Pressure));
        for c in [Closure::PUEq, Closure::PTUEq] {
            for k in c.mandatory_relaxations() {
                assert!(c.allows_relaxation(*k));
            }
        }
    }

    #[test]
    fn names_parse_back() {
        for c in [Closure::Euler, Closure::NonEq, Closure::UEq, Closure::PUEq, Closure::PTUEq] {
            assert_eq!(c.name().parse::<Closure>().unwrap(), c);
        }
        assert!("Foo".parse::<Closure>().is_err());
    }
}
