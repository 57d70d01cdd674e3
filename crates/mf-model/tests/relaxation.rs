//! Relaxation scenarios and properties.

use mf_core::Vec3;
use mf_eos::{Eos, EosKind};
use mf_model::{
    CellState, Phase, PressureRelaxation, PressureTemperatureRelaxation, RelaxScratch, Relaxation,
    VelocityRelaxation,
};
use proptest::prelude::*;

fn water() -> Eos {
    Eos::from_params(EosKind::StiffenedGas, &[4.4, 6e8, 1816.0, -1.167e6]).unwrap()
}

fn air() -> Eos {
    Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0]).unwrap()
}

fn two_phase(eos: &[Eos], alpha: f64, p1: f64, p2: f64) -> CellState {
    let mut a = Phase::new(alpha, 1000.0, p1, Vec3::zeros());
    let mut b = Phase::new(1.0 - alpha, 1.0, p2, Vec3::zeros());
    a.extend(&eos[0]);
    b.extend(&eos[1]);
    CellState::new(vec![a, b], vec![])
}

#[test]
fn water_air_pressure_relaxation() {
    let eos = vec![water(), air()];
    let mut s = two_phase(&eos, 0.5, 2e5, 1e5);
    PressureRelaxation::default()
        .relax(&mut s, &eos, &mut RelaxScratch::new(2))
        .unwrap();
    let p = s.phases[0].pressure;
    assert!(p > 1e5 && p < 2e5);
    // The stiff liquid barely expands; the gas absorbs it.
    assert!(s.phases[0].alpha > 0.5 && s.phases[0].alpha < 0.5001);
    assert!(s.phases[1].density > 1.0);
}

#[test]
fn pressure_equilibrium_is_left_alone() {
    let eos = vec![water(), air()];
    for relax in [PressureRelaxation::default(), PressureRelaxation::iterative()] {
        let mut s = two_phase(&eos, 0.3, 1e5, 1e5);
        relax.relax(&mut s, &eos, &mut RelaxScratch::new(2)).unwrap();
        for phase in &s.phases {
            assert!((phase.pressure - 1e5).abs() < 1e-9 * 1e5);
        }
        assert!((s.phases[0].alpha - 0.3).abs() < 1e-12);
        assert!((s.alpha_sum() - 1.0).abs() < 1e-12);
    }
}

#[test]
fn velocity_then_pressure_on_non_equilibrium_phases() {
    let eos = vec![water(), air()];
    let mut s = two_phase(&eos, 0.3, 5e5, 1e5);
    s.phases[1].velocity = Vec3::new(50.0, 0.0, 0.0);
    s.phases[1].extend(&eos[1]);
    let total = |s: &CellState| s.phases.iter().map(|p| p.mass() * p.total_energy).sum::<f64>();
    let e0 = total(&s);
    let mut scratch = RelaxScratch::new(2);
    VelocityRelaxation.relax(&mut s, &eos, &mut scratch).unwrap();
    PressureRelaxation::default().relax(&mut s, &eos, &mut scratch).unwrap();
    assert!((total(&s) - e0).abs() < 1e-10 * e0.abs());
    assert_eq!(s.phases[0].velocity, s.phases[1].velocity);
    assert_eq!(s.phases[0].pressure, s.phases[1].pressure);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn pressure_relaxation_properties(alpha in 0.1f64..0.9, p1 in 5e4f64..5e6, p2 in 5e4f64..5e6) {
        let eos = vec![water(), air()];
        let mut s = two_phase(&eos, alpha, p1, p2);
        let masses: Vec<f64> = s.phases.iter().map(|p| p.mass()).collect();
        let e0 = s.internal_energy_density();
        let relax = PressureRelaxation::default();
        let mut scratch = RelaxScratch::new(2);
        relax.relax(&mut s, &eos, &mut scratch).unwrap();

        let p = s.phases[0].pressure;
        let tol = 1e-9 * p1.max(p2);
        prop_assert!(p >= p1.min(p2) - tol && p <= p1.max(p2) + tol);
        prop_assert!((s.alpha_sum() - 1.0).abs() < 1e-12);
        for (k, phase) in s.phases.iter().enumerate() {
            prop_assert!((phase.mass() - masses[k]).abs() <= 1e-12 * masses[k]);
        }
        prop_assert!((s.internal_energy_density() - e0).abs() <= 1e-9 * e0.abs());

        let once = s.clone();
        relax.relax(&mut s, &eos, &mut scratch).unwrap();
        prop_assert_eq!(s, once);
    }

    #[test]
    fn iterative_pressure_relaxation_agrees(alpha in 0.1f64..0.9, p1 in 5e4f64..5e6, p2 in 5e4f64..5e6) {
        let eos = vec![water(), air()];
        let mut exact = two_phase(&eos, alpha, p1, p2);
        let mut newton = exact.clone();
        PressureRelaxation::default().relax(&mut exact, &eos, &mut RelaxScratch::new(2)).unwrap();
        PressureRelaxation::iterative().relax(&mut newton, &eos, &mut RelaxScratch::new(2)).unwrap();
        let (pa, pn) = (exact.phases[0].pressure, newton.phases[0].pressure);
        prop_assert!((pa - pn).abs() <= 1e-6 * pa, "{} vs {}", pa, pn);
    }

    #[test]
    fn pt_relaxation_properties(alpha in 0.1f64..0.9, p1 in 5e4f64..5e6, p2 in 5e4f64..5e6) {
        let eos = vec![water(), air()];
        let mut s = two_phase(&eos, alpha, p1, p2);
        let masses: Vec<f64> = s.phases.iter().map(|p| p.mass()).collect();
        let e0 = s.internal_energy_density();
        PressureTemperatureRelaxation::default()
            .relax(&mut s, &eos, &mut RelaxScratch::new(2))
            .unwrap();
        let (t1, t2) = (s.phases[0].temperature, s.phases[1].temperature);
        prop_assert!((t1 - t2).abs() <= 1e-8 * t1);
        for (k, phase) in s.phases.iter().enumerate() {
            prop_assert!((phase.mass() - masses[k]).abs() <= 1e-12 * masses[k]);
        }
        prop_assert!((s.internal_energy_density() - e0).abs() <= 1e-8 * e0.abs());
    }
}
