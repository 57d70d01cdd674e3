//! Conservative buffers: cell increments, face fluxes, working vectors.

use mf_core::{Frame, Vec3};
use mf_eos::Eos;

use crate::cell::Cell;
use crate::closure::Closure;
use crate::error::{ModelError, ModelResult};
use crate::relaxation::pressure_temperature;
use crate::state::{CellState, StateSelector};

/// Slot table of the conservative vector for one closure.
///
/// | closure    | per phase                 | mixture        |
/// |------------|---------------------------|----------------|
/// | Euler      | ρ                         | ρu (3), ρE     |
/// | NonEq      | α, αρ, αρu (3), αρE       | -              |
/// | UEq, PUEq  | α, αρ, αρe                | ρu (3), ρE     |
/// | PTUEq      | αρ                        | ρu (3), ρE     |
///
/// One slot per transported scalar follows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConsLayout {
    closure: Closure,
    n_phases: usize,
    n_transports: usize,
}

impl ConsLayout {
    pub fn new(closure: Closure, n_phases: usize, n_transports: usize) -> Self {
        Self {
            closure,
            n_phases,
            n_transports,
        }
    }

    pub fn closure(&self) -> Closure {
        self.closure
    }

    pub fn n_phases(&self) -> usize {
        self.n_phases
    }

    pub fn n_transports(&self) -> usize {
        self.n_transports
    }

    fn phase_stride(&self) -> usize {
        match self.closure {
            Closure::Euler | Closure::PTUEq => 1,
            Closure::NonEq => 6,
            Closure::UEq | Closure::PUEq => 3,
        }
    }

    fn phase_block(&self) -> usize {
        self.phase_stride() * self.n_phases
    }

    fn mixture_block(&self) -> usize {
        if self.closure == Closure::NonEq { 0 } else { 4 }
    }

    pub fn len(&self) -> usize {
        self.phase_block() + self.mixture_block() + self.n_transports
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn alpha(&self, k: usize) -> Option<usize> {
        match self.closure {
            Closure::NonEq | Closure::UEq | Closure::PUEq => Some(self.phase_stride() * k),
            Closure::Euler | Closure::PTUEq => None,
        }
    }

    /// Partial density αρ of phase `k`.
    pub fn mass(&self, k: usize) -> usize {
        match self.closure {
            Closure::Euler | Closure::PTUEq => k,
            _ => self.phase_stride() * k + 1,
        }
    }

    /// First of three phase momentum slots (NonEq only).
    pub fn phase_momentum(&self, k: usize) -> Option<usize> {
        (self.closure == Closure::NonEq).then(|| 6 * k + 2)
    }

    /// Phase energy: αρE under NonEq, αρe under UEq and PUEq.
    pub fn phase_energy(&self, k: usize) -> Option<usize> {
        match self.closure {
            Closure::NonEq => Some(6 * k + 5),
            Closure::UEq | Closure::PUEq => Some(3 * k + 2),
            Closure::Euler | Closure::PTUEq => None,
        }
    }

    /// First of three mixture momentum slots.
    pub fn momentum(&self) -> Option<usize> {
        (self.closure != Closure::NonEq).then(|| self.phase_block())
    }

    /// Mixture total energy ρE.
    pub fn energy(&self) -> Option<usize> {
        self.momentum().map(|m| m + 3)
    }

    pub fn transport(&self, i: usize) -> usize {
        self.phase_block() + self.mixture_block() + i
    }
}

/// Values only meaningful on a face flux: contact speed, interface
/// pressure and the upwinded volume fractions and transports.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterfaceValues {
    pub s_m: f64,
    pub p_i: f64,
    pub alphas: Vec<f64>,
    pub transports: Vec<f64>,
}

/// A conservative vector laid out by [`ConsLayout`].
///
/// The same type serves as cell increment accumulator, face flux and
/// working vector for building cell states.
#[derive(Clone, Debug, PartialEq)]
pub struct Flux {
    layout: ConsLayout,
    values: Vec<f64>,
    interface: InterfaceValues,
}

impl Flux {
    pub fn new(layout: ConsLayout) -> Self {
        Self {
            layout,
            values: vec![0.0; layout.len()],
            interface: InterfaceValues {
                s_m: 0.0,
                p_i: 0.0,
                alphas: vec![0.0; layout.n_phases()],
                transports: vec![0.0; layout.n_transports()],
            },
        }
    }

    pub fn layout(&self) -> &ConsLayout {
        &self.layout
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn interface(&self) -> &InterfaceValues {
        &self.interface
    }

    pub fn interface_mut(&mut self) -> &mut InterfaceValues {
        &mut self.interface
    }

    pub fn set_to_zero(&mut self) {
        self.values.fill(0.0);
        self.interface.s_m = 0.0;
        self.interface.p_i = 0.0;
        self.interface.alphas.fill(0.0);
        self.interface.transports.fill(0.0);
    }

    pub fn scale(&mut self, factor: f64) {
        self.values.iter_mut().for_each(|v| *v *= factor);
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// self += coef_a · other
    pub fn add_flux(&mut self, other: &Flux, coef_a: f64) {
        debug_assert_eq!(self.layout, other.layout);
        for (v, o) in self.values.iter_mut().zip(&other.values) {
            *v += coef_a * o;
        }
    }

    /// self -= coef_a · other
    pub fn subtract_flux(&mut self, other: &Flux, coef_a: f64) {
        self.add_flux(other, -coef_a);
    }

    /// Non-conservative contribution of `face` to the cell on its right
    /// (the side the normal points into).
    pub fn add_non_cons(&mut self, face: &Flux, coef_a: f64, state: &CellState, frame: &Frame) {
        self.non_cons(face, coef_a, state, frame);
    }

    /// Non-conservative contribution of `face` to the cell on its left.
    pub fn subtract_non_cons(&mut self, face: &Flux, coef_a: f64, state: &CellState, frame: &Frame) {
        self.non_cons(face, -coef_a, state, frame);
    }

    fn non_cons(&mut self, face: &Flux, coef: f64, state: &CellState, frame: &Frame) {
        let l = self.layout;
        let s_m = face.interface.s_m;
        match l.closure {
            Closure::NonEq => {
                let p_i = face.interface.p_i;
                for (k, phase) in state.phases.iter().enumerate() {
                    self.values[6 * k] -= coef * phase.alpha * s_m;
                    let jump = face.interface.alphas[k] - phase.alpha;
                    let push = -coef * p_i * jump;
                    for d in 0..3 {
                        self.values[6 * k + 2 + d] += push * frame.normal[d];
                    }
                    self.values[6 * k + 5] += push * s_m;
                }
            }
            Closure::UEq | Closure::PUEq => {
                for (k, phase) in state.phases.iter().enumerate() {
                    self.values[3 * k] -= coef * phase.alpha * s_m;
                    self.values[3 * k + 2] += coef * phase.alpha * phase.pressure * s_m;
                }
            }
            Closure::Euler | Closure::PTUEq => {}
        }
        for (i, c) in state.transports.iter().enumerate() {
            self.values[l.transport(i)] -= coef * c * s_m;
        }
    }

    /// Load the conservative vector of one of `cell`'s states.
    pub fn set_buffer_flux(&mut self, cell: &Cell, selector: StateSelector) {
        self.build_cons(cell.state(selector));
    }

    /// Conservative vector of a primitive state.
    pub fn build_cons(&mut self, state: &CellState) {
        let l = self.layout;
        self.values.fill(0.0);
        let mix = &state.mixture;
        match l.closure {
            Closure::Euler => {
                let p = &state.phases[0];
                self.values[0] = p.density;
                for d in 0..3 {
                    self.values[1 + d] = p.density * p.velocity[d];
                }
                self.values[4] = p.density * p.total_energy;
            }
            Closure::NonEq => {
                for (k, p) in state.phases.iter().enumerate() {
                    let m = p.mass();
                    self.values[6 * k] = p.alpha;
                    self.values[6 * k + 1] = m;
                    for d in 0..3 {
                        self.values[6 * k + 2 + d] = m * p.velocity[d];
                    }
                    self.values[6 * k + 5] = m * p.total_energy;
                }
            }
            Closure::UEq | Closure::PUEq | Closure::PTUEq => {
                let mut rho = 0.0;
                let mut rho_e = 0.0;
                for (k, p) in state.phases.iter().enumerate() {
                    let m = p.mass();
                    rho += m;
                    rho_e += m * p.energy;
                    if let Some(a) = l.alpha(k) {
                        self.values[a] = p.alpha;
                    }
                    self.values[l.mass(k)] = m;
                    if let Some(e) = l.phase_energy(k) {
                        self.values[e] = m * p.energy;
                    }
                }
                let mom = l.phase_block();
                for d in 0..3 {
                    self.values[mom + d] = rho * mix.velocity[d];
                }
                self.values[mom + 3] = rho_e + 0.5 * rho * mix.velocity.norm_squared();
            }
        }
        for (i, c) in state.transports.iter().enumerate() {
            self.values[l.transport(i)] = *c;
        }
    }

    /// Primitive state from the conservative vector.
    ///
    /// `state` supplies the starting point of iterative inversions and
    /// receives the result; its mixture is refreshed.
    pub fn build_prim(&self, state: &mut CellState, eos: &[Eos]) -> ModelResult<()> {
        let l = self.layout;
        let v = &self.values;
        if !self.is_finite() {
            return Err(ModelError::numerical("non-finite conservative vector"));
        }
        for (i, c) in state.transports.iter_mut().enumerate() {
            *c = v[l.transport(i)];
        }
        match l.closure {
            Closure::Euler => {
                let rho = positive(v[0], "density")?;
                let u = Vec3::new(v[1], v[2], v[3]) / rho;
                let e = v[4] / rho - 0.5 * u.norm_squared();
                let p = &mut state.phases[0];
                p.alpha = 1.0;
                p.density = rho;
                p.velocity = u;
                p.set_energy(&eos[0], e);
            }
            Closure::NonEq => {
                for (k, p) in state.phases.iter_mut().enumerate() {
                    p.alpha = v[6 * k];
                }
                self.normalized_alphas(state)?;
                for (k, p) in state.phases.iter_mut().enumerate() {
                    let m = positive(v[6 * k + 1], "partial density")?;
                    p.density = positive(m / p.alpha, "phase density")?;
                    p.velocity = Vec3::new(v[6 * k + 2], v[6 * k + 3], v[6 * k + 4]) / m;
                    let e = v[6 * k + 5] / m - 0.5 * p.velocity.norm_squared();
                    p.set_energy(&eos[k], e);
                }
            }
            Closure::UEq | Closure::PUEq => {
                for (k, p) in state.phases.iter_mut().enumerate() {
                    p.alpha = v[3 * k];
                }
                self.normalized_alphas(state)?;
                let (rho, u, e_mix) = self.mixture_motion(state.n_phases())?;
                for (k, p) in state.phases.iter_mut().enumerate() {
                    let m = positive(v[3 * k + 1], "partial density")?;
                    p.density = positive(m / p.alpha, "phase density")?;
                    p.velocity = u;
                    p.set_energy(&eos[k], v[3 * k + 2] / m);
                }
                state.refresh_mixture(l.closure);
                // The mixture energy equation is the authoritative budget.
                state.mixture.density = rho;
                state.mixture.energy = e_mix;
                state.mixture.total_energy = e_mix + 0.5 * u.norm_squared();
                return Ok(());
            }
            Closure::PTUEq => {
                let (rho, u, e_mix) = self.mixture_motion(state.n_phases())?;
                let masses: Vec<f64> = (0..l.n_phases()).map(|k| v[k]).collect();
                for m in &masses {
                    positive(*m, "partial density")?;
                }
                let guess = (state.mixture.pressure, state.mixture.temperature);
                let eq = pressure_temperature::solve_equilibrium(&masses, rho * e_mix, eos, guess)?;
                for (k, p) in state.phases.iter_mut().enumerate() {
                    p.density = eq.densities[k];
                    p.alpha = masses[k] / eq.densities[k];
                    p.pressure = eq.pressure;
                    p.velocity = u;
                    p.extend(&eos[k]);
                }
            }
        }
        state.refresh_mixture(l.closure);
        Ok(())
    }

    fn normalized_alphas(&self, state: &mut CellState) -> ModelResult<()> {
        if state.normalize_alphas() {
            Ok(())
        } else {
            Err(ModelError::numerical("volume fractions sum to zero"))
        }
    }

    /// (ρ, u, e) of the mixture from the shared momentum and energy slots.
    fn mixture_motion(&self, n_phases: usize) -> ModelResult<(f64, Vec3, f64)> {
        let l = self.layout;
        let rho: f64 = (0..n_phases).map(|k| self.values[l.mass(k)]).sum();
        let rho = positive(rho, "mixture density")?;
        let mom = l.phase_block();
        let u = Vec3::new(self.values[mom], self.values[mom + 1], self.values[mom + 2]) / rho;
        let e = self.values[mom + 3] / rho - 0.5 * u.norm_squared();
        Ok((rho, u, e))
    }

    /// Conducted heat `q` leaving through the face for phase `k`.
    pub fn add_heat(&mut self, k: usize, q: f64) {
        if let Some(e) = self.layout.phase_energy(k) {
            self.values[e] += q;
        }
        if let Some(e) = self.layout.energy() {
            self.values[e] += q;
        }
    }

    pub fn alpha(&self, k: usize) -> Option<f64> {
        self.layout.alpha(k).map(|i| self.values[i])
    }

    pub fn mass(&self, k: usize) -> f64 {
        self.values[self.layout.mass(k)]
    }

    pub fn total_mass(&self) -> f64 {
        (0..self.layout.n_phases()).map(|k| self.mass(k)).sum()
    }

    /// Mixture momentum, summed over phases under NonEq.
    pub fn momentum(&self) -> Vec3 {
        match self.layout.momentum() {
            Some(m) => Vec3::new(self.values[m], self.values[m + 1], self.values[m + 2]),
            None => (0..self.layout.n_phases())
                .filter_map(|k| self.layout.phase_momentum(k))
                .map(|m| Vec3::new(self.values[m], self.values[m + 1], self.values[m + 2]))
                .sum(),
        }
    }

    /// Mixture total energy, summed over phases under NonEq.
    pub fn total_energy(&self) -> f64 {
        match self.layout.energy() {
            Some(e) => self.values[e],
            None => (0..self.layout.n_phases())
                .filter_map(|k| self.layout.phase_energy(k))
                .map(|e| self.values[e])
                .sum(),
        }
    }

    pub fn transport(&self, i: usize) -> f64 {
        self.values[self.layout.transport(i)]
    }
}

fn positive(v: f64, what: &str) -> ModelResult<f64> {
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(ModelError::numerical(format!("non-positive {what} ({v})")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::Phase;
    use mf_eos::EosKind;

    fn water() -> Eos {
        Eos::from_params(EosKind::StiffenedGas, &[4.4, 6e8, 1816.0, 0.0]).unwrap()
    }

    fn air() -> Eos {
        Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0]).unwrap()
    }

    fn state(closure: Closure, eos: &[Eos]) -> CellState {
        let u = Vec3::new(5.0, -1.0, 0.5);
        let mut a = Phase::new(0.3, 1000.0, 2e5, u);
        let mut b = Phase::new(0.7, 1.2, 2e5, u);
        a.extend(&eos[0]);
        b.extend(&eos[1]);
        let mut s = CellState::new(vec![a, b], vec![0.25]);
        s.refresh_mixture(closure);
        s
    }

    #[test]
    fn layout_lengths() {
        assert_eq!(ConsLayout::new(Closure::Euler, 1, 0).len(), 5);
        assert_eq!(ConsLayout::new(Closure::NonEq, 2, 1).len(), 13);
        assert_eq!(ConsLayout::new(Closure::UEq, 2, 0).len(), 10);
        assert_eq!(ConsLayout::new(Closure::PUEq, 3, 2).len(), 15);
        assert_eq!(ConsLayout::new(Closure::PTUEq, 2, 0).len(), 6);
    }

    #[test]
    fn layout_slots_do_not_overlap() {
        for closure in [Closure::NonEq, Closure::UEq, Closure::PTUEq] {
            let l = ConsLayout::new(closure, 3, 2);
            let mut used = vec![false; l.len()];
            let mut mark = |i: usize| {
                assert!(!used[i], "{closure:?} slot {i} used twice");
                used[i] = true;
            };
            for k in 0..3 {
                l.alpha(k).into_iter().for_each(&mut mark);
                mark(l.mass(k));
                if let Some(m) = l.phase_momentum(k) {
                    (m..m + 3).for_each(&mut mark);
                }
                l.phase_energy(k).into_iter().for_each(&mut mark);
            }
            if let Some(m) = l.momentum() {
                (m..m + 4).for_each(&mut mark);
            }
            (0..2).map(|i| l.transport(i)).for_each(&mut mark);
            assert!(used.iter().all(|u| *u), "{closure:?} leaves a slot unused");
        }
    }

    #[test]
    fn build_prim_recovers_shared_velocity_state() {
        let eos = vec![water(), air()];
        for closure in [Closure::UEq, Closure::PUEq, Closure::NonEq] {
            let original = state(closure, &eos);
            let mut flux = Flux::new(ConsLayout::new(closure, 2, 1));
            flux.build_cons(&original);
            let mut rebuilt = original.clone();
            rebuilt.phases.iter_mut().for_each(|p| p.pressure = 0.0);
            flux.build_prim(&mut rebuilt, &eos).unwrap();
            for (a, b) in original.phases.iter().zip(&rebuilt.phases) {
                assert!((a.alpha - b.alpha).abs() < 1e-14);
                assert!((a.density - b.density).abs() < 1e-9 * a.density);
                assert!((a.pressure - b.pressure).abs() < 1e-6 * a.pressure, "{closure:?}");
                assert!((a.velocity - b.velocity).norm() < 1e-12);
            }
            assert_eq!(rebuilt.transports, vec![0.25]);
        }
    }

    #[test]
    fn non_cons_terms_cancel_across_a_face() {
        let eos = vec![water(), air()];
        let frame = Frame::x_axis();
        for closure in [Closure::NonEq, Closure::UEq] {
            let layout = ConsLayout::new(closure, 2, 1);
            let left = state(closure, &eos);
            let mut face = Flux::new(layout);
            face.interface_mut().s_m = 2.0;
            face.interface_mut().p_i = 2e5;
            face.interface_mut().alphas = vec![0.3, 0.7];
            let mut l = Flux::new(layout);
            let mut r = Flux::new(layout);
            l.subtract_non_cons(&face, 0.1, &left, &frame);
            r.add_non_cons(&face, 0.1, &left, &frame);
            for (a, b) in l.values().iter().zip(r.values()) {
                assert!((a + b).abs() < 1e-12);
            }
            // Equal face and cell fractions exert no interface force.
            assert!(l.momentum().norm() < 1e-12);
            assert!(l.total_energy().abs() < 1e-12);
        }
    }

    #[test]
    fn add_heat_feeds_phase_and_mixture_energy() {
        let mut f = Flux::new(ConsLayout::new(Closure::UEq, 2, 0));
        f.add_heat(1, 3.0);
        assert_eq!(f.values()[5], 3.0);
        assert_eq!(f.total_energy(), 3.0);
    }

    #[test]
    fn build_prim_rejects_negative_mass() {
        let eos = vec![air()];
        let mut f = Flux::new(ConsLayout::new(Closure::Euler, 1, 0));
        f.values_mut()[0] = -1.0;
        let mut s = CellState::new(vec![Phase::zeroed()], vec![]);
        let err = f.build_prim(&mut s, &eos).unwrap_err();
        assert_eq!(err.category(), crate::error::ErrorCategory::Numerical);
    }
}
