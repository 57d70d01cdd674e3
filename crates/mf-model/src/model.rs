//! The flow model: closure, phase laws and relaxation list.

use mf_core::{CellId, Vec3, ensure_positive, timing};
use mf_eos::{Eos, EquationOfState};
use tracing::debug;

use crate::cell::Cell;
use crate::closure::Closure;
use crate::error::{ModelError, ModelResult};
use crate::flux::{ConsLayout, Flux};
use crate::gradient::{CellGradients, GradientSchema};
use crate::mixture::Mixture;
use crate::numerics::NewtonConfig;
use crate::phase::Phase;
use crate::quantity::{self, Quantity, Scope};
use crate::relaxation::{Relaxation, RelaxationKind, RelaxScratch, energy};
use crate::state::{CellState, StateSelector};

/// Volume fractions must sum to one within this tolerance.
const ALPHA_SUM_TOL: f64 = 1e-8;

/// Immutable after construction and shared read-only by all workers.
#[derive(Debug)]
pub struct Model {
    closure: Closure,
    eos: Vec<Eos>,
    relaxations: Vec<Box<dyn Relaxation>>,
    layout: ConsLayout,
    schema: GradientSchema,
    newton: NewtonConfig,
}

impl Model {
    /// Model with default Newton settings and closed-form relaxations where
    /// the laws allow them.
    pub fn new(
        closure: Closure,
        eos: Vec<Eos>,
        relaxations: &[RelaxationKind],
        n_transports: usize,
    ) -> ModelResult<Self> {
        Self::with_options(closure, eos, relaxations, n_transports, NewtonConfig::default(), false)
    }

    pub fn with_options(
        closure: Closure,
        eos: Vec<Eos>,
        relaxations: &[RelaxationKind],
        n_transports: usize,
        newton: NewtonConfig,
        force_iterative: bool,
    ) -> ModelResult<Self> {
        let n = eos.len();
        if !closure.accepts_phase_count(n) {
            return Err(ModelError::configuration(format!(
                "{closure} does not accept {n} phase(s)"
            )));
        }
        for kind in relaxations {
            if !closure.allows_relaxation(*kind) {
                return Err(ModelError::configuration(format!(
                    "{} relaxation is not compatible with {closure}",
                    kind.name()
                )));
            }
        }
        let mut kinds: Vec<RelaxationKind> = closure.mandatory_relaxations().to_vec();
        for kind in relaxations {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }
        debug!(
            closure = closure.name(),
            phases = n,
            transports = n_transports,
            relaxations = ?kinds,
            "flow model configured"
        );
        Ok(Self {
            closure,
            relaxations: kinds.iter().map(|k| k.build(&newton, force_iterative)).collect(),
            layout: ConsLayout::new(closure, n, n_transports),
            schema: GradientSchema::new(closure, n, n_transports),
            eos,
            newton,
        })
    }

    pub fn closure(&self) -> Closure {
        self.closure
    }

    pub fn n_phases(&self) -> usize {
        self.eos.len()
    }

    pub fn n_transports(&self) -> usize {
        self.layout.n_transports()
    }

    pub fn eos(&self) -> &[Eos] {
        &self.eos
    }

    pub fn layout(&self) -> &ConsLayout {
        &self.layout
    }

    pub fn gradient_schema(&self) -> &GradientSchema {
        &self.schema
    }

    pub fn relaxation_kinds(&self) -> Vec<RelaxationKind> {
        self.relaxations.iter().map(|r| r.kind()).collect()
    }

    /// Zeroed phase `index`; the index must name one of the model's phases.
    pub fn allocate_phase(&self, index: usize) -> ModelResult<Phase> {
        if index >= self.n_phases() {
            return Err(ModelError::configuration(format!(
                "phase {index} requested from a model with {} phase(s)",
                self.n_phases()
            )));
        }
        Ok(Phase::zeroed())
    }

    /// Zeroed mixture for a state holding `count` phases.
    pub fn allocate_mixture(&self, count: usize) -> ModelResult<Mixture> {
        self.check_phase_count(count)?;
        Ok(Mixture::zeroed())
    }

    pub fn allocate_flux(&self) -> Flux {
        Flux::new(self.layout)
    }

    pub fn allocate_gradients(&self) -> CellGradients {
        CellGradients::new(&self.schema)
    }

    pub fn allocate_scratch(&self) -> RelaxScratch {
        RelaxScratch::new(self.n_phases())
    }

    /// `count` zeroed phases; `count` must match the model.
    pub fn allocate_phases(&self, count: usize) -> ModelResult<Vec<Phase>> {
        self.check_phase_count(count)?;
        Ok(vec![Phase::zeroed(); count])
    }

    pub fn allocate_state(&self) -> CellState {
        CellState::new(vec![Phase::zeroed(); self.n_phases()], vec![0.0; self.n_transports()])
    }

    pub fn allocate_cell(
        &self,
        id: CellId,
        position: Vec3,
        volume: f64,
        length_scale: f64,
        state: CellState,
    ) -> ModelResult<Cell> {
        self.check_shape(&state)?;
        ensure_positive(volume, "cell volume")
            .and_then(|_| ensure_positive(length_scale, "cell size"))
            .map_err(|err| ModelError::configuration(format!("cell {id}: {err}")))?;
        Ok(Cell::new(
            id,
            position,
            volume,
            length_scale,
            state,
            self.allocate_flux(),
            self.allocate_gradients(),
        ))
    }

    fn check_phase_count(&self, count: usize) -> ModelResult<()> {
        if count == self.n_phases() {
            Ok(())
        } else {
            Err(ModelError::configuration(format!(
                "expected {} phase(s), got {count}",
                self.n_phases()
            )))
        }
    }

    fn check_shape(&self, state: &CellState) -> ModelResult<()> {
        self.check_phase_count(state.n_phases())?;
        if state.transports.len() != self.n_transports() {
            return Err(ModelError::configuration(format!(
                "expected {} transport(s), got {}",
                self.n_transports(),
                state.transports.len()
            )));
        }
        Ok(())
    }

    /// Named scalar of a state, e.g. `(Quantity::Pressure, Scope::Phase(1))`.
    pub fn select_scalar(&self, state: &CellState, quantity: Quantity, scope: Scope) -> ModelResult<f64> {
        quantity::read(state, quantity, scope).ok_or_else(|| {
            ModelError::configuration(format!("{} is not available in {scope:?}", quantity.name()))
        })
    }

    pub fn update_mixture(&self, state: &mut CellState) {
        state.refresh_mixture(self.closure);
    }

    /// Complete state from user-supplied primary phase variables
    /// (α, ρ, p, u) and transports, relaxed to the closure's equilibrium.
    pub fn build_state(&self, phases: Vec<Phase>, transports: Vec<f64>) -> ModelResult<CellState> {
        let mut state = CellState::new(phases, transports);
        self.check_shape(&state)?;
        let sum = state.alpha_sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ModelError::configuration(format!(
                "volume fractions sum to {sum}, expected 1"
            )));
        }
        state.normalize_alphas();
        if self.closure.shares_velocity() {
            let u = state.phases[0].velocity;
            if state.phases.iter().any(|p| (p.velocity - u).norm() > 1e-12 * u.norm().max(1.0)) {
                return Err(ModelError::configuration(format!(
                    "phase velocities differ under {}",
                    self.closure
                )));
            }
        }
        for (phase, eos) in state.phases.iter_mut().zip(&self.eos) {
            phase.check(eos)?;
            phase.extend(eos);
        }
        self.update_mixture(&mut state);
        self.relax_state(&mut state, &mut self.allocate_scratch())?;
        self.check_state(&state)?;
        Ok(state)
    }

    /// Recompute every derived quantity of a state restored from the
    /// persisted primary variables (α, ρ, p, u per phase, transports).
    pub fn fulfill_state_resume(&self, state: &mut CellState) -> ModelResult<()> {
        self.check_shape(state)?;
        for (phase, eos) in state.phases.iter_mut().zip(&self.eos) {
            phase.extend(eos);
        }
        self.update_mixture(state);
        self.check_state(state)
    }

    /// Finish a state whose primary slots were extrapolated to a face.
    ///
    /// Fails when the extrapolated state is not admissible; callers fall
    /// back to the first-order state.
    pub fn complete_reconstruction(&self, state: &mut CellState) -> ModelResult<()> {
        if !state.normalize_alphas() {
            return Err(ModelError::numerical("reconstructed volume fractions vanish"));
        }
        let mix = state.mixture.clone();
        match self.closure {
            Closure::Euler | Closure::NonEq => {}
            Closure::UEq => {
                for p in &mut state.phases {
                    p.velocity = mix.velocity;
                }
            }
            Closure::PUEq => {
                for p in &mut state.phases {
                    p.velocity = mix.velocity;
                    p.pressure = mix.pressure;
                }
            }
            Closure::PTUEq => {
                for (p, eos) in state.phases.iter_mut().zip(&self.eos) {
                    p.velocity = mix.velocity;
                    p.pressure = mix.pressure;
                    p.density = eos.density_from_pt(mix.pressure, mix.temperature)?;
                }
            }
        }
        for (phase, eos) in state.phases.iter_mut().zip(&self.eos) {
            phase.check(eos)?;
            phase.extend(eos);
        }
        self.update_mixture(state);
        Ok(())
    }

    /// Run the relaxation list on one of a cell's states.
    pub fn apply_relaxations(
        &self,
        cell: &mut Cell,
        selector: StateSelector,
        scratch: &mut RelaxScratch,
    ) -> ModelResult<()> {
        let id = cell.id();
        self.relax_state(cell.state_mut(selector), scratch)
            .map_err(|e| e.at(id))
    }

    /// Relaxations, then (shared velocity only) the total-energy correction,
    /// then the mixture refresh.
    pub fn relax_state(&self, state: &mut CellState, scratch: &mut RelaxScratch) -> ModelResult<()> {
        if self.relaxations.is_empty() {
            return Ok(());
        }
        let _timer = timing::stage(&timing::step_timing::RELAXATIONS);
        let budget = state.mixture.density * state.mixture.energy;
        for relaxation in &self.relaxations {
            relaxation.relax(state, &self.eos, scratch)?;
        }
        if matches!(self.closure, Closure::UEq | Closure::PUEq) {
            let kinds = self.relaxation_kinds();
            if kinds.contains(&RelaxationKind::PressureTemperature) {
                energy::correct_pressure_temperature(state, &self.eos, budget)?;
            } else if kinds.contains(&RelaxationKind::Pressure) {
                energy::correct_pressure(state, &self.eos, budget, &self.newton)?;
            }
        }
        self.update_mixture(state);
        Ok(())
    }

    /// Admissibility of every phase plus Σ α = 1.
    pub fn check_state(&self, state: &CellState) -> ModelResult<()> {
        for (k, (phase, eos)) in state.phases.iter().zip(&self.eos).enumerate() {
            phase
                .check(eos)
                .map_err(|e| ModelError::numerical(format!("phase {k}: {e}")))?;
        }
        let sum = state.alpha_sum();
        if (sum - 1.0).abs() > ALPHA_SUM_TOL {
            return Err(ModelError::numerical(format!("volume fractions sum to {sum}")));
        }
        if !state.transports.iter().all(|c| c.is_finite()) {
            return Err(ModelError::numerical("non-finite transported scalar"));
        }
        Ok(())
    }

    /// Largest |u| + c of a state, for the CFL condition.
    pub fn max_wave_speed(&self, state: &CellState) -> f64 {
        state.max_signal_speed()
    }

    /// Close a stage: U(`target`) = U(`base`) + accumulated increments,
    /// inverted, relaxed and checked.
    pub fn commit(
        &self,
        cell: &mut Cell,
        base: StateSelector,
        target: StateSelector,
        scratch: &mut RelaxScratch,
    ) -> ModelResult<()> {
        let id = cell.id();
        let mut cons = self.allocate_flux();
        cons.build_cons(cell.state(base));
        cons.add_flux(&cell.cons, 1.0);
        cell.copy_state(base, target);
        self.finish(cell, &cons, target, scratch).map_err(|e| e.at(id))
    }

    /// Second-order (Heun) average: U(Current) = ½ (U(Current) + U(Intermediate)).
    pub fn average_stages(&self, cell: &mut Cell, scratch: &mut RelaxScratch) -> ModelResult<()> {
        let id = cell.id();
        let mut cons = self.allocate_flux();
        cons.build_cons(cell.state(StateSelector::Current));
        let mut predicted = self.allocate_flux();
        predicted.build_cons(cell.state(StateSelector::Intermediate));
        cons.scale(0.5);
        cons.add_flux(&predicted, 0.5);
        self.finish(cell, &cons, StateSelector::Current, scratch)
            .map_err(|e| e.at(id))
    }

    fn finish(&self, cell: &mut Cell, cons: &Flux, target: StateSelector, scratch: &mut RelaxScratch) -> ModelResult<()> {
        let state = cell.state_mut(target);
        cons.build_prim(state, &self.eos)?;
        self.relax_state(state, scratch)?;
        self.check_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;
    use mf_eos::EosKind;

    fn water() -> Eos {
        Eos::from_params(EosKind::StiffenedGas, &[4.4, 6e8, 1816.0, 0.0]).unwrap()
    }

    fn air() -> Eos {
        Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0]).unwrap()
    }

    #[test]
    fn configuration_errors() {
        let err = Model::new(Closure::Euler, vec![air(), air()], &[], 0).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        let err = Model::new(Closure::UEq, vec![water(), air()], &[RelaxationKind::Velocity], 0).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        let model = Model::new(Closure::UEq, vec![water(), air()], &[], 0).unwrap();
        assert!(model.allocate_phases(3).is_err());
        assert_eq!(model.allocate_phases(2).unwrap().len(), 2);
    }

    #[test]
    fn single_allocations_check_the_phase_count() {
        let model = Model::new(Closure::UEq, vec![water(), air()], &[], 0).unwrap();
        assert_eq!(model.allocate_phase(1).unwrap(), Phase::zeroed());
        let err = model.allocate_phase(2).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(model.allocate_mixture(2).is_ok());
        let err = model.allocate_mixture(3).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(model.allocate_flux().values().len(), model.layout().len());
    }

    #[test]
    fn cells_need_positive_geometry() {
        let model = Model::new(Closure::Euler, vec![air()], &[], 0).unwrap();
        let id = CellId::from_index(0);
        let err = model
            .allocate_cell(id, Vec3::zeros(), 0.0, 1.0, model.allocate_state())
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.to_string().contains("cell volume"));
        assert!(model.allocate_cell(id, Vec3::zeros(), 1.0, f64::NAN, model.allocate_state()).is_err());
        assert!(model.allocate_cell(id, Vec3::zeros(), 1.0, 1.0, model.allocate_state()).is_ok());
    }

    #[test]
    fn mandatory_relaxations_are_added() {
        let model = Model::new(Closure::PUEq, vec![water(), air()], &[], 0).unwrap();
        assert_eq!(model.relaxation_kinds(), vec![RelaxationKind::Pressure]);
        let model = Model::new(
            Closure::PUEq,
            vec![water(), air()],
            &[RelaxationKind::PressureTemperature, RelaxationKind::Pressure],
            0,
        )
        .unwrap();
        assert_eq!(
            model.relaxation_kinds(),
            vec![RelaxationKind::Pressure, RelaxationKind::PressureTemperature]
        );
    }

    #[test]
    fn select_scalar_by_scope() {
        let model = Model::new(Closure::UEq, vec![water(), air()], &[], 1).unwrap();
        let u = Vec3::new(1.0, 2.0, 3.0);
        let state = model
            .build_state(
                vec![Phase::new(0.25, 1000.0, 2e5, u), Phase::new(0.75, 1.0, 1e5, u)],
                vec![0.5],
            )
            .unwrap();
        assert_eq!(model.select_scalar(&state, Quantity::Pressure, Scope::Phase(1)).unwrap(), 1e5);
        assert_eq!(model.select_scalar(&state, Quantity::VelocityV, Scope::Mixture).unwrap(), 2.0);
        assert_eq!(model.select_scalar(&state, Quantity::Transport(0), Scope::Mixture).unwrap(), 0.5);
        assert!(model.select_scalar(&state, Quantity::Alpha, Scope::Mixture).is_err());
        assert!(model.select_scalar(&state, Quantity::Density, Scope::Phase(4)).is_err());
    }

    #[test]
    fn build_state_relaxes_pressure_for_pueq() {
        let model = Model::new(Closure::PUEq, vec![water(), air()], &[], 0).unwrap();
        let state = model
            .build_state(
                vec![Phase::new(0.5, 1000.0, 2e5, Vec3::zeros()), Phase::new(0.5, 1.0, 1e5, Vec3::zeros())],
                vec![],
            )
            .unwrap();
        assert_eq!(state.phases[0].pressure, state.phases[1].pressure);
        assert!((state.mixture.pressure - state.phases[0].pressure).abs() < 1e-9 * state.mixture.pressure);
    }

    #[test]
    fn build_state_rejects_bad_fractions() {
        let model = Model::new(Closure::UEq, vec![water(), air()], &[], 0).unwrap();
        let err = model
            .build_state(
                vec![Phase::new(0.5, 1000.0, 1e5, Vec3::zeros()), Phase::new(0.6, 1.0, 1e5, Vec3::zeros())],
                vec![],
            )
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn commit_with_zero_increment_keeps_the_state() {
        let model = Model::new(Closure::PTUEq, vec![water(), air()], &[], 0).unwrap();
        let state = model
            .build_state(
                vec![Phase::new(0.5, 1000.0, 1e5, Vec3::zeros()), Phase::new(0.5, 1.0, 1e5, Vec3::zeros())],
                vec![],
            )
            .unwrap();
        let mut cell = model
            .allocate_cell(CellId::from_index(0), Vec3::zeros(), 1.0, 1.0, state.clone())
            .unwrap();
        let mut scratch = model.allocate_scratch();
        model
            .commit(&mut cell, StateSelector::Current, StateSelector::Intermediate, &mut scratch)
            .unwrap();
        let s = cell.state(StateSelector::Intermediate);
        assert!((s.mixture.pressure - state.mixture.pressure).abs() < 1e-6 * state.mixture.pressure);
        assert!((s.mixture.temperature - state.mixture.temperature).abs() < 1e-9 * state.mixture.temperature);
        assert!((s.phases[0].alpha - state.phases[0].alpha).abs() < 1e-10);
    }

    #[test]
    fn numerical_errors_carry_the_cell() {
        let model = Model::new(Closure::Euler, vec![air()], &[], 0).unwrap();
        let state = model
            .build_state(vec![Phase::new(1.0, 1.0, 1e5, Vec3::zeros())], vec![])
            .unwrap();
        let mut cell = model
            .allocate_cell(CellId::from_index(12), Vec3::zeros(), 1.0, 1.0, state)
            .unwrap();
        cell.cons.values_mut()[0] = -10.0;
        let err = model
            .commit(&mut cell, StateSelector::Current, StateSelector::Current, &mut model.allocate_scratch())
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Numerical);
        assert!(err.to_string().contains("at cell 12"));
    }
}
