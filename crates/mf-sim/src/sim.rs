//! Simulation runner and result recording.

use mf_core::Vec3;
use tracing::{debug, info};

use crate::error::{SimError, SimResult};
use crate::mesh::Mesh;
use crate::stepper::Stepper;

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Final simulation time (seconds)
    pub t_end: f64,
    /// Maximum number of steps (safety limit)
    pub max_steps: usize,
    /// Record every N-th step (decimation)
    pub record_every: usize,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            t_end: 1.0e-3,
            max_steps: 100_000,
            record_every: 10,
        }
    }
}

/// Mixture quantities of one cell at a recorded time.
#[derive(Clone, Debug, PartialEq)]
pub struct CellSample {
    pub position: Vec3,
    pub density: f64,
    pub pressure: f64,
    pub velocity: Vec3,
    pub temperature: f64,
    pub alphas: Vec<f64>,
    pub transports: Vec<f64>,
}

/// Record of simulation results.
#[derive(Clone, Debug, Default)]
pub struct SimRecord {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// One sample per cell at each time point
    pub snapshots: Vec<Vec<CellSample>>,
    /// Steps taken
    pub steps: usize,
}

impl SimRecord {
    pub fn last(&self) -> Option<(f64, &[CellSample])> {
        Some((*self.t.last()?, self.snapshots.last()?.as_slice()))
    }
}

/// Progress reported after every step.
#[derive(Clone, Copy, Debug)]
pub struct SimProgress {
    pub step: usize,
    pub t: f64,
    pub dt: f64,
    pub t_end: f64,
}

fn snapshot(mesh: &Mesh) -> Vec<CellSample> {
    mesh.cells
        .iter()
        .map(|cell| {
            let mix = &cell.state.mixture;
            CellSample {
                position: cell.position,
                density: mix.density,
                pressure: mix.pressure,
                velocity: mix.velocity,
                temperature: mix.temperature,
                alphas: cell.state.phases.iter().map(|p| p.alpha).collect(),
                transports: cell.state.transports.clone(),
            }
        })
        .collect()
}

/// Run until `t_end` with CFL-limited steps.
pub fn run_sim(stepper: &Stepper, mesh: &mut Mesh, opts: &SimOptions) -> SimResult<SimRecord> {
    run_sim_with_progress(stepper, mesh, opts, |_| {})
}

pub fn run_sim_with_progress<F>(
    stepper: &Stepper,
    mesh: &mut Mesh,
    opts: &SimOptions,
    mut progress: F,
) -> SimResult<SimRecord>
where
    F: FnMut(SimProgress),
{
    if !opts.t_end.is_finite() || opts.t_end < 0.0 {
        return Err(SimError::invalid("t_end must be non-negative"));
    }
    if opts.max_steps == 0 {
        return Err(SimError::invalid("max_steps must be positive"));
    }
    if opts.record_every == 0 {
        return Err(SimError::invalid("record_every must be positive"));
    }

    info!(
        closure = %stepper.model().closure(),
        cells = mesh.n_cells(),
        t_end = opts.t_end,
        "starting simulation"
    );

    let mut record = SimRecord {
        t: vec![0.0],
        snapshots: vec![snapshot(mesh)],
        steps: 0,
    };
    let mut t = 0.0;
    let mut step = 0;
    while t < opts.t_end && step < opts.max_steps {
        let dt = stepper.compute_time_step(mesh)?.min(opts.t_end - t);
        stepper.step(mesh, dt)?;
        t += dt;
        step += 1;
        debug!(step, t, dt, "step done");
        progress(SimProgress {
            step,
            t,
            dt,
            t_end: opts.t_end,
        });

        if step % opts.record_every == 0 {
            record.t.push(t);
            record.snapshots.push(snapshot(mesh));
        }
    }

    // Always record final state
    if step % opts.record_every != 0 {
        record.t.push(t);
        record.snapshots.push(snapshot(mesh));
    }
    record.steps = step;

    info!(steps = step, t, "simulation finished");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryKind;
    use crate::stepper::StepperOptions;
    use mf_eos::{Eos, EosKind};
    use mf_model::{Closure, Model, Phase};

    fn setup() -> (Stepper, Mesh) {
        let eos = Eos::from_params(EosKind::IdealGas, &[1.4, 717.5, 0.0]).unwrap();
        let model = Model::new(Closure::Euler, vec![eos], &[], 0).unwrap();
        let mesh = Mesh::line(&model, 10, 1.0, BoundaryKind::Wall, BoundaryKind::Wall, |_| {
            model.build_state(vec![Phase::new(1.0, 1.2, 1.0e5, Vec3::zeros())], vec![])
        })
        .unwrap();
        (Stepper::new(model, StepperOptions::default()).unwrap(), mesh)
    }

    #[test]
    fn sim_options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.max_steps, 100_000);
        assert_eq!(opts.record_every, 10);
    }

    #[test]
    fn invalid_options_are_rejected() {
        let (stepper, mut mesh) = setup();
        let opts = SimOptions {
            max_steps: 0,
            ..SimOptions::default()
        };
        assert!(run_sim(&stepper, &mut mesh, &opts).is_err());
    }

    #[test]
    fn reaches_end_time_and_records_final_state() {
        let (stepper, mut mesh) = setup();
        let opts = SimOptions {
            t_end: 1.0e-4,
            max_steps: 1000,
            record_every: 3,
        };
        let mut calls = 0;
        let record = run_sim_with_progress(&stepper, &mut mesh, &opts, |_| calls += 1).unwrap();
        let (t, cells) = record.last().unwrap();
        assert!((t - 1.0e-4).abs() < 1e-15);
        assert_eq!(cells.len(), 10);
        assert_eq!(calls, record.steps);
        assert_eq!(record.t.len(), record.snapshots.len());
    }
}
