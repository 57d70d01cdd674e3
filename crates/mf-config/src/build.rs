//! Conversion of a validated case into model, mesh and stepper.

use mf_core::Vec3;
use mf_eos::Eos;
use mf_model::{CellState, Model, ModelError, ModelResult, NewtonConfig, Phase};
use mf_sim::{BoundaryKind, Conductivity, IntegratorType, Mesh, SimOptions, Stepper, StepperOptions};

use crate::ConfigResult;
use crate::schema::{BoundaryDef, CaseDef, OrderDef, PhysicsDef, RegionDef};

impl From<BoundaryDef> for BoundaryKind {
    fn from(def: BoundaryDef) -> Self {
        match def {
            BoundaryDef::Wall => BoundaryKind::Wall,
            BoundaryDef::Symmetry => BoundaryKind::Symmetry,
            BoundaryDef::NonReflecting => BoundaryKind::NonReflecting,
            BoundaryDef::InletStagnation { p0, t0 } => BoundaryKind::InletStagnation { p0, t0 },
            BoundaryDef::OutletPressure { p } => BoundaryKind::OutletPressure { p },
        }
    }
}

impl From<OrderDef> for IntegratorType {
    fn from(order: OrderDef) -> Self {
        match order {
            OrderDef::First => IntegratorType::ForwardEuler,
            OrderDef::Second => IntegratorType::Heun,
        }
    }
}

impl CaseDef {
    /// Flow model with one law per phase; law arity is checked here.
    pub fn into_model(&self) -> ConfigResult<Model> {
        let eos = self
            .phases
            .iter()
            .map(|phase| {
                let law = Eos::from_params(phase.eos.kind, &phase.eos.params)?;
                if phase.eos.conductivity > 0.0 {
                    law.with_conductivity(phase.eos.conductivity)
                } else {
                    Ok(law)
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(ModelError::from)?;
        let model = Model::with_options(
            self.model,
            eos,
            &self.relaxations,
            self.transports,
            NewtonConfig::default(),
            self.numerics.iterative_relaxations,
        )?;
        Ok(model)
    }

    /// Line mesh initialised from the regions; the first region holding a
    /// cell centre wins.
    pub fn into_mesh(&self, model: &Model) -> ConfigResult<Mesh> {
        let mesh = Mesh::line(
            model,
            self.mesh.cells,
            self.mesh.length,
            self.boundaries.left.into(),
            self.boundaries.right.into(),
            |x| {
                let region = self
                    .regions
                    .iter()
                    .find(|r| x >= r.x_min && x < r.x_max)
                    .ok_or_else(|| ModelError::configuration(format!("no region covers x = {x}")))?;
                region_state(model, region)
            },
        )?;
        Ok(mesh)
    }

    pub fn into_stepper(&self, model: Model) -> ConfigResult<Stepper> {
        let options = StepperOptions {
            cfl: self.numerics.cfl,
            integrator: self.numerics.order.into(),
            limiter: self.numerics.limiter,
        };
        let physics = self
            .additional_physics
            .iter()
            .map(|p| match p {
                PhysicsDef::Conductivity => Conductivity::new(&model),
            })
            .collect::<ModelResult<Vec<_>>>()?;
        let mut stepper = Stepper::new(model, options)?;
        for p in physics {
            stepper = stepper.with_physics(Box::new(p));
        }
        Ok(stepper)
    }

    pub fn sim_options(&self) -> SimOptions {
        SimOptions {
            t_end: self.run.final_time,
            max_steps: self.run.max_steps,
            record_every: self.run.record_every,
        }
    }

    /// Stepper and initial mesh, ready for `run_sim`.
    pub fn prepare(&self) -> ConfigResult<(Stepper, Mesh)> {
        let model = self.into_model()?;
        let mesh = self.into_mesh(&model)?;
        Ok((self.into_stepper(model)?, mesh))
    }
}

fn region_state(model: &Model, region: &RegionDef) -> ModelResult<CellState> {
    let phases = region
        .phases
        .iter()
        .map(|p| {
            let [u, v, w] = p.velocity;
            Phase::new(p.alpha, p.density, p.pressure, Vec3::new(u, v, w))
        })
        .collect();
    model.build_state(phases, region.transports.clone())
}
