//! Case file schema definitions.

use mf_eos::EosKind;
use mf_model::{Closure, LimiterKind, RelaxationKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaseDef {
    pub version: u32,
    pub name: String,
    pub model: Closure,
    #[serde(default)]
    pub relaxations: Vec<RelaxationKind>,
    #[serde(default)]
    pub transports: usize,
    #[serde(default)]
    pub additional_physics: Vec<PhysicsDef>,
    pub phases: Vec<PhaseDef>,
    #[serde(default)]
    pub numerics: NumericsDef,
    pub mesh: MeshDef,
    pub regions: Vec<RegionDef>,
    pub boundaries: BoundariesDef,
    pub run: RunDef,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PhysicsDef {
    Conductivity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseDef {
    pub name: String,
    pub eos: EosDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EosDef {
    pub kind: EosKind,
    /// Positional law parameters, e.g. `[gamma, p_inf, cv, e_ref]` for a
    /// stiffened gas.
    pub params: Vec<f64>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub conductivity: f64,
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderDef {
    First,
    #[default]
    Second,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NumericsDef {
    #[serde(default = "default_cfl")]
    pub cfl: f64,
    #[serde(default)]
    pub order: OrderDef,
    #[serde(default)]
    pub limiter: LimiterKind,
    /// Use the Newton relaxations even where a closed form exists.
    #[serde(default)]
    pub iterative_relaxations: bool,
}

fn default_cfl() -> f64 {
    0.8
}

impl Default for NumericsDef {
    fn default() -> Self {
        Self {
            cfl: default_cfl(),
            order: OrderDef::default(),
            limiter: LimiterKind::default(),
            iterative_relaxations: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeshDef {
    pub cells: usize,
    pub length: f64,
}

/// Initial condition on `x_min <= x < x_max`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionDef {
    pub x_min: f64,
    pub x_max: f64,
    pub phases: Vec<PhaseStateDef>,
    #[serde(default)]
    pub transports: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseStateDef {
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    pub density: f64,
    pub pressure: f64,
    #[serde(default)]
    pub velocity: [f64; 3],
}

fn default_alpha() -> f64 {
    1.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum BoundaryDef {
    Wall,
    Symmetry,
    NonReflecting,
    InletStagnation { p0: f64, t0: f64 },
    OutletPressure { p: f64 },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundariesDef {
    pub left: BoundaryDef,
    pub right: BoundaryDef,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunDef {
    pub final_time: f64,
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    #[serde(default = "default_record_every")]
    pub record_every: usize,
}

fn default_max_steps() -> usize {
    100_000
}

fn default_record_every() -> usize {
    100
}
