//! Case validation logic.

use std::collections::HashSet;

use crate::schema::{BoundaryDef, CaseDef, PhysicsDef, RegionDef};

pub const LATEST_VERSION: u32 = 1;

const ALPHA_SUM_TOL: f64 = 1e-6;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate name: {name} in {context}")]
    DuplicateName { name: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(field, value, "must be positive and finite"));
    }
    Ok(())
}

pub fn validate_case(case: &CaseDef) -> Result<(), ValidationError> {
    if case.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: case.version,
        });
    }

    let n_phases = case.phases.len();
    if !case.model.accepts_phase_count(n_phases) {
        return Err(invalid(
            "phases",
            n_phases,
            &format!("{} does not accept this phase count", case.model),
        ));
    }

    let mut names = HashSet::new();
    for phase in &case.phases {
        if !names.insert(&phase.name) {
            return Err(ValidationError::DuplicateName {
                name: phase.name.clone(),
                context: "phases".to_string(),
            });
        }
        let arity = phase.eos.kind.arity();
        if phase.eos.params.len() != arity {
            return Err(invalid(
                format!("phase '{}' eos params", phase.name),
                phase.eos.params.len(),
                &format!("{:?} takes {arity} parameters", phase.eos.kind),
            ));
        }
        if !phase.eos.conductivity.is_finite() || phase.eos.conductivity < 0.0 {
            return Err(invalid(
                format!("phase '{}' conductivity", phase.name),
                phase.eos.conductivity,
                "must be non-negative and finite",
            ));
        }
    }

    for kind in &case.relaxations {
        if !case.model.allows_relaxation(*kind) {
            return Err(ValidationError::Unsupported {
                feature: format!("{} relaxation", kind.name()),
                reason: format!("not compatible with the {} model", case.model),
            });
        }
    }

    for physics in &case.additional_physics {
        match physics {
            PhysicsDef::Conductivity => {
                if case.phases.iter().all(|p| p.eos.conductivity <= 0.0) {
                    return Err(invalid(
                        "additional_physics",
                        "Conductivity",
                        "no phase has a positive conductivity",
                    ));
                }
                if matches!(case.boundaries.left, BoundaryDef::Symmetry)
                    || matches!(case.boundaries.right, BoundaryDef::Symmetry)
                {
                    return Err(ValidationError::Unsupported {
                        feature: "conductivity on a symmetry boundary".to_string(),
                        reason: "no heat flux formula for this boundary".to_string(),
                    });
                }
            }
        }
    }

    let numerics = &case.numerics;
    if !numerics.cfl.is_finite() || numerics.cfl <= 0.0 || numerics.cfl > 1.0 {
        return Err(invalid("numerics cfl", numerics.cfl, "must be in (0, 1]"));
    }

    if case.mesh.cells == 0 {
        return Err(invalid("mesh cells", 0, "must be positive"));
    }
    positive("mesh length", case.mesh.length)?;

    validate_regions(case, n_phases)?;
    validate_boundary("boundaries left", &case.boundaries.left)?;
    validate_boundary("boundaries right", &case.boundaries.right)?;

    let run = &case.run;
    if !run.final_time.is_finite() || run.final_time < 0.0 {
        return Err(invalid("run final_time", run.final_time, "must be non-negative and finite"));
    }
    if run.max_steps == 0 {
        return Err(invalid("run max_steps", 0, "must be positive"));
    }
    if run.record_every == 0 {
        return Err(invalid("run record_every", 0, "must be positive"));
    }

    Ok(())
}

fn validate_regions(case: &CaseDef, n_phases: usize) -> Result<(), ValidationError> {
    if case.regions.is_empty() {
        return Err(invalid("regions", 0, "at least one region is required"));
    }
    for (i, region) in case.regions.iter().enumerate() {
        validate_region(i, region, n_phases, case.transports)?;
    }

    let mut spans: Vec<(f64, f64)> = case.regions.iter().map(|r| (r.x_min, r.x_max)).collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut covered = 0.0;
    for (x_min, x_max) in spans {
        if x_min > covered {
            return Err(invalid("regions", x_min, "leave a gap in the initial condition"));
        }
        covered = f64::max(covered, x_max);
    }
    if covered < case.mesh.length {
        return Err(invalid("regions", covered, "do not reach the end of the mesh"));
    }
    Ok(())
}

fn validate_region(i: usize, region: &RegionDef, n_phases: usize, n_transports: usize) -> Result<(), ValidationError> {
    if !(region.x_min.is_finite() && region.x_max.is_finite()) || region.x_min >= region.x_max {
        return Err(invalid(format!("region {i} bounds"), region.x_min, "x_min must be below x_max"));
    }
    if region.phases.len() != n_phases {
        return Err(invalid(
            format!("region {i} phases"),
            region.phases.len(),
            &format!("expected {n_phases}"),
        ));
    }
    if region.transports.len() != n_transports {
        return Err(invalid(
            format!("region {i} transports"),
            region.transports.len(),
            &format!("expected {n_transports}"),
        ));
    }
    let mut sum = 0.0;
    for (k, phase) in region.phases.iter().enumerate() {
        if !phase.alpha.is_finite() || phase.alpha < 0.0 || phase.alpha > 1.0 {
            return Err(invalid(format!("region {i} phase {k} alpha"), phase.alpha, "must be in [0, 1]"));
        }
        if n_phases > 1 && phase.alpha == 0.0 {
            return Err(invalid(
                format!("region {i} phase {k} alpha"),
                phase.alpha,
                "every phase needs a residual volume fraction",
            ));
        }
        positive(&format!("region {i} phase {k} density"), phase.density)?;
        if !phase.pressure.is_finite() {
            return Err(invalid(format!("region {i} phase {k} pressure"), phase.pressure, "must be finite"));
        }
        if phase.velocity.iter().any(|v| !v.is_finite()) {
            return Err(invalid(format!("region {i} phase {k} velocity"), "non-finite", "must be finite"));
        }
        sum += phase.alpha;
    }
    if (sum - 1.0).abs() > ALPHA_SUM_TOL {
        return Err(invalid(format!("region {i} alpha sum"), sum, "must be 1"));
    }
    Ok(())
}

fn validate_boundary(field: &str, boundary: &BoundaryDef) -> Result<(), ValidationError> {
    match *boundary {
        BoundaryDef::InletStagnation { p0, t0 } => {
            positive(&format!("{field} p0"), p0)?;
            positive(&format!("{field} t0"), t0)
        }
        BoundaryDef::OutletPressure { p } => {
            if !p.is_finite() {
                return Err(invalid(format!("{field} p"), p, "must be finite"));
            }
            Ok(())
        }
        BoundaryDef::Wall | BoundaryDef::Symmetry | BoundaryDef::NonReflecting => Ok(()),
    }
}
