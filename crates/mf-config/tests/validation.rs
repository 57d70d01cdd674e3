use mf_config::{ConfigError, ValidationError, parse_yaml};
use mf_model::ErrorCategory;

const BASE: &str = r#"
version: 1
name: two-phase
model: PUEq
phases:
  - name: water
    eos: { kind: StiffenedGas, params: [4.4, 6.0e8, 1816.0, 0.0] }
  - name: air
    eos: { kind: IdealGas, params: [1.4, 717.5, 0.0] }
mesh: { cells: 10, length: 1.0 }
regions:
  - x_min: 0.0
    x_max: 1.0
    phases:
      - { alpha: 0.5, density: 1000.0, pressure: 1.0e5 }
      - { alpha: 0.5, density: 1.0, pressure: 1.0e5 }
boundaries:
  left: { kind: Wall }
  right: { kind: NonReflecting }
run: { final_time: 1.0e-4 }
"#;

fn with(from: &str, to: &str) -> String {
    assert!(BASE.contains(from), "{from} not in base case");
    BASE.replace(from, to)
}

fn invalid_field(yaml: &str) -> String {
    match parse_yaml(yaml) {
        Err(ConfigError::Validation(ValidationError::InvalidValue { field, .. })) => field,
        other => panic!("expected an invalid value, got {other:?}"),
    }
}

#[test]
fn base_case_is_valid_with_defaults() {
    let case = parse_yaml(BASE).unwrap();
    assert_eq!(case.numerics.cfl, 0.8);
    assert_eq!(case.run.max_steps, 100_000);
    assert!(case.relaxations.is_empty());
    let model = case.into_model().unwrap();
    assert_eq!(model.relaxation_kinds(), vec![mf_model::RelaxationKind::Pressure]);
}

#[test]
fn wrong_eos_arity_is_rejected() {
    let yaml = with("params: [1.4, 717.5, 0.0]", "params: [1.4, 717.5]");
    assert!(invalid_field(&yaml).contains("eos params"));
}

#[test]
fn phase_count_must_match_closure() {
    let yaml = with("model: PUEq", "model: Euler");
    assert_eq!(invalid_field(&yaml), "phases");
}

#[test]
fn incompatible_relaxation_is_unsupported() {
    let yaml = with("model: PUEq", "model: PTUEq\nrelaxations: [Pressure]");
    let err = parse_yaml(&yaml).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(ValidationError::Unsupported { .. })));
    assert_eq!(err.category(), ErrorCategory::UnimplementedCombination);
}

#[test]
fn volume_fractions_must_sum_to_one() {
    let yaml = with("{ alpha: 0.5, density: 1.0,", "{ alpha: 0.4, density: 1.0,");
    assert!(invalid_field(&yaml).contains("alpha sum"));
}

#[test]
fn regions_must_cover_the_mesh() {
    let yaml = with("x_max: 1.0", "x_max: 0.8");
    assert_eq!(invalid_field(&yaml), "regions");
}

#[test]
fn cfl_out_of_range() {
    let yaml = with("mesh:", "numerics: { cfl: 1.5 }\nmesh:");
    assert_eq!(invalid_field(&yaml), "numerics cfl");
}

#[test]
fn conduction_needs_a_conducting_phase() {
    let yaml = with("phases:\n  - name", "additional_physics: [Conductivity]\nphases:\n  - name");
    assert_eq!(invalid_field(&yaml), "additional_physics");
}

#[test]
fn inlet_temperature_must_be_positive() {
    let yaml = with("right: { kind: NonReflecting }", "right: { kind: InletStagnation, p0: 2.0e5, t0: -3.0 }");
    assert_eq!(invalid_field(&yaml), "boundaries right t0");
}

#[test]
fn newer_versions_are_rejected() {
    let yaml = with("version: 1", "version: 9");
    assert!(matches!(
        parse_yaml(&yaml),
        Err(ConfigError::Validation(ValidationError::UnsupportedVersion { version: 9 }))
    ));
}

#[test]
fn yaml_round_trip() {
    let case = parse_yaml(BASE).unwrap();
    let path = std::env::temp_dir().join("mf_config_roundtrip.yaml");
    mf_config::save_yaml(&path, &case).unwrap();
    let loaded = mf_config::load_yaml(&path).unwrap();
    assert_eq!(case, loaded);
}
