use std::path::Path;

use mf_model::Closure;

#[test]
fn demo_cases_load_and_build() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/cases");
    for name in ["sod.yaml", "water_air.yaml"] {
        let path = root.join(name);
        let case = mf_config::load_yaml(&path).unwrap_or_else(|e| panic!("Failed to load {name}: {e}"));
        let (stepper, mesh) = case
            .prepare()
            .unwrap_or_else(|e| panic!("Failed to build {name}: {e}"));
        assert_eq!(mesh.n_cells(), case.mesh.cells);
        assert_eq!(stepper.model().n_phases(), case.phases.len());
    }
}

#[test]
fn water_air_case_carries_conduction_and_transport() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/cases/water_air.yaml");
    let case = mf_config::load_yaml(&path).unwrap();
    assert_eq!(case.model, Closure::PUEq);
    let (stepper, mesh) = case.prepare().unwrap();
    assert_eq!(stepper.physics_names(), vec!["conductivity"]);
    assert_eq!(stepper.model().n_transports(), 1);
    assert_eq!(mesh.cells[0].state.transports, vec![1.0]);
    assert_eq!(mesh.cells[199].state.transports, vec![0.0]);
}

#[test]
fn sod_case_runs_a_few_steps() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/cases/sod.yaml");
    let case = mf_config::load_yaml(&path).unwrap();
    let (stepper, mut mesh) = case.prepare().unwrap();
    let opts = mf_sim::SimOptions {
        max_steps: 5,
        ..case.sim_options()
    };
    let record = mf_sim::run_sim(&stepper, &mut mesh, &opts).unwrap();
    assert_eq!(record.steps, 5);
}
